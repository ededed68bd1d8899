// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! pipeline instrumentation calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during a frame and
//! produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the per-node
//!   [`nodes_laid_out`](Tracer::nodes_laid_out) and
//!   [`nodes_repainted`](Tracer::nodes_repainted) events.

use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the frame pipeline is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Needs-layout flush.
    Layout,
    /// Compositing-bit recomputation.
    CompositingBits,
    /// Needs-paint flush (recording pictures into layers).
    Paint,
    /// Compositing the layer tree onto the output canvas.
    Raster,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted after the layout flush.
#[derive(Clone, Copy, Debug)]
pub struct LayoutPassEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// How many times the needs-layout queue was drained.
    pub passes: u32,
    /// Nodes whose layout callbacks ran.
    pub laid_out: usize,
    /// Layout callbacks that failed.
    pub failures: usize,
}

/// Emitted after the paint flush.
#[derive(Clone, Copy, Debug)]
pub struct PaintPassEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Layer owners that were re-recorded.
    pub repainted: usize,
    /// Composited children whose layer was re-recorded.
    pub fresh: usize,
    /// Composited children whose layer was reused.
    pub retained: usize,
    /// Picture layers recorded.
    pub pictures: usize,
}

/// Emitted for every render callback that returned an error.
#[derive(Clone, Copy, Debug)]
pub struct RenderFailureEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Slot index of the failing node.
    pub node_index: u32,
    /// Depth of the failing node.
    pub depth: u32,
    /// Which phase the failure happened in.
    pub phase: PhaseKind,
}

/// Raster cache statistics at the end of a composited frame.
#[derive(Clone, Copy, Debug)]
pub struct RasterStatsEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Lookups answered with a cached image, since creation.
    pub hits: u64,
    /// Images rasterized, since creation.
    pub fills: u64,
    /// Entries evicted, since creation.
    pub evictions: u64,
    /// Entries left in the cache after the purge.
    pub entries: usize,
    /// Duration of the composited frame in ticks.
    pub frame_ticks: u64,
}

/// Per-frame timing summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time when the frame started.
    pub started: HostTime,
    /// Layout phase duration in ticks (0 if not measured).
    pub layout_ticks: u64,
    /// Compositing-bits phase duration in ticks (0 if not measured).
    pub compositing_ticks: u64,
    /// Paint phase duration in ticks (0 if not measured).
    pub paint_ticks: u64,
    /// Raster phase duration in ticks (0 if not measured).
    pub raster_ticks: u64,
    /// Nodes laid out this frame.
    pub laid_out: usize,
    /// Layer owners repainted this frame.
    pub repainted: usize,
    /// Render callbacks that failed this frame.
    pub failures: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a pipeline phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pipeline phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after the layout flush.
    fn on_layout_pass(&mut self, e: &LayoutPassEvent) {
        _ = e;
    }

    /// Called after the paint flush.
    fn on_paint_pass(&mut self, e: &PaintPassEvent) {
        _ = e;
    }

    /// Called for every failed render callback.
    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        _ = e;
    }

    /// Called with raster cache statistics after compositing.
    fn on_raster_stats(&mut self, e: &RasterStatsEvent) {
        _ = e;
    }

    /// Called with a per-frame timing summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the slot indices of nodes laid out this frame (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_nodes_laid_out(&mut self, frame_index: u64, nodes: &[u32]) {
        _ = (frame_index, nodes);
    }

    /// Called with the slot indices of layer owners repainted this frame
    /// (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_nodes_repainted(&mut self, frame_index: u64, nodes: &[u32]) {
        _ = (frame_index, nodes);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayoutPassEvent`].
    #[inline]
    pub fn layout_pass(&mut self, e: &LayoutPassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layout_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaintPassEvent`].
    #[inline]
    pub fn paint_pass(&mut self, e: &PaintPassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_paint_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderFailureEvent`].
    #[inline]
    pub fn render_failure(&mut self, e: &RenderFailureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_failure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RasterStatsEvent`].
    #[inline]
    pub fn raster_stats(&mut self, e: &RasterStatsEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_raster_stats(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits the nodes laid out this frame (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn nodes_laid_out(&mut self, frame_index: u64, nodes: &[u32]) {
        if let Some(s) = &mut self.sink {
            s.on_nodes_laid_out(frame_index, nodes);
        }
    }

    /// Emits the layer owners repainted this frame (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn nodes_repainted(&mut self, frame_index: u64, nodes: &[u32]) {
        if let Some(s) = &mut self.sink {
            s.on_nodes_repainted(frame_index, nodes);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    started: HostTime,
    phase_starts: [Option<HostTime>; 4],
    phase_ends: [Option<HostTime>; 4],
    laid_out: usize,
    repainted: usize,
    failures: usize,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for a frame that started at `started`.
    #[must_use]
    pub fn new(frame_index: u64, started: HostTime) -> Self {
        Self {
            frame_index,
            started,
            phase_starts: [None; 4],
            phase_ends: [None; 4],
            laid_out: 0,
            repainted: 0,
            failures: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Sets the per-frame work counts.
    pub fn set_counts(&mut self, laid_out: usize, repainted: usize, failures: usize) {
        self.laid_out = laid_out;
        self.repainted = repainted;
        self.failures = failures;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            started: self.started,
            layout_ticks: self.phase_duration(PhaseKind::Layout),
            compositing_ticks: self.phase_duration(PhaseKind::CompositingBits),
            paint_ticks: self.phase_duration(PhaseKind::Paint),
            raster_ticks: self.phase_duration(PhaseKind::Raster),
            laid_out: self.laid_out,
            repainted: self.repainted,
            failures: self.failures,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).ticks(),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Layout => 0,
        PhaseKind::CompositingBits => 1,
        PhaseKind::Paint => 2,
        PhaseKind::Raster => 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
