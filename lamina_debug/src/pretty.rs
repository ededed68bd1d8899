// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use lamina_core::time::{HostTime, Timebase};
use lamina_core::trace::{
    FrameSummary, LayoutPassEvent, PaintPassEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    RasterStatsEvent, RenderFailureEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Layout => "layout",
        PhaseKind::CompositingBits => "compositing",
        PhaseKind::Paint => "paint",
        PhaseKind::Raster => "raster",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_layout_pass(&mut self, e: &LayoutPassEvent) {
        let _ = writeln!(
            self.writer,
            "[layout] frame={} passes={} laid_out={} failures={}",
            e.frame_index, e.passes, e.laid_out, e.failures,
        );
    }

    fn on_paint_pass(&mut self, e: &PaintPassEvent) {
        let _ = writeln!(
            self.writer,
            "[paint] frame={} repainted={} fresh={} retained={} pictures={}",
            e.frame_index, e.repainted, e.fresh, e.retained, e.pictures,
        );
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        let _ = writeln!(
            self.writer,
            "[FAILURE] frame={} node={} depth={} during {}",
            e.frame_index,
            e.node_index,
            e.depth,
            phase_name(e.phase),
        );
    }

    fn on_raster_stats(&mut self, e: &RasterStatsEvent) {
        let _ = writeln!(
            self.writer,
            "[raster] frame={} hits={} fills={} evictions={} entries={} took={:.1}µs",
            e.frame_index,
            e.hits,
            e.fills,
            e.evictions,
            e.entries,
            self.ticks_to_us(e.frame_ticks),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} layout={:.1}µs compositing={:.1}µs paint={:.1}µs \
             raster={:.1}µs laid_out={} repainted={} failures={}",
            s.frame_index,
            self.ticks_to_us(s.layout_ticks),
            self.ticks_to_us(s.compositing_ticks),
            self.ticks_to_us(s.paint_ticks),
            self.ticks_to_us(s.raster_ticks),
            s.laid_out,
            s.repainted,
            s.failures,
        );
    }

    fn on_nodes_laid_out(&mut self, frame_index: u64, nodes: &[u32]) {
        let _ = writeln!(
            self.writer,
            "[nodes:layout] frame={frame_index} {nodes:?}",
        );
    }

    fn on_nodes_repainted(&mut self, frame_index: u64, nodes: &[u32]) {
        let _ = writeln!(
            self.writer,
            "[nodes:paint] frame={frame_index} {nodes:?}",
        );
    }
}
