// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Per-node events ([`on_nodes_laid_out`](TraceSink::on_nodes_laid_out),
//! [`on_nodes_repainted`](TraceSink::on_nodes_repainted)) store only the
//! count.

use lamina_core::time::HostTime;
use lamina_core::trace::{
    FrameSummary, LayoutPassEvent, PaintPassEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    RasterStatsEvent, RenderFailureEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_LAYOUT_PASS: u8 = 3;
const TAG_PAINT_PASS: u8 = 4;
const TAG_RENDER_FAILURE: u8 = 5;
const TAG_RASTER_STATS: u8 = 6;
const TAG_FRAME_SUMMARY: u8 = 7;
const TAG_NODES_LAID_OUT_COUNT: u8 = 8;
const TAG_NODES_REPAINTED_COUNT: u8 = 9;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Counts are capped at `u32::MAX` for recording.
    fn write_count(&mut self, n: usize) {
        self.write_u32(u32::try_from(n).unwrap_or(u32::MAX));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Layout => 0,
            PhaseKind::CompositingBits => 1,
            PhaseKind::Paint => 2,
            PhaseKind::Raster => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_layout_pass(&mut self, e: &LayoutPassEvent) {
        self.write_u8(TAG_LAYOUT_PASS);
        self.write_u64(e.frame_index);
        self.write_u32(e.passes);
        self.write_count(e.laid_out);
        self.write_count(e.failures);
    }

    fn on_paint_pass(&mut self, e: &PaintPassEvent) {
        self.write_u8(TAG_PAINT_PASS);
        self.write_u64(e.frame_index);
        self.write_count(e.repainted);
        self.write_count(e.fresh);
        self.write_count(e.retained);
        self.write_count(e.pictures);
    }

    fn on_render_failure(&mut self, e: &RenderFailureEvent) {
        self.write_u8(TAG_RENDER_FAILURE);
        self.write_u64(e.frame_index);
        self.write_u32(e.node_index);
        self.write_u32(e.depth);
        self.write_phase(e.phase);
    }

    fn on_raster_stats(&mut self, e: &RasterStatsEvent) {
        self.write_u8(TAG_RASTER_STATS);
        self.write_u64(e.frame_index);
        self.write_u64(e.hits);
        self.write_u64(e.fills);
        self.write_u64(e.evictions);
        self.write_count(e.entries);
        self.write_u64(e.frame_ticks);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.started.ticks());
        self.write_u64(s.layout_ticks);
        self.write_u64(s.compositing_ticks);
        self.write_u64(s.paint_ticks);
        self.write_u64(s.raster_ticks);
        self.write_count(s.laid_out);
        self.write_count(s.repainted);
        self.write_count(s.failures);
    }

    fn on_nodes_laid_out(&mut self, frame_index: u64, nodes: &[u32]) {
        self.write_u8(TAG_NODES_LAID_OUT_COUNT);
        self.write_u64(frame_index);
        self.write_count(nodes.len());
    }

    fn on_nodes_repainted(&mut self, frame_index: u64, nodes: &[u32]) {
        self.write_u8(TAG_NODES_REPAINTED_COUNT);
        self.write_u64(frame_index);
        self.write_count(nodes.len());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`LayoutPassEvent`].
    LayoutPass(LayoutPassEvent),
    /// A [`PaintPassEvent`].
    PaintPass(PaintPassEvent),
    /// A [`RenderFailureEvent`].
    RenderFailure(RenderFailureEvent),
    /// A [`RasterStatsEvent`].
    RasterStats(RasterStatsEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// Number of nodes laid out in a frame.
    NodesLaidOutCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of nodes.
        count: u32,
    },
    /// Number of layer owners repainted in a frame.
    NodesRepaintedCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of nodes.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u32()?).ok()
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Layout,
            1 => PhaseKind::CompositingBits,
            2 => PhaseKind::Paint,
            _ => PhaseKind::Raster,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_layout_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayoutPass(LayoutPassEvent {
            frame_index: self.read_u64()?,
            passes: self.read_u32()?,
            laid_out: self.read_count()?,
            failures: self.read_count()?,
        }))
    }

    fn decode_paint_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PaintPass(PaintPassEvent {
            frame_index: self.read_u64()?,
            repainted: self.read_count()?,
            fresh: self.read_count()?,
            retained: self.read_count()?,
            pictures: self.read_count()?,
        }))
    }

    fn decode_render_failure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderFailure(RenderFailureEvent {
            frame_index: self.read_u64()?,
            node_index: self.read_u32()?,
            depth: self.read_u32()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_raster_stats(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RasterStats(RasterStatsEvent {
            frame_index: self.read_u64()?,
            hits: self.read_u64()?,
            fills: self.read_u64()?,
            evictions: self.read_u64()?,
            entries: self.read_count()?,
            frame_ticks: self.read_u64()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            started: HostTime(self.read_u64()?),
            layout_ticks: self.read_u64()?,
            compositing_ticks: self.read_u64()?,
            paint_ticks: self.read_u64()?,
            raster_ticks: self.read_u64()?,
            laid_out: self.read_count()?,
            repainted: self.read_count()?,
            failures: self.read_count()?,
        }))
    }

    fn decode_count(&mut self, tag: u8) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(if tag == TAG_NODES_LAID_OUT_COUNT {
            RecordedEvent::NodesLaidOutCount { frame_index, count }
        } else {
            RecordedEvent::NodesRepaintedCount { frame_index, count }
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_LAYOUT_PASS => self.decode_layout_pass(),
            TAG_PAINT_PASS => self.decode_paint_pass(),
            TAG_RENDER_FAILURE => self.decode_render_failure(),
            TAG_RASTER_STATS => self.decode_raster_stats(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_NODES_LAID_OUT_COUNT | TAG_NODES_REPAINTED_COUNT => self.decode_count(tag),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use lamina_core::trace::Tracer;

    use super::*;
    use crate::testing::{Panel, frame, panel_tree};

    #[test]
    fn frame_records_every_pipeline_event_in_order() {
        let mut tree = panel_tree();
        let mut rec = RecorderSink::new();
        frame(&mut tree, 3, &mut Tracer::new(&mut rec));

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        let shape: Vec<&str> = events
            .iter()
            .map(|e| match e {
                RecordedEvent::PhaseBegin(_) => "begin",
                RecordedEvent::PhaseEnd(_) => "end",
                RecordedEvent::LayoutPass(_) => "layout",
                RecordedEvent::PaintPass(_) => "paint",
                RecordedEvent::RenderFailure(_) => "failure",
                RecordedEvent::RasterStats(_) => "raster",
                RecordedEvent::FrameSummary(_) => "summary",
                RecordedEvent::NodesLaidOutCount { .. } => "laid-out",
                RecordedEvent::NodesRepaintedCount { .. } => "repainted",
            })
            .collect();
        assert_eq!(
            shape,
            [
                "begin", "end", "layout", "laid-out", "begin", "end", "begin", "end", "paint",
                "repainted", "summary"
            ]
        );

        match &events[2] {
            RecordedEvent::LayoutPass(e) => {
                assert_eq!(e.frame_index, 3);
                assert_eq!((e.passes, e.laid_out, e.failures), (1, 2, 0));
            }
            other => panic!("expected LayoutPass, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::NodesLaidOutCount { frame_index, count } => {
                assert_eq!((*frame_index, *count), (3, 2));
            }
            other => panic!("expected NodesLaidOutCount, got {other:?}"),
        }
        match &events[10] {
            RecordedEvent::FrameSummary(s) => {
                assert_eq!((s.laid_out, s.repainted, s.failures), (2, 1, 0));
                assert_eq!(s.layout_ticks, 1000, "one clock step per phase");
            }
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn failures_are_recorded_with_their_phase() {
        let mut tree = panel_tree();
        let root = tree.root().expect("root");
        let child = tree.children(root)[0];
        tree.object_mut::<Panel>(child).expect("panel").fail_paint = true;
        let mut rec = RecorderSink::new();
        frame(&mut tree, 0, &mut Tracer::new(&mut rec));

        let failure = decode(rec.as_bytes()).find_map(|e| match e {
            RecordedEvent::RenderFailure(f) => Some(f),
            _ => None,
        });
        let failure = failure.expect("a failure event");
        assert_eq!(failure.node_index, child.index());
        assert_eq!(failure.depth, 1);
        assert_eq!(failure.phase, PhaseKind::Paint);
    }

    #[test]
    fn raster_stats_round_trip() {
        let mut rec = RecorderSink::new();
        rec.on_raster_stats(&RasterStatsEvent {
            frame_index: 9,
            hits: 4,
            fills: 2,
            evictions: 1,
            entries: 3,
            frame_ticks: 16_000,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::RasterStats(e)] => {
                assert_eq!((e.frame_index, e.hits, e.fills, e.evictions), (9, 4, 2, 1));
                assert_eq!((e.entries, e.frame_ticks), (3, 16_000));
            }
            other => panic!("expected one RasterStats, got {other:?}"),
        }
    }

    #[test]
    fn truncated_recording_stops_at_the_last_whole_event() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 1,
            phase: PhaseKind::Raster,
            timestamp: HostTime(10),
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 1,
            phase: PhaseKind::Raster,
            timestamp: HostTime(20),
        });
        let mut bytes = rec.into_bytes();
        bytes.pop();

        let events: Vec<_> = decode(&bytes).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::PhaseBegin(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
