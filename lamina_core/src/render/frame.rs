// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One traced run of the whole pipeline.

use alloc::vec::Vec;

use super::compositing::CompositingReport;
use super::error::{FailurePhase, RenderFailure};
use super::layout::LayoutReport;
use super::paint::PaintReport;
use super::tree::RenderTree;
use crate::painting::CompositedLayer;
use crate::time::{Clock, HostTime};
use crate::trace::{
    FrameSummaryBuilder, LayoutPassEvent, PaintPassEvent, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, RenderFailureEvent, Tracer,
};

/// What a [`RenderTree::draw_frame`] call did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Frame counter passed to `draw_frame`.
    pub frame_index: u64,
    /// The layout flush.
    pub layout: LayoutReport,
    /// The compositing-bits flush.
    pub compositing: CompositingReport,
    /// The paint flush.
    pub paint: PaintReport,
}

impl FrameReport {
    /// Returns every render callback failure of the frame, layout first.
    pub fn failures(&self) -> impl Iterator<Item = &RenderFailure> {
        self.layout.failures.iter().chain(&self.paint.failures)
    }
}

impl RenderTree {
    /// Runs layout, compositing bits and paint, emitting phase and pass
    /// events to `tracer`.
    ///
    /// Afterwards the layer tree under [`root_layer`](Self::root_layer) is
    /// ready to composite.
    pub fn draw_frame(
        &mut self,
        frame_index: u64,
        clock: &dyn Clock,
        tracer: &mut Tracer<'_>,
    ) -> FrameReport {
        let started = clock.now();
        let mut summary = FrameSummaryBuilder::new(frame_index, started);

        begin(tracer, &mut summary, frame_index, PhaseKind::Layout, started);
        let layout = self.flush_layout();
        end(tracer, &mut summary, frame_index, PhaseKind::Layout, clock);
        tracer.layout_pass(&LayoutPassEvent {
            frame_index,
            passes: layout.passes,
            laid_out: layout.laid_out.len(),
            failures: layout.failures.len(),
        });
        #[cfg(feature = "trace-rich")]
        {
            let nodes: Vec<u32> = layout.laid_out.iter().map(|id| id.index()).collect();
            tracer.nodes_laid_out(frame_index, &nodes);
        }

        let now = clock.now();
        begin(tracer, &mut summary, frame_index, PhaseKind::CompositingBits, now);
        let compositing = self.flush_compositing_bits();
        end(tracer, &mut summary, frame_index, PhaseKind::CompositingBits, clock);

        let now = clock.now();
        begin(tracer, &mut summary, frame_index, PhaseKind::Paint, now);
        let paint = self.flush_paint();
        end(tracer, &mut summary, frame_index, PhaseKind::Paint, clock);
        let retained = paint
            .composited
            .iter()
            .filter(|(_, c)| matches!(c, CompositedLayer::Retained(_)))
            .count();
        tracer.paint_pass(&PaintPassEvent {
            frame_index,
            repainted: paint.repainted.len(),
            fresh: paint.composited.len() - retained,
            retained,
            pictures: paint.pictures,
        });
        #[cfg(feature = "trace-rich")]
        {
            let nodes: Vec<u32> = paint.repainted.iter().map(|id| id.index()).collect();
            tracer.nodes_repainted(frame_index, &nodes);
        }

        let report = FrameReport {
            frame_index,
            layout,
            compositing,
            paint,
        };
        let failures: Vec<&RenderFailure> = report.failures().collect();
        for failure in &failures {
            tracer.render_failure(&RenderFailureEvent {
                frame_index,
                node_index: failure.node.index(),
                depth: failure.depth,
                phase: match failure.phase {
                    FailurePhase::Resize | FailurePhase::Layout => PhaseKind::Layout,
                    FailurePhase::Paint => PhaseKind::Paint,
                },
            });
        }
        summary.set_counts(
            report.layout.laid_out.len(),
            report.paint.repainted.len(),
            failures.len(),
        );
        tracer.frame_summary(&summary.finish());
        report
    }
}

fn begin(
    tracer: &mut Tracer<'_>,
    summary: &mut FrameSummaryBuilder,
    frame_index: u64,
    phase: PhaseKind,
    timestamp: HostTime,
) {
    summary.phase_begin(phase, timestamp);
    tracer.phase_begin(&PhaseBeginEvent {
        frame_index,
        phase,
        timestamp,
    });
}

fn end(
    tracer: &mut Tracer<'_>,
    summary: &mut FrameSummaryBuilder,
    frame_index: u64,
    phase: PhaseKind,
    clock: &dyn Clock,
) {
    let timestamp = clock.now();
    summary.phase_end(phase, timestamp);
    tracer.phase_end(&PhaseEndEvent {
        frame_index,
        phase,
        timestamp,
    });
}
