// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use lamina_core::time::Timebase;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Events that carry no timestamp of their own are placed at the most recent
/// phase boundary.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::LayoutPass(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "LayoutPass",
                    "cat": "Layout",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "passes": e.passes,
                        "laid_out": e.laid_out,
                        "failures": e.failures,
                    }
                }));
            }
            RecordedEvent::PaintPass(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "PaintPass",
                    "cat": "Paint",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "repainted": e.repainted,
                        "fresh": e.fresh,
                        "retained": e.retained,
                        "pictures": e.pictures,
                    }
                }));
            }
            RecordedEvent::RenderFailure(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RenderFailure",
                    "cat": "Error",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "node": e.node_index,
                        "depth": e.depth,
                        "phase": format!("{:?}", e.phase),
                    }
                }));
            }
            RecordedEvent::RasterStats(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "RasterCache",
                    "cat": "Raster",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "hits": e.hits,
                        "fills": e.fills,
                        "evictions": e.evictions,
                        "entries": e.entries,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": ticks_to_us(s.started.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "layout_us": ticks_to_us(s.layout_ticks, timebase),
                        "compositing_us": ticks_to_us(s.compositing_ticks, timebase),
                        "paint_us": ticks_to_us(s.paint_ticks, timebase),
                        "raster_us": ticks_to_us(s.raster_ticks, timebase),
                        "laid_out": s.laid_out,
                        "repainted": s.repainted,
                        "failures": s.failures,
                    }
                }));
            }
            RecordedEvent::NodesLaidOutCount { frame_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "NodesLaidOut",
                    "cat": "Rich",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                    }
                }));
            }
            RecordedEvent::NodesRepaintedCount { frame_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "NodesRepainted",
                    "cat": "Rich",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}
