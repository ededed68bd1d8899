// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame compositing.
//!
//! A [`Compositor`] outlives frames and owns everything that carries over
//! between them: the picture cache, the frame counter and the frame
//! stopwatch. Each frame is bracketed by a [`ScopedFrame`]:
//!
//! ```text
//!   acquire_frame(canvas, gpu)     frame_count += 1, start stopwatch
//!       │
//!       ▼
//!   ScopedFrame::paint_layer_tree  picture layers: cached image or replay
//!       │
//!       ▼
//!   drop / finish                  purge cache, stop stopwatch, overlays
//! ```

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use core::fmt;

use kurbo::{Point, Vec2};
use lamina_core::layer::{LayerId, LayerKind, LayerTree};
use lamina_core::picture::{Canvas, Color, LayerEffect, Paint, PhysicalSize, Picture};
use lamina_core::time::{Clock, Duration, HostTime, Stopwatch, Timebase};
use lamina_core::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, RasterStatsEvent, Tracer};

use crate::gpu::GpuContext;
use crate::options::CompositorOptions;
use crate::rasterizer::{PictureRasterizer, scale_factors};

const STATS_ORIGIN: Point = Point::new(10.0, 20.0);
const STATS_LINE_SPACING: f64 = 18.0;
const STATS_TEXT_SIZE: f32 = 14.0;

/// Draws layer trees onto output canvases, frame after frame.
pub struct Compositor {
    rasterizer: PictureRasterizer,
    options: CompositorOptions,
    frame_count: u64,
    frame_timer: Stopwatch,
    clock: Box<dyn Clock>,
    timebase: Timebase,
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("rasterizer", &self.rasterizer)
            .field("options", &self.options)
            .field("frame_count", &self.frame_count)
            .field("frame_timer", &self.frame_timer)
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Creates a compositor timing frames with `clock`, whose ticks convert
    /// to nanoseconds through `timebase`.
    #[must_use]
    pub fn new(clock: impl Clock + 'static, timebase: Timebase) -> Self {
        Self {
            rasterizer: PictureRasterizer::new(),
            options: CompositorOptions::empty(),
            frame_count: 0,
            frame_timer: Stopwatch::new(),
            clock: Box::new(clock),
            timebase,
        }
    }

    /// Returns the enabled diagnostic overlays.
    #[must_use]
    pub const fn options(&self) -> CompositorOptions {
        self.options
    }

    /// Replaces the enabled diagnostic overlays.
    pub fn set_options(&mut self, options: CompositorOptions) {
        self.options = options;
    }

    /// Returns the picture cache.
    #[must_use]
    pub const fn rasterizer(&self) -> &PictureRasterizer {
        &self.rasterizer
    }

    /// Returns the number of frames acquired so far.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns how long the last completed frame took.
    #[must_use]
    pub const fn last_frame_time(&self) -> Duration {
        self.frame_timer.last_lap()
    }

    /// Starts a frame drawing onto `canvas`.
    ///
    /// Without a `gpu`, every picture is replayed directly.
    pub fn acquire_frame<'a>(
        &'a mut self,
        canvas: &'a mut dyn Canvas,
        gpu: Option<&'a mut dyn GpuContext>,
    ) -> ScopedFrame<'a> {
        self.frame_count += 1;
        let started = self.clock.now();
        self.frame_timer.start(started);
        ScopedFrame {
            compositor: self,
            canvas,
            gpu,
            started,
            ended: false,
        }
    }

    fn end_frame(&mut self, canvas: &mut dyn Canvas) {
        self.rasterizer.purge();
        self.frame_timer.stop(self.clock.now());
        self.draw_statistics(canvas);
    }

    fn draw_statistics(&self, canvas: &mut dyn Canvas) {
        let paint = Paint {
            text_size: STATS_TEXT_SIZE,
            ..Paint::fill(Color::RED)
        };
        let mut origin = STATS_ORIGIN;

        if self.options.contains(CompositorOptions::SHOW_FRAME_STATS) {
            let text = format!(
                "Frame ({}): {:.2}ms",
                self.frame_count,
                self.last_frame_time().as_millis_f64(self.timebase)
            );
            canvas.draw_text(&text, origin, &paint);
            origin.y += STATS_LINE_SPACING;
        }

        if self.options.contains(CompositorOptions::SHOW_RASTERIZER_STATS) {
            let text = format!(
                "Rasterizer Hits: {} Fills: {} Evictions: {}",
                self.rasterizer.hits(),
                self.rasterizer.fills(),
                self.rasterizer.evictions()
            );
            canvas.draw_text(&text, origin, &paint);
        }
    }
}

/// One frame in progress.
///
/// Dropping the frame ends it: the picture cache is purged, the frame
/// stopwatch stopped and the enabled statistics drawn.
pub struct ScopedFrame<'a> {
    compositor: &'a mut Compositor,
    canvas: &'a mut dyn Canvas,
    gpu: Option<&'a mut dyn GpuContext>,
    started: HostTime,
    ended: bool,
}

impl fmt::Debug for ScopedFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedFrame")
            .field("frame", &self.compositor.frame_count)
            .field("started", &self.started)
            .field("has_gpu", &self.gpu.is_some())
            .finish_non_exhaustive()
    }
}

impl ScopedFrame<'_> {
    /// Returns the output canvas.
    pub fn canvas(&mut self) -> &mut dyn Canvas {
        &mut *self.canvas
    }

    /// Returns the compositor this frame belongs to.
    #[must_use]
    pub fn compositor(&self) -> &Compositor {
        self.compositor
    }

    /// Draws the layer subtree rooted at `root`.
    pub fn paint_layer_tree(&mut self, layers: &LayerTree, root: LayerId) {
        let kind = layers.kind(root);
        let offset = layers.offset(root);
        if let LayerKind::Picture(picture) = kind {
            self.paint_picture(picture, offset);
            return;
        }

        let canvas = &mut *self.canvas;
        canvas.save();
        canvas.translate(offset);
        let group = match kind {
            LayerKind::Clip(shape) => {
                shape.apply(canvas);
                false
            }
            LayerKind::Transform(transform) => {
                canvas.concat(*transform);
                false
            }
            LayerKind::Opacity(alpha) => {
                canvas.save_layer(Some(layers.bounds(root)), LayerEffect::alpha(*alpha));
                true
            }
            LayerKind::ColorFilter(filter) => {
                canvas.save_layer(
                    Some(layers.bounds(root)),
                    LayerEffect::color_filter(*filter),
                );
                true
            }
            LayerKind::Container | LayerKind::Picture(_) => false,
        };

        for child in layers.children(root) {
            self.paint_layer_tree(layers, child);
        }

        if group {
            self.canvas.restore();
        }
        self.canvas.restore();
    }

    /// Draws the cached image of `picture` if the cache has one, else
    /// replays it.
    fn paint_picture(&mut self, picture: &Rc<Picture>, offset: Vec2) {
        let ctm = self.canvas.transform();
        let (sx, sy) = scale_factors(ctm);
        let cull = picture.cull_rect();
        let size = PhysicalSize::from_logical(cull.size(), sx, sy);
        let highlight = self
            .compositor
            .options
            .contains(CompositorOptions::HIGHLIGHT_RASTERIZED_IMAGES);

        let image = self.compositor.rasterizer.get_cached_image(
            picture,
            size,
            ctm,
            self.gpu.as_deref_mut(),
            highlight,
        );

        match image {
            Some(image) => self.canvas.draw_image(&image, cull.origin() + offset),
            None => {
                self.canvas.save();
                self.canvas.translate(offset);
                self.canvas.draw_picture(picture);
                self.canvas.restore();
            }
        }
    }

    /// Ends the frame and reports the raster phase and cache statistics.
    pub fn finish(mut self, frame_index: u64, tracer: &mut Tracer<'_>) {
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Raster,
            timestamp: self.started,
        });
        self.end();
        let compositor = &*self.compositor;
        let frame_time = compositor.last_frame_time();
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Raster,
            timestamp: self.started + frame_time,
        });
        tracer.raster_stats(&RasterStatsEvent {
            frame_index,
            hits: compositor.rasterizer.hits(),
            fills: compositor.rasterizer.fills(),
            evictions: compositor.rasterizer.evictions(),
            entries: compositor.rasterizer.len(),
            frame_ticks: frame_time.ticks(),
        });
    }

    fn end(&mut self) {
        if !self.ended {
            self.ended = true;
            self.compositor.end_frame(&mut *self.canvas);
        }
    }
}

impl Drop for ScopedFrame<'_> {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use kurbo::{Affine, Rect};
    use lamina_core::layer::ClipShape;
    use lamina_core::picture::{DrawCommand, PictureRecorder};
    use lamina_core::trace::TraceSink;

    use super::*;
    use crate::testing::FakeGpu;

    fn compositor() -> (Compositor, Rc<Cell<u64>>) {
        let now = Rc::new(Cell::new(0_u64));
        let clock = now.clone();
        let compositor = Compositor::new(move || HostTime(clock.get()), Timebase::NANOS);
        (compositor, now)
    }

    fn picture(rect: Rect) -> Rc<Picture> {
        let mut rec = PictureRecorder::new(rect);
        rec.draw_rect(rect, &Paint::fill(Color::BLACK));
        rec.finish()
    }

    fn texts(commands: &[DrawCommand]) -> Vec<(String, Point, Paint)> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawText(text, origin, paint) => Some((text.clone(), *origin, *paint)),
                _ => None,
            })
            .collect()
    }

    /// A container at `(3, 4)` holding one 10x10 picture layer.
    fn single_picture_tree() -> (LayerTree, LayerId, Rc<Picture>) {
        let mut layers = LayerTree::new();
        let root = layers.create_layer(LayerKind::Container);
        layers.set_offset(root, Vec2::new(3.0, 4.0));
        let pic = picture(Rect::new(0.0, 0.0, 10.0, 10.0));
        let leaf = layers.create_layer(LayerKind::Picture(pic.clone()));
        layers.append(root, leaf);
        (layers, root, pic)
    }

    #[test]
    fn statistics_are_drawn_when_the_frame_ends() {
        let (mut compositor, now) = compositor();
        compositor.set_options(
            CompositorOptions::SHOW_FRAME_STATS | CompositorOptions::SHOW_RASTERIZER_STATS,
        );
        let mut canvas = PictureRecorder::new(Rect::new(0.0, 0.0, 100.0, 100.0));

        now.set(1_000_000);
        {
            let _frame = compositor.acquire_frame(&mut canvas, None);
            now.set(4_250_000);
        }

        let picture = canvas.finish();
        let texts = texts(picture.commands());
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].0, "Frame (1): 3.25ms");
        assert_eq!(texts[0].1, Point::new(10.0, 20.0));
        assert_eq!(texts[0].2.color, Color::RED);
        assert_eq!(texts[0].2.text_size, 14.0);
        assert_eq!(texts[1].0, "Rasterizer Hits: 0 Fills: 0 Evictions: 0");
        assert_eq!(texts[1].1, Point::new(10.0, 38.0));
    }

    #[test]
    fn rasterizer_statistics_take_the_first_line_alone() {
        let (mut compositor, _now) = compositor();
        compositor.set_options(CompositorOptions::SHOW_RASTERIZER_STATS);
        let mut canvas = PictureRecorder::new(Rect::ZERO);
        drop(compositor.acquire_frame(&mut canvas, None));

        let picture = canvas.finish();
        let texts = texts(picture.commands());
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].1, Point::new(10.0, 20.0));
    }

    #[test]
    fn no_overlays_by_default() {
        let (mut compositor, _now) = compositor();
        let mut canvas = PictureRecorder::new(Rect::ZERO);
        drop(compositor.acquire_frame(&mut canvas, None));
        drop(compositor.acquire_frame(&mut canvas, None));
        assert_eq!(compositor.frame_count(), 2);
        assert!(canvas.is_empty());
    }

    #[test]
    fn picture_layer_replays_then_draws_cached_image() {
        let (mut compositor, _now) = compositor();
        let (mut gpu, log) = FakeGpu::new();
        let (layers, root, pic) = single_picture_tree();

        let mut first = PictureRecorder::new(Rect::ZERO);
        {
            let mut frame = compositor.acquire_frame(&mut first, Some(&mut gpu));
            frame.paint_layer_tree(&layers, root);
        }
        let first = first.finish();
        assert!(
            first
                .commands()
                .iter()
                .any(|c| matches!(c, DrawCommand::DrawPicture(p) if Rc::ptr_eq(p, &pic)))
        );

        let mut second = PictureRecorder::new(Rect::ZERO);
        {
            let mut frame = compositor.acquire_frame(&mut second, Some(&mut gpu));
            frame.paint_layer_tree(&layers, root);
        }
        let second = second.finish();
        let commands = second.commands();
        assert!(
            !commands
                .iter()
                .any(|c| matches!(c, DrawCommand::DrawPicture(_))),
            "cached image replaces the replay"
        );
        let drawn = commands.iter().find_map(|c| match c {
            DrawCommand::DrawImage(image, origin) => Some((image.physical_size(), *origin)),
            _ => None,
        });
        assert_eq!(drawn, Some((PhysicalSize::new(10, 10), Point::ORIGIN)));
        assert_eq!(compositor.rasterizer().fills(), 1);
        assert_eq!(log.borrow().allocated, [PhysicalSize::new(10, 10)]);
    }

    #[test]
    fn device_scale_sizes_the_texture() {
        let (mut compositor, _now) = compositor();
        let (mut gpu, log) = FakeGpu::new();
        let (layers, root, _pic) = single_picture_tree();

        for _ in 0..2 {
            let mut canvas = PictureRecorder::new(Rect::ZERO);
            canvas.scale(2.0, 2.0);
            let mut frame = compositor.acquire_frame(&mut canvas, Some(&mut gpu));
            frame.paint_layer_tree(&layers, root);
        }
        assert_eq!(log.borrow().allocated, [PhysicalSize::new(20, 20)]);
    }

    #[test]
    fn removed_picture_layers_are_evicted() {
        let (mut compositor, _now) = compositor();
        let (mut gpu, log) = FakeGpu::new();
        let (layers, root, _pic) = single_picture_tree();
        let mut canvas = PictureRecorder::new(Rect::ZERO);

        for _ in 0..2 {
            let mut frame = compositor.acquire_frame(&mut canvas, Some(&mut gpu));
            frame.paint_layer_tree(&layers, root);
        }
        assert_eq!(compositor.rasterizer().len(), 1);

        for _ in 0..2 {
            drop(compositor.acquire_frame(&mut canvas, Some(&mut gpu)));
        }
        assert!(compositor.rasterizer().is_empty());
        assert_eq!(compositor.rasterizer().evictions(), 1);
        assert_eq!(log.borrow().released.len(), 1);
    }

    #[test]
    fn effect_layers_become_canvas_state() {
        let (mut compositor, _now) = compositor();
        let mut layers = LayerTree::new();
        let root = layers.create_layer(LayerKind::Container);
        let bounds = Rect::new(0.0, 0.0, 50.0, 50.0);
        let opacity = layers.create_layer(LayerKind::Opacity(128));
        layers.set_bounds(opacity, bounds);
        layers.append(root, opacity);
        let clip = layers.create_layer(LayerKind::Clip(ClipShape::Rect(bounds)));
        layers.append(opacity, clip);
        let transform = layers.create_layer(LayerKind::Transform(Affine::scale(3.0)));
        layers.append(clip, transform);
        let leaf = layers.create_layer(LayerKind::Picture(picture(bounds)));
        layers.append(transform, leaf);

        let mut canvas = PictureRecorder::new(Rect::ZERO);
        {
            let mut frame = compositor.acquire_frame(&mut canvas, None);
            frame.paint_layer_tree(&layers, root);
            assert_eq!(frame.canvas().transform(), Affine::IDENTITY, "balanced");
        }
        let picture = canvas.finish();
        let commands = picture.commands();

        assert!(commands.iter().any(|c| matches!(
            c,
            DrawCommand::SaveLayer { bounds: Some(b), effect } if *b == bounds && *effect == LayerEffect::alpha(128)
        )));
        assert!(
            commands
                .iter()
                .any(|c| matches!(c, DrawCommand::ClipRect(r) if *r == bounds))
        );
        assert!(
            commands
                .iter()
                .any(|c| matches!(c, DrawCommand::Concat(a) if *a == Affine::scale(3.0)))
        );
        let saves = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Save | DrawCommand::SaveLayer { .. }))
            .count();
        let restores = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Restore))
            .count();
        assert_eq!(saves, restores);
    }

    #[derive(Default)]
    struct StatsSink {
        phases: Vec<(PhaseKind, HostTime)>,
        stats: Vec<RasterStatsEvent>,
    }

    impl TraceSink for StatsSink {
        fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
            self.phases.push((e.phase, e.timestamp));
        }

        fn on_phase_end(&mut self, e: &PhaseEndEvent) {
            self.phases.push((e.phase, e.timestamp));
        }

        fn on_raster_stats(&mut self, e: &RasterStatsEvent) {
            self.stats.push(*e);
        }
    }

    #[test]
    fn finish_reports_raster_statistics() {
        let (mut compositor, now) = compositor();
        let (mut gpu, _log) = FakeGpu::new();
        let (layers, root, _pic) = single_picture_tree();
        let mut sink = StatsSink::default();
        let mut canvas = PictureRecorder::new(Rect::ZERO);

        for frame_index in 0..2 {
            now.set(frame_index * 100);
            let mut frame = compositor.acquire_frame(&mut canvas, Some(&mut gpu));
            frame.paint_layer_tree(&layers, root);
            now.set(frame_index * 100 + 40);
            frame.finish(frame_index, &mut Tracer::new(&mut sink));
        }

        assert_eq!(compositor.frame_count(), 2, "finish ends the frame once");
        assert_eq!(sink.stats.len(), 2);
        let last = sink.stats[1];
        assert_eq!((last.frame_index, last.hits, last.fills), (1, 1, 1));
        assert_eq!((last.entries, last.frame_ticks), (1, 40));
        assert_eq!(
            sink.phases[2..],
            [
                (PhaseKind::Raster, HostTime(100)),
                (PhaseKind::Raster, HostTime(140))
            ]
        );
    }
}
