// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-picture GPU image cache.
//!
//! Entries are keyed by picture identity and physical size and carry an
//! access count that is bumped by each lookup and decremented by each
//! [`purge`](PictureRasterizer::purge). A picture is only rasterized the
//! second frame in a row it is requested, so content that changes every
//! frame never pays for an offscreen texture. An entry that goes a full
//! frame without a lookup is evicted, dropping its image and (once no layer
//! still draws it) releasing the texture.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;

use kurbo::{Affine, Size, Vec2};
use lamina_core::picture::{Image, PhysicalSize, Picture, PictureId};

use crate::checkerboard::draw_checkerboard;
use crate::gpu::GpuContext;

/// Access count of an entry that has not been requested since it was
/// created, or that has gone a whole frame without a request.
const DEAD_ACCESS_COUNT: i32 = -1;

/// Identifies a rasterized picture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    /// Identity of the recorded picture.
    pub picture: PictureId,
    /// Size of the rasterized image in device pixels.
    pub size: PhysicalSize,
}

#[derive(Debug)]
struct Entry {
    access_count: i32,
    image: Option<Rc<Image>>,
}

impl Entry {
    const fn dead() -> Self {
        Self {
            access_count: DEAD_ACCESS_COUNT,
            image: None,
        }
    }
}

/// Caches GPU images of pictures that stay on screen across frames.
#[derive(Debug, Default)]
pub struct PictureRasterizer {
    cache: BTreeMap<CacheKey, Entry>,
    hits: u64,
    fills: u64,
    evictions: u64,
}

impl PictureRasterizer {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached image of `picture` at `size`, rasterizing it if
    /// this is at least the second consecutive frame it was requested.
    ///
    /// Returns `None` when the caller should replay the picture directly:
    /// on the first request, when `size` is empty, without a GPU context,
    /// or when texture allocation fails.
    ///
    /// Must be called at most once per key between two calls to
    /// [`purge`](Self::purge); debug builds panic otherwise.
    pub fn get_cached_image(
        &mut self,
        picture: &Rc<Picture>,
        size: PhysicalSize,
        ctm: Affine,
        gpu: Option<&mut (dyn GpuContext + '_)>,
        highlight: bool,
    ) -> Option<Rc<Image>> {
        if size.is_empty() {
            return None;
        }
        let gpu = gpu?;

        let key = CacheKey {
            picture: picture.id(),
            size,
        };
        let entry = self.cache.entry(key).or_insert_with(Entry::dead);

        if entry.access_count == DEAD_ACCESS_COUNT {
            entry.access_count = 1;
            return None;
        }

        entry.access_count += 1;
        debug_assert!(
            entry.access_count == 1,
            "{key:?} was looked up twice in one frame (forgot to purge between frames?)"
        );

        if entry.image.is_none() {
            entry.image = rasterize(picture, size, ctm, gpu, highlight).map(Rc::new);
            if entry.image.is_some() {
                self.fills += 1;
            }
        }

        let image = entry.image.clone();
        if image.is_some() {
            self.hits += 1;
        }
        image
    }

    /// Ends a frame: ages every entry and evicts those that were not
    /// requested since the previous purge.
    pub fn purge(&mut self) {
        let before = self.cache.len();
        self.cache.retain(|_, entry| {
            entry.access_count -= 1;
            entry.access_count != DEAD_ACCESS_COUNT
        });
        let evicted = before - self.cache.len();
        if evicted > 0 {
            log::trace!("evicted {evicted} rasterized pictures");
        }
        self.evictions += evicted as u64;
    }

    /// Lookups answered with an image, since creation.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Images rasterized, since creation.
    #[must_use]
    pub const fn fills(&self) -> u64 {
        self.fills
    }

    /// Entries evicted, since creation.
    #[must_use]
    pub const fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns whether an image is cached for `key`.
    #[must_use]
    pub fn contains_image(&self, key: &CacheKey) -> bool {
        self.cache.get(key).is_some_and(|e| e.image.is_some())
    }
}

/// Returns the horizontal and vertical scale a transform applies, as the
/// lengths of its basis vectors.
#[must_use]
pub fn scale_factors(ctm: Affine) -> (f64, f64) {
    let [a, b, c, d, _, _] = ctm.as_coeffs();
    (Vec2::new(a, b).hypot(), Vec2::new(c, d).hypot())
}

fn rasterize(
    picture: &Picture,
    size: PhysicalSize,
    ctm: Affine,
    gpu: &mut dyn GpuContext,
    highlight: bool,
) -> Option<Image> {
    let Some(mut target) = gpu.create_render_target(size) else {
        log::debug!(
            "no {}x{} texture for {:?}; replaying it directly",
            size.width,
            size.height,
            picture.id()
        );
        return None;
    };

    let (sx, sy) = scale_factors(ctm);
    let cull = picture.cull_rect();
    let canvas = target.canvas();
    canvas.scale(sx, sy);
    canvas.translate(-cull.origin().to_vec2());
    picture.playback(canvas);
    if highlight {
        draw_checkerboard(canvas, cull);
    }

    let (texture, release) = target.finish();
    let logical = Size::new(f64::from(size.width) / sx, f64::from(size.height) / sy);
    Some(Image::from_texture(texture, size, logical, release))
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use kurbo::Rect;
    use lamina_core::picture::{Canvas, Color, DrawCommand, Paint, PictureRecorder, TextureId};

    use super::*;
    use crate::testing::FakeGpu;

    fn picture(rect: Rect) -> Rc<Picture> {
        let mut rec = PictureRecorder::new(rect);
        rec.draw_rect(rect, &Paint::fill(Color::BLACK));
        rec.finish()
    }

    #[test]
    fn first_request_misses_and_second_frame_fills() {
        let (mut gpu, log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 10.0, 10.0));
        let size = PhysicalSize::new(10, 10);

        let first = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
        assert!(first.is_none(), "first request is never rasterized");
        assert_eq!(raster.len(), 1);
        raster.purge();

        let second = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
        let second = second.expect("second frame fills");
        assert_eq!((raster.fills(), raster.hits()), (1, 1));
        raster.purge();

        let third = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
        let third = third.expect("third frame hits");
        assert!(Rc::ptr_eq(&second, &third), "same image is reused");
        assert_eq!((raster.fills(), raster.hits()), (1, 2));
        assert_eq!(log.borrow().allocated.len(), 1, "rasterized once");
    }

    #[test]
    fn unrequested_entries_are_evicted_after_two_purges() {
        let (mut gpu, log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 4.0, 4.0));
        let size = PhysicalSize::new(4, 4);

        let _ = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
        raster.purge();
        let image = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
        assert!(image.is_some(), "filled");
        drop(image);

        raster.purge();
        assert_eq!(raster.len(), 1, "the requesting frame keeps it");
        assert_eq!(raster.evictions(), 0);
        assert!(log.borrow().released.is_empty());

        raster.purge();
        assert!(raster.is_empty());
        assert_eq!(raster.evictions(), 1);
        assert_eq!(log.borrow().released, [TextureId(1)]);
    }

    #[test]
    fn never_filled_entries_are_evicted_too() {
        let (mut gpu, _log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 4.0, 4.0));

        let _ = raster.get_cached_image(
            &pic,
            PhysicalSize::new(4, 4),
            Affine::IDENTITY,
            Some(&mut gpu),
            false,
        );
        raster.purge();
        raster.purge();
        assert!(raster.is_empty());
        assert_eq!(raster.evictions(), 1);
    }

    #[test]
    fn allocation_failure_replays_without_counting() {
        let (mut gpu, log) = FakeGpu::failing();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 8.0, 8.0));
        let size = PhysicalSize::new(8, 8);

        for _ in 0..2 {
            let image = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
            assert!(image.is_none());
            raster.purge();
        }
        assert_eq!((raster.hits(), raster.fills()), (0, 0));
        assert!(log.borrow().allocated.is_empty());
        assert!(!raster.contains_image(&CacheKey {
            picture: pic.id(),
            size
        }));
    }

    #[test]
    fn empty_size_or_missing_gpu_leaves_cache_untouched() {
        let (mut gpu, _log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 8.0, 8.0));

        let empty = PhysicalSize::new(0, 8);
        assert!(
            raster
                .get_cached_image(&pic, empty, Affine::IDENTITY, Some(&mut gpu), false)
                .is_none()
        );
        let size = PhysicalSize::new(8, 8);
        assert!(
            raster
                .get_cached_image(&pic, size, Affine::IDENTITY, None, false)
                .is_none()
        );
        assert!(raster.is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "forgot to purge between frames?")]
    fn double_lookup_in_one_frame_panics() {
        let (mut gpu, _log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 8.0, 8.0));
        let size = PhysicalSize::new(8, 8);
        let _ = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
        let _ = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
    }

    #[test]
    fn distinct_sizes_are_distinct_entries() {
        let (mut gpu, _log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 8.0, 8.0));
        let _ = raster.get_cached_image(
            &pic,
            PhysicalSize::new(8, 8),
            Affine::IDENTITY,
            Some(&mut gpu),
            false,
        );
        let _ = raster.get_cached_image(
            &pic,
            PhysicalSize::new(16, 16),
            Affine::scale(2.0),
            Some(&mut gpu),
            false,
        );
        assert_eq!(raster.len(), 2);
    }

    #[test]
    fn scale_factors_ignore_rotation() {
        assert_eq!(
            scale_factors(Affine::scale_non_uniform(2.0, 3.0)),
            (2.0, 3.0)
        );
        let (sx, sy) = scale_factors(Affine::rotate(FRAC_PI_2) * Affine::scale(2.0));
        assert!((sx - 2.0).abs() < 1e-9, "sx = {sx}");
        assert!((sy - 2.0).abs() < 1e-9, "sy = {sy}");
    }

    #[test]
    fn fill_scales_the_target_and_reports_logical_size() {
        let (mut gpu, log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(0.0, 0.0, 10.0, 5.0));
        let size = PhysicalSize::new(20, 10);
        let ctm = Affine::scale(2.0);

        let _ = raster.get_cached_image(&pic, size, ctm, Some(&mut gpu), false);
        raster.purge();
        let image = raster
            .get_cached_image(&pic, size, ctm, Some(&mut gpu), false)
            .expect("filled");

        assert_eq!(image.physical_size(), size);
        assert_eq!(image.logical_size(), Size::new(10.0, 5.0));
        let log = log.borrow();
        assert_eq!(log.allocated, [size]);
        let commands = log.rasterized[0].commands();
        assert!(matches!(commands[0], DrawCommand::Concat(a) if a == ctm));
        assert!(matches!(commands[2], DrawCommand::DrawRect(..)));
        assert_eq!(commands.len(), 3, "no highlight");
    }

    #[test]
    fn highlight_overlays_a_checkerboard() {
        let (mut gpu, log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let rect = Rect::new(0.0, 0.0, 24.0, 24.0);
        let pic = picture(rect);
        let size = PhysicalSize::new(24, 24);

        let _ = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), true);
        raster.purge();
        let _ = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), true);

        let log = log.borrow();
        let commands = log.rasterized[0].commands();
        assert!(
            commands
                .iter()
                .any(|c| matches!(c, DrawCommand::ClipRect(r) if *r == rect)),
            "checkerboard is clipped to the picture"
        );
    }

    #[test]
    fn offset_cull_rect_is_moved_to_the_texture_origin() {
        let (mut gpu, log) = FakeGpu::new();
        let mut raster = PictureRasterizer::new();
        let pic = picture(Rect::new(5.0, 7.0, 15.0, 17.0));
        let size = PhysicalSize::new(10, 10);

        let _ = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);
        raster.purge();
        let _ = raster.get_cached_image(&pic, size, Affine::IDENTITY, Some(&mut gpu), false);

        let log = log.borrow();
        let mut replay = PictureRecorder::new(Rect::ZERO);
        for command in &log.rasterized[0].commands()[..2] {
            if let DrawCommand::Concat(a) = command {
                replay.concat(*a);
            }
        }
        assert_eq!(replay.transform(), Affine::translate((-5.0, -7.0)));
    }
}
