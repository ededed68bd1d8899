// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing surface contract.

use alloc::rc::Rc;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Vec2};

use super::image::Image;
use super::paint::{LayerEffect, Paint};
use super::Picture;

/// A 2D drawing surface with a save/restore state stack.
///
/// Lamina never rasterizes on its own: output canvases and offscreen render
/// targets are provided by the embedder's 2D library. The
/// [`PictureRecorder`](super::PictureRecorder) implements this trait by
/// recording every call into a [`Picture`].
pub trait Canvas {
    /// Pushes the current transform and clip.
    fn save(&mut self);

    /// Pushes the current state and starts an offscreen group that is
    /// composited with `effect` on the matching [`restore`](Self::restore).
    fn save_layer(&mut self, bounds: Option<Rect>, effect: LayerEffect);

    /// Pops the most recent [`save`](Self::save) or
    /// [`save_layer`](Self::save_layer).
    fn restore(&mut self);

    /// Returns the current total transform.
    fn transform(&self) -> Affine;

    /// Post-multiplies the current transform by `transform`.
    fn concat(&mut self, transform: Affine);

    /// Translates the current transform.
    fn translate(&mut self, offset: Vec2) {
        self.concat(Affine::translate(offset));
    }

    /// Scales the current transform.
    fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(Affine::scale_non_uniform(sx, sy));
    }

    /// Intersects the clip with a rectangle.
    fn clip_rect(&mut self, rect: Rect);

    /// Intersects the clip with a rounded rectangle.
    fn clip_rounded_rect(&mut self, rect: RoundedRect);

    /// Intersects the clip with an arbitrary path.
    fn clip_path(&mut self, path: &BezPath);

    /// Draws a rectangle.
    fn draw_rect(&mut self, rect: Rect, paint: &Paint);

    /// Draws a rounded rectangle.
    fn draw_rounded_rect(&mut self, rect: RoundedRect, paint: &Paint);

    /// Draws a path.
    fn draw_path(&mut self, path: &BezPath, paint: &Paint);

    /// Draws a line segment.
    fn draw_line(&mut self, p0: Point, p1: Point, paint: &Paint);

    /// Draws a single line of text with its baseline starting at `origin`.
    ///
    /// Shaping is the surface's concern; lamina only uses this for
    /// diagnostic overlays.
    fn draw_text(&mut self, text: &str, origin: Point, paint: &Paint);

    /// Replays a recorded picture.
    fn draw_picture(&mut self, picture: &Rc<Picture>);

    /// Draws an image at its logical size with its top-left at `origin`.
    fn draw_image(&mut self, image: &Rc<Image>, origin: Point);
}
