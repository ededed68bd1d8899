// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded drawing commands.
//!
//! A [`Picture`] is an immutable, replayable list of [`DrawCommand`]s with a
//! process-unique [`PictureId`]. Pictures are produced by a
//! [`PictureRecorder`], which implements [`Canvas`] by appending to its
//! command list, and are shared as `Rc<Picture>` between picture layers and
//! the rasterization cache.
//!
//! The identity is what the rasterization cache keys on: two pictures with
//! identical commands are still distinct entries, and a picture never
//! changes after [`PictureRecorder::finish`].

mod canvas;
mod image;
mod paint;

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};

pub use canvas::Canvas;
pub use image::{Image, PhysicalSize, ReleaseFn, TextureId};
pub use paint::{BlendMode, Color, ColorFilter, LayerEffect, Paint, PaintStyle};

static NEXT_PICTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a recorded [`Picture`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PictureId(pub u64);

impl PictureId {
    fn next() -> Self {
        Self(NEXT_PICTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PictureId({})", self.0)
    }
}

/// A single recorded canvas call.
#[derive(Clone, Debug)]
pub enum DrawCommand {
    /// [`Canvas::save`].
    Save,
    /// [`Canvas::save_layer`].
    SaveLayer {
        /// Optional bounds hint for the offscreen group.
        bounds: Option<Rect>,
        /// Effect applied when the group is composited.
        effect: LayerEffect,
    },
    /// [`Canvas::restore`].
    Restore,
    /// [`Canvas::concat`].
    Concat(Affine),
    /// [`Canvas::clip_rect`].
    ClipRect(Rect),
    /// [`Canvas::clip_rounded_rect`].
    ClipRoundedRect(RoundedRect),
    /// [`Canvas::clip_path`].
    ClipPath(BezPath),
    /// [`Canvas::draw_rect`].
    DrawRect(Rect, Paint),
    /// [`Canvas::draw_rounded_rect`].
    DrawRoundedRect(RoundedRect, Paint),
    /// [`Canvas::draw_path`].
    DrawPath(BezPath, Paint),
    /// [`Canvas::draw_line`].
    DrawLine(Point, Point, Paint),
    /// [`Canvas::draw_text`].
    DrawText(String, Point, Paint),
    /// [`Canvas::draw_picture`].
    DrawPicture(Rc<Picture>),
    /// [`Canvas::draw_image`].
    DrawImage(Rc<Image>, Point),
}

/// An immutable recorded sequence of drawing commands.
#[derive(Debug)]
pub struct Picture {
    id: PictureId,
    cull_rect: Rect,
    commands: Vec<DrawCommand>,
}

impl Picture {
    /// Returns the picture's identity.
    #[must_use]
    pub const fn id(&self) -> PictureId {
        self.id
    }

    /// Returns the rectangle the picture was recorded against.
    #[must_use]
    pub const fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    /// Returns the recorded commands.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Replays every command onto `canvas`.
    pub fn playback(&self, canvas: &mut dyn Canvas) {
        for command in &self.commands {
            match command {
                DrawCommand::Save => canvas.save(),
                DrawCommand::SaveLayer { bounds, effect } => canvas.save_layer(*bounds, *effect),
                DrawCommand::Restore => canvas.restore(),
                DrawCommand::Concat(transform) => canvas.concat(*transform),
                DrawCommand::ClipRect(rect) => canvas.clip_rect(*rect),
                DrawCommand::ClipRoundedRect(rect) => canvas.clip_rounded_rect(*rect),
                DrawCommand::ClipPath(path) => canvas.clip_path(path),
                DrawCommand::DrawRect(rect, paint) => canvas.draw_rect(*rect, paint),
                DrawCommand::DrawRoundedRect(rect, paint) => canvas.draw_rounded_rect(*rect, paint),
                DrawCommand::DrawPath(path, paint) => canvas.draw_path(path, paint),
                DrawCommand::DrawLine(p0, p1, paint) => canvas.draw_line(*p0, *p1, paint),
                DrawCommand::DrawText(text, origin, paint) => canvas.draw_text(text, *origin, paint),
                DrawCommand::DrawPicture(picture) => canvas.draw_picture(picture),
                DrawCommand::DrawImage(image, origin) => canvas.draw_image(image, *origin),
            }
        }
    }
}

/// Records canvas calls into a [`Picture`].
#[derive(Debug)]
pub struct PictureRecorder {
    cull_rect: Rect,
    commands: Vec<DrawCommand>,
    transform: Affine,
    saved: Vec<Affine>,
}

impl PictureRecorder {
    /// Starts a recording bounded by `cull_rect`.
    #[must_use]
    pub fn new(cull_rect: Rect) -> Self {
        Self {
            cull_rect,
            commands: Vec::new(),
            transform: Affine::IDENTITY,
            saved: Vec::new(),
        }
    }

    /// Returns the recording bounds.
    #[must_use]
    pub const fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    /// Returns whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Ends the recording. Unbalanced saves are closed.
    #[must_use]
    pub fn finish(mut self) -> Rc<Picture> {
        for _ in 0..self.saved.len() {
            self.commands.push(DrawCommand::Restore);
        }
        Rc::new(Picture {
            id: PictureId::next(),
            cull_rect: self.cull_rect,
            commands: self.commands,
        })
    }

    fn push_state(&mut self) {
        self.saved.push(self.transform);
    }
}

impl Canvas for PictureRecorder {
    fn save(&mut self) {
        self.push_state();
        self.commands.push(DrawCommand::Save);
    }

    fn save_layer(&mut self, bounds: Option<Rect>, effect: LayerEffect) {
        self.push_state();
        self.commands.push(DrawCommand::SaveLayer { bounds, effect });
    }

    fn restore(&mut self) {
        // Skia ignores a restore with nothing saved; so do we.
        if let Some(transform) = self.saved.pop() {
            self.transform = transform;
            self.commands.push(DrawCommand::Restore);
        }
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn concat(&mut self, transform: Affine) {
        self.transform *= transform;
        self.commands.push(DrawCommand::Concat(transform));
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::ClipRect(rect));
    }

    fn clip_rounded_rect(&mut self, rect: RoundedRect) {
        self.commands.push(DrawCommand::ClipRoundedRect(rect));
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.commands.push(DrawCommand::ClipPath(path.clone()));
    }

    fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::DrawRect(rect, *paint));
    }

    fn draw_rounded_rect(&mut self, rect: RoundedRect, paint: &Paint) {
        self.commands.push(DrawCommand::DrawRoundedRect(rect, *paint));
    }

    fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        self.commands.push(DrawCommand::DrawPath(path.clone(), *paint));
    }

    fn draw_line(&mut self, p0: Point, p1: Point, paint: &Paint) {
        self.commands.push(DrawCommand::DrawLine(p0, p1, *paint));
    }

    fn draw_text(&mut self, text: &str, origin: Point, paint: &Paint) {
        self.commands
            .push(DrawCommand::DrawText(String::from(text), origin, *paint));
    }

    fn draw_picture(&mut self, picture: &Rc<Picture>) {
        self.commands.push(DrawCommand::DrawPicture(picture.clone()));
    }

    fn draw_image(&mut self, image: &Rc<Image>, origin: Point) {
        self.commands.push(DrawCommand::DrawImage(image.clone(), origin));
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use super::*;

    #[test]
    fn recorded_pictures_get_distinct_ids() {
        let a = PictureRecorder::new(Rect::ZERO).finish();
        let b = PictureRecorder::new(Rect::ZERO).finish();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn picture_ids_do_not_wrap_at_u32() {
        // Only ever raised, so concurrently recorded pictures stay unique.
        NEXT_PICTURE_ID.fetch_max(u64::from(u32::MAX), Ordering::Relaxed);
        let a = PictureRecorder::new(Rect::ZERO).finish();
        let b = PictureRecorder::new(Rect::ZERO).finish();
        assert!(a.id().0 >= u64::from(u32::MAX), "got {:?}", a.id());
        assert!(b.id().0 > u64::from(u32::MAX), "got {:?}", b.id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn recorder_tracks_transform_across_save_restore() {
        let mut rec = PictureRecorder::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        rec.save();
        rec.translate(Vec2::new(3.0, 4.0));
        assert_eq!(rec.transform(), Affine::translate((3.0, 4.0)));
        rec.restore();
        assert_eq!(rec.transform(), Affine::IDENTITY);
        // A stray restore is dropped.
        rec.restore();
        assert_eq!(rec.finish().commands().len(), 3);
    }

    #[test]
    fn finish_closes_unbalanced_saves() {
        let mut rec = PictureRecorder::new(Rect::ZERO);
        rec.save();
        rec.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &Paint::fill(Color::RED));
        let picture = rec.finish();
        assert!(matches!(
            picture.commands().last(),
            Some(DrawCommand::Restore)
        ));
    }

    #[test]
    fn playback_reproduces_commands() {
        let mut rec = PictureRecorder::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        rec.draw_rect(Rect::new(1.0, 1.0, 2.0, 2.0), &Paint::fill(Color::BLACK));
        rec.draw_line(Point::ORIGIN, Point::new(5.0, 5.0), &Paint::stroke(Color::RED, 1.0));
        let picture = rec.finish();

        let mut replay = PictureRecorder::new(picture.cull_rect());
        picture.playback(&mut replay);
        assert_eq!(replay.finish().commands().len(), picture.commands().len());
    }
}
