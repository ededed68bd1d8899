// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU-backed images.

use alloc::boxed::Box;
use core::fmt;

use kurbo::Size;

/// An integral size in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysicalSize {
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
}

impl PhysicalSize {
    /// Creates a physical size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Converts a logical size to device pixels under the given scale
    /// factors, truncating toward zero. Negative and non-finite results
    /// collapse to zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "saturating float-to-int casts are the intended rounding"
    )]
    pub fn from_logical(size: Size, scale_x: f64, scale_y: f64) -> Self {
        Self {
            width: (size.width * scale_x) as u32,
            height: (size.height * scale_y) as u32,
        }
    }

    /// Returns whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An opaque GPU texture handle assigned by the embedder.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u64);

impl fmt::Debug for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureId({})", self.0)
    }
}

/// Callback that frees a texture once the image wrapping it is dropped.
pub type ReleaseFn = Box<dyn FnOnce(TextureId)>;

/// An immutable image backed by a GPU texture.
///
/// Images are shared as `Rc<Image>`; the release callback runs exactly once,
/// when the last reference goes away.
pub struct Image {
    texture: TextureId,
    physical_size: PhysicalSize,
    logical_size: Size,
    release: Option<ReleaseFn>,
}

impl Image {
    /// Wraps a rendered texture.
    ///
    /// `logical_size` is the size the image occupies when drawn under the
    /// transform it was rasterized for.
    #[must_use]
    pub fn from_texture(
        texture: TextureId,
        physical_size: PhysicalSize,
        logical_size: Size,
        release: ReleaseFn,
    ) -> Self {
        Self {
            texture,
            physical_size,
            logical_size,
            release: Some(release),
        }
    }

    /// Returns the backing texture.
    #[must_use]
    pub const fn texture(&self) -> TextureId {
        self.texture
    }

    /// Returns the size in device pixels.
    #[must_use]
    pub const fn physical_size(&self) -> PhysicalSize {
        self.physical_size
    }

    /// Returns the size in logical pixels.
    #[must_use]
    pub const fn logical_size(&self) -> Size {
        self.logical_size
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.texture);
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("texture", &self.texture)
            .field("physical_size", &self.physical_size)
            .field("logical_size", &self.logical_size)
            .finish_non_exhaustive()
    }
}
