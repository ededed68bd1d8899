// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colors, paints and color filters used by draw commands.

use core::fmt;

/// A 32-bit ARGB color (`0xAARRGGBB`), unpremultiplied.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque red.
    pub const RED: Self = Self(0xFFFF_0000);

    /// Builds a color from its four channels.
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Returns the alpha channel.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the shift leaves exactly eight significant bits"
    )]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Returns this color with its alpha channel replaced.
    #[must_use]
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self(self.0 & 0x00FF_FFFF | (alpha as u32) << 24)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:08x})", self.0)
    }
}

/// How a shape is filled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PaintStyle {
    /// Fill the interior.
    #[default]
    Fill,
    /// Stroke the outline with the given width.
    Stroke(f64),
}

/// Styling for a single draw command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Paint {
    /// Source color.
    pub color: Color,
    /// Fill or stroke.
    pub style: PaintStyle,
    /// Text size in logical pixels, used by text draws only.
    pub text_size: f32,
}

impl Paint {
    /// A solid fill with the given color.
    #[must_use]
    pub const fn fill(color: Color) -> Self {
        Self {
            color,
            style: PaintStyle::Fill,
            text_size: 0.0,
        }
    }

    /// A stroke with the given color and width.
    #[must_use]
    pub const fn stroke(color: Color, width: f64) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke(width),
            text_size: 0.0,
        }
    }
}

/// Blend mode for combining a source color with destination content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    SourceOver,
    /// Keep the source only where the destination is opaque.
    SourceIn,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
    /// Component-wise product of source and destination.
    Modulate,
}

/// A color filter: blends a constant color into the filtered content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorFilter {
    /// Constant color blended into the content.
    pub color: Color,
    /// Blend mode used to combine `color` with the content.
    pub mode: BlendMode,
}

/// Effect applied to an offscreen group started with
/// [`Canvas::save_layer`](super::Canvas::save_layer).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerEffect {
    /// Group opacity (255 = opaque).
    pub alpha: Option<u8>,
    /// Color filter applied when the group is composited.
    pub color_filter: Option<ColorFilter>,
}

impl LayerEffect {
    /// Group opacity only.
    #[must_use]
    pub const fn alpha(alpha: u8) -> Self {
        Self {
            alpha: Some(alpha),
            color_filter: None,
        }
    }

    /// Color filter only.
    #[must_use]
    pub const fn color_filter(filter: ColorFilter) -> Self {
        Self {
            alpha: None,
            color_filter: Some(filter),
        }
    }
}
