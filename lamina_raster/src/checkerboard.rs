// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rasterized-image highlight.

use kurbo::Rect;
use lamina_core::picture::{Canvas, Color, Paint};

const CELL: f64 = 12.0;
const FILL: Color = Color::from_argb(0x40, 0xFF, 0x00, 0xFF);
const BORDER: Color = Color::from_argb(0x80, 0xFF, 0x00, 0x00);

/// Draws a translucent checkerboard with a border over `rect`.
pub fn draw_checkerboard(canvas: &mut dyn Canvas, rect: Rect) {
    canvas.save();
    canvas.clip_rect(rect);
    let paint = Paint::fill(FILL);
    let mut y = rect.y0;
    let mut row = 0_u32;
    while y < rect.y1 {
        let mut x = rect.x0 + if row % 2 == 0 { 0.0 } else { CELL };
        while x < rect.x1 {
            canvas.draw_rect(Rect::new(x, y, x + CELL, y + CELL), &paint);
            x += 2.0 * CELL;
        }
        y += CELL;
        row += 1;
    }
    canvas.draw_rect(rect, &Paint::stroke(BORDER, 1.0));
    canvas.restore();
}

#[cfg(test)]
mod tests {
    use lamina_core::picture::{DrawCommand, PictureRecorder};

    use super::*;

    #[test]
    fn checkerboard_alternates_rows_and_stays_clipped() {
        let rect = Rect::new(0.0, 0.0, 48.0, 24.0);
        let mut canvas = PictureRecorder::new(rect);
        draw_checkerboard(&mut canvas, rect);
        let picture = canvas.finish();
        let commands = picture.commands();

        assert!(matches!(commands[0], DrawCommand::Save));
        assert!(matches!(commands[1], DrawCommand::ClipRect(r) if r == rect));
        let cells: usize = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawRect(_, p) if p.color == FILL))
            .count();
        assert_eq!(cells, 4, "two rows of two cells");
        assert!(matches!(commands[2], DrawCommand::DrawRect(r, _) if r.x0 == 0.0));
        assert!(matches!(commands[4], DrawCommand::DrawRect(r, _) if r.x0 == CELL));
        assert!(matches!(commands.last(), Some(DrawCommand::Restore)));
    }
}
