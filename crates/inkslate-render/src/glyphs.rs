//! Font-free text placeholders.
//!
//! Each visible character becomes a solid block on the text's advance grid.
//! The vello scene always draws text this way; the raster surface does when
//! the host has no usable font.

use inkslate_core::shapes::ADVANCE_RATIO;
use kurbo::{Point, Rect};

/// Blocks standing in for the glyphs of one line of text.
pub(crate) fn glyph_blocks(text: &str, origin: Point, size: f64) -> Vec<Rect> {
    let advance = size * ADVANCE_RATIO;
    text.chars()
        .enumerate()
        .filter(|(_, ch)| !ch.is_whitespace())
        .map(|(i, _)| {
            let x = origin.x + i as f64 * advance;
            Rect::new(
                x + advance * 0.1,
                origin.y + size * 0.2,
                x + advance * 0.9,
                origin.y + size * 0.9,
            )
        })
        .collect()
}
