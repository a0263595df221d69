use image::{Rgba, RgbaImage};

use crate::{is_keying, CharacterId, Color, IndexedFrame, Palette};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Truecolor output, keyed pixels are fully transparent
    RgbaWithKey,
    /// The frame indices with the composed palette attached
    Indexed,
}

/// An indexed frame sharing the pixels of the [`IndexedFrame`] it comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedView<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedFrame<'a> {
    Rgba(RgbaImage),
    Indexed(IndexedView<'a>),
}

/// Whether pixels using `index` are transparent. This look at the frame original palette, not the
/// composed one, so layers repainting a key slot don't move transparency. Black is never transparent.
pub fn is_transparent_index(frame: &IndexedFrame, index: u8, character: CharacterId) -> bool {
    let original = frame.original_palette().get(index);
    original != Color::BLACK && is_keying(original, character)
}

pub fn render_rgba(frame: &IndexedFrame, composed: &Palette, character: CharacterId) -> RgbaImage {
    let mut transparent = [false; 256];
    for (index, slot) in transparent.iter_mut().enumerate() {
        *slot = is_transparent_index(frame, index as u8, character);
    }
    let mut image = RgbaImage::new(frame.width(), frame.height());
    for (pixel, index) in image.pixels_mut().zip(frame.pixels()) {
        *pixel = if transparent[*index as usize] {
            Rgba([0, 0, 0, 0])
        } else {
            let color = composed.get(*index);
            Rgba([color.r, color.g, color.b, 255])
        };
    }
    image
}

pub fn render_indexed<'a>(frame: &'a IndexedFrame, composed: &Palette) -> IndexedView<'a> {
    IndexedView {
        width: frame.width(),
        height: frame.height(),
        pixels: frame.pixels(),
        palette: composed.clone(),
    }
}

pub fn render<'a>(
    frame: &'a IndexedFrame,
    composed: &Palette,
    character: CharacterId,
    mode: RenderMode,
) -> RenderedFrame<'a> {
    trace!(
        "rendering a {}×{} frame for {} ({:?})",
        frame.width(),
        frame.height(),
        character,
        mode
    );
    match mode {
        RenderMode::RgbaWithKey => RenderedFrame::Rgba(render_rgba(frame, composed, character)),
        RenderMode::Indexed => RenderedFrame::Indexed(render_indexed(frame, composed)),
    }
}
