//! Reduce truecolor images to 256 palette entries using median cut, without dithering.

use std::collections::HashMap;

use image::RgbaImage;

use crate::{Color, Palette, PALETTE_LEN};

/// A box of colors for median cut algorithm.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<(Color, u32)>, // Color and count
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl ColorBox {
    fn widest_channel(&self) -> Channel {
        let (mut min_r, mut max_r) = (255u8, 0u8);
        let (mut min_g, mut max_g) = (255u8, 0u8);
        let (mut min_b, mut max_b) = (255u8, 0u8);
        for (color, _) in &self.colors {
            min_r = min_r.min(color.r);
            max_r = max_r.max(color.r);
            min_g = min_g.min(color.g);
            max_g = max_g.max(color.g);
            min_b = min_b.min(color.b);
            max_b = max_b.max(color.b);
        }
        let range_r = max_r.saturating_sub(min_r);
        let range_g = max_g.saturating_sub(min_g);
        let range_b = max_b.saturating_sub(min_b);
        if range_r >= range_g && range_r >= range_b {
            Channel::Red
        } else if range_g >= range_b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    /// Split along the widest channel, at the pixel count median. Both halves are non-empty.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let channel = self.widest_channel();
        self.colors.sort_by_key(|(color, _)| match channel {
            Channel::Red => color.r,
            Channel::Green => color.g,
            Channel::Blue => color.b,
        });

        let total: u64 = self.pixel_count();
        let mut running = 0u64;
        let mut split_idx = self.colors.len() / 2;
        for (i, (_, count)) in self.colors.iter().enumerate() {
            running += *count as u64;
            if running >= total / 2 {
                split_idx = i + 1;
                break;
            }
        }
        split_idx = split_idx.max(1).min(self.colors.len() - 1);

        let right = self.colors.split_off(split_idx);
        (self, ColorBox { colors: right })
    }

    fn average_color(&self) -> Color {
        let total = self.pixel_count();
        if total == 0 {
            return Color::BLACK;
        }
        let weighted = |channel: fn(&Color) -> u8| {
            let sum: u64 = self
                .colors
                .iter()
                .map(|(color, count)| channel(color) as u64 * *count as u64)
                .sum();
            ((sum + total / 2) / total) as u8
        };
        Color::new(weighted(|c| c.r), weighted(|c| c.g), weighted(|c| c.b))
    }

    fn pixel_count(&self) -> u64 {
        self.colors.iter().map(|(_, count)| *count as u64).sum()
    }
}

/// The output of [`quantize_median_cut`]
#[derive(Debug, PartialEq, Eq)]
pub struct QuantizedImage {
    pub pixels: Vec<u8>,
    pub palette: Palette,
    /// Number of palette entries really used by opaque pixels. Following entries are pure green.
    pub used_colors: usize,
}

/// Build an indexed version of `image`. Fully transparent pixels use the first pure green slot after
/// the real colors, and every unused slot is filled with pure green.
pub fn quantize_median_cut(image: &RgbaImage) -> QuantizedImage {
    let mut counts: HashMap<Color, u32> = HashMap::new();
    let mut first_seen: Vec<Color> = Vec::new();
    let mut has_transparent = false;
    for pixel in image.pixels() {
        if pixel.0[3] == 0 {
            has_transparent = true;
            continue;
        }
        let color = Color::new(pixel.0[0], pixel.0[1], pixel.0[2]);
        let count = counts.entry(color).or_insert(0);
        if *count == 0 {
            first_seen.push(color);
        }
        *count += 1;
    }

    let max_colors = if has_transparent {
        PALETTE_LEN - 1
    } else {
        PALETTE_LEN
    };

    let mut palette_colors: Vec<Color> = Vec::new();
    let mut mapping: HashMap<Color, u8> = HashMap::new();
    if first_seen.len() <= max_colors {
        for (index, color) in first_seen.iter().enumerate() {
            mapping.insert(*color, index as u8);
            palette_colors.push(*color);
        }
    } else {
        debug!(
            "reducing {} colors to {} with median cut",
            first_seen.len(),
            max_colors
        );
        let mut boxes = vec![ColorBox {
            colors: first_seen
                .iter()
                .map(|color| (*color, counts[color]))
                .collect(),
        }];
        while boxes.len() < max_colors {
            let candidate = boxes
                .iter()
                .enumerate()
                .filter(|(_, color_box)| color_box.colors.len() > 1)
                .max_by_key(|(_, color_box)| color_box.pixel_count())
                .map(|(position, _)| position);
            let position = match candidate {
                Some(position) => position,
                None => break,
            };
            let (left, right) = boxes.swap_remove(position).split();
            boxes.push(left);
            boxes.push(right);
        }
        for (index, color_box) in boxes.iter().enumerate() {
            palette_colors.push(color_box.average_color());
            for (color, _) in &color_box.colors {
                mapping.insert(*color, index as u8);
            }
        }
    }

    let used_colors = palette_colors.len();
    palette_colors.resize(PALETTE_LEN, Color::GREEN);
    // no overflow: at most 255 colors are used when there is transparency
    let transparent_index = used_colors.min(PALETTE_LEN - 1) as u8;

    let pixels = image
        .pixels()
        .map(|pixel| {
            if pixel.0[3] == 0 {
                transparent_index
            } else {
                mapping[&Color::new(pixel.0[0], pixel.0[1], pixel.0[2])]
            }
        })
        .collect();

    QuantizedImage {
        pixels,
        palette: Palette::from_colors_padded(&palette_colors),
        used_colors,
    }
}
