//! Recolor a reference icon with the colors of an edited fashion sub-palette.

use std::{
    collections::HashMap,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{ImageFormat, Rgb, RgbImage, RgbaImage};

use crate::{allowed_range, is_keying, Category, CharacterId, Color, Palette, PaletteError};

/// An icon as drawn by the artists, with the palette its slots are described by
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceIcon {
    pub image: RgbaImage,
    pub palette: Palette,
}

impl ReferenceIcon {
    pub fn new(image: RgbaImage, palette: Palette) -> Self {
        Self { image, palette }
    }

    /// Load the icon image and its companion palette
    pub fn load(image_path: &Path, palette_path: &Path) -> Result<Self, PaletteError> {
        if !image_path.is_file() {
            return Err(PaletteError::MissingAsset(image_path.to_path_buf()));
        }
        let image = image::load_from_memory(&fs::read(image_path)?)?.into_rgba8();
        let palette = shift_icon_palette(Palette::load(palette_path)?);
        Ok(Self { image, palette })
    }

    pub fn transparent_pixel_count(&self) -> usize {
        self.image.pixels().filter(|pixel| pixel.0[3] == 0).count()
    }
}

/// Icon palettes start with their key color. Those that don't are one entry late: they are moved one
/// index further, and the freed entry 0 becomes magenta.
pub fn shift_icon_palette(palette: Palette) -> Palette {
    let first = palette.get(0);
    if first == Color::MAGENTA || first == Color::BLACK {
        return palette;
    }
    debug!("shifting an icon palette starting with {}", first.to_hex());
    let mut colors = vec![Color::MAGENTA];
    colors.extend(palette.colors().iter().take(255));
    Palette::from_colors_padded(&colors)
}

/// The color used as background of an icon: magenta if the palette use it anywhere, otherwise black if
/// present, otherwise magenta.
pub fn icon_key_color(palette: &Palette) -> Color {
    let mut has_black = false;
    for (_, color) in palette.iter() {
        if color == Color::MAGENTA {
            return Color::MAGENTA;
        }
        has_black |= color == Color::BLACK;
    }
    if has_black {
        Color::BLACK
    } else {
        Color::MAGENTA
    }
}

/// Indices of the reference palette the icon really draws with, in index order
pub fn icon_slots(palette: &Palette, key: Color) -> Vec<u8> {
    palette
        .iter()
        .filter(|(_, color)| *color != key && *color != Color::GREEN)
        .map(|(index, _)| index)
        .collect()
}

/// The usable colors of `sub_palette` for the category, brightest first. The last index of each range
/// window is never used.
pub fn collect_source_colors(
    sub_palette: &Palette,
    character: CharacterId,
    category: Category,
    key: Color,
) -> Vec<Color> {
    let range = allowed_range(character, category);
    let mut colors = Vec::new();
    for (start, end) in range.intervals() {
        let end = (*end).min(256);
        if end <= *start + 1 {
            continue;
        }
        for index in *start..end - 1 {
            let color = sub_palette.get(index as u8);
            if color == key || is_keying(color, character) {
                continue;
            }
            colors.push(color);
        }
    }
    colors.sort_by(|first, second| second.luminance().total_cmp(&first.luminance()));
    colors
}

/// Spread `colors` over `slot_count` slots: evenly spaced picks when there are too many colors,
/// proportional repetition when there are too few. Halves round away from zero, so on a tie the
/// brighter color takes the extra slot.
pub fn distribute_colors(colors: &[Color], slot_count: usize) -> Vec<Color> {
    let len = colors.len();
    if len == 0 || slot_count == 0 {
        return Vec::new();
    }
    if len == slot_count {
        return colors.to_vec();
    }
    if len > slot_count {
        if slot_count == 1 {
            return vec![colors[0]];
        }
        return (0..slot_count)
            .map(|slot| {
                let position = (slot * (len - 1)) as f64 / (slot_count - 1) as f64;
                colors[position.round() as usize]
            })
            .collect();
    }
    let mut distributed = Vec::with_capacity(slot_count);
    let bound = |i: usize| (i as f64 * slot_count as f64 / len as f64).round() as usize;
    for (i, color) in colors.iter().enumerate() {
        for _ in bound(i)..bound(i + 1) {
            distributed.push(*color);
        }
    }
    distributed
}

/// A recolored icon, ready to be saved as a 24 bits bmp
#[derive(Debug, Clone, PartialEq)]
pub struct RemappedIcon {
    pub image: RgbImage,
    pub palette: Palette,
    pub key: Color,
}

impl RemappedIcon {
    pub fn to_bmp_bytes(&self) -> Result<Vec<u8>, PaletteError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Bmp)?;
        Ok(bytes)
    }
}

/// Recolor `reference` with a snapshot of the edited sub-palette. Transparent pixels get the key color,
/// and only them.
pub fn remap_icon(
    reference: &ReferenceIcon,
    sub_palette: &Palette,
    character: CharacterId,
    category: Category,
    reversed: bool,
) -> RemappedIcon {
    let key = icon_key_color(&reference.palette);
    let slots = icon_slots(&reference.palette, key);
    let sources = collect_source_colors(sub_palette, character, category, key);
    let mut distributed = distribute_colors(&sources, slots.len());
    if distributed.is_empty() {
        // nothing to recolor with: keep the reference colors
        distributed = slots
            .iter()
            .map(|index| reference.palette.get(*index))
            .collect();
    }
    if reversed {
        distributed.reverse();
    }
    debug!(
        "remapping an icon with {} slots from {} source colors, key {}",
        slots.len(),
        sources.len(),
        key.to_hex()
    );

    let palette = reference
        .palette
        .with_colors(slots.iter().copied().zip(distributed.iter().copied()));

    // a pixel drawn with a slot color takes the color given to the first slot holding it
    let mut slot_position: HashMap<Color, usize> = HashMap::new();
    for (position, index) in slots.iter().enumerate() {
        slot_position
            .entry(reference.palette.get(*index))
            .or_insert(position);
    }
    let mut mapping: HashMap<Color, Color> = HashMap::new();
    let mut unmatched = 0;
    for pixel in reference.image.pixels() {
        let color = Color::new(pixel.0[0], pixel.0[1], pixel.0[2]);
        if pixel.0[3] == 0 || mapping.contains_key(&color) {
            continue;
        }
        let target = if distributed.is_empty() {
            Color::NEUTRAL_GRAY
        } else if let Some(position) = slot_position.get(&color) {
            distributed[*position]
        } else {
            // colors outside every slot are handed out in raster order
            let target = distributed[unmatched % distributed.len()];
            unmatched += 1;
            target
        };
        mapping.insert(color, target);
    }

    let mut image = RgbImage::new(reference.image.width(), reference.image.height());
    for (output, input) in image.pixels_mut().zip(reference.image.pixels()) {
        let color = if input.0[3] == 0 {
            key
        } else {
            mapping[&Color::new(input.0[0], input.0[1], input.0[2])]
        };
        *output = Rgb(color.to_array());
    }

    RemappedIcon {
        image,
        palette,
        key,
    }
}

/// An icon image and its palette, sharing the same file stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconPair {
    pub stem: String,
    pub image: PathBuf,
    pub palette: PathBuf,
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .map_or(false, |extension| extension.eq_ignore_ascii_case("png"))
}

/// Find the `(image, .pal)` pairs of a directory. Stems are compared case-insensitively, images are
/// `.png` or `.bmp`, the `.png` being used when both exist. The result is sorted by stem.
pub fn find_icon_pairs(directory: &Path) -> Result<Vec<IconPair>, PaletteError> {
    if !directory.is_dir() {
        return Err(PaletteError::MissingAsset(directory.to_path_buf()));
    }
    let mut images: HashMap<String, PathBuf> = HashMap::new();
    let mut palettes: HashMap<String, PathBuf> = HashMap::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        let (stem, extension) = match (path.file_stem(), path.extension()) {
            (Some(stem), Some(extension)) => (
                stem.to_string_lossy().to_lowercase(),
                extension.to_string_lossy().to_lowercase(),
            ),
            _ => continue,
        };
        match extension.as_str() {
            "pal" => {
                palettes.insert(stem, path);
            }
            "png" | "bmp" => {
                // png wins over bmp whatever the directory order
                let keep_existing = images.get(&stem).map_or(false, |existing| {
                    is_png(existing) && extension == "bmp"
                });
                if !keep_existing {
                    images.insert(stem, path);
                }
            }
            _ => (),
        }
    }
    let mut pairs: Vec<IconPair> = images
        .into_iter()
        .filter_map(|(stem, image)| {
            palettes.remove(&stem).map(|palette| IconPair {
                stem,
                image,
                palette,
            })
        })
        .collect();
    pairs.sort_by(|first, second| first.stem.cmp(&second.stem));
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use std::fs;

    use crate::{
        collect_source_colors, distribute_colors, find_icon_pairs, icon_key_color, icon_slots,
        remap_icon, shift_icon_palette, Category, CharacterId, Color, Palette, ReferenceIcon,
    };

    fn id(number: u16) -> CharacterId {
        CharacterId::new(number).unwrap()
    }

    fn grays(count: u8) -> Vec<Color> {
        (0..count).map(|value| Color::new(value * 10 + 5, 0, 0)).collect()
    }

    #[test]
    fn test_key_color() {
        let both = Palette::default().with_color(3, Color::MAGENTA);
        assert_eq!(icon_key_color(&both), Color::MAGENTA);
        assert_eq!(icon_key_color(&Palette::default()), Color::BLACK);
        assert_eq!(
            icon_key_color(&Palette::new([Color::WHITE; 256])),
            Color::MAGENTA
        );
    }

    #[test]
    fn test_slots_skip_key_and_green() {
        let palette = Palette::new([Color::MAGENTA; 256])
            .with_color(2, Color::WHITE)
            .with_color(3, Color::GREEN)
            .with_color(7, Color::BLACK);
        assert_eq!(icon_slots(&palette, Color::MAGENTA), vec![2, 7]);
    }

    #[test]
    fn test_distribute() {
        let colors = grays(8);
        assert_eq!(
            distribute_colors(&colors, 4),
            vec![colors[0], colors[2], colors[5], colors[7]]
        );
        assert_eq!(distribute_colors(&colors, 1), vec![colors[0]]);
        assert_eq!(distribute_colors(&colors, 8), colors);
        let repeated = distribute_colors(&colors[..3], 7);
        assert_eq!(repeated.len(), 7);
        assert_eq!(
            repeated,
            vec![colors[0], colors[0], colors[1], colors[1], colors[1], colors[2], colors[2]]
        );
        assert!(distribute_colors(&[], 4).is_empty());
    }

    #[test]
    fn test_source_colors() {
        // fashion_3 of 001 is [152, 168)
        let mut palette = Palette::new([Color::GREEN; 256]);
        palette = palette
            .with_color(152, Color::new(10, 10, 10))
            .with_color(153, Color::new(200, 200, 200))
            .with_color(154, Color::MAGENTA)
            .with_color(167, Color::WHITE)
            .with_color(151, Color::WHITE);
        let colors = collect_source_colors(&palette, id(1), Category::Fashion(3), Color::MAGENTA);
        assert_eq!(colors, vec![Color::new(200, 200, 200), Color::new(10, 10, 10)]);
    }

    #[test]
    fn test_shift() {
        let palette = Palette::default()
            .with_color(0, Color::WHITE)
            .with_color(255, Color::new(1, 1, 1));
        let shifted = shift_icon_palette(palette);
        assert_eq!(shifted.get(0), Color::MAGENTA);
        assert_eq!(shifted.get(1), Color::WHITE);
        let kept = Palette::default().with_color(1, Color::WHITE);
        assert_eq!(shift_icon_palette(kept.clone()), kept);
    }

    #[test]
    fn test_remap_keeps_transparency() {
        let reference_palette = Palette::new([Color::GREEN; 256])
            .with_color(0, Color::MAGENTA)
            .with_color(1, Color::new(50, 50, 50))
            .with_color(2, Color::new(60, 60, 60));
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(0, 0, Rgba([50, 50, 50, 255]));
        image.put_pixel(1, 0, Rgba([60, 60, 60, 255]));
        image.put_pixel(2, 0, Rgba([255, 0, 255, 0]));
        image.put_pixel(0, 1, Rgba([0, 0, 0, 0]));
        // an opaque pixel painted with the key color is not transparent
        image.put_pixel(1, 1, Rgba([255, 0, 255, 255]));
        image.put_pixel(2, 1, Rgba([50, 50, 50, 255]));
        let reference = ReferenceIcon::new(image, reference_palette.clone());

        let sub_palette = Palette::new([Color::new(100, 0, 0); 256])
            .with_color(160, Color::new(0, 0, 200));
        let remapped = remap_icon(&reference, &sub_palette, id(1), Category::Fashion(3), false);
        assert_eq!(remapped.key, Color::MAGENTA);
        let key_pixels = remapped
            .image
            .pixels()
            .filter(|pixel| pixel.0 == Color::MAGENTA.to_array())
            .count();
        assert_eq!(key_pixels, reference.transparent_pixel_count());
        assert_eq!(remapped.palette.get(0), Color::MAGENTA);
        assert_eq!(remapped.palette.get(200), Color::GREEN);
        assert_eq!(remapped.image.get_pixel(0, 0).0, remapped.image.get_pixel(2, 1).0);
        assert!(remapped.to_bmp_bytes().unwrap().starts_with(b"BM"));
    }

    #[test]
    fn test_find_pairs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Hat.PNG", "hat.pal", "shoe.bmp", "lonely.pal", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let pairs = find_icon_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].stem, "hat");
        assert!(pairs[0].image.ends_with("Hat.PNG"));
    }

    #[test]
    fn test_find_pairs_prefers_png() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.bmp", "a.png", "a.pal", "b.png", "b.BMP", "b.pal", "c.bmp", "c.pal"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let pairs = find_icon_pairs(dir.path()).unwrap();
        let images: Vec<_> = pairs
            .iter()
            .map(|pair| pair.image.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(images, vec!["a.png", "b.png", "c.bmp"]);
    }

    #[test]
    fn test_distribute_ties() {
        let colors = grays(2);
        assert_eq!(
            distribute_colors(&colors, 5),
            vec![colors[0], colors[0], colors[0], colors[1], colors[1]]
        );
        // 3 picks over 5 colors: positions 0, 2 and 4
        let colors = grays(5);
        assert_eq!(
            distribute_colors(&colors, 3),
            vec![colors[0], colors[2], colors[4]]
        );
    }

    #[test]
    fn test_remap_follows_slot_position() {
        let reference_palette = Palette::new([Color::GREEN; 256])
            .with_color(0, Color::MAGENTA)
            .with_color(1, Color::new(10, 10, 10))
            .with_color(2, Color::new(20, 20, 20))
            .with_color(3, Color::new(30, 30, 30));
        // only the last slot color and a color outside every slot are drawn
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([30, 30, 30, 255]));
        image.put_pixel(1, 0, Rgba([99, 99, 99, 255]));
        let reference = ReferenceIcon::new(image, reference_palette);

        // fashion_3 of 001 is [152, 168)
        let sub_palette = Palette::new([Color::GREEN; 256])
            .with_color(152, Color::new(200, 200, 200))
            .with_color(153, Color::new(150, 150, 150))
            .with_color(154, Color::new(100, 100, 100));
        let remapped = remap_icon(&reference, &sub_palette, id(1), Category::Fashion(3), false);
        assert_eq!(remapped.palette.get(3), Color::new(100, 100, 100));
        assert_eq!(
            remapped.image.get_pixel(0, 0).0,
            remapped.palette.get(3).to_array()
        );
        assert_eq!(remapped.image.get_pixel(1, 0).0, [200, 200, 200]);
    }
}
