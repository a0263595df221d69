use crate::{Color, PaletteError};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// Number of colors in a palette
pub const PALETTE_LEN: usize = 256;
/// Size in bytes of a palette file
pub const PALETTE_FILE_LEN: usize = PALETTE_LEN * 3;

#[derive(PartialEq, Eq, Debug, Clone)]
/// A table of 256 RGB colors, referenced by byte index. Editing a palette produce a new palette.
pub struct Palette {
    colors: [Color; PALETTE_LEN],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: [Color::BLACK; PALETTE_LEN],
        }
    }
}

impl Palette {
    pub fn new(colors: [Color; PALETTE_LEN]) -> Self {
        Self { colors }
    }

    /// Build a palette from a possibly incomplete list of colors. Missing entries are black,
    /// extra entries are dropped.
    pub fn from_colors_padded(colors: &[Color]) -> Self {
        let mut palette = Self::default();
        for (slot, color) in palette.colors.iter_mut().zip(colors) {
            *slot = *color;
        }
        palette
    }

    /// Same as [`Palette::from_colors_padded`], from a flat R, G, B byte stream (like a png PLTE chunk)
    pub fn from_rgb_bytes_padded(bytes: &[u8]) -> Self {
        let colors: Vec<Color> = bytes
            .chunks_exact(3)
            .map(|chunk| Color::new(chunk[0], chunk[1], chunk[2]))
            .collect();
        Self::from_colors_padded(&colors)
    }

    /// Parse a flat R, G, B, R, G, B... palette. The input should be exactly 768 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PaletteError> {
        if bytes.len() != PALETTE_FILE_LEN {
            return Err(PaletteError::InvalidPalette(bytes.len()));
        }
        Self::new_from_bytes(&mut &bytes[..])
    }

    /// Read the 768 bytes of a palette from the reader. Any remaining content is not consumed.
    pub fn new_from_bytes<F: Read>(file: &mut F) -> Result<Self, PaletteError> {
        let mut colors = [Color::BLACK; PALETTE_LEN];
        for color in colors.iter_mut() {
            let red = file.read_u8()?;
            let green = file.read_u8()?;
            let blue = file.read_u8()?;
            *color = Color::new(red, green, blue);
        }
        Ok(Self { colors })
    }

    /// Load a palette file. Files whose size isn't exactly 768 bytes are rejected.
    pub fn load(path: &Path) -> Result<Self, PaletteError> {
        trace!("loading the palette at {:?}", path);
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(PaletteError::MissingAsset(path.to_path_buf()))
            }
            Err(err) => return Err(err.into()),
        };
        let mut content = Vec::with_capacity(PALETTE_FILE_LEN);
        file.read_to_end(&mut content)?;
        Self::from_bytes(&content)
    }

    pub fn write<F: Write>(&self, file: &mut F) -> Result<(), PaletteError> {
        for color in &self.colors {
            file.write_u8(color.r)?;
            file.write_u8(color.g)?;
            file.write_u8(color.b)?;
        }
        Ok(())
    }

    /// The flat 768 bytes representation, index 0 first
    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|color| color.to_array()).collect()
    }

    pub fn get(&self, index: u8) -> Color {
        self.colors[index as usize]
    }

    pub fn colors(&self) -> &[Color; PALETTE_LEN] {
        &self.colors
    }

    /// Return a copy of this palette, with the color at `index` replaced
    pub fn with_color(&self, index: u8, color: Color) -> Self {
        let mut colors = self.colors;
        colors[index as usize] = color;
        Self { colors }
    }

    /// Return a copy of this palette with all the given entries replaced
    pub fn with_colors<I: IntoIterator<Item = (u8, Color)>>(&self, changes: I) -> Self {
        let mut colors = self.colors;
        for (index, color) in changes {
            colors[index as usize] = color;
        }
        Self { colors }
    }

    /// Return the first index holding the given color
    pub fn position(&self, target_color: Color) -> Option<u8> {
        self.colors
            .iter()
            .position(|color| *color == target_color)
            .map(|index| index as u8)
    }

    /// Iterate over (index, color)
    pub fn iter(&self) -> impl Iterator<Item = (u8, Color)> + '_ {
        self.colors
            .iter()
            .enumerate()
            .map(|(index, color)| (index as u8, *color))
    }
}
