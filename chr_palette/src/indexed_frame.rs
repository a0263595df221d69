use std::{fs, io::Cursor, path::Path};

use image::ImageFormat;

use crate::{is_indexed_bmp, quantize_median_cut, read_indexed_bmp, Palette, PaletteError};

/// A paletted image, with each pixel being an 8bits index into its original palette.
///
/// Frames are read-only after load, and it is guaranteed that width*height == pixels.len()
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    original_palette: Palette,
}

impl IndexedFrame {
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        original_palette: Palette,
    ) -> Result<Self, PaletteError> {
        if width as usize * height as usize != pixels.len() {
            return Err(PaletteError::InvalidFrameResolution(
                width,
                height,
                pixels.len(),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
            original_palette,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The palette as stored in the source file
    pub fn original_palette(&self) -> &Palette {
        &self.original_palette
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Decode a frame file. Indexed png and 8-bit bmp keep their indices and palette, other images are
    /// quantized with median cut.
    pub fn decode(bytes: &[u8]) -> Result<Self, PaletteError> {
        let format = image::guess_format(bytes)
            .map_err(|err| PaletteError::UnsupportedFrameMode(err.to_string()))?;
        match format {
            ImageFormat::Png => {
                if let Some(frame) = Self::decode_indexed_png(bytes)? {
                    return Ok(frame);
                }
            }
            ImageFormat::Bmp if is_indexed_bmp(bytes) => {
                let bmp = read_indexed_bmp(&mut Cursor::new(bytes))?;
                return Self::new(bmp.width, bmp.height, bmp.pixels, bmp.palette);
            }
            _ => (),
        };
        Self::decode_truecolor(bytes, format)
    }

    pub fn load(path: &Path) -> Result<Self, PaletteError> {
        trace!("loading the frame at {:?}", path);
        if !path.is_file() {
            return Err(PaletteError::MissingAsset(path.to_path_buf()));
        }
        Self::decode(&fs::read(path)?)
    }

    /// Return [`None`] if the png is valid but not paletted
    fn decode_indexed_png(bytes: &[u8]) -> Result<Option<Self>, PaletteError> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::IDENTITY);
        let mut reader = decoder.read_info()?;
        if reader.info().color_type != png::ColorType::Indexed {
            return Ok(None);
        }
        let palette = match &reader.info().palette {
            Some(palette) => Palette::from_rgb_bytes_padded(palette),
            None => {
                return Err(PaletteError::UnsupportedFrameMode(
                    "an indexed png without palette".to_string(),
                ))
            }
        };
        let mut buffer = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buffer)?;
        let pixels = unpack_indices(
            &buffer[..info.buffer_size()],
            info.width,
            info.height,
            info.line_size,
            info.bit_depth as u8,
        );
        Self::new(info.width, info.height, pixels, palette).map(Some)
    }

    fn decode_truecolor(bytes: &[u8], format: ImageFormat) -> Result<Self, PaletteError> {
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|err| PaletteError::UnsupportedFrameMode(err.to_string()))?
            .into_rgba8();
        debug!(
            "quantizing a truecolor frame of {}×{}",
            image.width(),
            image.height()
        );
        let quantized = quantize_median_cut(&image);
        Self::new(
            image.width(),
            image.height(),
            quantized.pixels,
            quantized.palette,
        )
    }
}

/// Expand rows of 1, 2, 4 or 8 bits indices to one byte per pixel
fn unpack_indices(
    buffer: &[u8],
    width: u32,
    height: u32,
    line_size: usize,
    bit_depth: u8,
) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    if bit_depth == 8 {
        for line in buffer.chunks(line_size).take(height as usize) {
            pixels.extend_from_slice(&line[..width as usize]);
        }
        return pixels;
    }
    let per_byte = 8 / bit_depth as usize;
    let mask = (1u16 << bit_depth) as u8 - 1;
    for line in buffer.chunks(line_size).take(height as usize) {
        for x in 0..width as usize {
            let byte = line[x / per_byte];
            let shift = 8 - bit_depth as usize * (x % per_byte + 1);
            pixels.push((byte >> shift) & mask);
        }
    }
    pixels
}
