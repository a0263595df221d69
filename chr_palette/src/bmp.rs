//! Reader for uncompressed 8 bits per pixel bmp files, keeping the palette indices.

use crate::{Color, Palette, PaletteError};
use byteorder::{ReadBytesExt, LE};
use std::io::{Read, Seek, SeekFrom};

/// The decoded content of an 8-bit bmp
#[derive(Debug, PartialEq, Eq)]
pub struct IndexedBmp {
    pub width: u32,
    pub height: u32,
    /// Pixels from top-left to bottom-right, line by line
    pub pixels: Vec<u8>,
    pub palette: Palette,
}

/// Return true if the data start with the bmp magic and declare 8 bits per pixel
pub fn is_indexed_bmp(bytes: &[u8]) -> bool {
    bytes.len() >= 30 && &bytes[0..2] == b"BM" && bytes[28] == 8 && bytes[29] == 0
}

pub fn read_indexed_bmp<F: Read + Seek>(file: &mut F) -> Result<IndexedBmp, PaletteError> {
    let mut magic = [0; 2];
    file.read_exact(&mut magic)?;
    if &magic != b"BM" {
        return Err(PaletteError::InvalidBmpHeader("missing the BM magic"));
    }
    let _file_size = file.read_u32::<LE>()?;
    let _reserved = file.read_u32::<LE>()?;
    let pixel_offset = file.read_u32::<LE>()? as u64;

    let info_header_size = file.read_u32::<LE>()?;
    if info_header_size < 40 {
        return Err(PaletteError::InvalidBmpHeader("the info header is too small"));
    }
    let width = file.read_i32::<LE>()?;
    let raw_height = file.read_i32::<LE>()?;
    let _planes = file.read_u16::<LE>()?;
    let bits_per_pixel = file.read_u16::<LE>()?;
    let compression = file.read_u32::<LE>()?;
    let _image_size = file.read_u32::<LE>()?;
    let _x_pixels_per_meter = file.read_i32::<LE>()?;
    let _y_pixels_per_meter = file.read_i32::<LE>()?;
    let colors_used = file.read_u32::<LE>()?;
    let _colors_important = file.read_u32::<LE>()?;
    trace!(
        "bmp of {}×{}, {} bits per pixel, {} colors",
        width,
        raw_height,
        bits_per_pixel,
        colors_used
    );

    if bits_per_pixel != 8 {
        return Err(PaletteError::UnsupportedFrameMode(format!(
            "a bmp with {} bits per pixel isn't indexed",
            bits_per_pixel
        )));
    }
    if compression != 0 {
        return Err(PaletteError::UnsupportedFrameMode(format!(
            "the bmp compression method {} isn't supported",
            compression
        )));
    }
    if width < 0 {
        return Err(PaletteError::InvalidBmpHeader("negative width"));
    }
    let top_down = raw_height < 0;
    let width = width as u32;
    let height = raw_height.unsigned_abs();

    let nb_colors = match colors_used {
        0 => 256,
        nb => nb.min(256),
    };
    file.seek(SeekFrom::Start(14 + info_header_size as u64))?;
    let mut colors = Vec::with_capacity(nb_colors as usize);
    for _ in 0..nb_colors {
        let blue = file.read_u8()?;
        let green = file.read_u8()?;
        let red = file.read_u8()?;
        let _reserved = file.read_u8()?;
        colors.push(Color::new(red, green, blue));
    }

    file.seek(SeekFrom::Start(pixel_offset))?;
    let row_len = width as usize;
    let padded_row_len = (row_len + 3) / 4 * 4;
    let mut rows = Vec::with_capacity(height as usize);
    let mut row = vec![0; padded_row_len];
    for _ in 0..height {
        file.read_exact(&mut row)?;
        rows.push(row[..row_len].to_vec());
    }
    if !top_down {
        rows.reverse();
    }

    Ok(IndexedBmp {
        width,
        height,
        pixels: rows.concat(),
        palette: Palette::from_colors_padded(&colors),
    })
}

#[cfg(test)]
mod tests {
    use crate::{read_indexed_bmp, Color};
    use image::{codecs::bmp::BmpEncoder, ExtendedColorType};
    use std::io::Cursor;

    #[test]
    fn test_read_encoded_bmp() {
        let pixels = [0, 1, 2, 3, 4, 5];
        let mut palette = vec![[0, 0, 0]; 256];
        palette[1] = [255, 0, 0];
        palette[5] = [1, 2, 3];
        let mut bytes = Vec::new();
        BmpEncoder::new(&mut bytes)
            .encode_with_palette(
                &pixels,
                3,
                2,
                ExtendedColorType::L8,
                Some(palette.as_slice()),
            )
            .unwrap();
        assert!(crate::is_indexed_bmp(&bytes));

        let bmp = read_indexed_bmp(&mut Cursor::new(bytes)).unwrap();
        assert_eq!((bmp.width, bmp.height), (3, 2));
        assert_eq!(bmp.pixels, pixels);
        assert_eq!(bmp.palette.get(1), Color::new(255, 0, 0));
        assert_eq!(bmp.palette.get(5), Color::new(1, 2, 3));
    }

    #[test]
    fn test_reject_non_bmp() {
        assert!(read_indexed_bmp(&mut Cursor::new(b"PNG and more bytes".to_vec())).is_err());
    }
}
