use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{
    codecs::bmp::BmpEncoder, imageops, ExtendedColorType, ImageFormat, Rgba, RgbaImage,
};

use crate::{
    is_transparent_index, render_rgba, CharacterId, Color, Diagnostic, ExportKind, IndexedFrame,
    Palette, PaletteError,
};

/// Side of the square portrait canvas
pub const PORTRAIT_SIZE: u32 = 103;
/// Side of the square shop canvas
pub const SHOP_SIZE: u32 = 105;

/// The fixed-size canvas a frame is centered in
#[derive(Debug, Clone, Copy)]
pub enum BoxedKind<'a> {
    Portrait,
    /// Drawn over the shop background image, whose magenta pixels show the background color
    Shop { background: &'a RgbaImage },
}

/// The flat 768 bytes of the composed palette
pub fn export_palette(composed: &Palette) -> Vec<u8> {
    composed.to_bytes()
}

fn encode(image: image::DynamicImage, format: ImageFormat) -> Result<Vec<u8>, PaletteError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// The frame as a RGBA png, keyed pixels transparent
pub fn export_frame_rgba(
    frame: &IndexedFrame,
    composed: &Palette,
    character: CharacterId,
) -> Result<Vec<u8>, PaletteError> {
    let image = render_rgba(frame, composed, character);
    encode(image::DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

/// The frame as an 8 bits bmp with the composed palette. Transparent slots are replaced by the
/// background color.
pub fn export_frame_indexed(
    frame: &IndexedFrame,
    composed: &Palette,
    character: CharacterId,
    background: Color,
) -> Result<Vec<u8>, PaletteError> {
    let flattened = composed.with_colors(
        (0..=255u8)
            .filter(|index| is_transparent_index(frame, *index, character))
            .map(|index| (index, background)),
    );
    let palette: Vec<[u8; 3]> = flattened.colors().iter().map(|color| color.to_array()).collect();
    let mut bytes = Vec::new();
    BmpEncoder::new(&mut bytes).encode_with_palette(
        frame.pixels(),
        frame.width(),
        frame.height(),
        ExtendedColorType::L8,
        Some(palette.as_slice()),
    )?;
    Ok(bytes)
}

/// Replace transparent pixels by `background`
fn flatten(image: &mut RgbaImage, background: Color) {
    for pixel in image.pixels_mut() {
        if pixel.0[3] == 0 {
            *pixel = Rgba([background.r, background.g, background.b, 255]);
        }
    }
}

/// Compose the boxed canvas, without encoding it
pub fn compose_boxed(
    frame: &IndexedFrame,
    composed: &Palette,
    character: CharacterId,
    kind: BoxedKind,
    background: Color,
) -> RgbaImage {
    let filler = Rgba([background.r, background.g, background.b, 255]);
    let mut canvas = match kind {
        BoxedKind::Portrait => RgbaImage::from_pixel(PORTRAIT_SIZE, PORTRAIT_SIZE, filler),
        BoxedKind::Shop { background: shop } => {
            let mut canvas = RgbaImage::from_pixel(SHOP_SIZE, SHOP_SIZE, filler);
            let mut shop = shop.clone();
            for pixel in shop.pixels_mut() {
                let color = Color::new(pixel.0[0], pixel.0[1], pixel.0[2]);
                if pixel.0[3] == 0 || color == Color::MAGENTA {
                    *pixel = filler;
                }
            }
            let x = (SHOP_SIZE as i64 - shop.width() as i64) / 2;
            let y = (SHOP_SIZE as i64 - shop.height() as i64) / 2;
            imageops::overlay(&mut canvas, &shop, x, y);
            canvas
        }
    };
    let rendered = render_rgba(frame, composed, character);
    let x = (canvas.width() as i64 - rendered.width() as i64) / 2;
    let y = (canvas.height() as i64 - rendered.height() as i64) / 2;
    imageops::overlay(&mut canvas, &rendered, x, y);
    flatten(&mut canvas, background);
    canvas
}

/// The frame centered in a fixed-size canvas, as a 24 bits bmp
pub fn export_boxed(
    frame: &IndexedFrame,
    composed: &Palette,
    character: CharacterId,
    kind: BoxedKind,
    background: Color,
) -> Result<Vec<u8>, PaletteError> {
    let canvas = compose_boxed(frame, composed, character, kind, background);
    encode(
        image::DynamicImage::ImageRgba8(canvas).to_rgb8().into(),
        ImageFormat::Bmp,
    )
}

/// What the batch export should produce
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub kind: ExportKind,
    pub background: Color,
    /// Needed for [`ExportKind::ShopBmp`]
    pub shop_background: Option<RgbaImage>,
}

impl ExportSettings {
    /// Encode one frame. Palette blobs don't depend on the frame.
    pub fn encode_frame(
        &self,
        frame: &IndexedFrame,
        composed: &Palette,
        character: CharacterId,
    ) -> Result<Vec<u8>, PaletteError> {
        match self.kind {
            ExportKind::TransparentPng => export_frame_rgba(frame, composed, character),
            ExportKind::BoxedBmp => {
                export_frame_indexed(frame, composed, character, self.background)
            }
            ExportKind::PortraitBmp => export_boxed(
                frame,
                composed,
                character,
                BoxedKind::Portrait,
                self.background,
            ),
            ExportKind::ShopBmp => match &self.shop_background {
                Some(background) => export_boxed(
                    frame,
                    composed,
                    character,
                    BoxedKind::Shop { background },
                    self.background,
                ),
                None => Err(PaletteError::MissingAsset(PathBuf::from("shop background"))),
            },
            ExportKind::PaletteBlob => Ok(export_palette(composed)),
        }
    }
}

/// The result of [`export_all_frames`]
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    /// true if the export stopped before the last frame
    pub cancelled: bool,
}

/// Export every frame file into `output_directory`. `should_cancel` is checked between frames, files
/// already written stay on disk. Frames that can't be read or written are reported and skipped.
pub fn export_all_frames<C: FnMut() -> bool>(
    frame_paths: &[PathBuf],
    output_directory: &Path,
    composed: &Palette,
    character: CharacterId,
    settings: &ExportSettings,
    mut should_cancel: C,
) -> Result<BatchReport, PaletteError> {
    fs::create_dir_all(output_directory)?;
    let mut report = BatchReport::default();
    for frame_path in frame_paths {
        if should_cancel() {
            debug!("batch export cancelled after {} files", report.written.len());
            report.cancelled = true;
            break;
        }
        let location = frame_path.display().to_string();
        let encoded = IndexedFrame::load(frame_path)
            .and_then(|frame| settings.encode_frame(&frame, composed, character));
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(err) => {
                report.diagnostics.push(Diagnostic::from_error(&err, location));
                continue;
            }
        };
        let stem = frame_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "frame".to_string());
        let target = output_directory.join(format!("{}.{}", stem, settings.kind.extension()));
        if let Err(err) = fs::write(&target, bytes) {
            report
                .diagnostics
                .push(Diagnostic::from_error(&err.into(), target.display().to_string()));
            continue;
        }
        trace!("exported {:?}", target);
        report.written.push(target);
    }
    Ok(report)
}
