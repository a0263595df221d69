use std::{io, path::PathBuf};
use thiserror::Error;

use crate::DiagnosticKind;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("an input/output error happened")]
    IOError(#[from] io::Error),
    #[error("an error happened while decoding or encoding an image")]
    ImageError(#[from] image::ImageError),
    #[error("an error happened while decoding a png file")]
    PngDecodingError(#[from] png::DecodingError),
    #[error("an error happened while parsing the configuration")]
    Config(#[from] toml::de::Error),
    #[error("a palette file should be exactly 768 bytes long, found {0} bytes")]
    InvalidPalette(usize),
    #[error("the frame can't be reduced to indexed pixels and a palette: {0}")]
    UnsupportedFrameMode(String),
    #[error("the asset at {0:?} is missing")]
    MissingAsset(PathBuf),
    #[error("the character identifier {0:?} is invalid (expected three digits, optionally prefixed by \"chr\")")]
    InvalidCharacterId(String),
    #[error("the palette category {0:?} is unknown")]
    UnknownCategory(String),
    #[error("the color {0:?} is not a valid hexadecimal color")]
    InvalidHexColor(String),
    #[error("the bmp header is invalid: {0}")]
    InvalidBmpHeader(&'static str),
    #[error("the frame has {2} pixels, but a resolution of {0}×{1}")]
    InvalidFrameResolution(u32, u32, usize),
    #[error("the character {0} can't be found in the roster")]
    UnknownCharacter(String),
}

impl PaletteError {
    /// The diagnostic kind this error is reported under
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::InvalidPalette(_) => DiagnosticKind::InvalidPalette,
            Self::UnsupportedFrameMode(_)
            | Self::InvalidBmpHeader(_)
            | Self::InvalidFrameResolution(..)
            | Self::PngDecodingError(_)
            | Self::ImageError(_) => DiagnosticKind::UnsupportedFrameMode,
            Self::IOError(_)
            | Self::MissingAsset(_)
            | Self::Config(_)
            | Self::InvalidCharacterId(_)
            | Self::UnknownCategory(_)
            | Self::InvalidHexColor(_)
            | Self::UnknownCharacter(_) => DiagnosticKind::MissingAsset,
        }
    }
}
