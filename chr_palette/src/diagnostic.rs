use std::fmt;

use crate::PaletteError;

/// The kind of a non-fatal problem. The surrounding operation continues after reporting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    InvalidPalette,
    UnsupportedFrameMode,
    MissingAsset,
    /// An index or frame number was clamped to the nearest valid value
    OutOfRangeSelection,
    /// No non-keying color was found around a candidate, neutral gray was used instead
    KeyingAvoidanceExhausted,
}

/// A user-visible notice. Showing it is the job of whatever drives the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// A file path, a palette index, a frame number...
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let diagnostic = Self {
            kind,
            location: location.into(),
            message: message.into(),
        };
        warn!("{}", diagnostic);
        diagnostic
    }

    pub fn from_error(error: &PaletteError, location: impl Into<String>) -> Self {
        Self::new(error.kind(), location, error.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.kind, self.location, self.message)
    }
}
