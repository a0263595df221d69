use crate::{Category, Palette};

/// A sub-palette selected for a category. It only writes inside its allowed range when composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPaletteLayer {
    pub name: String,
    pub palette: Palette,
    pub category: Category,
    pub active: bool,
}

impl SubPaletteLayer {
    /// Create an active layer
    pub fn new(name: impl Into<String>, palette: Palette, category: Category) -> Self {
        Self {
            name: name.into(),
            palette,
            category,
            active: true,
        }
    }
}
