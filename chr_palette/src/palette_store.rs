use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{Diagnostic, Palette, PaletteError};

/// Load palettes from the disk once, and keep them around.
#[derive(Debug, Default)]
pub struct PaletteStore {
    cache: HashMap<PathBuf, Palette>,
}

impl PaletteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the palette at the given path, loading it on first access
    pub fn load(&mut self, path: &Path) -> Result<&Palette, PaletteError> {
        if !self.cache.contains_key(path) {
            let palette = Palette::load(path)?;
            debug!("cached the palette at {:?}", path);
            self.cache.insert(path.to_path_buf(), palette);
        }
        // no panic: inserted just above
        Ok(&self.cache[path])
    }

    /// Like [`PaletteStore::load`], but report the failure as a [`Diagnostic`] instead.
    pub fn load_or_report(
        &mut self,
        path: &Path,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Palette> {
        match self.load(path) {
            Ok(palette) => Some(palette.clone()),
            Err(err) => {
                diagnostics.push(Diagnostic::from_error(&err, path.display().to_string()));
                None
            }
        }
    }

    /// Replace the cached value, after the file was rewritten
    pub fn update(&mut self, path: &Path, palette: Palette) {
        self.cache.insert(path.to_path_buf(), palette);
    }

    pub fn forget(&mut self, path: &Path) {
        self.cache.remove(path);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{Color, DiagnosticKind, Palette, PaletteStore};

    #[test]
    fn test_cache_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let good_path = dir.path().join("good.pal");
        let bad_path = dir.path().join("bad.pal");
        fs::write(
            &good_path,
            Palette::default().with_color(1, Color::WHITE).to_bytes(),
        )
        .unwrap();
        fs::write(&bad_path, [0u8; 700]).unwrap();

        let mut store = PaletteStore::new();
        assert_eq!(store.load(&good_path).unwrap().get(1), Color::WHITE);
        // the cached value survives the file changing on disk
        fs::write(&good_path, Palette::default().to_bytes()).unwrap();
        assert_eq!(store.load(&good_path).unwrap().get(1), Color::WHITE);
        assert_eq!(store.len(), 1);

        let mut diagnostics = Vec::new();
        assert!(store.load_or_report(&bad_path, &mut diagnostics).is_none());
        assert!(store
            .load_or_report(&dir.path().join("missing.pal"), &mut diagnostics)
            .is_none());
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidPalette);
        assert_eq!(diagnostics[1].kind, DiagnosticKind::MissingAsset);
        assert_eq!(store.len(), 1);
    }
}
