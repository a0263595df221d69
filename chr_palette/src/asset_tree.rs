use anyhow::Context;
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    Category, CharacterId, Diagnostic, PaletteError, PaletteStore, PathsConfig, SubPaletteLayer,
};

/// Which tree a palette file was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSource {
    Vanilla,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    /// The file stem
    pub name: String,
    pub path: PathBuf,
    pub source: PaletteSource,
}

/// The on-disk layout of frames and palettes.
///
/// Palettes are stored as `<tree>/<category key>/chrNNN/<name>.pal`, under the palette identifier of
/// the character, for both the read-only vanilla tree and the user writable custom tree. Frames are
/// stored as `<frames>/chrNNN/*.png` or `*.bmp`, under the image identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTree {
    pub frames: PathBuf,
    pub vanilla: PathBuf,
    pub custom: PathBuf,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            extensions
                .iter()
                .any(|expected| extension.eq_ignore_ascii_case(expected))
        })
        .unwrap_or(false)
}

/// List the files of a directory with one of the given extensions. A missing directory is empty.
fn list_files(directory: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, PaletteError> {
    let read_dir = match fs::read_dir(directory) {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut paths = Vec::new();
    for entry in read_dir {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

impl AssetTree {
    pub fn new(
        frames: impl Into<PathBuf>,
        vanilla: impl Into<PathBuf>,
        custom: impl Into<PathBuf>,
    ) -> Self {
        Self {
            frames: frames.into(),
            vanilla: vanilla.into(),
            custom: custom.into(),
        }
    }

    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(
            &paths.frames,
            &paths.vanilla_palettes,
            &paths.custom_palettes,
        )
    }

    fn palette_dir(root: &Path, character: CharacterId, category: Category) -> PathBuf {
        root.join(category.key())
            .join(character.palette_id().wire_name())
    }

    pub fn vanilla_dir(&self, character: CharacterId, category: Category) -> PathBuf {
        Self::palette_dir(&self.vanilla, character, category)
    }

    pub fn custom_dir(&self, character: CharacterId, category: Category) -> PathBuf {
        Self::palette_dir(&self.custom, character, category)
    }

    /// List the palettes available for this character and category, sorted by name. A custom palette
    /// hides the vanilla palette with the same name.
    pub fn list_palettes(
        &self,
        character: CharacterId,
        category: Category,
    ) -> Result<Vec<PaletteEntry>, PaletteError> {
        let mut entries = BTreeMap::new();
        for (directory, source) in [
            (self.vanilla_dir(character, category), PaletteSource::Vanilla),
            (self.custom_dir(character, category), PaletteSource::Custom),
        ] {
            for path in list_files(&directory, &["pal"])? {
                let name = match path.file_stem().and_then(|stem| stem.to_str()) {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                entries.insert(name.clone(), PaletteEntry { name, path, source });
            }
        }
        trace!(
            "found {} {} palettes for {}",
            entries.len(),
            category,
            character
        );
        Ok(entries.into_values().collect())
    }

    /// Like [`AssetTree::list_palettes`], but leave out palettes that fail to load, reporting them
    pub fn list_valid_palettes(
        &self,
        character: CharacterId,
        category: Category,
        store: &mut PaletteStore,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<PaletteEntry>, PaletteError> {
        Ok(self
            .list_palettes(character, category)?
            .into_iter()
            .filter(|entry| store.load_or_report(&entry.path, diagnostics).is_some())
            .collect())
    }

    /// Find the file of a named palette, looking into the custom tree first
    pub fn resolve_palette(
        &self,
        character: CharacterId,
        category: Category,
        name: &str,
    ) -> Result<PathBuf, PaletteError> {
        let file_name = format!("{}.pal", name);
        let custom = self.custom_dir(character, category).join(&file_name);
        if custom.is_file() {
            return Ok(custom);
        }
        let vanilla = self.vanilla_dir(character, category).join(&file_name);
        if vanilla.is_file() {
            return Ok(vanilla);
        }
        Err(PaletteError::MissingAsset(vanilla))
    }

    /// Load a named palette as an active layer
    pub fn load_layer(
        &self,
        store: &mut PaletteStore,
        character: CharacterId,
        category: Category,
        name: &str,
    ) -> Result<SubPaletteLayer, PaletteError> {
        let path = self.resolve_palette(character, category, name)?;
        let palette = store.load(&path)?.clone();
        Ok(SubPaletteLayer::new(name, palette, category))
    }

    /// The frames of this character, sorted by file name
    pub fn frame_paths(&self, character: CharacterId) -> Result<Vec<PathBuf>, PaletteError> {
        let directory = self.frames.join(character.image_id().wire_name());
        if !directory.is_dir() {
            return Err(PaletteError::MissingAsset(directory));
        }
        list_files(&directory, &["png", "bmp"])
    }

    /// Write the layer in the custom tree, as `<name>.pal`. The store is updated with the new content.
    pub fn save_custom(
        &self,
        store: &mut PaletteStore,
        character: CharacterId,
        layer: &SubPaletteLayer,
    ) -> anyhow::Result<PathBuf> {
        let directory = self.custom_dir(character, layer.category);
        fs::create_dir_all(&directory)
            .with_context(|| format!("can't create the directory {:?}", directory))?;
        let path = directory.join(format!("{}.pal", layer.name));
        let mut file =
            fs::File::create(&path).with_context(|| format!("can't create {:?}", path))?;
        layer
            .palette
            .write(&mut file)
            .with_context(|| format!("can't write the palette {:?}", layer.name))?;
        store.update(&path, layer.palette.clone());
        debug!("saved the layer {:?} to {:?}", layer.name, path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        AssetTree, Category, CharacterId, Color, DiagnosticKind, Palette, PaletteError,
        PaletteSource, PaletteStore, SubPaletteLayer,
    };

    fn write_palette(path: &std::path::Path, color: Color) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, Palette::from_colors_padded(&[color]).to_bytes()).unwrap();
    }

    fn tree(root: &std::path::Path) -> AssetTree {
        AssetTree::new(root.join("frames"), root.join("vanilla"), root.join("custom"))
    }

    #[test]
    fn test_custom_shadows_vanilla() {
        let dir = tempfile::tempdir().unwrap();
        let tree = tree(dir.path());
        let character = CharacterId::new(1).unwrap();
        let category = Category::Hair;
        write_palette(
            &dir.path().join("vanilla/hair/chr001/blond.pal"),
            Color::WHITE,
        );
        write_palette(
            &dir.path().join("vanilla/hair/chr001/brown.pal"),
            Color::WHITE,
        );
        write_palette(
            &dir.path().join("custom/hair/chr001/blond.pal"),
            Color::MAGENTA,
        );

        let entries = tree.list_palettes(character, category).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "blond");
        assert_eq!(entries[0].source, PaletteSource::Custom);
        assert_eq!(entries[1].name, "brown");
        assert_eq!(entries[1].source, PaletteSource::Vanilla);

        let mut store = PaletteStore::new();
        let layer = tree
            .load_layer(&mut store, character, category, "blond")
            .unwrap();
        assert_eq!(layer.palette.get(0), Color::MAGENTA);
        assert!(matches!(
            tree.resolve_palette(character, category, "black"),
            Err(PaletteError::MissingAsset(_))
        ));
        assert!(tree
            .list_palettes(character, Category::Fashion(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_aliased_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let tree = tree(dir.path());
        let character = CharacterId::new(25).unwrap();
        write_palette(
            &dir.path().join("vanilla/fashion_2/chr100/red.pal"),
            Color::WHITE,
        );
        fs::create_dir_all(dir.path().join("frames/chr025")).unwrap();
        fs::write(dir.path().join("frames/chr025/b.png"), b"").unwrap();
        fs::write(dir.path().join("frames/chr025/a.BMP"), b"").unwrap();
        fs::write(dir.path().join("frames/chr025/notes.txt"), b"").unwrap();

        assert_eq!(
            tree.list_palettes(character, Category::Fashion(2))
                .unwrap()
                .len(),
            1
        );
        let frames = tree.frame_paths(character).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.BMP", "b.png"]);
        assert!(tree.frame_paths(CharacterId::new(2).unwrap()).is_err());
    }

    #[test]
    fn test_invalid_palettes_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let tree = tree(dir.path());
        let character = CharacterId::new(3).unwrap();
        write_palette(
            &dir.path().join("vanilla/fashion_1/chr003/good.pal"),
            Color::WHITE,
        );
        fs::write(
            dir.path().join("vanilla/fashion_1/chr003/short.pal"),
            [0u8; 700],
        )
        .unwrap();
        let mut store = PaletteStore::new();
        let mut diagnostics = Vec::new();
        let entries = tree
            .list_valid_palettes(character, Category::Fashion(1), &mut store, &mut diagnostics)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "good");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidPalette);
    }

    #[test]
    fn test_save_custom() {
        let dir = tempfile::tempdir().unwrap();
        let tree = tree(dir.path());
        let character = CharacterId::new(26).unwrap();
        let layer = SubPaletteLayer::new(
            "edited",
            Palette::from_colors_padded(&[Color::new(1, 2, 3)]),
            Category::Fashion(5),
        );
        let mut store = PaletteStore::new();
        let path = tree.save_custom(&mut store, character, &layer).unwrap();
        assert_eq!(path, dir.path().join("custom/fashion_5/chr101/edited.pal"));
        assert_eq!(fs::read(&path).unwrap().len(), 768);
        assert_eq!(Palette::load(&path).unwrap(), layer.palette);
        assert_eq!(store.len(), 1);
    }
}
