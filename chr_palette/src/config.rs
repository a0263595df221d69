use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Category, CharacterId, Color, PaletteError};

/// The layer name meaning "no layer for this category"
pub const NO_LAYER: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// RGBA png, keyed pixels transparent
    #[default]
    TransparentPng,
    /// 8 bits bmp, transparency flattened on the background color
    BoxedBmp,
    /// 103×103 bmp
    PortraitBmp,
    /// 105×105 bmp over the shop background
    ShopBmp,
    /// The 768 bytes of the composed palette
    PaletteBlob,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::TransparentPng => "png",
            Self::BoxedBmp | Self::PortraitBmp | Self::ShopBmp => "bmp",
            Self::PaletteBlob => "pal",
        }
    }
}

/// Where assets are looked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_frames")]
    pub frames: PathBuf,
    #[serde(default = "default_vanilla")]
    pub vanilla_palettes: PathBuf,
    #[serde(default = "default_custom")]
    pub custom_palettes: PathBuf,
    #[serde(default)]
    pub shop_background: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            vanilla_palettes: default_vanilla(),
            custom_palettes: default_custom(),
            shop_background: None,
        }
    }
}

fn default_frames() -> PathBuf {
    PathBuf::from("frames")
}

fn default_vanilla() -> PathBuf {
    PathBuf::from("palettes")
}

fn default_custom() -> PathBuf {
    PathBuf::from("custom_palettes")
}

fn default_background() -> [u8; 3] {
    Color::WHITE.to_array()
}

/// Everything a preview or export session is set up with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub character: CharacterId,
    /// Category key → layer name, or [`NO_LAYER`]
    #[serde(default)]
    pub layers: BTreeMap<String, String>,
    #[serde(default = "default_background")]
    pub background: [u8; 3],
    #[serde(default)]
    pub export: ExportKind,
    #[serde(default)]
    pub icon_reversed: bool,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl SessionConfig {
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            layers: BTreeMap::new(),
            background: default_background(),
            export: ExportKind::default(),
            icon_reversed: false,
            paths: PathsConfig::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, PaletteError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, PaletteError> {
        if !path.is_file() {
            return Err(PaletteError::MissingAsset(path.to_path_buf()));
        }
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn background_color(&self) -> Color {
        Color::from(self.background)
    }

    /// The selected layer names, by category. Categories set to [`NO_LAYER`] are left out.
    pub fn selected_layers(&self) -> Result<Vec<(Category, String)>, PaletteError> {
        let mut selected = Vec::new();
        for (key, name) in &self.layers {
            let category: Category = key.parse()?;
            if name.trim().is_empty() || name.eq_ignore_ascii_case(NO_LAYER) {
                continue;
            }
            selected.push((category, name.clone()));
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Category, Color, ExportKind, SessionConfig};

    #[test]
    fn test_parse_config() {
        let config = SessionConfig::from_toml_str(
            r#"
            character = "chr001"
            export = "portrait_bmp"
            icon_reversed = true
            background = [0, 0, 0]

            [layers]
            hair = "blond"
            fashion_1 = "none"
            fashion_3 = "red_gloves"

            [paths]
            frames = "/data/frames"
            "#,
        )
        .unwrap();
        assert_eq!(config.character.number(), 1);
        assert_eq!(config.export, ExportKind::PortraitBmp);
        assert!(config.icon_reversed);
        assert_eq!(config.background_color(), Color::BLACK);
        assert_eq!(
            config.selected_layers().unwrap(),
            vec![
                (Category::Fashion(3), "red_gloves".to_string()),
                (Category::Hair, "blond".to_string()),
            ]
        );
        assert_eq!(config.paths.custom_palettes.to_str(), Some("custom_palettes"));
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::from_toml_str("character = \"014\"").unwrap();
        assert_eq!(config.background_color(), Color::WHITE);
        assert_eq!(config.export, ExportKind::TransparentPng);
        assert!(!config.icon_reversed);
        assert!(config.selected_layers().unwrap().is_empty());
        assert_eq!(config, SessionConfig::new(config.character));
        assert_eq!(config.paths.frames.to_str(), Some("frames"));
    }

    #[test]
    fn test_invalid_config() {
        assert!(SessionConfig::from_toml_str("character = \"abc\"").is_err());
        let config =
            SessionConfig::from_toml_str("character = \"001\"\n[layers]\nfashion_12 = \"x\"")
                .unwrap();
        assert!(config.selected_layers().is_err());
    }
}
