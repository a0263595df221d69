use std::{fmt, str::FromStr};

use crate::PaletteError;

/// Display names of the eight fashion slots, in slot order
pub static FASHION_NAMES: [&str; 8] = [
    "headgear", "shirt", "pants", "gloves", "shoes", "back", "face", "accessory",
];

/// The role a sub-palette plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Hair,
    ThirdJobBase,
    /// Fashion slot, from 1 to 8
    Fashion(u8),
}

impl Category {
    /// Return [`None`] when the slot isn't between 1 and 8
    pub fn fashion(slot: u8) -> Option<Self> {
        if (1..=8).contains(&slot) {
            Some(Self::Fashion(slot))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Category> {
        [Self::Hair, Self::ThirdJobBase]
            .into_iter()
            .chain((1..=8).map(Self::Fashion))
    }

    /// The name used in configuration files and directory names
    pub fn key(self) -> String {
        match self {
            Self::Hair => "hair".to_string(),
            Self::ThirdJobBase => "third_job_base".to_string(),
            Self::Fashion(slot) => format!("fashion_{}", slot),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Hair => "hair",
            Self::ThirdJobBase => "third job base",
            Self::Fashion(slot) => FASHION_NAMES
                .get((slot as usize).wrapping_sub(1))
                .copied()
                .unwrap_or("fashion"),
        }
    }

    pub fn is_fashion(self) -> bool {
        matches!(self, Self::Fashion(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Category {
    type Err = PaletteError;

    /// Accept the key (`fashion_3`) or the fashion display name (`pants`)
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let lower = text.trim().to_ascii_lowercase();
        match lower.as_str() {
            "hair" => return Ok(Self::Hair),
            "third_job_base" => return Ok(Self::ThirdJobBase),
            _ => (),
        };
        if let Some(slot) = lower.strip_prefix("fashion_") {
            if let Some(category) = slot.parse().ok().and_then(Self::fashion) {
                return Ok(category);
            }
        }
        if let Some(position) = FASHION_NAMES.iter().position(|name| *name == lower) {
            return Ok(Self::Fashion(position as u8 + 1));
        }
        Err(PaletteError::UnknownCategory(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::Category;

    #[test]
    fn test_category_keys() {
        let all: Vec<Category> = Category::all().collect();
        assert_eq!(all.len(), 10);
        for category in all {
            assert_eq!(category.key().parse::<Category>().unwrap(), category);
        }
        assert_eq!("shoes".parse::<Category>().unwrap(), Category::Fashion(5));
        assert!("fashion_9".parse::<Category>().is_err());
        assert!("fashion_0".parse::<Category>().is_err());
        assert_eq!(Category::fashion(9), None);
        assert_eq!(Category::Fashion(2).display_name(), "shirt");
    }
}
