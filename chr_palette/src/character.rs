use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Category, PaletteError};

/// Image identifiers whose palettes are stored under another identifier.
/// The first value is the image identifier, the second the palette identifier.
static ALIASES: [(u16, u16); 3] = [(25, 100), (26, 101), (27, 102)];

/// A three digit character identifier. Its wire form is `chrNNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterId(u16);

impl CharacterId {
    /// Return [`None`] if the number doesn't fit in three digits
    pub fn new(number: u16) -> Option<Self> {
        if number <= 999 {
            Some(Self(number))
        } else {
            None
        }
    }

    pub fn number(self) -> u16 {
        self.0
    }

    /// `chrNNN`
    pub fn wire_name(self) -> String {
        format!("chr{:03}", self.0)
    }

    /// The identifier palettes of this character are stored under
    pub fn palette_id(self) -> CharacterId {
        for (image_id, palette_id) in &ALIASES {
            if *image_id == self.0 {
                return Self(*palette_id);
            }
        }
        self
    }

    /// The identifier images of this character are stored under
    pub fn image_id(self) -> CharacterId {
        for (image_id, palette_id) in &ALIASES {
            if *palette_id == self.0 {
                return Self(*image_id);
            }
        }
        self
    }

    /// true for both sides of an alias pair
    pub fn is_aliased(self) -> bool {
        ALIASES
            .iter()
            .any(|(image_id, palette_id)| *image_id == self.0 || *palette_id == self.0)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for CharacterId {
    type Err = PaletteError;

    /// Accept `NNN` and `chrNNN` (case insensitive prefix)
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let digits = match trimmed.get(..3) {
            Some(prefix) if trimmed.len() > 3 && prefix.eq_ignore_ascii_case("chr") => {
                &trimmed[3..]
            }
            _ => trimmed,
        };
        if digits.len() != 3 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(PaletteError::InvalidCharacterId(text.to_string()));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| PaletteError::InvalidCharacterId(text.to_string()))
    }
}

impl TryFrom<String> for CharacterId {
    type Error = PaletteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CharacterId> for String {
    fn from(value: CharacterId) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum JobTier {
    First,
    Second,
    Third,
}

impl TryFrom<u8> for JobTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            other => Err(format!("the job tier should be 1, 2 or 3, found {}", other)),
        }
    }
}

impl From<JobTier> for u8 {
    fn from(value: JobTier) -> Self {
        match value {
            JobTier::First => 1,
            JobTier::Second => 2,
            JobTier::Third => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub tier: JobTier,
}

impl Character {
    /// Where frames of this character are found
    pub fn image_id(&self) -> CharacterId {
        self.id.image_id()
    }

    /// Where palettes of this character are found. Also the identifier keying and range rules use.
    pub fn palette_id(&self) -> CharacterId {
        self.id.palette_id()
    }

    /// Aliased characters never use a third job base layer, even when one is nominally active
    pub fn allows_third_job_base(&self) -> bool {
        self.tier == JobTier::Third && !self.id.is_aliased()
    }

    pub fn applicable_categories(&self) -> Vec<Category> {
        Category::all()
            .filter(|category| *category != Category::ThirdJobBase || self.allows_third_job_base())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(rename = "character")]
    characters: Vec<Character>,
}

/// The list of known characters, as (display name, job tier) → identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub characters: Vec<Character>,
}

impl Roster {
    /// Parse a list of `[[character]]` tables with `id`, `name` and `tier` keys
    pub fn from_toml_str(text: &str) -> Result<Self, PaletteError> {
        let file: RosterFile = toml::from_str(text)?;
        Ok(Self {
            characters: file.characters,
        })
    }

    pub fn resolve(&self, name: &str, tier: JobTier) -> Result<&Character, PaletteError> {
        self.characters
            .iter()
            .find(|character| character.tier == tier && character.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| PaletteError::UnknownCharacter(format!("{} ({:?})", name, tier)))
    }

    /// Find a character by identifier. Palette identifiers of an alias pair find the image side.
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters
            .iter()
            .find(|character| character.id == id)
            .or_else(|| {
                let image_id = id.image_id();
                self.characters.iter().find(|character| character.id == image_id)
            })
    }
}
