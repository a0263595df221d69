//! Decide which colors are chroma keys, that is rendered as transparent.

use crate::{Category, CharacterId, Color};

/// Number of ±1 steps tried around a keyed color before giving up
pub const KEYING_AVOIDANCE_STEPS: u8 = 20;

fn character_is(character: CharacterId, number: u16) -> bool {
    character.number() == number
}

/// The rule shared by all characters without an override
pub fn is_universal_keying(color: Color) -> bool {
    let Color { r, g, b } = color;
    (g == 255 && b == 0 && r <= 25) || (r == 0 && g == 255 && b <= 21) || color == Color::MAGENTA
}

/// Only the exact pure green is a padding entry
pub fn is_green_padding(color: Color) -> bool {
    color == Color::GREEN
}

/// Whether `color` is a keying color for `character`
pub fn is_keying(color: Color, character: CharacterId) -> bool {
    if character_is(character, 14) {
        return color == Color::GREEN || color == Color::MAGENTA;
    }
    if character_is(character, 4) && color == Color::BLACK {
        return true;
    }
    is_universal_keying(color)
}

/// Whether the palette slot `index` holding `color` is keyed. This add index based rules on top of
/// [`is_keying`]: index 255 is always keyed for character 004.
pub fn is_keying_slot(color: Color, index: u8, character: CharacterId) -> bool {
    (character_is(character, 4) && index == 255) || is_keying(color, character)
}

/// The keying rule used when a layer of the given category is painted over the base palette
pub fn is_layer_keying(
    color: Color,
    index: u8,
    character: CharacterId,
    category: Category,
) -> bool {
    if is_green_padding(color) {
        return true;
    }
    match category {
        Category::Hair if character_is(character, 1) && color == Color::GREEN => true,
        _ => is_keying_slot(color, index, character),
    }
}

/// Result of [`avoid_keying`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyingAvoidance {
    /// The candidate wasn't a keying color
    Unchanged(Color),
    /// A close non-keying color was found
    Nudged(Color),
    /// Nothing found close enough, neutral gray is used instead
    Exhausted(Color),
}

impl KeyingAvoidance {
    pub fn color(self) -> Color {
        match self {
            Self::Unchanged(color) | Self::Nudged(color) | Self::Exhausted(color) => color,
        }
    }
}

/// Find a non-keying color close to `candidate` by moving one channel at a time, one step further at
/// each round, up to [`KEYING_AVOIDANCE_STEPS`] steps.
pub fn avoid_keying(candidate: Color, character: CharacterId) -> KeyingAvoidance {
    if !is_keying(candidate, character) {
        return KeyingAvoidance::Unchanged(candidate);
    }
    for step in 1..=KEYING_AVOIDANCE_STEPS as i16 {
        for channel in 0..3 {
            for direction in [1, -1] {
                let mut channels = candidate.to_array();
                let moved = channels[channel] as i16 + step * direction;
                if !(0..=255).contains(&moved) {
                    continue;
                }
                channels[channel] = moved as u8;
                let nudged = Color::from(channels);
                if !is_keying(nudged, character) {
                    return KeyingAvoidance::Nudged(nudged);
                }
            }
        }
    }
    KeyingAvoidance::Exhausted(Color::NEUTRAL_GRAY)
}
