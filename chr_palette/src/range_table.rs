use crate::{Category, CharacterId};

/// Half-open intervals `[start, end)` of palette indices. `end` can be 256.
type Intervals = &'static [(u16, u16)];

/// The layout most characters share
static STANDARD_LAYOUT: [(Category, Intervals); 10] = [
    (Category::Hair, &[(16, 48)]),
    (Category::ThirdJobBase, &[(48, 96)]),
    (Category::Fashion(1), &[(96, 128)]),
    (Category::Fashion(2), &[(128, 152)]),
    (Category::Fashion(3), &[(152, 168)]),
    (Category::Fashion(4), &[(168, 184)]),
    (Category::Fashion(5), &[(184, 200)]),
    (Category::Fashion(6), &[(200, 216)]),
    (Category::Fashion(7), &[(216, 232)]),
    (Category::Fashion(8), &[(232, 248)]),
];

/// Index 255 is a key slot for this character, so the last fashion slot stops before it
static LAYOUT_004: [(Category, Intervals); 10] = [
    (Category::Hair, &[(16, 40)]),
    (Category::ThirdJobBase, &[(40, 96)]),
    (Category::Fashion(1), &[(96, 128)]),
    (Category::Fashion(2), &[(128, 160)]),
    (Category::Fashion(3), &[(160, 176)]),
    (Category::Fashion(4), &[(176, 192)]),
    (Category::Fashion(5), &[(192, 208)]),
    (Category::Fashion(6), &[(208, 224)]),
    (Category::Fashion(7), &[(224, 240)]),
    (Category::Fashion(8), &[(240, 255)]),
];

/// Hair is split in two windows, the base fills the gaps around it
static LAYOUT_014: [(Category, Intervals); 10] = [
    (Category::Hair, &[(16, 32), (60, 64)]),
    (Category::ThirdJobBase, &[(32, 60), (64, 96)]),
    (Category::Fashion(1), &[(96, 128)]),
    (Category::Fashion(2), &[(128, 152)]),
    (Category::Fashion(3), &[(152, 168)]),
    (Category::Fashion(4), &[(168, 184)]),
    (Category::Fashion(5), &[(184, 200)]),
    (Category::Fashion(6), &[(200, 216)]),
    (Category::Fashion(7), &[(216, 232)]),
    (Category::Fashion(8), &[(232, 248)]),
];

/// The seventh fashion slot paints over the end of the first one
static LAYOUT_020: [(Category, Intervals); 10] = [
    (Category::Hair, &[(16, 48)]),
    (Category::ThirdJobBase, &[(48, 96)]),
    (Category::Fashion(1), &[(96, 128)]),
    (Category::Fashion(2), &[(128, 152)]),
    (Category::Fashion(3), &[(152, 168)]),
    (Category::Fashion(4), &[(168, 184)]),
    (Category::Fashion(5), &[(184, 200)]),
    (Category::Fashion(6), &[(200, 216)]),
    (Category::Fashion(7), &[(120, 128), (216, 232)]),
    (Category::Fashion(8), &[(232, 248)]),
];

static FULL_RANGE: [(u16, u16); 1] = [(0, 256)];

fn layout_for(character: CharacterId) -> Option<&'static [(Category, Intervals)]> {
    match character.number() {
        4 => Some(&LAYOUT_004),
        14 => Some(&LAYOUT_014),
        20 => Some(&LAYOUT_020),
        1..=3 | 5..=13 | 15..=19 | 21..=27 | 100..=102 => Some(&STANDARD_LAYOUT),
        _ => None,
    }
}

/// The set of palette indices a category is allowed to write for a character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    intervals: Intervals,
}

impl IndexRange {
    pub fn full() -> Self {
        Self {
            intervals: &FULL_RANGE,
        }
    }

    pub fn contains(&self, index: u8) -> bool {
        let index = index as u16;
        self.intervals
            .iter()
            .any(|(start, end)| *start <= index && index < *end)
    }

    /// The half-open intervals, in table order
    pub fn intervals(&self) -> &'static [(u16, u16)] {
        self.intervals
    }

    /// Every index of the range, interval after interval
    pub fn indices(&self) -> impl Iterator<Item = u8> + 'static {
        self.intervals
            .iter()
            .flat_map(|(start, end)| (*start..(*end).min(256)).map(|index| index as u8))
    }

    pub fn is_full(&self) -> bool {
        (0..=255).all(|index| self.contains(index))
    }
}

/// Look up the indices `category` may overwrite for `character`, which should be a palette identifier.
/// Unknown pairs can write the whole palette.
pub fn allowed_range(character: CharacterId, category: Category) -> IndexRange {
    let entry = layout_for(character).and_then(|layout| {
        layout
            .iter()
            .find(|(entry_category, _)| *entry_category == category)
    });
    match entry {
        Some((_, intervals)) => IndexRange {
            intervals: *intervals,
        },
        None => {
            trace!(
                "no range for {} and {}, using the full palette",
                character,
                category
            );
            IndexRange::full()
        }
    }
}

/// Pairs that ignore their range entirely. Character 020 fashion slot 4 assets write outside of
/// the slot window and rely on it.
pub fn is_range_exempt(character: CharacterId, category: Category) -> bool {
    character.number() == 20 && category == Category::Fashion(4)
}
