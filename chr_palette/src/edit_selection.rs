use std::collections::BTreeSet;

use crate::{Diagnostic, DiagnosticKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectModifier {
    /// Replace the selection
    None,
    /// Add or remove a single index
    Toggle,
    /// Select everything from the focus to the index
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

/// The set of palette indices being edited. The focus is always part of a non-empty selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSelection {
    indices: BTreeSet<u8>,
    focus: Option<u8>,
    multi_enabled: bool,
}

impl Default for EditSelection {
    fn default() -> Self {
        Self {
            indices: BTreeSet::new(),
            focus: None,
            multi_enabled: true,
        }
    }
}

impl EditSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select index `index`. Indices past 255 are clamped, with a notice.
    pub fn select(&mut self, index: usize, modifier: SelectModifier) -> Option<Diagnostic> {
        let (index, diagnostic) = if index > 255 {
            (
                255,
                Some(Diagnostic::new(
                    DiagnosticKind::OutOfRangeSelection,
                    index.to_string(),
                    "the palette index was clamped to 255",
                )),
            )
        } else {
            (index as u8, None)
        };

        match (modifier, self.focus) {
            (SelectModifier::Toggle, _) => {
                if self.indices.remove(&index) {
                    if self.focus == Some(index) {
                        self.focus = self.indices.iter().next().copied();
                    }
                } else {
                    self.indices.insert(index);
                    self.focus = Some(index);
                }
            }
            (SelectModifier::Range, Some(previous)) => {
                let (start, end) = if previous <= index {
                    (previous, index)
                } else {
                    (index, previous)
                };
                self.indices = (start..=end).collect();
                self.focus = Some(index);
            }
            (SelectModifier::None, _) | (SelectModifier::Range, None) => {
                self.indices.clear();
                self.indices.insert(index);
                self.focus = Some(index);
            }
        }
        diagnostic
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.focus = None;
    }

    pub fn focus(&self) -> Option<u8> {
        self.focus
    }

    pub fn mode(&self) -> SelectionMode {
        if self.multi_enabled && self.indices.len() > 1 {
            SelectionMode::Multi
        } else {
            SelectionMode::Single
        }
    }

    /// Force the single mode (slider edits only touch the focus) or allow multi mode again.
    /// The flag is kept across later selections.
    pub fn set_multi_enabled(&mut self, enabled: bool) {
        self.multi_enabled = enabled;
    }

    pub fn is_multi_enabled(&self) -> bool {
        self.multi_enabled
    }

    /// true when slider edits are relative across the whole selection
    pub fn is_multi(&self) -> bool {
        self.mode() == SelectionMode::Multi
    }

    /// Selected indices, in increasing order
    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        self.indices.iter().copied()
    }

    pub fn contains(&self, index: u8) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{DiagnosticKind, EditSelection, SelectModifier, SelectionMode};

    #[test]
    fn test_select_modes() {
        let mut selection = EditSelection::new();
        assert!(selection.select(10, SelectModifier::None).is_none());
        assert_eq!(selection.focus(), Some(10));
        assert_eq!(selection.mode(), SelectionMode::Single);

        selection.select(12, SelectModifier::Toggle);
        assert_eq!(selection.indices().collect::<Vec<_>>(), vec![10, 12]);
        assert_eq!(selection.focus(), Some(12));
        assert!(selection.is_multi());

        selection.select(12, SelectModifier::Toggle);
        assert_eq!(selection.focus(), Some(10));
        assert!(!selection.is_multi());

        selection.select(5, SelectModifier::Range);
        assert_eq!(selection.indices().collect::<Vec<_>>(), vec![5, 6, 7, 8, 9, 10]);
        assert_eq!(selection.focus(), Some(5));

        selection.select(7, SelectModifier::None);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_focus_is_member() {
        let mut selection = EditSelection::new();
        for (index, modifier) in [
            (3, SelectModifier::Toggle),
            (3, SelectModifier::Toggle),
            (9, SelectModifier::Range),
            (4, SelectModifier::Toggle),
            (9, SelectModifier::Toggle),
        ] {
            selection.select(index, modifier);
            match selection.focus() {
                Some(focus) => assert!(selection.contains(focus)),
                None => assert!(selection.is_empty()),
            }
        }
    }

    #[test]
    fn test_clamp() {
        let mut selection = EditSelection::new();
        let diagnostic = selection.select(300, SelectModifier::None).unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::OutOfRangeSelection);
        assert_eq!(selection.focus(), Some(255));
    }

    #[test]
    fn test_multi_disabled() {
        let mut selection = EditSelection::new();
        selection.select(1, SelectModifier::None);
        selection.select(3, SelectModifier::Range);
        selection.set_multi_enabled(false);
        assert!(!selection.is_multi());
        selection.set_multi_enabled(true);
        assert!(selection.is_multi());
    }

    #[test]
    fn test_multi_disabled_survives_selection() {
        let mut selection = EditSelection::new();
        selection.select(1, SelectModifier::None);
        selection.select(3, SelectModifier::Range);
        selection.set_multi_enabled(false);

        selection.select(7, SelectModifier::Toggle);
        assert_eq!(selection.len(), 4);
        assert!(!selection.is_multi());
        assert_eq!(selection.mode(), SelectionMode::Single);

        selection.select(10, SelectModifier::Range);
        assert!(!selection.is_multi());

        selection.clear();
        selection.select(2, SelectModifier::None);
        selection.select(4, SelectModifier::Range);
        assert!(!selection.is_multi_enabled());
        assert!(!selection.is_multi());

        selection.set_multi_enabled(true);
        assert!(selection.is_multi());
    }
}
