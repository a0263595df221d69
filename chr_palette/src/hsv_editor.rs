use std::time::{Duration, Instant};

use crate::{
    avoid_keying, hsv_to_rgb, rgb_to_hsv, CharacterId, Color, Diagnostic, DiagnosticKind,
    EditSelection, Hsv, KeyingAvoidance, PaletteError, SelectModifier, SubPaletteLayer,
};

/// Input changes closer than this are merged into a single apply
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(16);

/// Below this focus saturation (or value), the relative transform is additive for every target
const FOCUS_ADDITIVE_THRESHOLD: f64 = 1.0;
/// Below this target saturation (or value), the target is shifted instead of scaled
const TARGET_ADDITIVE_THRESHOLD: f64 = 2.0;

/// Merge rapid inputs. The first value queued in a window set its deadline, later values replace it.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn submit(&mut self, value: T, now: Instant) {
        let deadline = match self.pending.take() {
            Some((deadline, _)) => deadline,
            None => now + self.window,
        };
        self.pending = Some((deadline, value));
    }

    /// Return the pending value once its window elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    /// Return the pending value right away, whatever the deadline
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A color change asked by the user
#[derive(Debug, Clone, PartialEq)]
pub enum EditRequest {
    Hsv(Hsv),
    Rgb(Color),
    Hex(String),
}

/// What an apply changed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditOutcome {
    /// The new color of each rewritten index
    pub changed: Vec<(u8, Color)>,
    pub diagnostics: Vec<Diagnostic>,
    /// The slider values matching the focus after the write-back
    pub focus_hsv: Option<Hsv>,
}

/// Shift (or scale) a saturation or value component of `target` by the move from `focus` to `slider`
fn relative_component(focus: f64, slider: f64, target: f64) -> f64 {
    let result = if focus <= FOCUS_ADDITIVE_THRESHOLD || target <= TARGET_ADDITIVE_THRESHOLD {
        target + (slider - focus)
    } else {
        target * (slider / focus)
    };
    result.clamp(0.0, 100.0)
}

/// Move `target` the way the sliders moved from `focus`
pub fn relative_transform(focus: Hsv, sliders: Hsv, target: Hsv) -> Hsv {
    Hsv {
        h: (target.h + (sliders.h - focus.h)).rem_euclid(360.0),
        s: relative_component(focus.s, sliders.s, target.s),
        v: relative_component(focus.v, sliders.v, target.v),
    }
}

/// Edit the colors of one layer. Single selections are set to the exact slider color, multi selections
/// move relatively to the focus. RGB and hex colors are written to every selected index.
/// Written colors are never keying colors.
#[derive(Debug)]
pub struct HsvEditor {
    character: CharacterId,
    pub selection: EditSelection,
    debouncer: Debouncer<EditRequest>,
    /// Slider values pushed back to the input after a write-back. The same values coming back are
    /// not a user input, and are dropped.
    published: Option<Hsv>,
}

impl HsvEditor {
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            selection: EditSelection::new(),
            debouncer: Debouncer::new(DEBOUNCE_WINDOW),
            published: None,
        }
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    pub fn select(&mut self, index: usize, modifier: SelectModifier) -> Option<Diagnostic> {
        self.selection.select(index, modifier)
    }

    pub fn focus_hsv(&self, layer: &SubPaletteLayer) -> Option<Hsv> {
        self.selection
            .focus()
            .map(|focus| rgb_to_hsv(layer.palette.get(focus)))
    }

    /// Push a write-back candidate through keying avoidance
    fn write_candidate(
        &self,
        index: u8,
        candidate: Color,
        outcome: &mut EditOutcome,
    ) {
        let avoided = avoid_keying(candidate, self.character);
        match avoided {
            KeyingAvoidance::Unchanged(_) => (),
            KeyingAvoidance::Nudged(color) => trace!(
                "moved {} to {} at index {} to avoid keying",
                candidate.to_hex(),
                color.to_hex(),
                index
            ),
            KeyingAvoidance::Exhausted(color) => outcome.diagnostics.push(Diagnostic::new(
                DiagnosticKind::KeyingAvoidanceExhausted,
                index.to_string(),
                format!(
                    "no color close to {} is usable, {} was used instead",
                    candidate.to_hex(),
                    color.to_hex()
                ),
            )),
        }
        outcome.changed.push((index, avoided.color()));
    }

    fn finish(&mut self, layer: &mut SubPaletteLayer, mut outcome: EditOutcome) -> EditOutcome {
        if !outcome.changed.is_empty() {
            layer.palette = layer.palette.with_colors(outcome.changed.iter().copied());
        }
        outcome.focus_hsv = self.focus_hsv(layer);
        self.published = outcome.focus_hsv;
        outcome
    }

    pub fn apply_hsv(&mut self, layer: &mut SubPaletteLayer, sliders: Hsv) -> EditOutcome {
        let sliders = sliders.clamped();
        let mut outcome = EditOutcome::default();
        let focus = match self.selection.focus() {
            Some(focus) => focus,
            None => return outcome,
        };

        if !self.selection.is_multi() {
            self.write_candidate(focus, hsv_to_rgb(sliders), &mut outcome);
            return self.finish(layer, outcome);
        }

        let focus_hsv = rgb_to_hsv(layer.palette.get(focus));
        for index in self.selection.indices() {
            let target = rgb_to_hsv(layer.palette.get(index));
            let moved = relative_transform(focus_hsv, sliders, target);
            if moved == target {
                continue;
            }
            self.write_candidate(index, hsv_to_rgb(moved), &mut outcome);
        }
        debug!(
            "relative edit of {} indices of {:?}, {} changed",
            self.selection.len(),
            layer.name,
            outcome.changed.len()
        );
        self.finish(layer, outcome)
    }

    /// Set the focus and every selected index to the same color
    pub fn apply_rgb(&mut self, layer: &mut SubPaletteLayer, color: Color) -> EditOutcome {
        let mut outcome = EditOutcome::default();
        // absolute colors ignore the multi flag, it only drives slider edits
        let indices: Vec<u8> = self.selection.indices().collect();
        for index in indices {
            self.write_candidate(index, color, &mut outcome);
        }
        self.finish(layer, outcome)
    }

    pub fn apply_hex(
        &mut self,
        layer: &mut SubPaletteLayer,
        hex: &str,
    ) -> Result<EditOutcome, PaletteError> {
        let color = Color::from_hex(hex)?;
        Ok(self.apply_rgb(layer, color))
    }

    pub fn apply(
        &mut self,
        layer: &mut SubPaletteLayer,
        request: EditRequest,
    ) -> Result<EditOutcome, PaletteError> {
        match request {
            EditRequest::Hsv(hsv) => Ok(self.apply_hsv(layer, hsv)),
            EditRequest::Rgb(color) => Ok(self.apply_rgb(layer, color)),
            EditRequest::Hex(hex) => self.apply_hex(layer, &hex),
        }
    }

    /// Queue an input for the next debounced apply. Return false when the input is only the echo of
    /// the slider values published by the last write-back.
    pub fn input(&mut self, request: EditRequest, now: Instant) -> bool {
        if let (EditRequest::Hsv(hsv), Some(published)) = (&request, self.published) {
            if *hsv == published {
                self.published = None;
                return false;
            }
        }
        self.debouncer.submit(request, now);
        true
    }

    /// Apply the queued input if its window elapsed. Called while dragging.
    pub fn poll(
        &mut self,
        layer: &mut SubPaletteLayer,
        now: Instant,
    ) -> Option<Result<EditOutcome, PaletteError>> {
        let request = self.debouncer.poll(now)?;
        Some(self.apply(layer, request))
    }

    /// Apply the queued input right away. Called when the input is released.
    pub fn release(
        &mut self,
        layer: &mut SubPaletteLayer,
    ) -> Option<Result<EditOutcome, PaletteError>> {
        let request = self.debouncer.flush()?;
        Some(self.apply(layer, request))
    }

    pub fn has_pending_input(&self) -> bool {
        self.debouncer.is_pending()
    }
}
