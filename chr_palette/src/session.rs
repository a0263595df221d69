use std::{path::PathBuf, time::Instant};

use image::RgbaImage;

use crate::{
    compose, export_palette, render_rgba, AssetTree, Category, Character, Color,
    CompositionResult, Diagnostic, DiagnosticKind, EditOutcome, EditRequest, ExportKind,
    ExportSettings, HsvEditor, IndexedFrame, Palette, PaletteError, PaletteStore, SessionConfig,
    SubPaletteLayer,
};

/// What one apply cycle produced, in the order it was produced: the layer was updated first, then
/// the palette was composed again, then the frame rendered again.
#[derive(Debug, Clone)]
pub struct EditCycle {
    pub outcome: EditOutcome,
    pub composed: Palette,
    /// [`None`] when no frame is loaded
    pub rendered: Option<RgbaImage>,
}

/// The state of one preview and edit session. It owns the layers; nothing else mutates them.
#[derive(Debug)]
pub struct Session {
    character: Character,
    /// Replaces the palette of the frame as the composition base when set
    base: Option<Palette>,
    layers: Vec<SubPaletteLayer>,
    frame_paths: Vec<PathBuf>,
    frame_number: usize,
    frame: Option<IndexedFrame>,
    composition: Option<CompositionResult>,
    background: Color,
    editor: HsvEditor,
    edited: Option<Category>,
}

impl Session {
    pub fn new(character: Character) -> Self {
        let editor = HsvEditor::new(character.palette_id());
        Self {
            character,
            base: None,
            layers: Vec::new(),
            frame_paths: Vec::new(),
            frame_number: 0,
            frame: None,
            composition: None,
            background: Color::WHITE,
            editor,
            edited: None,
        }
    }

    /// Set a session up from its configuration: layers are loaded from the asset tree and the first
    /// frame is selected. Missing or invalid assets are reported and left out.
    pub fn from_config(
        character: Character,
        config: &SessionConfig,
        tree: &AssetTree,
        store: &mut PaletteStore,
    ) -> Result<(Self, Vec<Diagnostic>), PaletteError> {
        let mut session = Self::new(character);
        let mut diagnostics = Vec::new();
        session.set_background(config.background_color());
        for (category, name) in config.selected_layers()? {
            match tree.load_layer(store, session.character.id, category, &name) {
                Ok(layer) => {
                    session.set_layer(layer);
                }
                Err(err) => diagnostics.push(Diagnostic::from_error(
                    &err,
                    format!("{} layer {:?}", category, name),
                )),
            }
        }
        match tree.frame_paths(session.character.id) {
            Ok(paths) => {
                session.set_frame_paths(paths);
                if !session.frame_paths.is_empty() {
                    if let Err(err) = session.select_frame(0) {
                        diagnostics.push(Diagnostic::from_error(&err, "frame 0"));
                    }
                }
            }
            Err(err) => diagnostics.push(Diagnostic::from_error(&err, "frames")),
        }
        Ok((session, diagnostics))
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    fn invalidate(&mut self) {
        self.composition = None;
    }

    /// Replace the composition base. [`None`] uses the palette of the current frame.
    pub fn set_base(&mut self, base: Option<Palette>) {
        self.base = base;
        self.invalidate();
    }

    /// The explicit base, or the palette of the current frame, or black
    pub fn base_palette(&self) -> Palette {
        match (&self.base, &self.frame) {
            (Some(base), _) => base.clone(),
            (None, Some(frame)) => frame.original_palette().clone(),
            (None, None) => Palette::default(),
        }
    }

    pub fn layers(&self) -> &[SubPaletteLayer] {
        &self.layers
    }

    pub fn layer(&self, category: Category) -> Option<&SubPaletteLayer> {
        self.layers.iter().find(|layer| layer.category == category)
    }

    fn layer_position(&self, category: Category) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.category == category)
    }

    /// Use `layer` for its category, replacing the previous one in place. Return false if the
    /// category doesn't apply to this character (third job base of an aliased character).
    pub fn set_layer(&mut self, layer: SubPaletteLayer) -> bool {
        if layer.category == Category::ThirdJobBase && !self.character.allows_third_job_base() {
            debug!(
                "ignored the third job base layer {:?} for {}",
                layer.name, self.character.id
            );
            return false;
        }
        match self.layer_position(layer.category) {
            Some(position) => self.layers[position] = layer,
            None => self.layers.push(layer),
        }
        self.invalidate();
        true
    }

    pub fn remove_layer(&mut self, category: Category) -> Option<SubPaletteLayer> {
        let position = self.layer_position(category)?;
        if self.edited == Some(category) {
            self.edited = None;
        }
        self.invalidate();
        Some(self.layers.remove(position))
    }

    pub fn set_layer_active(&mut self, category: Category, active: bool) -> bool {
        match self.layer_position(category) {
            Some(position) => {
                self.layers[position].active = active;
                self.invalidate();
                true
            }
            None => false,
        }
    }

    pub fn set_frame_paths(&mut self, paths: Vec<PathBuf>) {
        self.frame_paths = paths;
        self.frame_number = 0;
    }

    pub fn frame_paths(&self) -> &[PathBuf] {
        &self.frame_paths
    }

    pub fn frame_number(&self) -> usize {
        self.frame_number
    }

    pub fn frame(&self) -> Option<&IndexedFrame> {
        self.frame.as_ref()
    }

    /// Use a frame that doesn't come from the frame list
    pub fn set_frame(&mut self, frame: IndexedFrame) {
        self.frame = Some(frame);
        self.invalidate();
    }

    /// Load the frame with this number. A number past the last frame is clamped to the last frame,
    /// with a notice.
    pub fn select_frame(&mut self, number: usize) -> Result<Option<Diagnostic>, PaletteError> {
        let last = match self.frame_paths.len().checked_sub(1) {
            Some(last) => last,
            None => {
                return Err(PaletteError::MissingAsset(PathBuf::from(
                    self.character.image_id().wire_name(),
                )))
            }
        };
        let diagnostic = if number > last {
            Some(Diagnostic::new(
                DiagnosticKind::OutOfRangeSelection,
                format!("frame {}", number),
                format!("there are only {} frames, the last one is shown", last + 1),
            ))
        } else {
            None
        };
        let number = number.min(last);
        let frame = IndexedFrame::load(&self.frame_paths[number])?;
        self.frame_number = number;
        self.set_frame(frame);
        Ok(diagnostic)
    }

    /// The composition of the current base and layers, computed again only after a change
    pub fn composition(&mut self) -> &CompositionResult {
        let composition = match self.composition.take() {
            Some(composition) => composition,
            None => {
                trace!("composing {} layers", self.layers.len());
                compose(
                    Some(&self.base_palette()),
                    &self.layers,
                    self.character.palette_id(),
                )
            }
        };
        self.composition.insert(composition)
    }

    pub fn composed_palette(&mut self) -> Palette {
        self.composition().palette.clone()
    }

    /// Render the current frame with the composed palette
    pub fn render(&mut self) -> Option<RgbaImage> {
        let composed = self.composed_palette();
        let frame = self.frame.as_ref()?;
        Some(render_rgba(frame, &composed, self.character.palette_id()))
    }

    /// Encode the current frame (or the composed palette) as the settings ask
    pub fn export(&mut self, settings: &ExportSettings) -> Result<Vec<u8>, PaletteError> {
        let composed = self.composed_palette();
        match &self.frame {
            Some(frame) => settings.encode_frame(frame, &composed, self.character.palette_id()),
            None if settings.kind == ExportKind::PaletteBlob => Ok(export_palette(&composed)),
            None => Err(PaletteError::MissingAsset(PathBuf::from(
                self.character.image_id().wire_name(),
            ))),
        }
    }

    /// Target the layer of this category with the editor. The selection is cleared.
    pub fn edit_layer(&mut self, category: Category) -> bool {
        if self.layer_position(category).is_none() {
            return false;
        }
        self.edited = Some(category);
        self.editor.selection.clear();
        true
    }

    pub fn edited_layer(&self) -> Option<&SubPaletteLayer> {
        self.layer(self.edited?)
    }

    pub fn editor(&self) -> &HsvEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut HsvEditor {
        &mut self.editor
    }

    /// An immutable copy of the edited layer, for the icon remapper
    pub fn snapshot(&self) -> Option<SubPaletteLayer> {
        self.edited_layer().cloned()
    }

    fn finish_cycle(&mut self, outcome: EditOutcome) -> EditCycle {
        if !outcome.changed.is_empty() {
            self.invalidate();
        }
        let composed = self.composed_palette();
        let rendered = self
            .frame
            .as_ref()
            .map(|frame| render_rgba(frame, &composed, self.character.palette_id()));
        EditCycle {
            outcome,
            composed,
            rendered,
        }
    }

    /// Apply an edit to the edited layer right away, then compose and render again.
    /// Return [`None`] if no layer is being edited.
    pub fn apply_edit(
        &mut self,
        request: EditRequest,
    ) -> Option<Result<EditCycle, PaletteError>> {
        let position = self.layer_position(self.edited?)?;
        let outcome = match self.editor.apply(&mut self.layers[position], request) {
            Ok(outcome) => outcome,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(self.finish_cycle(outcome)))
    }

    /// Queue an input from a slider or a text field. See [`HsvEditor::input`].
    pub fn input(&mut self, request: EditRequest, now: Instant) -> bool {
        self.editor.input(request, now)
    }

    /// Run the queued input once its debounce window is over
    pub fn poll(&mut self, now: Instant) -> Option<Result<EditCycle, PaletteError>> {
        let position = self.layer_position(self.edited?)?;
        let outcome = match self.editor.poll(&mut self.layers[position], now)? {
            Ok(outcome) => outcome,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(self.finish_cycle(outcome)))
    }

    /// Run the queued input now, the input was released
    pub fn release(&mut self) -> Option<Result<EditCycle, PaletteError>> {
        let position = self.layer_position(self.edited?)?;
        let outcome = match self.editor.release(&mut self.layers[position])? {
            Ok(outcome) => outcome,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(self.finish_cycle(outcome)))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        time::{Duration, Instant},
    };

    use image::{ImageBuffer, Luma};

    use crate::{
        AssetTree, Category, Character, CharacterId, Color, DiagnosticKind, EditRequest,
        IndexedFrame, JobTier, Palette, PaletteStore, SelectModifier, Session, SessionConfig,
        SubPaletteLayer,
    };

    fn character(number: u16, tier: JobTier) -> Character {
        Character {
            id: CharacterId::new(number).unwrap(),
            name: "test".to_string(),
            tier,
        }
    }

    fn layer(category: Category, index: u8, color: Color) -> SubPaletteLayer {
        SubPaletteLayer::new(
            category.key(),
            Palette::default().with_color(index, color),
            category,
        )
    }

    #[test]
    fn test_lazy_composition() {
        let mut session = Session::new(character(1, JobTier::First));
        session.set_base(Some(Palette::default().with_color(111, Color::new(10, 10, 10))));
        assert_eq!(session.composed_palette().get(111), Color::new(10, 10, 10));

        assert!(session.set_layer(layer(Category::Fashion(1), 111, Color::new(255, 128, 0))));
        assert_eq!(session.composed_palette().get(111), Color::new(255, 128, 0));
        assert_eq!(session.composition().supplied_by(111), Some(0));

        assert!(session.set_layer(layer(Category::Fashion(1), 111, Color::new(1, 2, 3))));
        assert_eq!(session.layers().len(), 1);
        assert_eq!(session.composed_palette().get(111), Color::new(1, 2, 3));

        session.set_layer_active(Category::Fashion(1), false);
        assert_eq!(session.composed_palette().get(111), Color::new(10, 10, 10));
        assert!(session.remove_layer(Category::Fashion(1)).is_some());
        assert!(session.layers().is_empty());
    }

    #[test]
    fn test_third_job_base_filtering() {
        let mut third = Session::new(character(3, JobTier::Third));
        assert!(third.set_layer(layer(Category::ThirdJobBase, 50, Color::WHITE)));
        let mut aliased = Session::new(character(25, JobTier::Third));
        assert!(!aliased.set_layer(layer(Category::ThirdJobBase, 50, Color::WHITE)));
        assert!(aliased.layers().is_empty());
        let mut second = Session::new(character(3, JobTier::Second));
        assert!(!second.set_layer(layer(Category::ThirdJobBase, 50, Color::WHITE)));
    }

    #[test]
    fn test_apply_edit_cycle() {
        let mut session = Session::new(character(1, JobTier::First));
        let frame = IndexedFrame::new(1, 1, vec![20], Palette::default()).unwrap();
        session.set_frame(frame);
        session.set_layer(layer(Category::Hair, 20, Color::new(200, 0, 0)));
        assert!(session.apply_edit(EditRequest::Rgb(Color::WHITE)).is_none());
        assert!(session.edit_layer(Category::Hair));
        session.editor_mut().select(20, SelectModifier::None);

        let cycle = session
            .apply_edit(EditRequest::Hex("#0000ff".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(cycle.outcome.changed, vec![(20, Color::new(0, 0, 255))]);
        assert_eq!(session.edited_layer().unwrap().palette.get(20), Color::new(0, 0, 255));
        assert_eq!(cycle.composed.get(20), Color::new(0, 0, 255));
        assert_eq!(
            cycle.rendered.unwrap().get_pixel(0, 0).0,
            [0, 0, 255, 255]
        );
        assert!(session
            .apply_edit(EditRequest::Hex("nope".to_string()))
            .unwrap()
            .is_err());
    }

    #[test]
    fn test_debounced_input() {
        let mut session = Session::new(character(1, JobTier::First));
        session.set_layer(layer(Category::Hair, 20, Color::new(200, 0, 0)));
        session.edit_layer(Category::Hair);
        session.editor_mut().select(20, SelectModifier::None);
        let start = Instant::now();
        assert!(session.input(EditRequest::Rgb(Color::new(1, 1, 1)), start));
        assert!(session.input(EditRequest::Rgb(Color::new(2, 2, 2)), start));
        assert!(session.poll(start).is_none());
        let cycle = session
            .poll(start + Duration::from_millis(20))
            .unwrap()
            .unwrap();
        assert_eq!(cycle.outcome.changed, vec![(20, Color::new(2, 2, 2))]);
        assert!(session.release().is_none());

        session.input(EditRequest::Rgb(Color::new(3, 3, 3)), start);
        let cycle = session.release().unwrap().unwrap();
        assert_eq!(cycle.composed.get(20), Color::new(3, 3, 3));
    }

    #[test]
    fn test_from_config_and_frame_selection() {
        let dir = tempfile::tempdir().unwrap();
        let tree = AssetTree::new(
            dir.path().join("frames"),
            dir.path().join("vanilla"),
            dir.path().join("custom"),
        );
        let hair_dir = dir.path().join("vanilla/hair/chr001");
        fs::create_dir_all(&hair_dir).unwrap();
        fs::write(
            hair_dir.join("red.pal"),
            Palette::default().with_color(20, Color::new(250, 0, 0)).to_bytes(),
        )
        .unwrap();
        let frames_dir = dir.path().join("frames/chr001");
        fs::create_dir_all(&frames_dir).unwrap();
        for (name, index) in [("0.png", 20u8), ("1.png", 21)] {
            let image: ImageBuffer<Luma<u8>, Vec<u8>> =
                ImageBuffer::from_pixel(1, 1, Luma([index]));
            image.save(frames_dir.join(name)).unwrap();
        }

        let mut config = SessionConfig::new(CharacterId::new(1).unwrap());
        config.layers.insert("hair".to_string(), "red".to_string());
        config.layers.insert("fashion_2".to_string(), "missing".to_string());
        let mut store = PaletteStore::new();
        let (mut session, diagnostics) = Session::from_config(
            character(1, JobTier::First),
            &config,
            &tree,
            &mut store,
        )
        .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingAsset);
        assert_eq!(session.layers().len(), 1);
        assert_eq!(session.frame_paths().len(), 2);
        assert!(session.frame().is_some());
        assert_eq!(session.composed_palette().get(20), Color::new(250, 0, 0));

        let notice = session.select_frame(7).unwrap().unwrap();
        assert_eq!(notice.kind, DiagnosticKind::OutOfRangeSelection);
        assert_eq!(session.frame_number(), 1);
        assert!(session.select_frame(0).unwrap().is_none());
        assert_eq!(session.frame_number(), 0);
    }
}
