#[macro_use]
extern crate log;


mod palette_error;
pub use palette_error::PaletteError;

mod diagnostic;
pub use diagnostic::{Diagnostic, DiagnosticKind};

mod color;
pub use color::{hsv_to_rgb, rgb_to_hsv, Color, Hsv};

mod palette;
pub use palette::{Palette, PALETTE_FILE_LEN, PALETTE_LEN};

mod palette_store;
pub use palette_store::PaletteStore;

mod character;
pub use character::{Character, CharacterId, JobTier, Roster};

mod category;
pub use category::{Category, FASHION_NAMES};

mod range_table;
pub use range_table::{allowed_range, is_range_exempt, IndexRange};

mod keying;
pub use keying::{
    avoid_keying, is_green_padding, is_keying, is_keying_slot, is_layer_keying,
    is_universal_keying, KeyingAvoidance, KEYING_AVOIDANCE_STEPS,
};

mod sub_palette_layer;
pub use sub_palette_layer::SubPaletteLayer;

mod composer;
pub use composer::{compose, CompositionResult};

mod bmp;
pub use bmp::{is_indexed_bmp, read_indexed_bmp, IndexedBmp};

mod quantize;
pub use quantize::{quantize_median_cut, QuantizedImage};

mod indexed_frame;
pub use indexed_frame::IndexedFrame;

mod frame_renderer;
pub use frame_renderer::{
    is_transparent_index, render, render_indexed, render_rgba, IndexedView, RenderMode,
    RenderedFrame,
};

mod edit_selection;
pub use edit_selection::{EditSelection, SelectModifier, SelectionMode};

mod hsv_editor;
pub use hsv_editor::{
    relative_transform, Debouncer, EditOutcome, EditRequest, HsvEditor, DEBOUNCE_WINDOW,
};

mod icon_remapper;
pub use icon_remapper::{
    collect_source_colors, distribute_colors, find_icon_pairs, icon_key_color, icon_slots,
    remap_icon, shift_icon_palette, IconPair, ReferenceIcon, RemappedIcon,
};

mod exporter;
pub use exporter::{
    compose_boxed, export_all_frames, export_boxed, export_frame_indexed, export_frame_rgba,
    export_palette, BatchReport, BoxedKind, ExportSettings, PORTRAIT_SIZE, SHOP_SIZE,
};

mod config;
pub use config::{ExportKind, PathsConfig, SessionConfig, NO_LAYER};

mod asset_tree;
pub use asset_tree::{AssetTree, PaletteEntry, PaletteSource};

mod session;
pub use session::{EditCycle, Session};
