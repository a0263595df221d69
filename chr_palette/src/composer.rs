use crate::{
    allowed_range, is_layer_keying, is_range_exempt, Category, CharacterId, Palette,
    SubPaletteLayer, PALETTE_LEN,
};

/// A composed palette, with the origin of each of its colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionResult {
    pub palette: Palette,
    /// For each index, the position (in the slice given to [`compose`]) of the layer that supplied the
    /// color, or [`None`] if it comes from the base palette
    pub provenance: [Option<usize>; PALETTE_LEN],
}

impl CompositionResult {
    pub fn supplied_by(&self, index: u8) -> Option<usize> {
        self.provenance[index as usize]
    }
}

/// The order layers are painted in: the third job base first, then the other layers starting from the
/// last inserted one. Painted later means higher priority.
fn paint_order(layers: &[SubPaletteLayer]) -> Vec<usize> {
    let mut order: Vec<usize> = layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| layer.active && layer.category == Category::ThirdJobBase)
        .map(|(position, _)| position)
        .collect();
    order.extend(
        layers
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, layer)| layer.active && layer.category != Category::ThirdJobBase)
            .map(|(position, _)| position),
    );
    order
}

/// Paint the active `layers` over `base`, each inside the index range its category is allowed to use
/// for `character`. A missing base is all black. Inactive layers are ignored.
pub fn compose(
    base: Option<&Palette>,
    layers: &[SubPaletteLayer],
    character: CharacterId,
) -> CompositionResult {
    let mut palette = base.cloned().unwrap_or_default();
    let mut provenance = [None; PALETTE_LEN];
    let mut changes = Vec::new();

    for position in paint_order(layers) {
        let layer = &layers[position];
        let range = allowed_range(character, layer.category);
        let exempt = is_range_exempt(character, layer.category);
        trace!(
            "painting the layer {:?} ({}) for {}",
            layer.name,
            layer.category,
            character
        );
        changes.clear();
        for (index, color) in layer.palette.iter() {
            if !exempt && !range.contains(index) {
                continue;
            }
            if is_layer_keying(color, index, character, layer.category) {
                continue;
            }
            changes.push((index, color));
            provenance[index as usize] = Some(position);
        }
        palette = palette.with_colors(changes.iter().copied());
    }

    CompositionResult {
        palette,
        provenance,
    }
}
