//! The host side of selection, focus and scaling.

use folio_layout::{MarqueeMode, PickResult, apply_marquee};
use folio_traits::DisplayHost;
use folio_types::NodeKey;
use std::collections::BTreeSet;

/// Drawables the user has selected, by key. Keys survive re-evaluation, so
/// the selection is kept across frames.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    keys: BTreeSet<NodeKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.keys.iter().copied()
    }

    pub fn select(&mut self, key: NodeKey) {
        self.keys.insert(key);
    }

    pub fn deselect(&mut self, key: NodeKey) {
        self.keys.remove(&key);
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// A click: replaces the selection with the hit, or toggles the hit when
    /// `additive`. Clicking empty space clears unless `additive`.
    pub fn apply_pick(&mut self, hit: Option<&PickResult>, additive: bool) {
        match (hit, additive) {
            (Some(hit), true) => apply_marquee(&mut self.keys, [hit.key], MarqueeMode::Toggle),
            (Some(hit), false) => apply_marquee(&mut self.keys, [hit.key], MarqueeMode::Replace),
            (None, true) => {}
            (None, false) => self.keys.clear(),
        }
    }

    /// A rubber-band selection over everything a rectangle pick returned.
    pub fn apply_rect(&mut self, hits: &[PickResult], mode: MarqueeMode) {
        apply_marquee(&mut self.keys, hits.iter().map(|h| h.key), mode);
    }
}

/// The display collaborator handed to every pass.
#[derive(Debug, Clone)]
pub struct Display {
    pub selection: Selection,
    pub focused: Option<NodeKey>,
    pub zoom: f32,
    /// Resolution factor used while printing.
    pub printer_resolution: f32,
    pub printing: bool,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            focused: None,
            zoom: 1.0,
            printer_resolution: 1.0,
            printing: false,
        }
    }
}

impl Display {
    pub fn with_zoom(zoom: f32) -> Self {
        Self {
            zoom,
            ..Self::default()
        }
    }
}

impl DisplayHost for Display {
    fn selected(&self, key: NodeKey) -> u32 {
        u32::from(self.selection.contains(key))
    }

    fn request_focus(&mut self, key: NodeKey) {
        if self.focused != Some(key) {
            log::debug!("Focus moves to {:?}", key);
        }
        self.focused = Some(key);
    }

    fn font_scaling(&self) -> f32 {
        if self.printing { 1.0 } else { self.zoom }
    }

    fn printer_scaling(&self) -> f32 {
        if self.printing { self.printer_resolution } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_layout::LayoutTree;
    use folio_render_core::{SelectionCategory, SelectionId};

    fn hit(key: u64) -> PickResult {
        PickResult {
            id: SelectionId::new(1, SelectionCategory::Plain),
            drawable: LayoutTree::default().root(),
            key: NodeKey(key),
            category: SelectionCategory::Plain,
            depth: 0.0,
            char_index: None,
            corner: None,
            container: None,
        }
    }

    #[test]
    fn click_replaces_and_shift_click_toggles() {
        let mut selection = Selection::new();
        selection.apply_pick(Some(&hit(1)), false);
        selection.apply_pick(Some(&hit(2)), true);
        assert_eq!(selection.keys().collect::<Vec<_>>(), vec![NodeKey(1), NodeKey(2)]);

        selection.apply_pick(Some(&hit(1)), true);
        assert_eq!(selection.keys().collect::<Vec<_>>(), vec![NodeKey(2)]);

        selection.apply_pick(None, true);
        assert_eq!(selection.len(), 1);
        selection.apply_pick(None, false);
        assert!(selection.is_empty());
    }

    #[test]
    fn printing_swaps_zoom_for_printer_resolution() {
        let mut display = Display::with_zoom(2.0);
        assert_eq!(display.font_scaling(), 2.0);
        assert_eq!(display.printer_scaling(), 1.0);

        display.printing = true;
        display.printer_resolution = 4.0;
        assert_eq!(display.font_scaling(), 1.0);
        assert_eq!(display.printer_scaling(), 4.0);
    }
}
