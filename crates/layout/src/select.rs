//! Identify bookkeeping and pick resolution.
//!
//! An identify pass hands every visited drawable a fresh id and remembers
//! what it stands for. Reading back the id+depth target gives hit records;
//! the [`Picker`] turns them into drawables, characters or handle corners.

use crate::drawable::Drawable;
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_render_core::{HitRecord, SelectionCategory, SelectionId};
use folio_traits::DisplayHost;
use folio_types::NodeKey;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Corner of a selection highlight carrying an automatic resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::TopLeft, Corner::TopRight, Corner::BottomRight, Corner::BottomLeft];
}

/// What one identify id stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifyEntry {
    pub drawable: DrawableId,
    pub key: NodeKey,
    /// Nearest enclosing layout at the time of the pass.
    pub container: Option<DrawableId>,
    /// Character within a text drawable, for character ids.
    pub char_index: Option<usize>,
    /// Set for the automatic handles around a selected drawable.
    pub corner: Option<Corner>,
}

impl IdentifyEntry {
    pub fn new(drawable: DrawableId, key: NodeKey, container: Option<DrawableId>) -> Self {
        Self {
            drawable,
            key,
            container,
            char_index: None,
            corner: None,
        }
    }
}

/// Ids assigned during one identify pass. Serials start at 1 for every pass.
#[derive(Debug, Default, Clone)]
pub struct IdentifyMap {
    entries: BTreeMap<SelectionId, IdentifyEntry>,
    next: u32,
}

impl IdentifyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next id. Returns [`SelectionId::INVALID`] once the
    /// serial space is exhausted; such submissions are never hit.
    pub fn assign(&mut self, entry: IdentifyEntry, category: SelectionCategory) -> SelectionId {
        if self.next >= SelectionId::MAX_SERIAL {
            log::warn!("Identify pass ran out of selection ids at {:?}", entry.drawable);
            return SelectionId::INVALID;
        }
        self.next += 1;
        let id = SelectionId::new(self.next, category);
        self.entries.insert(id, entry);
        id
    }

    pub fn get(&self, id: SelectionId) -> Option<&IdentifyEntry> {
        self.entries.get(&id)
    }

    /// The serial the next assignment will build on.
    pub fn next_serial(&self) -> u32 {
        self.next
    }

    /// Forgets every id assigned after `serial`. Serials keep counting
    /// up, so a forgotten id is never handed out again in this pass.
    pub fn forget_after(&mut self, serial: u32) {
        self.entries.retain(|id, _| id.serial() <= serial);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SelectionId, &IdentifyEntry)> {
        self.entries.iter()
    }
}

/// A resolved hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub id: SelectionId,
    pub drawable: DrawableId,
    pub key: NodeKey,
    pub category: SelectionCategory,
    pub depth: f32,
    pub char_index: Option<usize>,
    pub corner: Option<Corner>,
    pub container: Option<DrawableId>,
}

/// Resolves hit records against the map of the pass that produced them.
pub struct Picker<'m> {
    map: &'m IdentifyMap,
}

impl<'m> Picker<'m> {
    pub fn new(map: &'m IdentifyMap) -> Self {
        Self { map }
    }

    fn resolve(&self, hit: &HitRecord) -> Option<PickResult> {
        let entry = self.map.get(hit.id)?;
        Some(PickResult {
            id: hit.id,
            drawable: entry.drawable,
            key: entry.key,
            category: hit.id.category(),
            depth: hit.min_depth,
            char_index: entry.char_index,
            corner: entry.corner,
            container: entry.container,
        })
    }

    /// The single best hit: handles first, then the nearest, then the more
    /// specific category, then whatever was submitted last.
    pub fn pick(&self, hits: &[HitRecord]) -> Option<PickResult> {
        hits.iter()
            .filter(|h| self.map.get(h.id).is_some())
            .min_by(|a, b| rank(a, b))
            .and_then(|h| self.resolve(h))
    }

    /// Every distinct drawable touched, nearest first. Character and
    /// handle-corner hits resolve to their drawable; table decorations are
    /// left out.
    pub fn candidates(&self, hits: &[HitRecord]) -> Vec<PickResult> {
        let mut sorted: Vec<&HitRecord> = hits.iter().collect();
        sorted.sort_by(|a, b| {
            a.min_depth
                .partial_cmp(&b.min_depth)
                .unwrap_or(Ordering::Equal)
                .then(b.order.cmp(&a.order))
        });
        let mut seen = HashSet::new();
        sorted
            .into_iter()
            .filter(|h| h.id.category() != SelectionCategory::Container)
            .filter_map(|h| self.resolve(h))
            .filter(|r| seen.insert(r.drawable))
            .collect()
    }

    /// The layout enclosing the hit drawable, for group selection.
    pub fn container_of(&self, tree: &LayoutTree, result: &PickResult) -> Option<DrawableId> {
        if let Some(container) = result.container.filter(|c| tree.contains(*c)) {
            return Some(container);
        }
        let mut current = tree.parent(result.drawable);
        while let Some(id) = current {
            if matches!(tree.get(id), Ok(Drawable::Layout(_))) {
                return Some(id);
            }
            current = tree.parent(id);
        }
        None
    }
}

fn rank(a: &HitRecord, b: &HitRecord) -> Ordering {
    let handle = |h: &HitRecord| h.id.category() != SelectionCategory::Handle;
    handle(a)
        .cmp(&handle(b))
        .then(a.min_depth.partial_cmp(&b.min_depth).unwrap_or(Ordering::Equal))
        .then(b.id.category().pick_priority().cmp(&a.id.category().pick_priority()))
        .then(b.order.cmp(&a.order))
}

/// How a rectangle pick combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarqueeMode {
    #[default]
    Replace,
    Add,
    Subtract,
    Toggle,
}

/// Applies a rectangle pick to a selection set.
pub fn apply_marquee(
    selection: &mut BTreeSet<NodeKey>,
    picked: impl IntoIterator<Item = NodeKey>,
    mode: MarqueeMode,
) {
    if mode == MarqueeMode::Replace {
        selection.clear();
    }
    for key in picked {
        match mode {
            MarqueeMode::Replace | MarqueeMode::Add => {
                selection.insert(key);
            }
            MarqueeMode::Subtract => {
                selection.remove(&key);
            }
            MarqueeMode::Toggle => {
                if !selection.remove(&key) {
                    selection.insert(key);
                }
            }
        }
    }
}

impl LayoutTree {
    /// How many times the host reports `id` as selected.
    pub fn selected(&self, id: DrawableId, display: &dyn DisplayHost) -> Result<u32, LayoutError> {
        Ok(display.selected(self.key(id)?))
    }

    /// Summed selection count of everything owned by `id`, at any depth.
    pub fn children_selected(&self, id: DrawableId, display: &dyn DisplayHost) -> Result<u32, LayoutError> {
        self.get(id)?;
        let mut count = 0u32;
        let mut stack = self.owned(id);
        while let Some(current) = stack.pop() {
            if let Ok(key) = self.key(current) {
                count = count.saturating_add(display.selected(key));
            }
            stack.extend(self.owned(current));
        }
        Ok(count)
    }
}
