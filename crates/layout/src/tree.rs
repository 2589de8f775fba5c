//! Arena storage for drawables.
//!
//! Every drawable lives in a slot addressed by a [`DrawableId`]. Ids carry a
//! generation counter, so an id kept across a clear or a removal is detected
//! as stale instead of silently reaching a reused slot. Parent links are ids
//! as well; nothing in the tree holds a pointer to anything else.

use crate::config::LayoutConfig;
use crate::drawable::Drawable;
use crate::flow::FlowRegistry;
use crate::layout::Layout;
use crate::LayoutError;
use folio_types::{FlowName, NodeKey, RefreshName};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId {
    idx: u32,
    generation: u32,
}

impl DrawableId {
    /// Returns the raw slot index (for diagnostics only).
    pub const fn index(self) -> u32 {
        self.idx
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawableId({}@gen{})", self.idx, self.generation)
    }
}

#[derive(Debug)]
pub struct Node {
    pub drawable: Drawable,
    /// The container that owns this drawable; `None` only for the root.
    /// Flow items are owned by the layout that recorded them.
    pub parent: Option<DrawableId>,
    pub key: NodeKey,
    /// Set for items owned by a text flow.
    pub flow: Option<FlowName>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
pub struct LayoutTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    root: DrawableId,
    keys: HashMap<NodeKey, DrawableId>,
    pub(crate) names: HashMap<RefreshName, Vec<DrawableId>>,
    pub(crate) flows: FlowRegistry,
    config: LayoutConfig,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

/// Key of the root layout. Never zero: the mixer below maps zero to zero.
const ROOT_KEY: NodeKey = NodeKey(0x243F_6A88_85A3_08D3);

/// Mixes a container key with a slot number into a child key.
///
/// Keys depend only on where a drawable was added, so re-evaluating the
/// same content after a clear reproduces the same keys. The slot is offset
/// by one so a first child never shares its parent's key.
pub(crate) fn derive_key(parent: NodeKey, slot: u64) -> NodeKey {
    let mut z = parent
        .0
        .rotate_left(17)
        .wrapping_add((slot + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    NodeKey(z ^ (z >> 31))
}

/// Stable key base for a named flow.
pub(crate) fn name_key(name: &str) -> NodeKey {
    let hash = name
        .bytes()
        .fold(0xCBF2_9CE4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01B3));
    NodeKey(hash)
}

impl LayoutTree {
    pub fn new(config: LayoutConfig) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: DrawableId { idx: 0, generation: 0 },
            keys: HashMap::new(),
            names: HashMap::new(),
            flows: FlowRegistry::default(),
            config,
        };
        tree.root = tree.alloc(Drawable::Layout(Layout::new()), None, ROOT_KEY, None);
        tree
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn root(&self) -> DrawableId {
        self.root
    }

    /// Number of live drawables, the root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn contains(&self, id: DrawableId) -> bool {
        self.slots
            .get(id.idx as usize)
            .is_some_and(|s| s.generation == id.generation && s.node.is_some())
    }

    pub fn node(&self, id: DrawableId) -> Result<&Node, LayoutError> {
        self.slots
            .get(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or(LayoutError::StaleId(id))
    }

    pub fn node_mut(&mut self, id: DrawableId) -> Result<&mut Node, LayoutError> {
        self.slots
            .get_mut(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or(LayoutError::StaleId(id))
    }

    pub fn get(&self, id: DrawableId) -> Result<&Drawable, LayoutError> {
        self.node(id).map(|n| &n.drawable)
    }

    pub fn get_mut(&mut self, id: DrawableId) -> Result<&mut Drawable, LayoutError> {
        self.node_mut(id).map(|n| &mut n.drawable)
    }

    pub fn key(&self, id: DrawableId) -> Result<NodeKey, LayoutError> {
        self.node(id).map(|n| n.key)
    }

    pub fn find_key(&self, key: NodeKey) -> Option<DrawableId> {
        self.keys.get(&key).copied().filter(|id| self.contains(*id))
    }

    pub fn parent(&self, id: DrawableId) -> Option<DrawableId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    /// Ordered children of a layout; empty for every other kind.
    pub fn children(&self, id: DrawableId) -> &[DrawableId] {
        match self.get(id) {
            Ok(Drawable::Layout(layout)) => &layout.children,
            _ => &[],
        }
    }

    /// Every drawable directly owned by `id`: layout children, table cells
    /// and decorations, and items waiting on a page.
    pub fn owned(&self, id: DrawableId) -> Vec<DrawableId> {
        match self.get(id) {
            Ok(Drawable::Layout(layout)) => {
                layout.children.iter().chain(&layout.recorded).copied().collect()
            }
            Ok(Drawable::Table(table)) => table
                .cells
                .iter()
                .chain(&table.fills)
                .chain(&table.borders)
                .copied()
                .collect(),
            Ok(Drawable::Page(page)) => page.pending.iter().map(|p| p.id).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn alloc(
        &mut self,
        drawable: Drawable,
        parent: Option<DrawableId>,
        key: NodeKey,
        flow: Option<FlowName>,
    ) -> DrawableId {
        let node = Node {
            drawable,
            parent,
            key,
            flow,
        };
        let id = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.node = Some(node);
            DrawableId {
                idx,
                generation: slot.generation,
            }
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            DrawableId { idx, generation: 0 }
        };
        if let Some(previous) = self.keys.insert(key, id)
            && previous != id
            && self.contains(previous)
        {
            log::warn!("Node key {:?} reassigned from {:?} to {:?}", key, previous, id);
        }
        id
    }

    /// Allocates a drawable owned by `parent` with the parent's next key.
    pub(crate) fn alloc_child(
        &mut self,
        parent: DrawableId,
        drawable: Drawable,
    ) -> Result<DrawableId, LayoutError> {
        let parent_key = self.key(parent)?;
        let slot = match self.get_mut(parent)? {
            Drawable::Layout(l) => l.take_slot(),
            Drawable::Page(p) => p.take_slot(),
            Drawable::Table(t) => t.take_slot(),
            other => return Err(LayoutError::NotAContainer(other.kind())),
        };
        Ok(self.alloc(drawable, Some(parent), derive_key(parent_key, slot), None))
    }

    /// Appends a drawable to a container.
    ///
    /// Layouts append to their child list, tables add a cell, pages take the
    /// drawable as a pagination offer (text is split into pieces first and
    /// the first piece is returned).
    pub fn add(&mut self, parent: DrawableId, drawable: Drawable) -> Result<DrawableId, LayoutError> {
        match self.get(parent)? {
            Drawable::Layout(_) => {
                let id = self.alloc_child(parent, drawable)?;
                self.get_mut(parent)?.as_layout_mut()?.children.push(id);
                self.invalidate(parent);
                Ok(id)
            }
            Drawable::Table(_) => self.add_cell(parent, drawable),
            Drawable::Page(_) => {
                let ids = self.paginate(parent, drawable)?;
                ids.first()
                    .copied()
                    .ok_or_else(|| LayoutError::Generic("empty text offered to page".into()))
            }
            other => Err(LayoutError::NotAContainer(other.kind())),
        }
    }

    pub fn add_layout(&mut self, parent: DrawableId) -> Result<DrawableId, LayoutError> {
        self.add(parent, Drawable::layout())
    }

    /// Detaches `id` from its owner and frees it with everything it owns.
    pub fn remove(&mut self, id: DrawableId) -> Result<(), LayoutError> {
        if id == self.root {
            return Err(LayoutError::RootRemoval);
        }
        let parent = self.node(id)?.parent;

        if let Drawable::Page(page) = self.get(id)? {
            let (successor, predecessor) = (page.successor, page.predecessor);
            if let Some(Ok(Drawable::Page(p))) = predecessor.map(|p| self.get_mut(p)) {
                p.successor = None;
                p.dirty = true;
            }
            if let Some(successor) = successor {
                self.remove(successor)?;
            }
        }

        if let Some(parent) = parent {
            self.invalidate(parent);
            if let Ok(drawable) = self.get_mut(parent) {
                match drawable {
                    Drawable::Layout(l) => {
                        l.children.retain(|c| *c != id);
                        l.recorded.retain(|c| *c != id);
                    }
                    Drawable::Page(p) => p.pending.retain(|p| p.id != id),
                    Drawable::Table(t) => t.detach(id),
                    _ => {}
                }
            }
        }
        self.free_subtree(id);
        Ok(())
    }

    /// Frees `id` and everything it owns without touching its owner.
    pub(crate) fn free_subtree(&mut self, id: DrawableId) {
        let mut stack = vec![id];
        let mut touched = Vec::new();
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            stack.extend(self.owned(current));
            let slot = &mut self.slots[current.idx as usize];
            if let Some(node) = slot.node.take() {
                if self.keys.get(&node.key) == Some(&current) {
                    self.keys.remove(&node.key);
                }
                if let Drawable::Layout(layout) = &node.drawable {
                    for name in layout.refresh.names() {
                        self.unregister_name(name, current);
                    }
                }
                if let Some(name) = node.flow {
                    self.flows.detach(&name, current);
                    touched.push(name);
                }
            }
            let slot = &mut self.slots[current.idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(current.idx);
        }
        for name in touched {
            self.invalidate_readers(&name);
        }
    }

    pub(crate) fn unregister_name(&mut self, name: &RefreshName, id: DrawableId) {
        if let Some(ids) = self.names.get_mut(name) {
            ids.retain(|i| *i != id);
            if ids.is_empty() {
                self.names.remove(name);
            }
        }
    }

    /// Drops everything a container holds, together with its refresh
    /// bookkeeping and derived sizing. A content source stays attached.
    pub fn clear(&mut self, id: DrawableId) -> Result<(), LayoutError> {
        let owned = self.owned(id);
        for child in owned {
            self.free_subtree(child);
        }

        let mut names = Vec::new();
        let mut chain = None;
        match self.get_mut(id)? {
            Drawable::Layout(layout) => {
                layout.children.clear();
                layout.recorded.clear();
                layout.reset_slots();
                names = layout.refresh.names().to_vec();
                layout.refresh.clear();
            }
            Drawable::Page(page) => {
                page.pending.clear();
                page.reset();
                chain = page.successor.take();
            }
            Drawable::Table(table) => table.clear(),
            other => return Err(LayoutError::NotAContainer(other.kind())),
        }
        for name in &names {
            self.unregister_name(name, id);
        }
        while let Some(next) = chain {
            chain = self.get(next).ok().and_then(|d| d.as_page().ok()).and_then(|p| p.successor);
            self.remove(next)?;
        }
        self.invalidate(id);
        Ok(())
    }

    /// Drops derived data (table sizing and decorations, page pagination,
    /// refresh bookkeeping) below `id` without removing content.
    pub fn clear_caches(&mut self, id: DrawableId) -> Result<(), LayoutError> {
        let mut stack = vec![id];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let mut names = Vec::new();
            let mut decorations = Vec::new();
            match self.get_mut(current)? {
                Drawable::Layout(layout) => {
                    names = layout.refresh.names().to_vec();
                    layout.refresh.clear();
                    layout.caches.clear();
                }
                Drawable::Table(table) => {
                    table.invalidate();
                    decorations = table.take_decorations();
                }
                Drawable::Page(page) => page.dirty = true,
                _ => {}
            }
            for name in &names {
                self.unregister_name(name, current);
            }
            for d in decorations {
                self.free_subtree(d);
            }
            stack.extend(self.owned(current));
        }
        self.invalidate(id);
        Ok(())
    }

    /// Marks derived data that depends on `id` as stale: enclosing tables
    /// lose their sizing, enclosing pages (and their chains) repaginate, and
    /// every drawable registered in a layout's caches list is invalidated.
    pub fn invalidate(&mut self, id: DrawableId) {
        let mut stack = vec![id];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Ok(node) = self.node_mut(current) else {
                continue;
            };
            let parent = node.parent;
            match &mut node.drawable {
                Drawable::Table(table) => table.invalidate(),
                Drawable::Page(page) => {
                    page.dirty = true;
                    stack.extend(page.predecessor);
                }
                Drawable::Layout(layout) => stack.extend(layout.caches.iter().copied()),
                _ => {}
            }
            stack.extend(parent);
        }
    }

    /// Forces every page to repaginate and every table to resize, e.g.
    /// after the display scaling changed.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            match slot.node.as_mut().map(|n| &mut n.drawable) {
                Some(Drawable::Page(page)) => page.dirty = true,
                Some(Drawable::Table(table)) => table.invalidate(),
                _ => {}
            }
        }
    }

    /// Records that `referrer` derives data from `layout`, so changes to the
    /// layout invalidate it too.
    pub fn register_cache(&mut self, layout: DrawableId, referrer: DrawableId) -> Result<(), LayoutError> {
        let caches = &mut self.get_mut(layout)?.as_layout_mut()?.caches;
        if !caches.contains(&referrer) {
            caches.push(referrer);
        }
        Ok(())
    }

    /// Drops ids from caches lists whose drawables no longer exist.
    pub(crate) fn prune_caches(&mut self, layout: DrawableId) {
        let live: Vec<DrawableId> = match self.get(layout) {
            Ok(Drawable::Layout(l)) => l.caches.iter().copied().filter(|c| self.contains(*c)).collect(),
            _ => return,
        };
        if let Ok(Drawable::Layout(l)) = self.get_mut(layout) {
            l.caches = live;
        }
    }

    /// Moves `id` under a new owner without touching either owner's lists.
    pub(crate) fn reparent(&mut self, id: DrawableId, parent: DrawableId) -> Result<(), LayoutError> {
        self.node_mut(id)?.parent = Some(parent);
        Ok(())
    }

    /// Ids of every live drawable, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = DrawableId> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, s)| {
            s.node.as_ref().map(|_| DrawableId {
                idx: idx as u32,
                generation: s.generation,
            })
        })
    }
}
