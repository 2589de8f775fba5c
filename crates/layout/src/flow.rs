//! Named text flows.
//!
//! A flow records drawables once and lets any number of pages replay them:
//! each page anchored to the flow takes items from the flow's cursor on and
//! advances it past what fit. Content that spans pages or columns is
//! recorded into a flow instead of being offered to a single page.

use crate::drawable::Drawable;
use crate::justify::BreakOrder;
use crate::page::PendingItem;
use crate::tree::{derive_key, name_key, DrawableId, LayoutTree};
use crate::LayoutError;
use folio_style::{Attribute, TextWrap};
use folio_types::FlowName;
use std::collections::HashMap;

/// Placeholder that expands to a flow's remaining items when its page is
/// paginated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowAnchor {
    pub name: FlowName,
    /// Set on anchors created for overflow pages; those are dropped again
    /// when the page chain is rebuilt.
    pub continuation: bool,
}

impl FlowAnchor {
    pub fn new(name: impl Into<FlowName>) -> Self {
        Self {
            name: name.into(),
            continuation: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct TextFlow {
    pub items: Vec<PendingItem>,
    /// Index of the first item not yet placed in the current pass.
    pub cursor: usize,
    wrap: TextWrap,
    next_slot: u64,
    readers: Vec<DrawableId>,
}

impl TextFlow {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pages that replayed this flow in the last pass.
    pub fn readers(&self) -> &[DrawableId] {
        &self.readers
    }

    pub(crate) fn add_reader(&mut self, page: DrawableId) {
        if !self.readers.contains(&page) {
            self.readers.push(page);
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FlowRegistry {
    flows: HashMap<FlowName, TextFlow>,
}

impl FlowRegistry {
    pub fn get(&self, name: &FlowName) -> Option<&TextFlow> {
        self.flows.get(name)
    }

    pub fn get_mut(&mut self, name: &FlowName) -> Option<&mut TextFlow> {
        self.flows.get_mut(name)
    }

    pub fn entry(&mut self, name: &FlowName) -> &mut TextFlow {
        self.flows.entry(name.clone()).or_default()
    }

    pub fn detach(&mut self, name: &FlowName, id: DrawableId) {
        if let Some(flow) = self.flows.get_mut(name) {
            flow.items.retain(|item| item.id != id);
            flow.cursor = flow.cursor.min(flow.items.len());
            if flow.items.is_empty() {
                flow.next_slot = 0;
                flow.cursor = 0;
            }
        }
    }

    pub fn remove(&mut self, name: &FlowName) -> Option<TextFlow> {
        self.flows.remove(name)
    }

    pub fn rewind(&mut self) {
        for flow in self.flows.values_mut() {
            flow.cursor = 0;
        }
    }
}

impl LayoutTree {
    pub fn flow(&self, name: &FlowName) -> Option<&TextFlow> {
        self.flows.get(name)
    }

    /// Records one drawable into a flow. `owner` is the layout whose
    /// evaluation produced it; clearing the owner removes the item again.
    pub fn flow_item(
        &mut self,
        owner: DrawableId,
        name: impl Into<FlowName>,
        drawable: Drawable,
        order: Option<BreakOrder>,
        count: u32,
    ) -> Result<DrawableId, LayoutError> {
        let name = name.into();
        self.get(owner)?.as_layout()?;

        if let Drawable::Attribute(Attribute::Wrap { wrap }) = &drawable {
            self.flows.entry(&name).wrap = *wrap;
        }
        let flow = self.flows.entry(&name);
        let slot = flow.next_slot;
        flow.next_slot += 1;

        let key = derive_key(name_key(name.as_str()), slot);
        let id = self.alloc(drawable, Some(owner), key, Some(name.clone()));
        self.flows.entry(&name).items.push(PendingItem { id, order, count });
        self.get_mut(owner)?.as_layout_mut()?.recorded.push(id);
        self.invalidate_readers(&name);
        Ok(id)
    }

    /// Records a drawable, splitting text into pieces with the flow's
    /// current wrapping mode. Returns the ids of everything recorded.
    pub fn record(
        &mut self,
        owner: DrawableId,
        name: impl Into<FlowName>,
        drawable: Drawable,
    ) -> Result<Vec<DrawableId>, LayoutError> {
        let name = name.into();
        match drawable {
            Drawable::Text(span) => {
                let wrap = self.flows.entry(&name).wrap;
                span.pieces(wrap)
                    .into_iter()
                    .map(|piece| self.flow_item(owner, name.clone(), Drawable::Text(piece.span), piece.order, 1))
                    .collect()
            }
            Drawable::Break(order) => Ok(vec![self.flow_item(owner, name, Drawable::Break(order), Some(order), 1)?]),
            other => Ok(vec![self.flow_item(owner, name, other, None, 1)?]),
        }
    }

    /// Removes a flow and every item recorded into it.
    pub fn clear_flow(&mut self, name: &FlowName) -> Result<(), LayoutError> {
        let ids: Vec<DrawableId> = match self.flows.get(name) {
            Some(flow) => flow.items.iter().map(|item| item.id).collect(),
            None => return Ok(()),
        };
        for id in ids {
            self.remove(id)?;
        }
        self.invalidate_readers(name);
        self.flows.remove(name);
        Ok(())
    }

    /// Moves every flow cursor back to the start, ahead of a pagination pass.
    pub fn rewind_flows(&mut self) {
        self.flows.rewind();
    }

    pub(crate) fn invalidate_readers(&mut self, name: &FlowName) {
        let readers: Vec<DrawableId> = match self.flows.get_mut(name) {
            Some(flow) => std::mem::take(&mut flow.readers),
            None => return,
        };
        let live: Vec<DrawableId> = readers.into_iter().filter(|r| self.contains(*r)).collect();
        for reader in &live {
            self.invalidate(*reader);
        }
        if let Some(flow) = self.flows.get_mut(name) {
            flow.readers = live;
        }
    }
}
