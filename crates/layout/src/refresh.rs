//! Refresh scheduling.
//!
//! Layouts declare which event categories make their content stale and when
//! it must be recomputed at the latest. Queries fold these declarations over
//! a subtree and over named dependencies, so the frame driver knows the
//! earliest moment anything needs work and never polls faster than that.

use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_types::{EventCategory, RefreshName};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshInfo {
    events: BTreeSet<EventCategory>,
    /// Latest time the content may be shown unchanged, in seconds.
    next_refresh: f64,
    names: Vec<RefreshName>,
    deps: Vec<RefreshName>,
    /// Resource delivery was subscribed for pending images, not declared.
    awaiting: bool,
}

impl Default for RefreshInfo {
    fn default() -> Self {
        Self {
            events: BTreeSet::new(),
            next_refresh: f64::INFINITY,
            names: Vec::new(),
            deps: Vec::new(),
            awaiting: false,
        }
    }
}

impl RefreshInfo {
    pub fn events(&self) -> &BTreeSet<EventCategory> {
        &self.events
    }

    pub fn next_refresh(&self) -> f64 {
        self.next_refresh
    }

    pub fn names(&self) -> &[RefreshName] {
        &self.names
    }

    pub fn deps(&self) -> &[RefreshName] {
        &self.deps
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.next_refresh.is_infinite() && self.deps.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        *self = RefreshInfo::default();
    }
}

/// Folded refresh metadata of a subtree.
#[derive(Debug, Clone, PartialEq)]
struct Fold {
    events: BTreeSet<EventCategory>,
    next_refresh: f64,
}

impl Default for Fold {
    fn default() -> Self {
        Self {
            events: BTreeSet::new(),
            next_refresh: f64::INFINITY,
        }
    }
}

impl LayoutTree {
    /// Subscribes a layout to an event category. A deadline brings the next
    /// mandatory refresh forward; it never postpones it.
    pub fn refresh_on(
        &mut self,
        layout: DrawableId,
        category: EventCategory,
        deadline: Option<f64>,
    ) -> Result<(), LayoutError> {
        let info = &mut self.get_mut(layout)?.as_layout_mut()?.refresh;
        info.events.insert(category);
        if category == EventCategory::RESOURCE_READY {
            info.awaiting = false;
        }
        if let Some(t) = deadline {
            info.next_refresh = info.next_refresh.min(t);
        }
        Ok(())
    }

    /// Asks for a timer refresh `delay` seconds after `now`.
    pub fn refresh_after(&mut self, layout: DrawableId, now: f64, delay: f64) -> Result<(), LayoutError> {
        self.refresh_on(layout, EventCategory::TIMER, Some(now + delay.max(0.0)))
    }

    /// Drops a subscription. Dropping the timer also drops the deadline.
    pub fn no_refresh_on(&mut self, layout: DrawableId, category: EventCategory) -> Result<(), LayoutError> {
        let info = &mut self.get_mut(layout)?.as_layout_mut()?.refresh;
        info.events.remove(&category);
        match category {
            EventCategory::TIMER => info.next_refresh = f64::INFINITY,
            EventCategory::RESOURCE_READY => info.awaiting = false,
            _ => {}
        }
        Ok(())
    }

    /// Subscribes `layout` to resource delivery for a pending image under
    /// it. The subscription lapses at the next evaluation that finds no
    /// pending image; a declared one is left alone.
    pub(crate) fn await_resource(&mut self, layout: DrawableId) -> Result<(), LayoutError> {
        let info = &mut self.get_mut(layout)?.as_layout_mut()?.refresh;
        if info.events.insert(EventCategory::RESOURCE_READY) {
            info.awaiting = true;
        }
        Ok(())
    }

    pub(crate) fn lapse_awaited(&mut self, layout: DrawableId) -> Result<(), LayoutError> {
        let info = &mut self.get_mut(layout)?.as_layout_mut()?.refresh;
        if std::mem::take(&mut info.awaiting) {
            info.events.remove(&EventCategory::RESOURCE_READY);
        }
        Ok(())
    }

    /// Makes `layout` share the refresh needs of every layout named `name`.
    pub fn add_dep(&mut self, layout: DrawableId, name: impl Into<RefreshName>) -> Result<(), LayoutError> {
        let name = name.into();
        let info = &mut self.get_mut(layout)?.as_layout_mut()?.refresh;
        if !info.deps.contains(&name) {
            info.deps.push(name);
        }
        Ok(())
    }

    /// Registers `layout` under `name` so other layouts can depend on it.
    pub fn name_layout(&mut self, layout: DrawableId, name: impl Into<RefreshName>) -> Result<(), LayoutError> {
        let name = name.into();
        let info = &mut self.get_mut(layout)?.as_layout_mut()?.refresh;
        if !info.names.contains(&name) {
            info.names.push(name.clone());
        }
        let ids = self.names.entry(name).or_default();
        if !ids.contains(&layout) {
            ids.push(layout);
        }
        Ok(())
    }

    pub fn named(&self, name: &RefreshName) -> &[DrawableId] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Earliest mandatory refresh of `id`, its subtree and its dependencies.
    pub fn next_refresh(&self, id: DrawableId) -> f64 {
        self.fold(id).next_refresh
    }

    /// Every event category `id`, its subtree or its dependencies react to.
    pub fn refresh_events(&self, id: DrawableId) -> BTreeSet<EventCategory> {
        self.fold(id).events
    }

    fn fold(&self, id: DrawableId) -> Fold {
        let mut out = Fold::default();
        let mut visited = HashSet::new();
        self.fold_into(id, 0, &mut visited, &mut out);
        out
    }

    fn fold_into(&self, id: DrawableId, depth: usize, visited: &mut HashSet<RefreshName>, out: &mut Fold) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Ok(drawable) = self.get(current) else {
                continue;
            };
            if let Ok(layout) = drawable.as_layout() {
                let info = &layout.refresh;
                out.events.extend(info.events.iter().copied());
                out.next_refresh = out.next_refresh.min(info.next_refresh);
                for dep in &info.deps {
                    if depth >= self.config().max_dependency_depth {
                        log::debug!("Refresh dependency '{}' is beyond the depth limit", dep);
                        continue;
                    }
                    if !visited.insert(dep.clone()) {
                        continue;
                    }
                    for &target in self.named(dep) {
                        self.fold_into(target, depth + 1, visited, out);
                    }
                }
            }
            stack.extend(self.owned(current));
        }
    }

    /// The outermost layouts with a content source that must be evaluated
    /// again for `events` at time `now`.
    pub fn refresh_targets(&self, events: &BTreeSet<EventCategory>, now: f64) -> Vec<DrawableId> {
        let mut targets = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(current) = stack.pop() {
            let has_source = matches!(self.get(current), Ok(d) if d.as_layout().is_ok_and(|l| l.source.is_some()));
            if has_source {
                let fold = self.fold(current);
                if fold.next_refresh <= now || !fold.events.is_disjoint(events) {
                    targets.push(current);
                    continue;
                }
            }
            let mut owned = self.owned(current);
            owned.reverse();
            stack.extend(owned);
        }
        targets
    }

    /// Re-evaluates every refresh target. Returns how many layouts ran.
    pub fn refresh(&mut self, events: &BTreeSet<EventCategory>, now: f64) -> Result<usize, LayoutError> {
        let targets = self.refresh_targets(events, now);
        for &target in &targets {
            log::debug!("Refreshing {:?}", target);
            self.reevaluate(target, now)?;
        }
        Ok(targets.len())
    }
}

/// What the frame driver needs to know after a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSchedule {
    /// Earliest mandatory refresh, in seconds; infinite when nothing is due.
    pub next_refresh: f64,
    /// Categories that require a refresh as soon as they occur.
    pub immediate: BTreeSet<EventCategory>,
}

impl FrameSchedule {
    pub fn collect(tree: &LayoutTree) -> Self {
        let root = tree.root();
        let mut immediate = tree.refresh_events(root);
        immediate.remove(&EventCategory::TIMER);
        Self {
            next_refresh: tree.next_refresh(root),
            immediate,
        }
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.next_refresh <= now
    }

    /// How long the driver may sleep; `None` means until an event arrives.
    pub fn wait(&self, now: f64) -> Option<Duration> {
        if self.next_refresh.is_infinite() {
            return None;
        }
        Some(Duration::from_secs_f64((self.next_refresh - now).max(0.0)))
    }

    pub fn wants(&self, category: EventCategory) -> bool {
        self.immediate.contains(&category)
    }
}
