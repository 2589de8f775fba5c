use crate::refresh::RefreshInfo;
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_style::LayoutState;
use std::fmt;
use std::sync::Arc;

/// Re-runs the content of one layout.
///
/// This is the hook through which document evaluation hands content to the
/// engine. A layout carrying a source can be cleared and rebuilt on its own
/// when its refresh metadata asks for it, without touching its siblings.
pub trait ContentSource: fmt::Debug {
    fn evaluate(&self, tree: &mut LayoutTree, layout: DrawableId, now: f64) -> Result<(), LayoutError>;
}

/// The basic composition node: an ordered list of children drawn with a
/// scoped copy of the ambient state.
#[derive(Debug, Default)]
pub struct Layout {
    pub children: Vec<DrawableId>,
    /// Replaces the inherited ambient attributes when set. The placement
    /// (transform and offset) is always inherited.
    pub state: Option<LayoutState>,
    pub refresh: RefreshInfo,
    /// Drawables that derive data from this layout and must be invalidated
    /// with it.
    pub caches: Vec<DrawableId>,
    /// Items this layout recorded into text flows.
    pub recorded: Vec<DrawableId>,
    pub source: Option<Arc<dyn ContentSource>>,
    next_slot: u64,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: LayoutState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// The running state children start from.
    pub fn enter(&self, parent: &LayoutState) -> LayoutState {
        match &self.state {
            Some(own) => LayoutState {
                transform: parent.transform,
                offset: parent.offset,
                ..own.clone()
            },
            None => parent.clone(),
        }
    }

    pub(crate) fn take_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    pub(crate) fn reset_slots(&mut self) {
        self.next_slot = 0;
    }
}

impl LayoutTree {
    pub fn set_source(&mut self, layout: DrawableId, source: Arc<dyn ContentSource>) -> Result<(), LayoutError> {
        self.get_mut(layout)?.as_layout_mut()?.source = Some(source);
        Ok(())
    }

    /// Clears a layout and runs its content source again. Layouts without a
    /// source are only cleared.
    pub fn reevaluate(&mut self, layout: DrawableId, now: f64) -> Result<(), LayoutError> {
        let source = self.get(layout)?.as_layout()?.source.clone();
        self.clear(layout)?;
        if let Some(source) = source {
            source.evaluate(self, layout, now)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::Drawable;
    use folio_style::Attribute;
    use folio_types::{Color, Point};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn own_state_keeps_parent_placement() {
        let mut parent = LayoutState::default();
        parent.apply(&Attribute::Translate { x: 5.0, y: 0.0, z: 0.0 });
        parent.apply(&Attribute::FillColor { color: Color::WHITE });

        let layout = Layout::with_state(LayoutState::default());
        let entered = layout.enter(&parent);
        assert_eq!(entered.paint.fill, Color::BLACK);
        assert_eq!(entered.to_world(Point::ORIGIN), Point::flat(5.0, 0.0));

        assert_eq!(Layout::new().enter(&parent), parent);
    }

    #[derive(Debug, Default)]
    struct Counter {
        runs: AtomicUsize,
    }

    impl ContentSource for Counter {
        fn evaluate(&self, tree: &mut LayoutTree, layout: DrawableId, _now: f64) -> Result<(), LayoutError> {
            let n = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
            for _ in 0..n {
                tree.add(layout, Drawable::rect(1.0, 1.0))?;
            }
            Ok(())
        }
    }

    #[test]
    fn reevaluate_replaces_content() {
        let mut tree = LayoutTree::default();
        let root = tree.root();
        let group = tree.add_layout(root).unwrap();
        let source = Arc::new(Counter::default());
        tree.set_source(group, source.clone()).unwrap();

        tree.reevaluate(group, 0.0).unwrap();
        assert_eq!(tree.children(group).len(), 1);
        tree.reevaluate(group, 1.0).unwrap();
        assert_eq!(tree.children(group).len(), 2);
        assert_eq!(source.runs.load(Ordering::Relaxed), 2);
    }
}
