//! The sizing pass.
//!
//! Evaluation walks the tree in document order and brings every derived
//! structure up to date: pages are paginated (or reused when unchanged),
//! tables are sized and decorated, pending images subscribe their layout to
//! resource delivery until they are ready. Draw, identify and the measuring queries only read the
//! results.

use crate::context::MeasureContext;
use crate::drawable::Drawable;
use crate::perf;
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_style::LayoutState;
use folio_traits::ResourceState;
use folio_types::EventCategory;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvaluateStats {
    pub visited: usize,
    pub paginated: usize,
    pub pages_reused: usize,
    pub pages_created: usize,
    pub tables_sized: usize,
}

impl LayoutTree {
    /// Brings pagination and table sizing up to date for the whole tree.
    pub fn evaluate(&mut self, cx: &mut MeasureContext<'_>) -> Result<EvaluateStats, LayoutError> {
        let started = perf::start();
        let mut stats = EvaluateStats::default();
        self.rewind_flows();
        let root = self.root();
        self.evaluate_node(root, &LayoutState::default(), root, cx, &mut stats)?;
        perf::finish(cx.env.profiler, "evaluate", started);
        log::trace!("Evaluated tree: {:?}", stats);
        Ok(stats)
    }

    /// Evaluates `id` with the running state it is drawn with. `layout` is
    /// the nearest enclosing layout, which receives subscriptions made on
    /// behalf of leaves.
    pub(crate) fn evaluate_node(
        &mut self,
        id: DrawableId,
        state: &LayoutState,
        layout: DrawableId,
        cx: &mut MeasureContext<'_>,
        stats: &mut EvaluateStats,
    ) -> Result<(), LayoutError> {
        stats.visited += 1;
        match self.get(id)? {
            Drawable::Layout(l) => {
                let mut running = l.enter(state);
                self.lapse_awaited(id)?;
                // Children are read by index: pagination may insert
                // successor pages while the loop runs.
                let mut i = 0;
                while let Some(&child) = self.children(id).get(i) {
                    i += 1;
                    if let Drawable::Attribute(attr) = self.get(child)? {
                        running.apply(attr);
                        continue;
                    }
                    self.evaluate_node(child, &running, id, cx, stats)?;
                }
                self.prune_caches(id);
            }
            Drawable::Page(_) => self.paginate_page(id, state, layout, cx, stats)?,
            Drawable::Table(table) => {
                let cells = table.cells.clone();
                let frame = state.at_origin();
                for cell in cells {
                    self.evaluate_node(cell, &frame, layout, cx, stats)?;
                }
                self.build_decorations(id)?;
                if self.compute_table(id, state, cx)? {
                    stats.tables_sized += 1;
                }
            }
            Drawable::Image(image) => {
                if cx.env.textures.texture(&image.uri) == ResourceState::Pending {
                    self.await_resource(layout)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
