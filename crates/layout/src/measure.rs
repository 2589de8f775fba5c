//! Bounds and Space queries.
//!
//! Both return boxes in the frame of the state they are given: pass
//! `state.at_origin()` for a drawable's own size. Bounds is the visible
//! extent; Space additionally reserves the ambient margins around leaves.
//! Failures never propagate: a drawable that cannot be measured is logged
//! and takes no room.

use crate::context::{Env, MeasureContext};
use crate::drawable::Drawable;
use crate::table;
use crate::text::TextSpan;
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_style::{FontModel, LayoutState, Margins};
use folio_types::{Box3, Point};

/// Measured size of a text span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextMetrics {
    pub width: f32,
    pub line_height: f32,
    /// Baseline distance from the top of the line box, half-leading included.
    pub ascent: f32,
}

/// The font a state draws with on this display.
pub(crate) fn display_font(state: &LayoutState, env: &Env<'_>) -> FontModel {
    if env.font_scaling == 1.0 {
        state.font.clone()
    } else {
        state.font.scaled(env.font_scaling)
    }
}

pub(crate) fn text_metrics(
    span: &TextSpan,
    state: &LayoutState,
    cx: &mut MeasureContext<'_>,
) -> Result<TextMetrics, LayoutError> {
    let font = display_font(state, &cx.env);
    let width = span.width(&font, cx.env.metrics, &mut cx.cache.glyphs, cx.env.profiler)?;
    let ascent = cx.env.metrics.ascent(&font);
    let descent = cx.env.metrics.descent(&font);
    let half_leading = (font.line_height - (ascent + descent)) / 2.0;
    Ok(TextMetrics {
        width,
        line_height: font.line_height,
        ascent: ascent + half_leading,
    })
}

pub fn bounds(tree: &LayoutTree, id: DrawableId, state: &LayoutState, cx: &mut MeasureContext<'_>) -> Box3 {
    measure_logged(tree, id, state, cx, false)
}

pub fn space(tree: &LayoutTree, id: DrawableId, state: &LayoutState, cx: &mut MeasureContext<'_>) -> Box3 {
    measure_logged(tree, id, state, cx, true)
}

fn measure_logged(
    tree: &LayoutTree,
    id: DrawableId,
    state: &LayoutState,
    cx: &mut MeasureContext<'_>,
    reserve: bool,
) -> Box3 {
    match measure(tree, id, state, cx, reserve) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Could not measure {:?}: {}", id, e);
            Box3::EMPTY
        }
    }
}

fn measure(
    tree: &LayoutTree,
    id: DrawableId,
    state: &LayoutState,
    cx: &mut MeasureContext<'_>,
    reserve: bool,
) -> Result<Box3, LayoutError> {
    let local = match tree.get(id)? {
        Drawable::Layout(layout) => {
            let mut running = layout.enter(state);
            let mut out = Box3::EMPTY;
            for &child in &layout.children {
                if let Ok(Drawable::Attribute(attr)) = tree.get(child) {
                    running.apply(attr);
                    continue;
                }
                out = out.union(&measure_logged(tree, child, &running, cx, reserve));
            }
            return Ok(out);
        }
        Drawable::Attribute(_) | Drawable::Break(_) | Drawable::Flow(_) => return Ok(Box3::EMPTY),
        Drawable::Page(page) => return Ok(state.box_to_world(&page.local_box())),
        Drawable::Custom(ext) => {
            let b = if reserve { ext.space(state)? } else { ext.bounds(state)? };
            return Ok(state.box_to_world(&b));
        }
        Drawable::Shape(shape) => shape.local_bounds(),
        Drawable::Text(span) => {
            let m = text_metrics(span, state, cx)?;
            Box3::new(Point::ORIGIN, Point::flat(m.width, m.line_height))
        }
        Drawable::Table(t) => {
            let size = if t.is_sized() {
                t.size()
            } else {
                let sizing = table::size_cells(tree, t, state, cx);
                t.size_for(&sizing.column_width, &sizing.row_height)
            };
            Box3::new(Point::ORIGIN, Point::flat(size.width, size.height))
        }
        Drawable::Handle(handle) => Box3::new(Point::ORIGIN, Point::flat(handle.size.width, handle.size.height)),
        Drawable::Image(image) => Box3::new(Point::ORIGIN, Point::flat(image.size.width, image.size.height)),
    };
    let local = if reserve { reserve_margins(&local, &state.margins) } else { local };
    Ok(state.box_to_world(&local))
}

fn reserve_margins(b: &Box3, m: &Margins) -> Box3 {
    if b.is_empty() {
        return *b;
    }
    Box3::new(b.lower.offset(-m.left, -m.top, 0.0), b.upper.offset(m.right, m.bottom, 0.0))
}
