//! Pages: the vertical half of flowed layout.
//!
//! Drawables are offered to a page in reading order. Pagination measures
//! every offer, breaks the items into lines across the column width, then
//! breaks the lines into columns. Whatever does not fit moves to a successor
//! page inserted right after this one in the enclosing layout; text flows
//! continue there through a continuation anchor.

use crate::context::MeasureContext;
use crate::drawable::Drawable;
use crate::evaluate::EvaluateStats;
use crate::flow::FlowAnchor;
use crate::justify::{BreakOrder, Justified, Justifier};
use crate::line::{LayoutLine, LineItem};
use crate::measure;
use crate::perf::{self, CacheKind};
use crate::text::TextSpan;
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_style::{Attribute, LayoutState, Margins, TextWrap};
use folio_types::{Box3, FlowName, Point, Size};
use std::collections::HashSet;

/// A drawable waiting to be paginated, with the break it offers after
/// itself. `count` repeats that break (two line breaks leave a blank line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingItem {
    pub id: DrawableId,
    pub order: Option<BreakOrder>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Left edge of the column within the page.
    pub x: f32,
    pub lines: Justified<LayoutLine>,
}

/// The stretch of a flow one page replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlowRead {
    pub name: FlowName,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Page(usize),
    Flow { read: usize, index: usize },
}

#[derive(Debug, Clone, Copy)]
struct Offer {
    id: DrawableId,
    order: Option<BreakOrder>,
    count: u32,
    source: Source,
}

enum Measured {
    Attribute,
    Marker,
    Text(TextSpan),
    Content,
}

#[derive(Debug)]
pub struct PageLayout {
    pub size: Size,
    /// Top-left corner within the enclosing layout. Successor pages are
    /// stacked below their predecessor.
    pub origin: Point,
    pub columns: usize,
    /// Horizontal room between columns.
    pub gap: f32,
    pub margins: Margins,
    pub pending: Vec<PendingItem>,
    pub laid_out: Vec<Column>,
    pub successor: Option<DrawableId>,
    pub predecessor: Option<DrawableId>,
    /// Attribute offers placed on earlier pages of the chain, in order.
    /// They are in effect before this page's own offers.
    pub inherited: Vec<DrawableId>,
    pub dirty: bool,
    pub(crate) flows_read: Vec<FlowRead>,
    /// The state pagination last ran with, in its zero-offset form.
    entered: Option<LayoutState>,
    offer_wrap: TextWrap,
    next_slot: u64,
}

impl PageLayout {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            origin: Point::ORIGIN,
            columns: 1,
            gap: 0.0,
            margins: Margins::default(),
            pending: Vec::new(),
            laid_out: Vec::new(),
            successor: None,
            predecessor: None,
            inherited: Vec::new(),
            dirty: true,
            flows_read: Vec::new(),
            entered: None,
            offer_wrap: TextWrap::default(),
            next_slot: 0,
        }
    }

    pub fn with_columns(mut self, columns: usize, gap: f32) -> Self {
        self.columns = columns.max(1);
        self.gap = gap;
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn column_width(&self) -> f32 {
        let columns = self.columns.max(1) as f32;
        ((self.size.width - self.margins.horizontal() - self.gap * (columns - 1.0)) / columns).max(0.0)
    }

    pub fn content_height(&self) -> f32 {
        (self.size.height - self.margins.vertical()).max(0.0)
    }

    pub fn local_box(&self) -> Box3 {
        Box3::new(self.origin, self.origin.offset(self.size.width, self.size.height, 0.0))
    }

    /// Lines of every column, in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &LayoutLine> {
        self.laid_out.iter().flat_map(|c| c.lines.items())
    }

    /// Drawables placed on this page, in reading order.
    pub fn placed(&self) -> Vec<DrawableId> {
        self.lines()
            .flat_map(|l| l.items.items())
            .filter(|i| !i.repeat)
            .map(|i| i.id)
            .collect()
    }

    /// `state` with the inherited attributes applied: what this page's
    /// first offer is measured and drawn with.
    pub(crate) fn entry_state(&self, tree: &LayoutTree, state: &LayoutState) -> LayoutState {
        let mut entry = state.clone();
        for id in &self.inherited {
            if let Ok(Drawable::Attribute(attr)) = tree.get(*id) {
                entry.apply(attr);
            }
        }
        entry
    }

    pub(crate) fn take_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    pub(crate) fn reset(&mut self) {
        self.laid_out.clear();
        self.flows_read.clear();
        self.entered = None;
        self.offer_wrap = TextWrap::default();
        self.next_slot = 0;
        self.dirty = true;
    }

    /// An empty page with the same geometry, placed below this one.
    fn successor_template(&self) -> PageLayout {
        PageLayout {
            origin: self.origin.offset(0.0, self.size.height, 0.0),
            offer_wrap: self.offer_wrap,
            ..PageLayout::new(self.size)
                .with_columns(self.columns, self.gap)
                .with_margins(self.margins)
        }
    }
}

impl LayoutTree {
    /// The last page of the chain starting at `page`.
    pub fn last_page(&self, page: DrawableId) -> Result<DrawableId, LayoutError> {
        let mut current = page;
        while let Some(next) = self.get(current)?.as_page()?.successor {
            current = next;
        }
        Ok(current)
    }

    /// `page` followed by every successor created for it.
    pub fn page_chain(&self, page: DrawableId) -> Vec<DrawableId> {
        let mut chain = vec![page];
        let mut current = page;
        while let Some(next) = self.get(current).ok().and_then(|d| d.as_page().ok()).and_then(|p| p.successor) {
            chain.push(next);
            current = next;
        }
        chain
    }

    /// Offers one drawable to a page chain. It joins the last page and the
    /// chain is paginated again on the next evaluation.
    pub fn paginate_item(
        &mut self,
        page: DrawableId,
        drawable: Drawable,
        order: Option<BreakOrder>,
        count: u32,
    ) -> Result<DrawableId, LayoutError> {
        let target = self.last_page(page)?;
        let id = self.alloc_child(target, drawable)?;
        self.get_mut(target)?.as_page_mut()?.pending.push(PendingItem {
            id,
            order,
            count: count.max(1),
        });
        self.invalidate(target);
        Ok(id)
    }

    /// Offers a drawable with the break its kind implies. Text is split into
    /// words, spaces and newlines with the wrapping mode last offered to
    /// this page.
    pub fn paginate(&mut self, page: DrawableId, drawable: Drawable) -> Result<Vec<DrawableId>, LayoutError> {
        match drawable {
            Drawable::Text(span) => {
                let wrap = self.get(page)?.as_page()?.offer_wrap;
                span.pieces(wrap)
                    .into_iter()
                    .map(|piece| self.paginate_item(page, Drawable::Text(piece.span), piece.order, 1))
                    .collect()
            }
            Drawable::Break(order) => Ok(vec![self.paginate_item(page, Drawable::Break(order), Some(order), 1)?]),
            Drawable::Attribute(attr) => {
                if let Attribute::Wrap { wrap } = &attr {
                    self.get_mut(page)?.as_page_mut()?.offer_wrap = *wrap;
                }
                Ok(vec![self.paginate_item(page, Drawable::Attribute(attr), None, 1)?])
            }
            other => Ok(vec![self.paginate_item(page, other, None, 1)?]),
        }
    }

    pub fn paginate_text(&mut self, page: DrawableId, text: &str) -> Result<Vec<DrawableId>, LayoutError> {
        self.paginate(page, Drawable::text(text))
    }

    /// Makes the page replay a text flow at this point.
    pub fn anchor_flow(&mut self, page: DrawableId, name: impl Into<FlowName>) -> Result<DrawableId, LayoutError> {
        self.paginate_item(page, Drawable::Flow(FlowAnchor::new(name)), None, 1)
    }

    /// Lays out one page, reusing the previous result when nothing it
    /// depends on changed.
    pub(crate) fn paginate_page(
        &mut self,
        page: DrawableId,
        state: &LayoutState,
        layout: DrawableId,
        cx: &mut MeasureContext<'_>,
        stats: &mut EvaluateStats,
    ) -> Result<(), LayoutError> {
        let frame = state.at_origin();
        let p = self.get(page)?.as_page()?;
        let reusable = !p.dirty
            && p.entered.as_ref() == Some(&frame)
            && p.flows_read
                .iter()
                .all(|r| self.flows.get(&r.name).map(|f| f.cursor) == Some(r.start));
        if reusable {
            cx.env.profiler.count_hit(CacheKind::Page);
            let reads = p.flows_read.clone();
            for read in reads {
                if let Some(flow) = self.flows.get_mut(&read.name) {
                    flow.cursor = read.end;
                }
            }
            stats.pages_reused += 1;
            return Ok(());
        }
        cx.env.profiler.count_miss(CacheKind::Page);
        let started = perf::start();

        self.pull_back(page)?;
        let (offers, mut reads) = self.collect_offers(page)?;
        let entry = self.get(page)?.as_page()?.entry_state(self, state);
        let items = self.measure_offers(&offers, &entry, layout, cx, stats)?;

        let p = self.get(page)?.as_page()?;
        let column_width = p.column_width();
        let content_height = p.content_height();
        let columns = p.columns;
        let (margin_left, gap) = (p.margins.left, p.gap);
        let can_overflow = matches!(self.parent(page).map(|parent| self.get(parent)), Some(Ok(Drawable::Layout(_))));

        let lines = break_lines(items, column_width, &entry);
        let vertical = Justifier::new(content_height, entry.along_y, BreakOrder::Column).with_preferred(BreakOrder::Line);
        let (units, rest) = if can_overflow {
            vertical.run_until(lines, Some(BreakOrder::Page), Some(columns))
        } else {
            let (units, rest) = vertical.run_until(lines, None, None);
            if units.len() > columns {
                log::debug!(
                    "Page {:?} has no enclosing layout for overflow; placed {} extra columns",
                    page,
                    units.len() - columns
                );
            }
            (units, rest)
        };

        let laid_out: Vec<Column> = units
            .into_iter()
            .enumerate()
            .map(|(i, lines)| Column {
                x: margin_left + i as f32 * (column_width + gap),
                lines,
            })
            .collect();

        // Items past the first line that did not fit. Repeated breaks of an
        // offer that was placed are dropped.
        let first_overflow = rest
            .iter()
            .flat_map(|line| line.items.items())
            .find(|item| !item.repeat)
            .map(|item| item.offer);
        let (placed, overflow) = offers.split_at(first_overflow.unwrap_or(offers.len()));

        for (j, read) in reads.iter_mut().enumerate() {
            if let Some(index) = overflow.iter().find_map(|o| match o.source {
                Source::Flow { read, index } if read == j => Some(index),
                _ => None,
            }) {
                read.end = index;
            }
            if let Some(flow) = self.flows.get_mut(&read.name) {
                flow.cursor = read.end;
            }
        }

        let p = self.get_mut(page)?.as_page_mut()?;
        p.laid_out = laid_out;
        p.flows_read = reads.clone();
        p.entered = Some(frame);
        p.dirty = false;
        stats.paginated += 1;

        if !overflow.is_empty() {
            self.spill(page, placed, overflow, &reads, stats)?;
        }
        perf::finish(cx.env.profiler, "paginate", started);
        Ok(())
    }

    /// Merges the items of every successor back into `page` and removes the
    /// successors, so the chain can be split again from scratch.
    fn pull_back(&mut self, page: DrawableId) -> Result<(), LayoutError> {
        let mut next = self.get_mut(page)?.as_page_mut()?.successor.take();
        let mut moved = Vec::new();
        let mut dropped = Vec::new();
        let mut pages = Vec::new();

        while let Some(current) = next {
            let p = self.get_mut(current)?.as_page_mut()?;
            next = p.successor.take();
            p.predecessor = None;
            let items = std::mem::take(&mut p.pending);
            pages.push(current);
            for item in items {
                match self.get(item.id)? {
                    Drawable::Flow(anchor) if anchor.continuation => dropped.push(item.id),
                    _ => moved.push(item),
                }
            }
        }

        for item in &moved {
            self.reparent(item.id, page)?;
        }
        self.get_mut(page)?.as_page_mut()?.pending.extend(moved);
        for id in dropped {
            self.free_subtree(id);
        }
        for id in pages {
            self.remove(id)?;
        }
        Ok(())
    }

    fn collect_offers(&mut self, page: DrawableId) -> Result<(Vec<Offer>, Vec<FlowRead>), LayoutError> {
        let pending = self.get(page)?.as_page()?.pending.clone();
        let mut offers = Vec::with_capacity(pending.len());
        let mut reads: Vec<FlowRead> = Vec::new();

        for (idx, item) in pending.iter().enumerate() {
            let Drawable::Flow(anchor) = self.get(item.id)? else {
                offers.push(Offer {
                    id: item.id,
                    order: item.order,
                    count: item.count,
                    source: Source::Page(idx),
                });
                continue;
            };
            let name = anchor.name.clone();
            if reads.iter().any(|r| r.name == name) {
                continue;
            }
            let flow = self.flows.entry(&name);
            flow.add_reader(page);
            let start = flow.cursor;
            for (index, fi) in flow.items.iter().enumerate().skip(start) {
                offers.push(Offer {
                    id: fi.id,
                    order: fi.order,
                    count: fi.count,
                    source: Source::Flow {
                        read: reads.len(),
                        index,
                    },
                });
            }
            reads.push(FlowRead {
                name,
                start,
                end: flow.items.len(),
            });
        }
        Ok((offers, reads))
    }

    fn measure_offers(
        &mut self,
        offers: &[Offer],
        state: &LayoutState,
        layout: DrawableId,
        cx: &mut MeasureContext<'_>,
        stats: &mut EvaluateStats,
    ) -> Result<Vec<LineItem>, LayoutError> {
        let mut running = state.clone();
        let mut items = Vec::with_capacity(offers.len());

        for (n, offer) in offers.iter().enumerate() {
            let kind = match self.get(offer.id)? {
                Drawable::Attribute(attr) => {
                    running.apply(attr);
                    Measured::Attribute
                }
                Drawable::Break(_) | Drawable::Flow(_) => Measured::Marker,
                Drawable::Text(span) => Measured::Text(span.clone()),
                _ => Measured::Content,
            };
            let font = measure::display_font(&running, &cx.env);
            let mut item = LineItem {
                id: offer.id,
                extent: 0.0,
                lower: Point::ORIGIN,
                height: 0.0,
                ascent: 0.0,
                break_after: offer.order,
                separator: true,
                attribute: false,
                repeat: false,
                along_x: running.along_x,
                line_height: font.line_height,
                offer: n,
            };

            match kind {
                Measured::Attribute => item.attribute = true,
                Measured::Marker => {}
                Measured::Text(span) => {
                    item.separator = span.is_whitespace();
                    match measure::text_metrics(&span, &running, cx) {
                        Ok(m) => {
                            item.extent = m.width;
                            item.height = m.line_height;
                            item.ascent = m.ascent;
                        }
                        Err(e) => log::warn!("Could not measure text {:?}: {}", offer.id, e),
                    }
                }
                Measured::Content => {
                    let frame = running.at_origin();
                    self.evaluate_node(offer.id, &frame, layout, cx, stats)?;
                    let space = measure::space(self, offer.id, &frame, cx);
                    item.separator = false;
                    if !space.is_empty() {
                        item.extent = space.width();
                        item.lower = space.lower;
                        item.height = space.height();
                        item.ascent = space.height();
                    }
                }
            }

            items.push(item.clone());
            if offer.order.is_some() {
                for _ in 1..offer.count {
                    items.push(LineItem {
                        extent: 0.0,
                        height: 0.0,
                        ascent: 0.0,
                        separator: true,
                        attribute: false,
                        repeat: true,
                        ..item.clone()
                    });
                }
            }
        }
        Ok(items)
    }

    /// Moves the offers that did not fit onto a new successor page. The
    /// attributes among the `placed` offers stay in effect there.
    fn spill(
        &mut self,
        page: DrawableId,
        placed: &[Offer],
        overflow: &[Offer],
        reads: &[FlowRead],
        stats: &mut EvaluateStats,
    ) -> Result<(), LayoutError> {
        let parent = self
            .parent(page)
            .ok_or_else(|| LayoutError::Generic("overflowing page has no parent".into()))?;
        let template = self.get(page)?.as_page()?.successor_template();
        let mut inherited = self.get(page)?.as_page()?.inherited.clone();
        inherited.extend(
            placed
                .iter()
                .map(|o| o.id)
                .filter(|id| matches!(self.get(*id), Ok(Drawable::Attribute(_)))),
        );
        let successor = self.alloc_child(parent, Drawable::Page(template))?;
        {
            let siblings = &mut self.get_mut(parent)?.as_layout_mut()?.children;
            let at = siblings.iter().position(|c| *c == page).map_or(siblings.len(), |i| i + 1);
            siblings.insert(at, successor);
        }

        let pending = self.get(page)?.as_page()?.pending.clone();
        let mut moved_from_page = HashSet::new();
        let mut anchored = HashSet::new();
        let mut carried = Vec::with_capacity(overflow.len());

        for offer in overflow {
            match offer.source {
                Source::Page(idx) => {
                    moved_from_page.insert(idx);
                    self.reparent(offer.id, successor)?;
                    carried.push(pending[idx]);
                }
                Source::Flow { read, .. } => {
                    if !anchored.insert(read) {
                        continue;
                    }
                    let anchor = FlowAnchor {
                        name: reads[read].name.clone(),
                        continuation: true,
                    };
                    let id = self.alloc_child(successor, Drawable::Flow(anchor))?;
                    carried.push(PendingItem {
                        id,
                        order: None,
                        count: 1,
                    });
                }
            }
        }

        let p = self.get_mut(page)?.as_page_mut()?;
        p.pending = pending
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !moved_from_page.contains(idx))
            .map(|(_, item)| item)
            .collect();
        p.successor = Some(successor);

        let s = self.get_mut(successor)?.as_page_mut()?;
        s.pending = carried;
        s.predecessor = Some(page);
        s.inherited = inherited;

        log::debug!(
            "Page {:?} overflowed {} offers into {:?}",
            page,
            overflow.len(),
            successor
        );
        stats.pages_created += 1;
        Ok(())
    }
}

/// Breaks measured items into lines. Each line is justified with the
/// horizontal justification in effect at its first item.
fn break_lines(items: Vec<LineItem>, width: f32, state: &LayoutState) -> Vec<LayoutLine> {
    let mut lines = Vec::new();
    let mut rest = items;
    while !rest.is_empty() {
        let justifier = Justifier::new(width, rest[0].along_x, BreakOrder::Line).with_preferred(BreakOrder::Word);
        let split = justifier.split(&rest);
        let tail = rest.split_off(split.len);
        let unit = std::mem::replace(&mut rest, tail);
        lines.push(LayoutLine::new(justifier.justify(unit, split.ended_by), &state.along_y));
    }
    lines
}
