//! Two-pass grid layout.
//!
//! Cells are added row-major. Sizing measures every cell's space in a
//! zero-offset frame and folds it into per-column and per-row boxes; the box
//! extents become the column widths and row heights. Sizing is kept until a
//! cell changes, so drawing a table repeatedly costs one lookup.

use crate::context::MeasureContext;
use crate::drawable::Drawable;
use crate::measure;
use crate::perf::{self, CacheKind};
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_style::{Attribute, LayoutState};
use folio_types::{Box3, Color, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Where a cell sits inside its allotted box: 0 packs to the start, 0.5
/// centers, 1 packs to the end.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellAlign {
    pub x: f32,
    pub y: f32,
}

impl CellAlign {
    pub fn centered() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Result of the measuring pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TableSizing {
    pub column_width: Vec<f32>,
    pub row_height: Vec<f32>,
    /// Most negative origin per column and row; cells are shifted by it so
    /// content drawn left of or above its origin stays inside the cell.
    pub column_origin: Vec<f32>,
    pub row_origin: Vec<f32>,
    pub spaces: Vec<Box3>,
}

#[derive(Debug)]
pub struct Table {
    pub rows: usize,
    pub columns: usize,
    /// Room added on each side of every cell.
    pub margin: Size,
    pub fill: Option<Color>,
    /// Border color and line width.
    pub border: Option<(Color, f32)>,
    pub cells: Vec<DrawableId>,
    pub align: Vec<CellAlign>,
    pub column_width: Vec<f32>,
    pub row_height: Vec<f32>,
    column_origin: Vec<f32>,
    row_origin: Vec<f32>,
    spaces: Vec<Box3>,
    pub fills: Vec<DrawableId>,
    pub borders: Vec<DrawableId>,
    next_slot: u64,
}

impl Table {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            margin: Size::zero(),
            fill: None,
            border: None,
            cells: Vec::new(),
            align: Vec::new(),
            column_width: Vec::new(),
            row_height: Vec::new(),
            column_origin: Vec::new(),
            row_origin: Vec::new(),
            spaces: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            next_slot: 0,
        }
    }

    pub fn with_margin(mut self, x: f32, y: f32) -> Self {
        self.margin = Size::new(x, y);
        self
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_border(mut self, color: Color, width: f32) -> Self {
        self.border = Some((color, width));
        self
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.columns
    }

    /// True when the derived sizing matches the declared grid.
    pub fn is_sized(&self) -> bool {
        self.column_width.len() == self.columns && self.row_height.len() == self.rows
    }

    pub(crate) fn take_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    pub(crate) fn invalidate(&mut self) {
        self.column_width.clear();
        self.row_height.clear();
        self.column_origin.clear();
        self.row_origin.clear();
        self.spaces.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.cells.clear();
        self.align.clear();
        self.fills.clear();
        self.borders.clear();
        self.next_slot = 0;
        self.invalidate();
    }

    pub(crate) fn take_decorations(&mut self) -> Vec<DrawableId> {
        let mut out = std::mem::take(&mut self.fills);
        out.append(&mut self.borders);
        out
    }

    pub(crate) fn detach(&mut self, id: DrawableId) {
        if let Some(pos) = self.cells.iter().position(|c| *c == id) {
            self.cells.remove(pos);
            self.align.remove(pos);
            self.invalidate();
        }
        self.fills.retain(|f| *f != id);
        self.borders.retain(|b| *b != id);
    }

    fn apply(&mut self, sizing: TableSizing) {
        self.column_width = sizing.column_width;
        self.row_height = sizing.row_height;
        self.column_origin = sizing.column_origin;
        self.row_origin = sizing.row_origin;
        self.spaces = sizing.spaces;
    }

    /// Total size for the given widths and heights, margins included.
    pub fn size_for(&self, column_width: &[f32], row_height: &[f32]) -> Size {
        Size::new(
            column_width.iter().sum::<f32>() + 2.0 * self.margin.width * self.columns as f32,
            row_height.iter().sum::<f32>() + 2.0 * self.margin.height * self.rows as f32,
        )
    }

    pub fn size(&self) -> Size {
        self.size_for(&self.column_width, &self.row_height)
    }

    /// The box allotted to grid slot `index`, margins included.
    pub fn cell_rect(&self, index: usize) -> Rect {
        let (row, col) = (index / self.columns.max(1), index % self.columns.max(1));
        let x: f32 = self.column_width[..col.min(self.column_width.len())]
            .iter()
            .map(|w| w + 2.0 * self.margin.width)
            .sum();
        let y: f32 = self.row_height[..row.min(self.row_height.len())]
            .iter()
            .map(|h| h + 2.0 * self.margin.height)
            .sum();
        let w = self.column_width.get(col).copied().unwrap_or(0.0);
        let h = self.row_height.get(row).copied().unwrap_or(0.0);
        Rect::new(x, y, w + 2.0 * self.margin.width, h + 2.0 * self.margin.height)
    }

    /// Offset at which cell `index` is drawn, relative to the table origin.
    pub fn placement(&self, index: usize) -> Point {
        let cols = self.columns.max(1);
        let (row, col) = (index / cols, index % cols);
        let slot = self.cell_rect(index);
        let space = self.spaces.get(index).copied().unwrap_or(Box3::EMPTY);
        let align = self.align.get(index).copied().unwrap_or_default();
        let origin_x = self.column_origin.get(col).copied().unwrap_or(0.0);
        let origin_y = self.row_origin.get(row).copied().unwrap_or(0.0);
        let (used_x, used_y) = if space.is_empty() {
            (0.0, 0.0)
        } else {
            (space.upper.x - origin_x, space.upper.y - origin_y)
        };
        let slack_x = (self.column_width.get(col).copied().unwrap_or(0.0) - used_x).max(0.0);
        let slack_y = (self.row_height.get(row).copied().unwrap_or(0.0) - used_y).max(0.0);
        Point::flat(
            slot.x + self.margin.width - origin_x + align.x * slack_x,
            slot.y + self.margin.height - origin_y + align.y * slack_y,
        )
    }
}

/// Measures every cell and folds the results into column and row boxes.
pub(crate) fn size_cells(
    tree: &LayoutTree,
    table: &Table,
    state: &LayoutState,
    cx: &mut MeasureContext<'_>,
) -> TableSizing {
    let frame = state.at_origin();
    let cols = table.columns.max(1);
    let mut column_boxes = vec![Box3::EMPTY; table.columns];
    let mut row_boxes = vec![Box3::EMPTY; table.rows];
    let mut spaces = Vec::with_capacity(table.cells.len());

    for (i, &cell) in table.cells.iter().enumerate() {
        let space = measure::space(tree, cell, &frame, cx);
        if let Some(b) = column_boxes.get_mut(i % cols) {
            *b = b.union(&space);
        }
        if let Some(b) = row_boxes.get_mut(i / cols) {
            *b = b.union(&space);
        }
        spaces.push(space);
    }

    let origin = |b: &Box3, pick: fn(&Point) -> f32| if b.is_empty() { 0.0 } else { pick(&b.lower) };
    TableSizing {
        column_width: column_boxes.iter().map(Box3::width).collect(),
        row_height: row_boxes.iter().map(Box3::height).collect(),
        column_origin: column_boxes.iter().map(|b| origin(b, |p| p.x)).collect(),
        row_origin: row_boxes.iter().map(|b| origin(b, |p| p.y)).collect(),
        spaces,
    }
}

impl LayoutTree {
    pub fn add_cell(&mut self, table: DrawableId, drawable: Drawable) -> Result<DrawableId, LayoutError> {
        self.add_cell_aligned(table, drawable, CellAlign::default())
    }

    pub fn add_cell_aligned(
        &mut self,
        table: DrawableId,
        drawable: Drawable,
        align: CellAlign,
    ) -> Result<DrawableId, LayoutError> {
        let t = self.get(table)?.as_table()?;
        if t.cells.len() >= t.capacity() {
            return Err(LayoutError::TableFull {
                rows: t.rows,
                columns: t.columns,
            });
        }
        let id = self.alloc_child(table, drawable)?;
        let t = self.get_mut(table)?.as_table_mut()?;
        t.cells.push(id);
        t.align.push(align);
        self.invalidate(table);
        Ok(id)
    }

    /// Sizes a table unless its sizing is still current. Returns whether
    /// the cells were measured.
    pub fn compute_table(
        &mut self,
        table: DrawableId,
        state: &LayoutState,
        cx: &mut MeasureContext<'_>,
    ) -> Result<bool, LayoutError> {
        let t = self.get(table)?.as_table()?;
        if t.is_sized() {
            cx.env.profiler.count_hit(CacheKind::Table);
            return Ok(false);
        }
        cx.env.profiler.count_miss(CacheKind::Table);
        let started = perf::start();
        let sizing = size_cells(self, t, state, cx);
        self.get_mut(table)?.as_table_mut()?.apply(sizing);
        self.resize_decorations(table)?;
        perf::finish(cx.env.profiler, "table", started);
        Ok(true)
    }

    /// Builds the per-cell fill and border layouts once.
    pub(crate) fn build_decorations(&mut self, table: DrawableId) -> Result<(), LayoutError> {
        let t = self.get(table)?.as_table()?;
        let count = t.capacity();
        let fill = t.fill.filter(|_| t.fills.is_empty());
        let border = t.border.filter(|_| t.borders.is_empty());

        if let Some(color) = fill {
            let mut fills = Vec::with_capacity(count);
            for _ in 0..count {
                fills.push(self.decoration(
                    table,
                    vec![Drawable::Attribute(Attribute::FillColor { color }), Drawable::rect(0.0, 0.0)],
                )?);
            }
            self.get_mut(table)?.as_table_mut()?.fills = fills;
        }
        if let Some((color, width)) = border {
            let mut borders = Vec::with_capacity(count);
            for _ in 0..count {
                borders.push(self.decoration(
                    table,
                    vec![
                        Drawable::Attribute(Attribute::LineColor { color }),
                        Drawable::Attribute(Attribute::LineWidth { width }),
                        Drawable::Attribute(Attribute::FillColor {
                            color: Color::TRANSPARENT,
                        }),
                        Drawable::rect(0.0, 0.0),
                    ],
                )?);
            }
            self.get_mut(table)?.as_table_mut()?.borders = borders;
        }

        let t = self.get(table)?.as_table()?;
        debug_assert!(t.fill.is_none() || t.fills.len() == count);
        debug_assert!(t.border.is_none() || t.borders.len() == count);
        Ok(())
    }

    fn decoration(&mut self, table: DrawableId, parts: Vec<Drawable>) -> Result<DrawableId, LayoutError> {
        let layout = self.alloc_child(table, Drawable::layout())?;
        for part in parts {
            let id = self.alloc_child(layout, part)?;
            self.get_mut(layout)?.as_layout_mut()?.children.push(id);
        }
        Ok(layout)
    }

    /// Matches every decoration rectangle to its cell's allotted box.
    fn resize_decorations(&mut self, table: DrawableId) -> Result<(), LayoutError> {
        let t = self.get(table)?.as_table()?;
        let jobs: Vec<(DrawableId, Size)> = t
            .fills
            .iter()
            .enumerate()
            .chain(t.borders.iter().enumerate())
            .map(|(i, d)| (*d, t.cell_rect(i).size()))
            .collect();
        for (decoration, size) in jobs {
            let Some(&rect) = self.children(decoration).last() else {
                continue;
            };
            self.get_mut(rect)?.as_shape_mut()?.set_size(size);
        }
        Ok(())
    }
}

impl From<Table> for Drawable {
    fn from(table: Table) -> Self {
        Drawable::Table(table)
    }
}
