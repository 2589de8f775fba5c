use crate::justify::{BreakOrder, Justifiable, Justified};
use crate::tree::DrawableId;
use folio_style::Justification;
use folio_types::Point;

/// A measured drawable offered to a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: DrawableId,
    pub extent: f32,
    /// Lower corner of the item's space, measured at the origin. Placement
    /// subtracts it so the space starts exactly at the item's position.
    pub lower: Point,
    pub height: f32,
    /// Distance from the top of the item to its baseline.
    pub ascent: f32,
    pub break_after: Option<BreakOrder>,
    pub separator: bool,
    /// Attribute items change the running state when the line is drawn.
    pub attribute: bool,
    /// Extra break opportunities of a repeated offer. These never draw.
    pub repeat: bool,
    /// Horizontal justification in effect where the item was offered.
    pub along_x: Justification,
    /// Line height in effect where the item was offered, used for lines
    /// without content.
    pub line_height: f32,
    /// Index of the offer this item was measured from.
    pub offer: usize,
}

impl Justifiable for LineItem {
    fn extent(&self) -> f32 {
        self.extent
    }

    fn break_after(&self) -> Option<BreakOrder> {
        self.break_after
    }

    fn is_separator(&self) -> bool {
        self.separator
    }
}

/// One line of flowed content.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub items: Justified<LineItem>,
    pub height: f32,
    /// Distance from the top of the line to the shared baseline.
    pub baseline: f32,
    /// Vertical room the line takes, including line spacing and the space
    /// after a paragraph.
    pub advance: f32,
}

impl LayoutLine {
    pub fn new(items: Justified<LineItem>, along_y: &Justification) -> Self {
        let mut baseline = 0.0f32;
        let mut descent = 0.0f32;
        let mut content = false;
        for item in items.items().filter(|i| !i.separator || i.height > 0.0) {
            baseline = baseline.max(item.ascent);
            descent = descent.max(item.height - item.ascent);
            content = true;
        }

        let mut height = baseline + descent;
        if !content || height <= 0.0 {
            height = items.items().next().map(|i| i.line_height).unwrap_or(0.0);
            baseline = height;
        }

        let mut advance = height * along_y.spacing.max(0.0);
        if items.ended_by.boundary(BreakOrder::Line) >= BreakOrder::Paragraph {
            advance += along_y.after;
        }

        Self {
            items,
            height,
            baseline,
            advance,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Justifiable for LayoutLine {
    fn extent(&self) -> f32 {
        self.advance
    }

    fn break_after(&self) -> Option<BreakOrder> {
        Some(self.items.ended_by.boundary(BreakOrder::Line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::justify::Justifier;
    use crate::tree::LayoutTree;

    fn item(id: DrawableId, extent: f32, height: f32, ascent: f32) -> LineItem {
        LineItem {
            id,
            extent,
            lower: Point::ORIGIN,
            height,
            ascent,
            break_after: None,
            separator: false,
            attribute: false,
            repeat: false,
            along_x: Justification::default(),
            line_height: 14.0,
            offer: 0,
        }
    }

    #[test]
    fn baseline_is_the_tallest_ascent() {
        let tree = LayoutTree::default();
        let id = tree.root();
        let justifier = Justifier::new(100.0, Justification::default(), BreakOrder::Line);
        let items = vec![item(id, 10.0, 20.0, 20.0), item(id, 10.0, 14.0, 10.0)];
        let line = LayoutLine::new(justifier.justify(items, crate::UnitEnd::Exhausted), &Justification::default());
        assert_eq!(line.baseline, 20.0);
        assert_eq!(line.height, 24.0);
        assert_eq!(line.advance, 24.0);
    }

    #[test]
    fn lone_break_keeps_line_height() {
        let tree = LayoutTree::default();
        let mut marker = item(tree.root(), 0.0, 0.0, 0.0);
        marker.separator = true;
        marker.break_after = Some(BreakOrder::Paragraph);
        let justifier = Justifier::new(100.0, Justification::default(), BreakOrder::Line);
        let along_y = Justification {
            after: 6.0,
            ..Justification::default()
        };
        let line = LayoutLine::new(
            justifier.justify(vec![marker], crate::UnitEnd::Hard(BreakOrder::Paragraph)),
            &along_y,
        );
        assert_eq!(line.height, 14.0);
        assert_eq!(line.advance, 20.0);
        assert_eq!(line.break_after(), Some(BreakOrder::Paragraph));
    }
}
