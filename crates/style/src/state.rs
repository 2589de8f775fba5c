use crate::{Attribute, FontModel, Justification, Margins, PaintModel, TextWrap};
use folio_types::{Box3, Point, Transform};
use serde::{Deserialize, Serialize};

/// The inheritable ambient attributes in effect while a drawable runs.
///
/// This is a plain value: a child layout receives a copy of its parent's
/// state, so nothing it changes can leak back up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutState {
    pub transform: Transform,
    /// Where flowed content is placed in the local frame. Lines and tables
    /// move this cursor before drawing each item.
    pub offset: Point,
    pub font: FontModel,
    pub paint: PaintModel,
    pub margins: Margins,
    pub along_x: Justification,
    pub along_y: Justification,
    pub wrap: TextWrap,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            offset: Point::ORIGIN,
            font: FontModel::default(),
            paint: PaintModel::default(),
            margins: Margins::default(),
            along_x: Justification::default(),
            along_y: Justification::default(),
            wrap: TextWrap::Word,
        }
    }
}

impl LayoutState {
    pub fn apply(&mut self, attribute: &Attribute) {
        match attribute {
            Attribute::Translate { x, y, z } => {
                self.transform = self.transform.then(&Transform::translation(*x, *y, *z));
            }
            Attribute::Scale { x, y, z } => {
                self.transform = self.transform.then(&Transform::scaling(*x, *y, *z));
            }
            Attribute::Rotate { degrees } => {
                self.transform = self.transform.then(&Transform::rotation(*degrees));
            }
            Attribute::ResetTransform => self.transform = Transform::IDENTITY,
            Attribute::FillColor { color } => self.paint.fill = *color,
            Attribute::LineColor { color } => self.paint.line = *color,
            Attribute::LineWidth { width } => self.paint.line_width = width.max(0.0),
            Attribute::FontFamily { family } => self.font.family = family.clone(),
            Attribute::FontSize { size } => self.font.set_size(size.max(0.0)),
            Attribute::FontWeight { weight } => self.font.weight = *weight,
            Attribute::FontStyle { style } => self.font.style = *style,
            Attribute::LineHeight { height } => self.font.line_height = height.max(0.0),
            Attribute::Texture { texture } => self.paint.texture = *texture,
            Attribute::Shader { shader } => self.paint.shader = *shader,
            Attribute::Lighting { lighting } => self.paint.lighting = *lighting,
            Attribute::Margins { margins } => self.margins = *margins,
            Attribute::JustifyX { justification } => self.along_x = *justification,
            Attribute::JustifyY { justification } => self.along_y = *justification,
            Attribute::Wrap { wrap } => self.wrap = *wrap,
        }
    }

    /// Maps a local point (relative to the current offset) to world space.
    pub fn to_world(&self, local: Point) -> Point {
        self.transform.apply(local.add(self.offset))
    }

    /// Maps a local box (relative to the current offset) to world space.
    pub fn box_to_world(&self, local: &Box3) -> Box3 {
        self.transform.apply_box(&local.offset(self.offset))
    }

    /// A copy of this state with the cursor moved back to the origin,
    /// used when measuring something in its own zero-offset frame.
    pub fn at_origin(&self) -> LayoutState {
        LayoutState {
            offset: Point::ORIGIN,
            transform: Transform::IDENTITY,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::Color;

    #[test]
    fn attributes_mutate_state() {
        let mut state = LayoutState::default();
        state.apply(&Attribute::FillColor { color: Color::WHITE });
        state.apply(&Attribute::Translate { x: 10.0, y: 5.0, z: 0.0 });
        assert_eq!(state.paint.fill, Color::WHITE);
        assert_eq!(state.to_world(Point::flat(1.0, 1.0)), Point::flat(11.0, 6.0));
    }

    #[test]
    fn copies_are_independent() {
        let parent = LayoutState::default();
        let mut child = parent.clone();
        child.apply(&Attribute::FontSize { size: 30.0 });
        assert_eq!(parent.font.size, 12.0);
        assert_eq!(child.font.size, 30.0);
    }

    #[test]
    fn visual_attributes_are_classified() {
        assert!(Attribute::Texture { texture: None }.is_visual());
        assert!(!Attribute::Translate { x: 0.0, y: 0.0, z: 0.0 }.is_visual());
        assert!(Attribute::FontSize { size: 3.0 }.affects_metrics());
    }
}
