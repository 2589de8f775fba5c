use crate::flow::FlowAnchor;
use crate::justify::BreakOrder;
use crate::layout::Layout;
use crate::page::PageLayout;
use crate::shape::Shape;
use crate::table::Table;
use crate::text::TextSpan;
use crate::tree::DrawableId;
use crate::LayoutError;
use folio_render_core::Mesh;
use folio_style::{Attribute, LayoutState};
use folio_types::{Box3, ResourceUri, Size};
use std::fmt;

/// Custom content supplied by the embedding application.
///
/// Meshes and boxes are in the drawable's local frame; the traversal maps
/// them through the running transform. Errors are contained to the drawable.
pub trait Extension: fmt::Debug {
    fn name(&self) -> &str;

    fn bounds(&self, state: &LayoutState) -> Result<Box3, LayoutError>;

    fn space(&self, state: &LayoutState) -> Result<Box3, LayoutError> {
        self.bounds(state)
    }

    fn draw(&self, state: &LayoutState, out: &mut Vec<Mesh>) -> Result<(), LayoutError>;
}

/// An externally produced picture. Drawn as a placeholder until the
/// texture source reports it ready.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub uri: ResourceUri,
    pub size: Size,
}

/// A grab handle. Identify tags it with the handle category so a pick
/// resolves to it before the shape it manipulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub size: Size,
    pub target: Option<DrawableId>,
}

#[derive(Debug)]
pub enum Drawable {
    Layout(Layout),
    Shape(Shape),
    Text(TextSpan),
    Attribute(Attribute),
    Break(BreakOrder),
    Page(PageLayout),
    Table(Table),
    Flow(FlowAnchor),
    Handle(Handle),
    Image(Image),
    Custom(Box<dyn Extension>),
}

macro_rules! accessor {
    ($as_ref:ident, $as_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $as_ref(&self) -> Result<&$ty, LayoutError> {
            match self {
                Drawable::$variant(inner) => Ok(inner),
                other => Err(LayoutError::WrongKind {
                    expected: stringify!($variant),
                    found: other.kind(),
                }),
            }
        }

        pub fn $as_mut(&mut self) -> Result<&mut $ty, LayoutError> {
            match self {
                Drawable::$variant(inner) => Ok(inner),
                other => Err(LayoutError::WrongKind {
                    expected: stringify!($variant),
                    found: other.kind(),
                }),
            }
        }
    };
}

impl Drawable {
    pub fn text(text: &str) -> Self {
        Drawable::Text(TextSpan::new(text))
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Drawable::Shape(Shape::rect(width, height))
    }

    pub fn layout() -> Self {
        Drawable::Layout(Layout::new())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Drawable::Layout(_) => "Layout",
            Drawable::Shape(_) => "Shape",
            Drawable::Text(_) => "Text",
            Drawable::Attribute(_) => "Attribute",
            Drawable::Break(_) => "Break",
            Drawable::Page(_) => "Page",
            Drawable::Table(_) => "Table",
            Drawable::Flow(_) => "Flow",
            Drawable::Handle(_) => "Handle",
            Drawable::Image(_) => "Image",
            Drawable::Custom(_) => "Custom",
        }
    }

    /// Separators may hang at the end of a line and never count as content.
    pub fn is_separator(&self) -> bool {
        match self {
            Drawable::Text(span) => span.is_whitespace(),
            Drawable::Attribute(_) | Drawable::Break(_) | Drawable::Flow(_) => true,
            _ => false,
        }
    }

    /// Whether the drawable produces geometry or owns drawables that do.
    pub fn is_visible_kind(&self) -> bool {
        !matches!(
            self,
            Drawable::Attribute(_) | Drawable::Break(_) | Drawable::Flow(_)
        )
    }

    accessor!(as_layout, as_layout_mut, Layout, Layout);
    accessor!(as_page, as_page_mut, Page, PageLayout);
    accessor!(as_table, as_table_mut, Table, Table);
    accessor!(as_shape, as_shape_mut, Shape, Shape);
}
