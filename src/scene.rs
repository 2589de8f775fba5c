//! JSON scene descriptions.
//!
//! A scene stands in for a host document evaluator: it is a tree of items
//! that are added, paginated or recorded into flows depending on where they
//! appear. Layouts with refresh settings are installed as content sources
//! and rebuilt whenever their refresh metadata asks for it.

use crate::config::PageConfig;
use crate::error::FolioError;
use folio_layout::{
    BreakOrder, ContentSource, Drawable, DrawableId, Handle, Image, LayoutError, LayoutTree, Shape, Table,
};
use folio_style::{Attribute, Margins, PageSize};
use folio_types::{Color, EventCategory, FlowName, Point, ResourceUri, Size};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

fn one() -> u32 {
    1
}

fn one_f() -> f32 {
    1.0
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub items: Vec<SceneItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SceneItem {
    Rect {
        width: f32,
        height: f32,
    },
    RoundedRect {
        width: f32,
        height: f32,
        radius: f32,
    },
    Ellipse {
        width: f32,
        height: f32,
    },
    Polygon {
        points: Vec<[f32; 2]>,
    },
    Line {
        x: f32,
        y: f32,
    },
    Text {
        text: String,
    },
    /// Seconds since the driver started, rebuilt on every evaluation.
    Clock {
        #[serde(default)]
        precision: usize,
    },
    Attribute(Attribute),
    Break {
        order: BreakOrder,
        #[serde(default = "one")]
        count: u32,
    },
    Image {
        uri: String,
        width: f32,
        height: f32,
    },
    Handle {
        width: f32,
        height: f32,
    },
    Layout(LayoutItem),
    Page(PageItem),
    Table(TableItem),
    /// Records its items into a named flow instead of drawing them here.
    Flow {
        name: String,
        #[serde(default)]
        items: Vec<SceneItem>,
    },
    /// Makes the enclosing page replay a flow.
    Anchor {
        flow: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayoutItem {
    pub items: Vec<SceneItem>,
    pub name: Option<String>,
    pub deps: Vec<String>,
    /// Rebuild this often, in seconds.
    pub refresh_every: Option<f64>,
    /// Rebuild when any of these event categories arrive.
    pub refresh_on: Vec<EventCategory>,
}

impl LayoutItem {
    fn is_live(&self) -> bool {
        self.refresh_every.is_some() || !self.refresh_on.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageItem {
    pub size: Option<PageSize>,
    pub margins: Option<Margins>,
    pub columns: Option<usize>,
    pub gap: Option<f32>,
    pub items: Vec<SceneItem>,
}

impl PageItem {
    fn page_config(&self, defaults: &PageConfig) -> PageConfig {
        PageConfig {
            size: self.size.unwrap_or(defaults.size),
            margins: self.margins.unwrap_or(defaults.margins),
            columns: self.columns.unwrap_or(defaults.columns),
            gap: self.gap.unwrap_or(defaults.gap),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableItem {
    pub rows: usize,
    pub columns: usize,
    #[serde(default)]
    pub margin: [f32; 2],
    #[serde(default)]
    pub fill: Option<Color>,
    #[serde(default)]
    pub border: Option<Color>,
    #[serde(default = "one_f")]
    pub border_width: f32,
    #[serde(default)]
    pub cells: Vec<SceneItem>,
}

impl TableItem {
    fn table(&self) -> Table {
        let mut table = Table::new(self.rows, self.columns).with_margin(self.margin[0], self.margin[1]);
        if let Some(fill) = self.fill {
            table = table.with_fill(fill);
        }
        if let Some(border) = self.border {
            table = table.with_border(border, self.border_width);
        }
        table
    }
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FolioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Adds the scene below the root and returns the layout holding it.
    pub fn build(&self, tree: &mut LayoutTree, defaults: &PageConfig) -> Result<DrawableId, FolioError> {
        let root = tree.root();
        let layout = tree.add_layout(root)?;
        let builder = Builder { defaults, now: 0.0 };
        builder.items(tree, &Target::Layout(layout), &self.items)?;
        Ok(layout)
    }
}

/// Where built drawables go.
#[derive(Debug, Clone)]
enum Target {
    Layout(DrawableId),
    Page(DrawableId),
    Table(DrawableId),
    Flow(DrawableId, FlowName),
}

struct Builder<'c> {
    defaults: &'c PageConfig,
    now: f64,
}

impl Builder<'_> {
    fn items(&self, tree: &mut LayoutTree, target: &Target, items: &[SceneItem]) -> Result<(), FolioError> {
        for item in items {
            self.item(tree, target, item)?;
        }
        Ok(())
    }

    fn place(&self, tree: &mut LayoutTree, target: &Target, drawable: Drawable) -> Result<Vec<DrawableId>, FolioError> {
        let ids = match target {
            Target::Layout(layout) => vec![tree.add(*layout, drawable)?],
            Target::Page(page) => tree.paginate(*page, drawable)?,
            Target::Table(table) => vec![tree.add_cell(*table, drawable)?],
            Target::Flow(owner, name) => tree.record(*owner, name.clone(), drawable)?,
        };
        Ok(ids)
    }

    /// Places a container, which never splits into pieces.
    fn place_one(&self, tree: &mut LayoutTree, target: &Target, drawable: Drawable) -> Result<DrawableId, FolioError> {
        let kind = drawable.kind();
        self.place(tree, target, drawable)?
            .into_iter()
            .next()
            .ok_or_else(|| FolioError::Scene(format!("{} was not placed", kind)))
    }

    fn item(&self, tree: &mut LayoutTree, target: &Target, item: &SceneItem) -> Result<(), FolioError> {
        let drawable = match item {
            SceneItem::Rect { width, height } => Drawable::rect(*width, *height),
            SceneItem::RoundedRect { width, height, radius } => Drawable::Shape(Shape::RoundedRectangle {
                size: Size::new(*width, *height),
                radius: *radius,
            }),
            SceneItem::Ellipse { width, height } => Drawable::Shape(Shape::ellipse(*width, *height)),
            SceneItem::Polygon { points } => Drawable::Shape(Shape::Polygon {
                points: points.iter().map(|[x, y]| Point::flat(*x, *y)).collect(),
            }),
            SceneItem::Line { x, y } => Drawable::Shape(Shape::Line { to: Point::flat(*x, *y) }),
            SceneItem::Text { text } => Drawable::text(text),
            SceneItem::Clock { precision } => Drawable::text(&format!("{:.*}", *precision, self.now)),
            SceneItem::Attribute(attribute) => Drawable::Attribute(attribute.clone()),
            SceneItem::Image { uri, width, height } => Drawable::Image(Image {
                uri: ResourceUri::from(uri.as_str()),
                size: Size::new(*width, *height),
            }),
            SceneItem::Handle { width, height } => Drawable::Handle(Handle {
                size: Size::new(*width, *height),
                target: None,
            }),
            SceneItem::Break { order, count } => return self.brk(tree, target, *order, *count),
            SceneItem::Layout(desc) => {
                let layout = self.place_one(tree, target, Drawable::layout())?;
                return self.install(tree, layout, desc);
            }
            SceneItem::Page(desc) => {
                if matches!(target, Target::Page(_) | Target::Flow(..)) {
                    return Err(FolioError::Scene("pages cannot be paginated or recorded".into()));
                }
                let page = Drawable::Page(desc.page_config(self.defaults).build());
                let page = self.place_one(tree, target, page)?;
                return self.items(tree, &Target::Page(page), &desc.items);
            }
            SceneItem::Table(desc) => {
                let table = self.place_one(tree, target, desc.table().into())?;
                return self.items(tree, &Target::Table(table), &desc.cells);
            }
            SceneItem::Flow { name, items } => {
                let Target::Layout(owner) = target else {
                    return Err(FolioError::Scene(format!("flow '{}' must be recorded from a layout", name)));
                };
                return self.items(tree, &Target::Flow(*owner, FlowName::from(name.as_str())), items);
            }
            SceneItem::Anchor { flow } => {
                let Target::Page(page) = target else {
                    return Err(FolioError::Scene(format!("anchor for '{}' must sit on a page", flow)));
                };
                tree.anchor_flow(*page, flow.as_str())?;
                return Ok(());
            }
        };
        self.place(tree, target, drawable)?;
        Ok(())
    }

    /// Breaks keep their repeat count wherever they are offered.
    fn brk(&self, tree: &mut LayoutTree, target: &Target, order: BreakOrder, count: u32) -> Result<(), FolioError> {
        let drawable = Drawable::Break(order);
        match target {
            Target::Page(page) => {
                tree.paginate_item(*page, drawable, Some(order), count)?;
            }
            Target::Flow(owner, name) => {
                tree.flow_item(*owner, name.clone(), drawable, Some(order), count)?;
            }
            Target::Layout(_) | Target::Table(_) => {
                self.place(tree, target, drawable)?;
            }
        }
        Ok(())
    }

    fn install(&self, tree: &mut LayoutTree, layout: DrawableId, desc: &LayoutItem) -> Result<(), FolioError> {
        if desc.is_live() {
            let source = LiveContent {
                desc: desc.clone(),
                defaults: self.defaults.clone(),
            };
            tree.set_source(layout, Arc::new(source))?;
            tree.reevaluate(layout, self.now)?;
            return Ok(());
        }
        self.fill(tree, layout, desc)
    }

    fn fill(&self, tree: &mut LayoutTree, layout: DrawableId, desc: &LayoutItem) -> Result<(), FolioError> {
        if let Some(name) = &desc.name {
            tree.name_layout(layout, name.as_str())?;
        }
        for dep in &desc.deps {
            tree.add_dep(layout, dep.as_str())?;
        }
        if let Some(period) = desc.refresh_every {
            tree.refresh_after(layout, self.now, period)?;
        }
        for &category in &desc.refresh_on {
            tree.refresh_on(layout, category, None)?;
        }
        self.items(tree, &Target::Layout(layout), &desc.items)
    }
}

/// Rebuilds a scene layout from its description on every refresh.
#[derive(Debug)]
struct LiveContent {
    desc: LayoutItem,
    defaults: PageConfig,
}

impl ContentSource for LiveContent {
    fn evaluate(&self, tree: &mut LayoutTree, layout: DrawableId, now: f64) -> Result<(), LayoutError> {
        let builder = Builder {
            defaults: &self.defaults,
            now,
        };
        builder.fill(tree, layout, &self.desc).map_err(|e| match e {
            FolioError::Layout(e) => e,
            other => LayoutError::Generic(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r##"{
        "items": [
            { "type": "attribute", "attr": "fill-color", "color": "#336699" },
            { "type": "rect", "width": 20, "height": 10 },
            { "type": "layout", "name": "clock", "refresh_every": 1.0, "items": [
                { "type": "clock", "precision": 1 }
            ]},
            { "type": "flow", "name": "body", "items": [
                { "type": "text", "text": "one two" }
            ]},
            { "type": "page", "size": { "width": 200, "height": 100 }, "margins": 0, "items": [
                { "type": "text", "text": "Title" },
                { "type": "break", "order": "line", "count": 2 },
                { "type": "anchor", "flow": "body" }
            ]},
            { "type": "table", "rows": 1, "columns": 2, "fill": "#ffffff", "cells": [
                { "type": "text", "text": "a" },
                { "type": "layout", "items": [{ "type": "ellipse", "width": 5, "height": 5 }] }
            ]}
        ]
    }"##;

    #[test]
    fn builds_every_item_kind() {
        let scene = Scene::from_json(DOCUMENT).unwrap();
        let mut tree = LayoutTree::default();
        let scene_layout = scene.build(&mut tree, &PageConfig::default()).unwrap();

        let children = tree.children(scene_layout).to_vec();
        assert_eq!(children.len(), 5);
        assert!(matches!(tree.get(children[0]), Ok(Drawable::Attribute(_))));

        let clock = tree.named(&"clock".into()).to_vec();
        assert_eq!(clock, vec![children[2]]);
        assert_eq!(tree.next_refresh(clock[0]), 1.0);
        assert!(matches!(tree.get(tree.children(clock[0])[0]), Ok(Drawable::Text(_))));

        let flow = tree.flow(&FlowName::from("body")).unwrap();
        assert_eq!(flow.len(), 3);

        let page = tree.get(children[3]).unwrap().as_page().unwrap();
        assert_eq!(page.size, Size::new(200.0, 100.0));
        assert_eq!(page.pending.len(), 3);
        assert_eq!(page.pending[1].count, 2);

        let table = tree.get(children[4]).unwrap().as_table().unwrap();
        assert_eq!(table.cells.len(), 2);
    }

    #[test]
    fn rejects_misplaced_anchor() {
        let scene = Scene::from_json(r#"{ "items": [{ "type": "anchor", "flow": "body" }] }"#).unwrap();
        let err = scene.build(&mut LayoutTree::default(), &PageConfig::default()).unwrap_err();
        assert!(matches!(err, FolioError::Scene(_)));
    }

    #[test]
    fn rejects_unknown_item() {
        assert!(matches!(
            Scene::from_json(r#"{ "items": [{ "type": "sphere" }] }"#),
            Err(FolioError::Json(_))
        ));
    }
}
