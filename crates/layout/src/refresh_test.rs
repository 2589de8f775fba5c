use crate::drawable::{Drawable, Image};
use crate::layout::ContentSource;
use crate::refresh::FrameSchedule;
use crate::test_utils::{create_test_tree, TestHarness};
use crate::tree::{DrawableId, LayoutTree};
use crate::LayoutError;
use folio_traits::ResourceState;
use folio_types::{EventCategory, ResourceUri, Size, TextureId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Rebuilds a single rectangle and asks to be refreshed on mouse movement.
#[derive(Debug, Default)]
struct Hover {
    runs: AtomicUsize,
}

impl ContentSource for Hover {
    fn evaluate(&self, tree: &mut LayoutTree, layout: DrawableId, _now: f64) -> Result<(), LayoutError> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        tree.add(layout, Drawable::rect(10.0, 10.0))?;
        tree.refresh_on(layout, EventCategory::MOUSE_MOVE, None)?;
        tree.name_layout(layout, "hover")?;
        Ok(())
    }
}

/// Asks for a timer refresh one second after each run.
#[derive(Debug, Default)]
struct Clock {
    runs: AtomicUsize,
}

impl ContentSource for Clock {
    fn evaluate(&self, tree: &mut LayoutTree, layout: DrawableId, now: f64) -> Result<(), LayoutError> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        tree.refresh_after(layout, now, 1.0)
    }
}

fn events(categories: &[EventCategory]) -> BTreeSet<EventCategory> {
    categories.iter().copied().collect()
}

#[test]
fn test_deadlines_fold_to_the_earliest() {
    let mut tree = create_test_tree();
    let root = tree.root();
    let a = tree.add_layout(root).unwrap();
    let b = tree.add_layout(a).unwrap();

    tree.refresh_after(a, 0.0, 10.0).unwrap();
    tree.refresh_after(b, 0.0, 4.0).unwrap();

    assert_eq!(tree.next_refresh(root), 4.0);
    assert_eq!(tree.next_refresh(a), 4.0);
    let idle = tree.add_layout(root).unwrap();
    assert!(tree.next_refresh(idle).is_infinite());
}

#[test]
fn test_later_deadline_never_postpones() {
    let mut tree = create_test_tree();
    let root = tree.root();
    tree.refresh_on(root, EventCategory::TIMER, Some(3.0)).unwrap();
    tree.refresh_on(root, EventCategory::TIMER, Some(8.0)).unwrap();
    assert_eq!(tree.next_refresh(root), 3.0);

    tree.no_refresh_on(root, EventCategory::TIMER).unwrap();
    assert!(tree.next_refresh(root).is_infinite());
    assert!(tree.refresh_events(root).is_empty());
}

#[test]
fn test_dependency_cycles_terminate() {
    let mut tree = create_test_tree();
    let root = tree.root();
    let a = tree.add_layout(root).unwrap();
    let b = tree.add_layout(root).unwrap();
    tree.name_layout(a, "a").unwrap();
    tree.name_layout(b, "b").unwrap();
    tree.add_dep(a, "b").unwrap();
    tree.add_dep(b, "a").unwrap();
    tree.refresh_on(b, EventCategory::KEY, Some(2.0)).unwrap();

    assert_eq!(tree.next_refresh(a), 2.0);
    assert!(tree.refresh_events(a).contains(&EventCategory::KEY));
}

#[test]
fn test_clear_drops_refresh_bookkeeping() {
    let mut tree = create_test_tree();
    let root = tree.root();
    let a = tree.add_layout(root).unwrap();
    tree.name_layout(a, "a").unwrap();
    tree.refresh_on(a, EventCategory::FOCUS, None).unwrap();

    tree.clear(a).unwrap();

    assert!(tree.refresh_events(a).is_empty());
    assert!(tree.named(&"a".into()).is_empty());
}

#[test]
fn test_event_refreshes_only_subscribed_layouts() {
    let mut tree = create_test_tree();
    let root = tree.root();
    let hover = tree.add_layout(root).unwrap();
    let clock = tree.add_layout(root).unwrap();
    let hover_source = Arc::new(Hover::default());
    let clock_source = Arc::new(Clock::default());
    tree.set_source(hover, hover_source.clone()).unwrap();
    tree.set_source(clock, clock_source.clone()).unwrap();
    tree.reevaluate(hover, 0.0).unwrap();
    tree.reevaluate(clock, 0.0).unwrap();
    let first_rect = tree.children(hover)[0];

    let ran = tree.refresh(&events(&[EventCategory::MOUSE_MOVE]), 0.5).unwrap();

    assert_eq!(ran, 1);
    assert_eq!(hover_source.runs.load(Ordering::Relaxed), 2);
    assert_eq!(clock_source.runs.load(Ordering::Relaxed), 1);
    assert!(!tree.contains(first_rect));
    assert_eq!(tree.children(hover).len(), 1);
    assert_eq!(tree.named(&"hover".into()), &[hover]);
}

#[test]
fn test_due_deadline_refreshes_without_events() {
    let mut tree = create_test_tree();
    let root = tree.root();
    let clock = tree.add_layout(root).unwrap();
    let source = Arc::new(Clock::default());
    tree.set_source(clock, source.clone()).unwrap();
    tree.reevaluate(clock, 0.0).unwrap();

    assert_eq!(tree.refresh(&BTreeSet::new(), 0.5).unwrap(), 0);
    assert_eq!(tree.refresh(&BTreeSet::new(), 1.0).unwrap(), 1);
    assert_eq!(source.runs.load(Ordering::Relaxed), 2);
    assert_eq!(tree.next_refresh(root), 2.0);
}

#[test]
fn test_schedule_reports_wait_and_immediate_events() {
    let mut tree = create_test_tree();
    let root = tree.root();
    let a = tree.add_layout(root).unwrap();
    tree.refresh_after(a, 0.0, 0.25).unwrap();
    tree.refresh_on(a, EventCategory::RESIZE, None).unwrap();

    let schedule = FrameSchedule::collect(&tree);
    assert_eq!(schedule.wait(0.0), Some(Duration::from_millis(250)));
    assert_eq!(schedule.wait(1.0), Some(Duration::ZERO));
    assert!(schedule.is_due(0.25));
    assert!(schedule.wants(EventCategory::RESIZE));
    assert!(!schedule.wants(EventCategory::TIMER));

    let idle = FrameSchedule::collect(&create_test_tree());
    assert_eq!(idle.wait(0.0), None);
}

#[test]
fn test_pending_image_subscribes_to_delivery() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let group = tree.add_layout(root).unwrap();
    tree.add(
        group,
        Drawable::Image(Image {
            uri: ResourceUri::from("logo.png"),
            size: Size::new(32.0, 32.0),
        }),
    )
    .unwrap();

    tree.evaluate(&mut h.measure()).unwrap();
    assert!(tree.refresh_events(group).contains(&EventCategory::RESOURCE_READY));

    let mut ready = TestHarness::new();
    ready.textures.insert(
        "logo.png",
        ResourceState::Ready {
            texture: TextureId(1),
            size: Size::new(32.0, 32.0),
        },
    );
    let mut fresh = create_test_tree();
    let root = fresh.root();
    fresh
        .add(
            root,
            Drawable::Image(Image {
                uri: ResourceUri::from("logo.png"),
                size: Size::new(32.0, 32.0),
            }),
        )
        .unwrap();
    fresh.evaluate(&mut ready.measure()).unwrap();
    assert!(fresh.refresh_events(root).is_empty());
}

#[test]
fn test_delivered_image_stops_waiting_for_delivery() {
    let mut h = TestHarness::new();
    let mut tree = create_test_tree();
    let root = tree.root();
    let waiting = tree.add_layout(root).unwrap();
    let declared = tree.add_layout(root).unwrap();
    tree.refresh_on(declared, EventCategory::RESOURCE_READY, None).unwrap();
    for layout in [waiting, declared] {
        tree.add(
            layout,
            Drawable::Image(Image {
                uri: ResourceUri::from("logo.png"),
                size: Size::new(32.0, 32.0),
            }),
        )
        .unwrap();
    }

    tree.evaluate(&mut h.measure()).unwrap();
    assert!(FrameSchedule::collect(&tree).wants(EventCategory::RESOURCE_READY));

    h.textures.insert(
        "logo.png",
        ResourceState::Ready {
            texture: TextureId(1),
            size: Size::new(32.0, 32.0),
        },
    );
    tree.evaluate(&mut h.measure()).unwrap();

    assert!(tree.refresh_events(waiting).is_empty());
    assert!(tree.refresh_events(declared).contains(&EventCategory::RESOURCE_READY));
    tree.no_refresh_on(declared, EventCategory::RESOURCE_READY).unwrap();
    assert!(!FrameSchedule::collect(&tree).wants(EventCategory::RESOURCE_READY));
}
