//! The frame loop.
//!
//! A frame drains the resource inbox, re-evaluates the layouts whose refresh
//! metadata asks for it, draws, draws the selection overlay, and collects the
//! schedule that tells the host when the next frame is needed.

use crate::config::FrameConfig;
use crate::display::Display;
use crate::error::FolioError;
use crate::inbox::{InboxSender, ResourceInbox};
use folio_layout::{
    DebugProfiler, Env, FrameSchedule, LayoutCache, LayoutTree, MarqueeMode, NoOpProfiler, PickResult, Profiler,
    RenderContext, RenderStats,
};
use folio_render_core::{GraphicsBackend, SelectionCategory, SoftwareBackend};
use folio_traits::{DisplayHost, FixedAdvanceMetrics, FontMetrics};
use folio_types::{EventCategory, Rect};
use itertools::Itertools;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// What one frame did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub time: f64,
    /// Resources that landed in the inbox since the previous frame.
    pub delivered: usize,
    /// Layouts re-evaluated by refresh.
    pub refreshed: usize,
    pub draw: RenderStats,
    pub selection: RenderStats,
    pub schedule: FrameSchedule,
}

enum Profiling {
    Off(NoOpProfiler),
    On(DebugProfiler),
}

impl Profiling {
    fn as_dyn(&self) -> &dyn Profiler {
        match self {
            Profiling::Off(p) => p,
            Profiling::On(p) => p,
        }
    }
}

pub struct FrameDriver<B: GraphicsBackend = SoftwareBackend> {
    tree: LayoutTree,
    backend: B,
    cache: LayoutCache,
    metrics: Box<dyn FontMetrics>,
    inbox: ResourceInbox,
    display: Display,
    profiler: Profiling,
    config: FrameConfig,
    pending: BTreeSet<EventCategory>,
    schedule: FrameSchedule,
    frames: u64,
    started: Instant,
}

impl FrameDriver<SoftwareBackend> {
    /// A driver over the CPU reference backend.
    pub fn software(config: FrameConfig) -> (Self, InboxSender) {
        Self::new(SoftwareBackend::default(), config)
    }
}

impl<B: GraphicsBackend> FrameDriver<B> {
    /// Creates a driver with an empty tree. The sender is the producer end
    /// of the resource inbox.
    pub fn new(backend: B, config: FrameConfig) -> (Self, InboxSender) {
        let (inbox, sender) = ResourceInbox::unbounded();
        let tree = LayoutTree::new(config.layout.clone());
        let metrics = FixedAdvanceMetrics::new(config.glyph_advance, config.space_advance);
        let profiler = if config.profiling {
            Profiling::On(DebugProfiler::new())
        } else {
            Profiling::Off(NoOpProfiler)
        };
        let driver = Self {
            schedule: FrameSchedule::collect(&tree),
            tree,
            backend,
            cache: LayoutCache::new(config.layout.cache_capacity),
            metrics: Box::new(metrics),
            inbox,
            display: Display::with_zoom(config.zoom),
            profiler,
            config,
            pending: BTreeSet::new(),
            frames: 0,
            started: Instant::now(),
        };
        (driver, sender)
    }

    /// Replaces the font metrics, e.g. with the host's font stack.
    pub fn with_metrics(mut self, metrics: Box<dyn FontMetrics>) -> Self {
        self.metrics = metrics;
        self.cache.glyphs.clear();
        self.tree.invalidate_all();
        self
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        &mut self.tree
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Display {
        &mut self.display
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// The schedule collected at the end of the last frame.
    pub fn schedule(&self) -> &FrameSchedule {
        &self.schedule
    }

    /// Seconds since the driver was created.
    pub fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Queues a host event for the next frame.
    pub fn post(&mut self, category: EventCategory) {
        self.pending.insert(category);
    }

    /// Whether a frame is needed at `now`.
    pub fn needs_frame(&self, now: f64) -> bool {
        self.schedule.is_due(now) || self.pending.iter().any(|c| self.schedule.wants(*c))
    }

    /// How long the host may sleep before the next mandatory frame.
    pub fn wait(&self, now: f64) -> Option<Duration> {
        self.schedule.wait(now)
    }

    fn split(&mut self) -> (&mut LayoutTree, RenderContext<'_>) {
        let font_scaling = self.display.font_scaling() * self.display.printer_scaling();
        let cx = RenderContext {
            env: Env {
                metrics: self.metrics.as_ref(),
                textures: &self.inbox,
                profiler: self.profiler.as_dyn(),
                font_scaling,
            },
            cache: &mut self.cache,
            backend: &mut self.backend,
            display: &mut self.display,
        };
        (&mut self.tree, cx)
    }

    /// Runs one frame at `now` seconds. The backend is told a frame begins
    /// before anything is drawn.
    pub fn frame(&mut self, now: f64) -> Result<FrameReport, FolioError> {
        self.frames += 1;
        self.backend.begin_frame();
        let delivered = self.inbox.drain();
        if delivered > 0 {
            self.pending.insert(EventCategory::RESOURCE_READY);
        }

        let events = std::mem::take(&mut self.pending);
        let refreshed = self.tree.refresh(&events, now)?;
        if !events.is_empty() {
            log::trace!(
                "Frame {} events [{}] refreshed {} layouts",
                self.frames,
                events.iter().join(", "),
                refreshed
            );
        }

        let frame = self.frames;
        let (tree, mut cx) = self.split();
        let draw = tree.draw(&mut cx)?;
        let selection = tree.draw_selection(&mut cx)?;
        if draw.faults > 0 {
            log::warn!("Frame {} skipped {} faulty drawables", frame, draw.faults);
        }

        self.schedule = FrameSchedule::collect(&self.tree);
        if let Profiling::On(profiler) = &self.profiler {
            profiler.log_summary(frame);
            profiler.reset();
        }

        Ok(FrameReport {
            frame,
            time: now,
            delivered,
            refreshed,
            draw,
            selection,
            schedule: self.schedule.clone(),
        })
    }

    /// Runs frames at the scheduled deadlines until nothing is due before
    /// `until`, or `max_frames` ran. The clock is simulated.
    pub fn play(&mut self, until: f64, max_frames: usize) -> Result<Vec<FrameReport>, FolioError> {
        let mut reports = Vec::new();
        let mut now = 0.0;
        while reports.len() < max_frames {
            let report = self.frame(now)?;
            let next = report.schedule.next_refresh;
            reports.push(report);
            if next > until {
                break;
            }
            now = next.max(now);
        }
        Ok(reports)
    }

    /// The drawable under a point, without touching the selection.
    pub fn pick(&mut self, x: f32, y: f32) -> Result<Option<PickResult>, FolioError> {
        let radius = self.config.pick_radius;
        let (tree, mut cx) = self.split();
        Ok(tree.pick_point(&mut cx, x, y, radius)?)
    }

    /// A click. Replaces the selection with the hit, or toggles it when
    /// `additive`. Clicking text also asks the host for keyboard focus.
    pub fn click(&mut self, x: f32, y: f32, additive: bool) -> Result<Option<PickResult>, FolioError> {
        let hit = self.pick(x, y)?;
        self.display.selection.apply_pick(hit.as_ref(), additive);
        if let Some(hit) = hit.as_ref().filter(|h| h.category == SelectionCategory::Character) {
            self.display.request_focus(hit.key);
        }
        self.post(EventCategory::MOUSE_BUTTON);
        Ok(hit)
    }

    /// A rubber-band selection. Returns how many drawables the rectangle
    /// touched.
    pub fn marquee(&mut self, rect: Rect, mode: MarqueeMode) -> Result<usize, FolioError> {
        let (tree, mut cx) = self.split();
        let hits = tree.pick_rect(&mut cx, rect)?;
        self.display.selection.apply_rect(&hits, mode);
        self.post(EventCategory::MOUSE_BUTTON);
        Ok(hits.len())
    }
}
