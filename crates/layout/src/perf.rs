use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// The memoized structures whose hit rate is worth watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CacheKind {
    /// Tessellated shapes.
    Mesh,
    /// Per-font glyph advances.
    Glyph,
    /// A page whose inputs did not change since its last pagination.
    Page,
    /// A table whose column widths and row heights are still valid.
    Table,
}

impl CacheKind {
    const ALL: [CacheKind; 4] = [CacheKind::Mesh, CacheKind::Glyph, CacheKind::Page, CacheKind::Table];

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheKind::Mesh => "mesh",
            CacheKind::Glyph => "glyph",
            CacheKind::Page => "page",
            CacheKind::Table => "table",
        })
    }
}

/// Receives timings and cache behaviour from the evaluate, paginate, table,
/// draw and identify passes.
///
/// Sections are only timed with the `profiling` feature; cache lookups are
/// always reported.
pub trait Profiler: Send + Sync {
    /// Adds one run of a timed section.
    fn record(&self, section: &str, duration: Duration);
    fn count_hit(&self, cache: CacheKind);
    fn count_miss(&self, cache: CacheKind);

    /// One drawable visited by a render pass, and how long it took.
    fn record_visit(&self, duration: Duration);
    fn reset(&self);
}

/// Discards everything; the default outside of debugging.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpProfiler;

impl Profiler for NoOpProfiler {
    #[inline(always)]
    fn record(&self, _section: &str, _duration: Duration) {}
    #[inline(always)]
    fn count_hit(&self, _cache: CacheKind) {}
    #[inline(always)]
    fn count_miss(&self, _cache: CacheKind) {}
    #[inline(always)]
    fn record_visit(&self, _duration: Duration) {}
    #[inline(always)]
    fn reset(&self) {}
}

/// Accumulated runs of one timed section.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SectionTiming {
    pub runs: u32,
    pub total: Duration,
}

/// Collects everything it is told; backs the CLI's `--profile` switch.
#[derive(Debug, Default)]
pub struct DebugProfiler {
    sections: Mutex<BTreeMap<String, SectionTiming>>,
    hits: [AtomicUsize; 4],
    misses: [AtomicUsize; 4],
    visits: AtomicUsize,
    visit_nanos: AtomicU64,
}

impl DebugProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self, cache: CacheKind) -> usize {
        self.hits[cache.slot()].load(Ordering::Acquire)
    }

    pub fn misses(&self, cache: CacheKind) -> usize {
        self.misses[cache.slot()].load(Ordering::Acquire)
    }

    pub fn section(&self, name: &str) -> Option<SectionTiming> {
        self.sections.lock().ok().and_then(|s| s.get(name).copied())
    }

    /// Mean time spent per visited drawable.
    pub fn average_visit(&self) -> Option<Duration> {
        let visits = self.visits.load(Ordering::Acquire) as u64;
        let nanos = self.visit_nanos.load(Ordering::Acquire);
        (visits > 0).then(|| Duration::from_nanos(nanos / visits))
    }

    pub fn log_summary(&self, frame: u64) {
        log::info!("Profile of frame {}", frame);
        for cache in CacheKind::ALL {
            let hits = self.hits(cache);
            let lookups = hits + self.misses(cache);
            if lookups > 0 {
                log::info!(
                    "  {} cache: {}/{} hits ({:.1}%)",
                    cache,
                    hits,
                    lookups,
                    hits as f64 * 100.0 / lookups as f64
                );
            }
        }
        if let Some(avg) = self.average_visit() {
            log::info!("  {} drawables visited, {:?} each", self.visits.load(Ordering::Acquire), avg);
        }
        if let Ok(sections) = self.sections.lock() {
            for (name, timing) in sections.iter() {
                log::info!("  {}: {:?} over {} runs", name, timing.total, timing.runs);
            }
        }
    }
}

impl Profiler for DebugProfiler {
    fn record(&self, section: &str, duration: Duration) {
        if let Ok(mut sections) = self.sections.lock() {
            let timing = sections.entry(section.to_string()).or_default();
            timing.runs += 1;
            timing.total += duration;
        }
    }

    fn count_hit(&self, cache: CacheKind) {
        self.hits[cache.slot()].fetch_add(1, Ordering::Release);
    }

    fn count_miss(&self, cache: CacheKind) {
        self.misses[cache.slot()].fetch_add(1, Ordering::Release);
    }

    fn record_visit(&self, duration: Duration) {
        self.visits.fetch_add(1, Ordering::Release);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.visit_nanos.fetch_add(nanos, Ordering::Release);
    }

    fn reset(&self) {
        if let Ok(mut sections) = self.sections.lock() {
            sections.clear();
        }
        for counter in self.hits.iter().chain(&self.misses) {
            counter.store(0, Ordering::Release);
        }
        self.visits.store(0, Ordering::Release);
        self.visit_nanos.store(0, Ordering::Release);
    }
}

/// Opens a timed section when the `profiling` feature is enabled.
#[inline]
pub(crate) fn start() -> Option<Instant> {
    if cfg!(feature = "profiling") {
        Some(Instant::now())
    } else {
        None
    }
}

/// Closes a section opened by [`start`].
#[inline]
pub(crate) fn finish(profiler: &dyn Profiler, section: &str, started: Option<Instant>) {
    if let Some(t) = started {
        profiler.record(section, t.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_count_runs_and_time() {
        let p = DebugProfiler::new();
        p.record("evaluate", Duration::from_millis(2));
        p.record("evaluate", Duration::from_millis(3));
        assert_eq!(
            p.section("evaluate"),
            Some(SectionTiming {
                runs: 2,
                total: Duration::from_millis(5)
            })
        );
        assert_eq!(p.section("draw"), None);
    }

    #[test]
    fn caches_are_counted_separately() {
        let p = DebugProfiler::new();
        p.count_hit(CacheKind::Page);
        p.count_miss(CacheKind::Mesh);
        p.count_miss(CacheKind::Mesh);
        assert_eq!(p.hits(CacheKind::Page), 1);
        assert_eq!(p.misses(CacheKind::Page), 0);
        assert_eq!(p.misses(CacheKind::Mesh), 2);

        p.record_visit(Duration::from_micros(4));
        p.record_visit(Duration::from_micros(2));
        assert_eq!(p.average_visit(), Some(Duration::from_micros(3)));

        p.reset();
        assert_eq!(p.misses(CacheKind::Mesh), 0);
        assert!(p.average_visit().is_none());
    }
}
