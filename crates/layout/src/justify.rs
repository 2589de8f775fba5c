//! Generic one-axis line breaking and slack distribution.
//!
//! The same algorithm breaks drawables into lines (horizontal axis) and
//! lines into columns and pages (vertical axis). Items report their extent
//! and an optional break opportunity after themselves; the justifier cuts
//! the sequence into units no longer than the target and positions the
//! items of each unit.

use folio_style::Justification;
use serde::{Deserialize, Serialize};

const FIT_EPSILON: f32 = 1e-3;

/// Severity of a break opportunity. Stronger breaks end more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakOrder {
    Character,
    Word,
    Sentence,
    Line,
    Paragraph,
    Column,
    Page,
}

pub trait Justifiable {
    /// Natural size along the justified axis.
    fn extent(&self) -> f32;

    /// A break opportunity directly after this item.
    fn break_after(&self) -> Option<BreakOrder>;

    /// Separators (spaces, markers) may hang past the end of a unit and do
    /// not count towards its natural width when trailing.
    fn is_separator(&self) -> bool {
        false
    }

    /// Relative share of justified slack this item's break gap absorbs.
    fn stretch(&self) -> f32 {
        1.0
    }

    /// Relative share of negative slack this item's break gap absorbs.
    fn shrink(&self) -> f32 {
        0.0
    }
}

/// Why a unit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitEnd {
    /// A break at least as strong as the justifier's hard order.
    Hard(BreakOrder),
    /// Overflow, resolved at an earlier break of this order.
    Soft(BreakOrder),
    /// Overflow with no usable break; the unit was cut at an item boundary.
    Forced,
    /// The items ran out.
    Exhausted,
}

impl UnitEnd {
    /// True when the unit was cut because more content did not fit.
    pub fn is_full(&self) -> bool {
        matches!(self, UnitEnd::Soft(_) | UnitEnd::Forced)
    }

    /// The strength of the boundary after this unit when units themselves
    /// become items of an outer justifier.
    pub fn boundary(&self, soft: BreakOrder) -> BreakOrder {
        match self {
            UnitEnd::Hard(order) => (*order).max(soft),
            _ => soft,
        }
    }
}

/// One positioned item.
#[derive(Debug, Clone, PartialEq)]
pub struct Place<T> {
    pub item: T,
    pub extent: f32,
    /// Start of the item along the axis, relative to the unit start.
    pub position: f32,
    /// Slack added after the item: its share of gap or spread slack.
    pub stretch: f32,
    /// Whether the item counts as content (not a separator).
    pub solid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Justified<T> {
    pub places: Vec<Place<T>>,
    /// Sum of extents, excluding trailing separators.
    pub natural: f32,
    pub target: f32,
    /// Start position of the first item (the centered share of slack).
    pub offset: f32,
    /// `target - natural`; negative for a forced oversized unit.
    pub slack: f32,
    /// Slack handed out to gaps and solids.
    pub distributed: f32,
    pub ended_by: UnitEnd,
}

impl<T> Justified<T> {
    /// End of the last content item, including distributed slack.
    pub fn used(&self) -> f32 {
        self.offset + self.natural + self.distributed
    }

    pub fn is_empty(&self) -> bool {
        self.places.iter().all(|p| !p.solid)
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.places.iter().map(|p| &p.item)
    }

    pub fn into_items(self) -> impl Iterator<Item = T> {
        self.places.into_iter().map(|p| p.item)
    }
}

/// Where to cut the next unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub len: usize,
    pub ended_by: UnitEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Justifier {
    pub target: f32,
    pub justification: Justification,
    /// Breaks of this order or stronger always end a unit.
    pub hard: BreakOrder,
    /// Weakest break tried first when back-tracking after overflow.
    pub preferred: BreakOrder,
}

impl Justifier {
    pub fn new(target: f32, justification: Justification, hard: BreakOrder) -> Self {
        Self {
            target,
            justification,
            hard,
            preferred: BreakOrder::Word,
        }
    }

    pub fn with_preferred(mut self, preferred: BreakOrder) -> Self {
        self.preferred = preferred;
        self
    }

    /// Finds the end of the unit starting at `items[0]`.
    ///
    /// Always consumes at least one item when `items` is non-empty.
    pub fn split<T: Justifiable>(&self, items: &[T]) -> Split {
        let mut running = 0.0f32;
        let mut placed_solid = false;
        let mut candidates: Vec<(usize, BreakOrder)> = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let extent = item.extent();
            let separator = item.is_separator();

            if !separator && running + extent > self.target + FIT_EPSILON {
                if let Some(split) = self.back_track(&candidates) {
                    return split;
                }
                if placed_solid {
                    return Split {
                        len: i,
                        ended_by: UnitEnd::Forced,
                    };
                }
                log::debug!(
                    "Item of extent {:.2} exceeds target {:.2}; placing it alone",
                    extent,
                    self.target
                );
                return match item.break_after() {
                    Some(order) if order >= self.hard => Split {
                        len: i + 1,
                        ended_by: UnitEnd::Hard(order),
                    },
                    _ => Split {
                        len: i + 1,
                        ended_by: UnitEnd::Forced,
                    },
                };
            }

            running += extent;
            placed_solid |= !separator;

            if let Some(order) = item.break_after() {
                if order >= self.hard {
                    return Split {
                        len: i + 1,
                        ended_by: UnitEnd::Hard(order),
                    };
                }
                if placed_solid {
                    candidates.push((i + 1, order));
                }
            }
        }

        Split {
            len: items.len(),
            ended_by: UnitEnd::Exhausted,
        }
    }

    /// The latest candidate of the preferred order or stronger, falling back
    /// to the latest candidate of any order.
    fn back_track(&self, candidates: &[(usize, BreakOrder)]) -> Option<Split> {
        let pick = |min: BreakOrder| {
            candidates
                .iter()
                .rev()
                .find(|(_, order)| *order >= min)
                .map(|&(len, order)| Split {
                    len,
                    ended_by: UnitEnd::Soft(order),
                })
        };
        pick(self.preferred).or_else(|| pick(BreakOrder::Character))
    }

    /// Positions the items of one unit and distributes its slack.
    pub fn justify<T: Justifiable>(&self, items: Vec<T>, ended_by: UnitEnd) -> Justified<T> {
        // Trailing separators hang: they keep their position but are not
        // part of the natural extent.
        let content_end = items
            .iter()
            .rposition(|item| !item.is_separator())
            .map(|i| i + 1)
            .unwrap_or(0);
        let natural: f32 = items[..content_end].iter().map(|i| i.extent()).sum();
        let slack = self.target - natural;

        // Interior gaps are break opportunities followed by more content.
        let gaps: Vec<usize> = (0..content_end.saturating_sub(1))
            .filter(|&i| items[i].break_after().is_some())
            .collect();
        let solids = items[..content_end]
            .iter()
            .filter(|i| !i.is_separator())
            .count();

        let fraction = self.justification.fraction(ended_by.is_full());
        let mut gap_share = vec![0.0f32; items.len()];
        let mut solid_share = 0.0f32;
        let mut distributed = 0.0f32;

        if fraction > 0.0 && slack != 0.0 {
            let amount = slack * fraction;
            let weight = |i: usize| {
                if slack > 0.0 {
                    items[i].stretch().max(0.0)
                } else {
                    items[i].shrink().max(0.0)
                }
            };
            let total_weight: f32 = gaps.iter().map(|&i| weight(i)).sum();
            let spread = if slack > 0.0 && solids > 0 {
                self.justification.spread.clamp(0.0, 1.0)
            } else {
                0.0
            };

            let (to_solids, to_gaps) = if total_weight > 0.0 {
                (amount * spread, amount * (1.0 - spread))
            } else if slack > 0.0 && solids > 0 && spread > 0.0 {
                (amount * spread, 0.0)
            } else {
                (0.0, 0.0)
            };

            if total_weight > 0.0 {
                for &i in &gaps {
                    gap_share[i] = to_gaps * weight(i) / total_weight;
                }
            }
            if solids > 0 {
                solid_share = to_solids / solids as f32;
            }
            distributed = to_solids + if total_weight > 0.0 { to_gaps } else { 0.0 };
        }

        let remainder = slack - distributed;
        let offset = if remainder > 0.0 {
            remainder * self.justification.centering.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut cursor = offset;
        let mut places = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let extent = item.extent();
            let solid = !item.is_separator();
            let mut stretch = gap_share[i];
            if solid && i < content_end {
                stretch += solid_share;
            }
            places.push(Place {
                position: cursor,
                extent,
                stretch,
                solid,
                item,
            });
            cursor += extent + stretch;
        }

        Justified {
            places,
            natural,
            target: self.target,
            offset,
            slack,
            distributed,
            ended_by,
        }
    }

    /// Cuts and justifies units until the items are consumed, a unit ends on
    /// a break of `stop` order or stronger, or `max_units` units were made.
    /// Returns the units and the unconsumed items.
    pub fn run_until<T: Justifiable>(
        &self,
        items: Vec<T>,
        stop: Option<BreakOrder>,
        max_units: Option<usize>,
    ) -> (Vec<Justified<T>>, Vec<T>) {
        let mut rest = items;
        let mut units = Vec::new();

        while !rest.is_empty() {
            if max_units.is_some_and(|max| units.len() >= max) {
                break;
            }
            let split = self.split(&rest);
            let tail = rest.split_off(split.len);
            let unit = std::mem::replace(&mut rest, tail);
            units.push(self.justify(unit, split.ended_by));

            if let (Some(stop), UnitEnd::Hard(order)) = (stop, split.ended_by)
                && order >= stop
            {
                break;
            }
        }

        (units, rest)
    }

    /// Justifies every item into as many units as needed.
    pub fn run<T: Justifiable>(&self, items: Vec<T>) -> Vec<Justified<T>> {
        self.run_until(items, None, None).0
    }
}
