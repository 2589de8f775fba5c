use serde::{Deserialize, Serialize};

/// How slack is distributed along one axis.
///
/// Slack is the target extent minus the natural size of the placed items.
/// `amount` of it is spread across the break gaps of a full unit (a line that
/// was ended by overflow), `partial` applies instead to units that ended on a
/// hard break or at the end of the content. Whatever is left undistributed is
/// positioned by `centering`: 0 packs to the start, 0.5 centers, 1 packs to
/// the end. `spread` diverts part of the justified slack to solid items
/// instead of gaps. `spacing` scales each item's natural extent (line
/// spacing on the vertical axis). `before` and `after` add room around
/// paragraph-or-stronger breaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Justification {
    pub amount: f32,
    pub partial: f32,
    pub centering: f32,
    pub spread: f32,
    pub spacing: f32,
    pub before: f32,
    pub after: f32,
}

impl Default for Justification {
    fn default() -> Self {
        Self {
            amount: 0.0,
            partial: 0.0,
            centering: 0.0,
            spread: 0.0,
            spacing: 1.0,
            before: 0.0,
            after: 0.0,
        }
    }
}

impl Justification {
    pub fn ragged(centering: f32) -> Self {
        Self {
            centering,
            ..Self::default()
        }
    }

    pub fn justified() -> Self {
        Self {
            amount: 1.0,
            ..Self::default()
        }
    }

    pub fn centered() -> Self {
        Self::ragged(0.5)
    }

    /// Fraction of slack to distribute for a unit, given how it ended.
    pub fn fraction(&self, full: bool) -> f32 {
        let f = if full { self.amount } else { self.partial };
        f.clamp(0.0, 1.0)
    }
}
