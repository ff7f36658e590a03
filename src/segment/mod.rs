// Trial Segmentation from Unstructured Event Logs
//
// The experiment software never writes a trial as one record. Stimulus
// parameters, the trial boundary marker and the outcome marker arrive as
// separate, adjacent events. This module rebuilds trials from the positions
// of those events relative to an anchor event.
//
// Two anchoring strategies exist across the experiment phases:
// - Boundary-anchored: anchor on the trial-start announcement, read stimulus
//   parameters from the events just before it and the outcome just after it.
// - Outcome-anchored: anchor on the outcome itself, read the stimulus size
//   from the event just after it (optionally followed by a position).
//
// Neighbour lookups are bounds-checked. A missing neighbour is a miss: the
// candidate is dropped and scanning continues.

mod boundary;
mod outcome;
mod trial;

pub use trial::{Outcome, Trial};

use crate::event::{Event, EventNames};
use crate::summary::GroupBy;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Strategy used to locate trials in a session's event stream
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationPolicy {
    /// Anchor on `trial_start == 1`; size and rotation precede, outcome follows
    #[default]
    BoundaryAnchored,
    /// Anchor on `outcome == 1`; size follows
    OutcomeAnchored,
    /// Outcome-anchored, also reading a horizontal position after the size
    OutcomeAnchoredWithPosition,
}

impl SegmentationPolicy {
    /// Whether trials from this policy can carry the parameter `group_by` reads
    pub fn provides(self, group_by: GroupBy) -> bool {
        match group_by {
            GroupBy::Size => true,
            GroupBy::Rotation => self == Self::BoundaryAnchored,
            GroupBy::PositionX => self == Self::OutcomeAnchoredWithPosition,
        }
    }
}

/// Rebuild the time-ordered trials of one session
///
/// # Example
/// ```
/// use trialstat::event::{Event, EventNames};
/// use trialstat::segment::{segment, Outcome, SegmentationPolicy};
///
/// let events = vec![
///     Event::new("stm_size", 30.0, 0.0),
///     Event::new("stm_rotation_in_depth", 10.0, 0.1),
///     Event::new("Announce_TrialStart", 1.0, 0.2),
///     Event::new("success", 1.0, 1.4),
/// ];
///
/// let trials = segment(&events, SegmentationPolicy::BoundaryAnchored, &EventNames::default());
/// assert_eq!(trials.len(), 1);
/// assert_eq!(trials[0].outcome, Outcome::Success);
/// assert_eq!(trials[0].stimulus_rotation, Some(10.0));
/// ```
pub fn segment(events: &[Event], policy: SegmentationPolicy, names: &EventNames) -> Vec<Trial> {
    let trials = match policy {
        SegmentationPolicy::BoundaryAnchored => boundary::segment_boundary_anchored(events, names),
        SegmentationPolicy::OutcomeAnchored => {
            outcome::segment_outcome_anchored(events, names, false)
        }
        SegmentationPolicy::OutcomeAnchoredWithPosition => {
            outcome::segment_outcome_anchored(events, names, true)
        }
    };

    tracing::debug!(
        "Segmented {} trials from {} events ({:?})",
        trials.len(),
        events.len(),
        policy
    );

    trials
}

/// Bounds-checked lookup `offset` positions away from `index`
fn neighbour(events: &[Event], index: usize, offset: isize) -> Option<&Event> {
    index
        .checked_add_signed(offset)
        .and_then(|position| events.get(position))
}
