use super::{neighbour, Outcome, Trial};
use crate::event::{Event, EventNames};

/// Boundary-anchored segmentation
///
/// A trial starts at `trial_start` with value 1. The one or two events before
/// it may carry the stimulus size and rotation; the event after it must be an
/// outcome. Candidates missing any of the three are dropped.
pub(super) fn segment_boundary_anchored(events: &[Event], names: &EventNames) -> Vec<Trial> {
    let mut trials = Vec::new();

    for (index, event) in events.iter().enumerate() {
        if event.name != names.trial_start || event.value != 1.0 {
            continue;
        }

        let mut size = None;
        let mut rotation = None;

        // index-2 is read after index-1 so the farther event wins a tie
        for offset in [-1, -2] {
            let Some(prior) = neighbour(events, index, offset) else {
                continue;
            };
            if prior.name == names.size {
                size = Some(prior.value);
            } else if prior.name == names.rotation {
                rotation = Some(prior.value);
            }
        }

        let outcome = neighbour(events, index, 1)
            .and_then(|next| Outcome::from_event_name(&next.name, names));

        if let (Some(size), Some(rotation), Some(outcome)) = (size, rotation, outcome) {
            trials.push(Trial {
                trial_number: trials.len() as u32 + 1,
                time: event.time,
                outcome,
                stimulus_size: Some(size),
                stimulus_rotation: Some(rotation),
                stimulus_position_x: None,
            });
        } else {
            tracing::trace!("Dropped incomplete trial candidate at event {}", index);
        }
    }

    trials
}
