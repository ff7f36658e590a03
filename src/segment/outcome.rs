use super::{neighbour, Outcome, Trial};
use crate::event::{Event, EventNames};

/// Outcome-anchored segmentation
///
/// A trial is an outcome event with value 1 immediately followed by a size
/// event. A second size event right after the first marks stray duplicate
/// metadata and voids the candidate. A size event at the very end of the
/// stream still completes the trial.
///
/// With `read_position`, a position event directly after the size event
/// supplies `stimulus_position_x`.
pub(super) fn segment_outcome_anchored(
    events: &[Event],
    names: &EventNames,
    read_position: bool,
) -> Vec<Trial> {
    let mut trials = Vec::new();

    for (index, event) in events.iter().enumerate() {
        if event.value != 1.0 {
            continue;
        }
        let Some(outcome) = Outcome::from_event_name(&event.name, names) else {
            continue;
        };
        let Some(size_event) = neighbour(events, index, 1).filter(|e| e.name == names.size)
        else {
            continue;
        };

        let mut position = None;
        match neighbour(events, index, 2) {
            Some(after) if after.name == names.size => {
                tracing::trace!("Duplicate size event after outcome at event {}", index);
                continue;
            }
            Some(after) if read_position && after.name == names.position_x => {
                position = Some(after.value);
            }
            _ => {}
        }

        trials.push(Trial {
            trial_number: trials.len() as u32 + 1,
            time: event.time,
            outcome,
            stimulus_size: Some(size_event.value),
            stimulus_rotation: None,
            stimulus_position_x: position,
        });
    }

    trials
}
