//! Learning progress over a subject's whole trial history
//!
//! Two views used to decide when to move a subject along the stimulus range:
//! how wide a range of a parameter was tested in each block of trials, and how
//! performance grows with the number of times each stimulus value was seen.

use crate::segment::Trial;
use crate::summary::{GroupBy, GroupKey, OutcomeCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default block length for [`range_progress`]
pub const DEFAULT_TRIALS_PER_BIN: usize = 50;

/// Parameter range tested in one block of trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeStep {
    /// Trials covered up to and including this block
    pub cumulative_trials: usize,
    pub min: f64,
    pub max: f64,
}

/// Performance on the nth showing of every stimulus value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationStat {
    /// 1-based
    pub presentation: usize,
    pub counts: OutcomeCounts,
    pub percent_correct: Option<f64>,
}

/// Min and max of `parameter` over consecutive full blocks of trials
///
/// Only trials carrying the parameter are counted. The trailing partial block
/// is discarded, as is everything when `trials_per_bin` is zero.
pub fn range_progress(
    trials: &[Trial],
    parameter: GroupBy,
    trials_per_bin: usize,
) -> Vec<RangeStep> {
    if trials_per_bin == 0 {
        return Vec::new();
    }

    let values: Vec<f64> = trials.iter().filter_map(|t| parameter.parameter(t)).collect();

    values
        .chunks_exact(trials_per_bin)
        .enumerate()
        .map(|(index, chunk)| RangeStep {
            cumulative_trials: (index + 1) * trials_per_bin,
            min: chunk.iter().copied().fold(f64::INFINITY, f64::min),
            max: chunk.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
        .collect()
}

/// Percent correct by presentation index across stimulus values
///
/// Runs up to the smallest number of presentations any value received, so
/// every point pools exactly one outcome from each value.
pub fn performance_by_presentation(
    trials: &[Trial],
    group_by: GroupBy,
) -> Vec<PresentationStat> {
    let mut by_key: BTreeMap<GroupKey, Vec<&Trial>> = BTreeMap::new();
    for trial in trials {
        if let Some(value) = group_by.parameter(trial) {
            by_key.entry(GroupKey::new(value)).or_default().push(trial);
        }
    }

    let depth = by_key.values().map(Vec::len).min().unwrap_or(0);

    (0..depth)
        .map(|n| {
            let mut counts = OutcomeCounts::default();
            for shown in by_key.values() {
                counts.record(&shown[n].outcome);
            }
            PresentationStat {
                presentation: n + 1,
                counts,
                percent_correct: counts.percent_correct(),
            }
        })
        .collect()
}
