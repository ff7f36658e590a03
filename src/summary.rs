//! Per-session outcome statistics
//!
//! Counts successes, failures and ignores for one session, overall and per
//! stimulus-parameter value, and derives percent correct and the
//! discriminability index from them.
//!
//! Every rate whose denominator is zero is `None`. Counts are never `None`.

use crate::segment::{Outcome, Trial};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Discriminability index `s/(s+f) - f/(s+f)`, bounded to [-1, 1]
///
/// A proportion difference, not the z-score d' of signal detection theory.
/// `None` when there are no decided trials.
pub fn discriminability(successes: u64, failures: u64) -> Option<f64> {
    let decided = successes + failures;
    if decided == 0 {
        return None;
    }
    let decided = decided as f64;
    Some(successes as f64 / decided - failures as f64 / decided)
}

fn percentage(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64 * 100.0)
    }
}

/// Outcome tallies for one grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub successes: u64,
    pub failures: u64,
    pub ignores: u64,
}

impl OutcomeCounts {
    pub fn new(successes: u64, failures: u64, ignores: u64) -> Self {
        Self {
            successes,
            failures,
            ignores,
        }
    }

    /// Record one outcome; returns false for an unrecognized label
    pub fn record(&mut self, outcome: &Outcome) -> bool {
        match outcome {
            Outcome::Success => self.successes += 1,
            Outcome::Failure => self.failures += 1,
            Outcome::Ignore => self.ignores += 1,
            Outcome::Unrecognized(_) => return false,
        }
        true
    }

    pub fn merge(&mut self, other: &OutcomeCounts) {
        self.successes += other.successes;
        self.failures += other.failures;
        self.ignores += other.ignores;
    }

    pub fn total(&self) -> u64 {
        self.successes + self.failures + self.ignores
    }

    pub fn percent_correct(&self) -> Option<f64> {
        percentage(self.successes, self.total())
    }

    pub fn percent_failure(&self) -> Option<f64> {
        percentage(self.failures, self.total())
    }

    pub fn percent_ignore(&self) -> Option<f64> {
        percentage(self.ignores, self.total())
    }

    pub fn discriminability(&self) -> Option<f64> {
        discriminability(self.successes, self.failures)
    }
}

/// Stimulus parameter used to partition trials
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    Size,
    #[default]
    Rotation,
    PositionX,
}

impl GroupBy {
    /// The trial's value for this parameter, if recorded
    pub fn parameter(&self, trial: &Trial) -> Option<f64> {
        match self {
            Self::Size => trial.stimulus_size,
            Self::Rotation => trial.stimulus_rotation,
            Self::PositionX => trial.stimulus_position_x,
        }
    }

    /// Sizes are listed largest first; rotations and positions left to right
    pub fn descending(&self) -> bool {
        matches!(self, Self::Size)
    }

    /// Sort keys into this parameter's series order
    pub fn sort_keys(&self, keys: &mut [GroupKey]) {
        if self.descending() {
            keys.sort_by(|a, b| b.cmp(a));
        } else {
            keys.sort();
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Rotation => "rotation",
            Self::PositionX => "position_x",
        }
    }
}

/// A stimulus-parameter value and its stable text form
///
/// Keys order and compare by value; `-0.0` is folded into `0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupKey {
    pub value: f64,
    pub label: String,
}

impl GroupKey {
    pub fn new(value: f64) -> Self {
        let value = if value == 0.0 { 0.0 } else { value };
        Self {
            value,
            label: format!("{:?}", value),
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// Counts and derived metrics for one grouping (or the whole session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// `None` for the overall grouping
    pub key: Option<GroupKey>,
    pub counts: OutcomeCounts,
    pub total_trials: u64,
    pub percent_correct: Option<f64>,
    pub percent_failure: Option<f64>,
    pub percent_ignore: Option<f64>,
    pub discriminability: Option<f64>,
}

impl GroupStats {
    pub fn from_counts(key: Option<GroupKey>, counts: OutcomeCounts) -> Self {
        Self {
            key,
            counts,
            total_trials: counts.total(),
            percent_correct: counts.percent_correct(),
            percent_failure: counts.percent_failure(),
            percent_ignore: counts.percent_ignore(),
            discriminability: counts.discriminability(),
        }
    }

    /// Stats for a grouping with no trials
    pub fn empty(key: Option<GroupKey>) -> Self {
        Self::from_counts(key, OutcomeCounts::default())
    }
}

/// Trials whose stimulus sat near the horizontal centre of the screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenteredStats {
    pub trials: u64,
    pub counts: OutcomeCounts,
    pub percent_correct: Option<f64>,
    /// Share of the session's counted trials that were centred
    pub percent_of_session: Option<f64>,
}

/// Restricts which trials enter a summary
///
/// An unset field accepts every trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialFilter {
    pub size: Option<f64>,
    pub rotation: Option<f64>,
}

impl TrialFilter {
    pub fn accepts(&self, trial: &Trial) -> bool {
        let matches = |wanted: Option<f64>, actual: Option<f64>| match wanted {
            None => true,
            Some(w) => actual == Some(w),
        };
        matches(self.size, trial.stimulus_size) && matches(self.rotation, trial.stimulus_rotation)
    }

    pub fn is_active(&self) -> bool {
        self.size.is_some() || self.rotation.is_some()
    }
}

/// Options controlling how a session is summarized
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryOptions {
    pub group_by: GroupBy,
    pub filter: TrialFilter,
    /// Max |position_x| for a trial to count as centred
    pub center_tolerance: f64,
}

/// Per-session counts and metrics, overall and by stimulus value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// 1-based position in the subject's chronological session list
    pub session_number: u32,
    pub session_id: String,
    pub group_by: GroupBy,
    pub overall: GroupStats,
    /// One entry per observed value, in series order
    pub groups: Vec<GroupStats>,
    pub centered: CenteredStats,
    /// Trials dropped for an unrecognized outcome label
    pub excluded_trials: u64,
    /// Counted trials lacking the grouping parameter
    pub ungrouped_trials: u64,
}

impl SessionSummary {
    pub fn group(&self, key: &GroupKey) -> Option<&GroupStats> {
        self.groups.iter().find(|g| g.key.as_ref() == Some(key))
    }

    /// Stats for `key`, zero-count when the session never showed that value
    pub fn group_or_empty(&self, key: &GroupKey) -> GroupStats {
        self.group(key)
            .cloned()
            .unwrap_or_else(|| GroupStats::empty(Some(key.clone())))
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().filter_map(|g| g.key.as_ref())
    }
}

/// Accumulates one session's trials
#[derive(Debug)]
pub struct SessionTracker {
    options: SummaryOptions,
    overall: OutcomeCounts,
    groups: BTreeMap<GroupKey, OutcomeCounts>,
    centered: OutcomeCounts,
    excluded: u64,
    ungrouped: u64,
}

impl SessionTracker {
    pub fn new(options: SummaryOptions) -> Self {
        Self {
            options,
            overall: OutcomeCounts::default(),
            groups: BTreeMap::new(),
            centered: OutcomeCounts::default(),
            excluded: 0,
            ungrouped: 0,
        }
    }

    /// Record one trial; filtered-out trials are ignored entirely
    pub fn record(&mut self, trial: &Trial) {
        if !self.options.filter.accepts(trial) {
            return;
        }

        if !self.overall.record(&trial.outcome) {
            tracing::warn!(
                "Unrecognized outcome '{}' in trial {}; excluded from totals",
                trial.outcome,
                trial.trial_number
            );
            self.excluded += 1;
            return;
        }

        match self.options.group_by.parameter(trial) {
            Some(value) => {
                self.groups
                    .entry(GroupKey::new(value))
                    .or_default()
                    .record(&trial.outcome);
            }
            None => self.ungrouped += 1,
        }

        if let Some(x) = trial.stimulus_position_x {
            if x.abs() <= self.options.center_tolerance {
                self.centered.record(&trial.outcome);
            }
        }
    }

    pub fn finish(self, session_number: u32, session_id: impl Into<String>) -> SessionSummary {
        let group_by = self.options.group_by;

        let mut groups: Vec<GroupStats> = self
            .groups
            .into_iter()
            .map(|(key, counts)| GroupStats::from_counts(Some(key), counts))
            .collect();
        if group_by.descending() {
            groups.reverse();
        }

        let centered = CenteredStats {
            trials: self.centered.total(),
            counts: self.centered,
            percent_correct: self.centered.percent_correct(),
            percent_of_session: percentage(self.centered.total(), self.overall.total()),
        };

        SessionSummary {
            session_number,
            session_id: session_id.into(),
            group_by,
            overall: GroupStats::from_counts(None, self.overall),
            groups,
            centered,
            excluded_trials: self.excluded,
            ungrouped_trials: self.ungrouped,
        }
    }
}

/// Summarize one session's trials
pub fn summarize_session(
    session_number: u32,
    session_id: &str,
    trials: &[Trial],
    options: &SummaryOptions,
) -> SessionSummary {
    let mut tracker = SessionTracker::new(*options);
    for trial in trials {
        tracker.record(trial);
    }
    tracker.finish(session_number, session_id)
}

/// Sum several sessions' counts per stimulus value
///
/// Returns the pooled overall stats and the pooled groups in series order.
pub fn pool_summaries(
    summaries: &[SessionSummary],
    group_by: GroupBy,
) -> (GroupStats, Vec<GroupStats>) {
    let mut overall = OutcomeCounts::default();
    let mut groups: BTreeMap<GroupKey, OutcomeCounts> = BTreeMap::new();

    for summary in summaries {
        overall.merge(&summary.overall.counts);
        for group in &summary.groups {
            if let Some(key) = &group.key {
                groups.entry(key.clone()).or_default().merge(&group.counts);
            }
        }
    }

    let mut pooled: Vec<GroupStats> = groups
        .into_iter()
        .map(|(key, counts)| GroupStats::from_counts(Some(key), counts))
        .collect();
    if group_by.descending() {
        pooled.reverse();
    }

    (GroupStats::from_counts(None, overall), pooled)
}
