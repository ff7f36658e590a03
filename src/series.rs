//! Cross-session series for one subject
//!
//! Turns an ordered list of session summaries into parallel vectors indexed
//! by session, ready for plotting with session number on the x-axis. Every
//! series has exactly one entry per session: a session that never showed a
//! stimulus value contributes a zero count and `None` rates for it.

use crate::summary::{GroupBy, GroupKey, GroupStats, SessionSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-session series of one grouping's counts and rates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub successes: Vec<u64>,
    pub failures: Vec<u64>,
    pub ignores: Vec<u64>,
    pub total_trials: Vec<u64>,
    pub percent_correct: Vec<Option<f64>>,
    pub percent_failure: Vec<Option<f64>>,
    pub percent_ignore: Vec<Option<f64>>,
    pub discriminability: Vec<Option<f64>>,
}

impl MetricSeries {
    fn with_capacity(sessions: usize) -> Self {
        Self {
            successes: Vec::with_capacity(sessions),
            failures: Vec::with_capacity(sessions),
            ignores: Vec::with_capacity(sessions),
            total_trials: Vec::with_capacity(sessions),
            percent_correct: Vec::with_capacity(sessions),
            percent_failure: Vec::with_capacity(sessions),
            percent_ignore: Vec::with_capacity(sessions),
            discriminability: Vec::with_capacity(sessions),
        }
    }

    fn push(&mut self, stats: &GroupStats) {
        self.successes.push(stats.counts.successes);
        self.failures.push(stats.counts.failures);
        self.ignores.push(stats.counts.ignores);
        self.total_trials.push(stats.total_trials);
        self.percent_correct.push(stats.percent_correct);
        self.percent_failure.push(stats.percent_failure);
        self.percent_ignore.push(stats.percent_ignore);
        self.discriminability.push(stats.discriminability);
    }

    pub fn len(&self) -> usize {
        self.total_trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_trials.is_empty()
    }
}

/// Series for one stimulus value across all sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSeries {
    pub key: GroupKey,
    pub metrics: MetricSeries,
}

/// A subject's per-session series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSeries {
    pub subject: String,
    pub group_by: GroupBy,
    pub session_numbers: Vec<u32>,
    pub session_ids: Vec<String>,
    pub overall: MetricSeries,
    /// One series per value seen in any session, in series order
    pub groups: Vec<GroupSeries>,
    pub centered_trials: Vec<u64>,
    pub centered_percent_correct: Vec<Option<f64>>,
    pub centered_percent_of_session: Vec<Option<f64>>,
}

impl SubjectSeries {
    pub fn session_count(&self) -> usize {
        self.session_numbers.len()
    }

    pub fn group(&self, key: &GroupKey) -> Option<&GroupSeries> {
        self.groups.iter().find(|g| &g.key == key)
    }
}

/// Distinct keys seen in any session, in the parameter's series order
pub fn distinct_keys(summaries: &[SessionSummary], group_by: GroupBy) -> Vec<GroupKey> {
    let unique: BTreeSet<GroupKey> = summaries
        .iter()
        .flat_map(|s| s.keys().cloned())
        .collect();

    let mut keys: Vec<GroupKey> = unique.into_iter().collect();
    group_by.sort_keys(&mut keys);
    keys
}

/// Build a subject's series from summaries ordered by session number
pub fn build_series(
    subject: &str,
    summaries: &[SessionSummary],
    group_by: GroupBy,
) -> SubjectSeries {
    let sessions = summaries.len();
    let keys = distinct_keys(summaries, group_by);

    let mut overall = MetricSeries::with_capacity(sessions);
    let mut groups: Vec<GroupSeries> = keys
        .into_iter()
        .map(|key| GroupSeries {
            key,
            metrics: MetricSeries::with_capacity(sessions),
        })
        .collect();

    let mut centered_trials = Vec::with_capacity(sessions);
    let mut centered_percent_correct = Vec::with_capacity(sessions);
    let mut centered_percent_of_session = Vec::with_capacity(sessions);

    for summary in summaries {
        overall.push(&summary.overall);
        for group in &mut groups {
            group.metrics.push(&summary.group_or_empty(&group.key));
        }
        centered_trials.push(summary.centered.trials);
        centered_percent_correct.push(summary.centered.percent_correct);
        centered_percent_of_session.push(summary.centered.percent_of_session);
    }

    SubjectSeries {
        subject: subject.to_string(),
        group_by,
        session_numbers: summaries.iter().map(|s| s.session_number).collect(),
        session_ids: summaries.iter().map(|s| s.session_id.clone()).collect(),
        overall,
        groups,
        centered_trials,
        centered_percent_correct,
        centered_percent_of_session,
    }
}
