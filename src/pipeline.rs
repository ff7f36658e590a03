//! Per-subject analysis pipeline
//!
//! Reads a subject's sessions in order, segments and summarizes each one,
//! then derives the cross-session series, bootstrap bins, pooled stats and
//! learning-progress views. Runs sequentially; the coordinator runs one
//! pipeline per subject in parallel.

use crate::bootstrap::{bootstrap_bins, subject_seed, BinReport};
use crate::config::{AnalysisConfig, SubjectSessions};
use crate::event::{EventSource, EventSourceError};
use crate::filter::EventFilter;
use crate::progress::{performance_by_presentation, range_progress, PresentationStat, RangeStep};
use crate::segment::{segment, Trial};
use crate::series::{build_series, SubjectSeries};
use crate::summary::{
    pool_summaries, summarize_session, GroupStats, OutcomeCounts, SessionSummary,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything computed for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectReport {
    pub subject: String,
    /// One per session, numbered 1..N in manifest order
    pub sessions: Vec<SessionSummary>,
    pub series: SubjectSeries,
    /// Empty when bootstrapping is disabled or there are too few sessions
    pub bins: Vec<BinReport>,
    /// Counts over all sessions
    pub pooled: GroupStats,
    pub pooled_groups: Vec<GroupStats>,
    /// Reference condition over every session's trials, if configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<GroupStats>,
    pub range_progress: Vec<RangeStep>,
    pub presentation: Vec<PresentationStat>,
}

impl SubjectReport {
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn total_trials(&self) -> u64 {
        self.pooled.total_trials
    }
}

/// Session label used in reports: the file stem, else the whole path
pub fn session_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Analyze one subject
///
/// The first session that cannot be read aborts this subject only.
pub fn analyze_subject(
    subject: &SubjectSessions,
    source: &dyn EventSource,
    config: &AnalysisConfig,
    filter: &EventFilter,
) -> Result<SubjectReport, EventSourceError> {
    tracing::info!(
        "Analyzing subject {} ({} sessions)",
        subject.name,
        subject.sessions.len()
    );

    let options = config.summary_options();
    let mut sessions = Vec::with_capacity(subject.sessions.len());
    let mut all_trials: Vec<Trial> = Vec::new();
    let mut reference_counts = OutcomeCounts::default();

    for (index, relative) in subject.sessions.iter().enumerate() {
        let path = config.session_path(relative);
        let events = source.open_and_filter(&path, filter)?;
        let trials = segment(&events, config.policy, &config.events);

        let session_number = index as u32 + 1;
        let summary = summarize_session(session_number, &session_id(relative), &trials, &options);
        tracing::debug!(
            "{} session {}: {} events, {} trials, {} counted",
            subject.name,
            session_number,
            events.len(),
            trials.len(),
            summary.overall.total_trials
        );

        // The reference condition is scored before the trial filter applies
        if let Some(reference) = &config.reference {
            for trial in trials.iter().filter(|t| reference.accepts(t)) {
                reference_counts.record(&trial.outcome);
            }
        }

        all_trials.extend(trials.into_iter().filter(|t| options.filter.accepts(t)));
        sessions.push(summary);
    }

    let series = build_series(&subject.name, &sessions, config.group_by);
    let (pooled, pooled_groups) = pool_summaries(&sessions, config.group_by);

    let bins = if config.bootstrap_enabled {
        let mut rng = StdRng::seed_from_u64(subject_seed(config.bootstrap.seed, &subject.name));
        bootstrap_bins(&sessions, config.group_by, &config.bootstrap, &mut rng)
    } else {
        Vec::new()
    };

    let reference = config
        .reference
        .map(|_| GroupStats::from_counts(None, reference_counts));

    let progress = range_progress(&all_trials, config.group_by, config.progress_bin_trials);
    let presentation = performance_by_presentation(&all_trials, config.group_by);

    tracing::info!(
        "Finished subject {}: {} trials over {} sessions, {} bins",
        subject.name,
        pooled.total_trials,
        sessions.len(),
        bins.len()
    );

    Ok(SubjectReport {
        subject: subject.name.clone(),
        sessions,
        series,
        bins,
        pooled,
        pooled_groups,
        reference,
        range_progress: progress,
        presentation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, MemorySource};
    use crate::summary::{GroupKey, TrialFilter};
    use std::path::PathBuf;

    fn boundary_session(rotations: &[(f64, &str)]) -> Vec<Event> {
        rotations
            .iter()
            .enumerate()
            .flat_map(|(i, (rotation, outcome))| {
                let t = i as f64 * 10.0;
                vec![
                    Event::new("stm_size", 30.0, t),
                    Event::new("stm_rotation_in_depth", *rotation, t + 1.0),
                    Event::new("Announce_TrialStart", 1.0, t + 2.0),
                    Event::new(*outcome, 1.0, t + 3.0),
                    Event::new("Announce_TrialEnd", 1.0, t + 4.0),
                ]
            })
            .collect()
    }

    fn setup() -> (SubjectSessions, MemorySource, AnalysisConfig) {
        let subject = SubjectSessions::new("V1", ["V1/s1.jsonl", "V1/s2.jsonl"]);
        let source = MemorySource::new()
            .with_session(
                "data/V1/s1.jsonl",
                boundary_session(&[(0.0, "success"), (15.0, "failure"), (0.0, "success")]),
            )
            .with_session(
                "data/V1/s2.jsonl",
                boundary_session(&[(15.0, "success"), (0.0, "ignore")]),
            );
        let mut config = AnalysisConfig {
            root: PathBuf::from("data"),
            progress_bin_trials: 2,
            ..AnalysisConfig::default()
        };
        config.bootstrap.bin_size = 2;
        config.bootstrap.iterations = 50;
        (subject, source, config)
    }

    #[test]
    fn test_session_id_from_stem() {
        assert_eq!(session_id(Path::new("V1/V1_140501.jsonl")), "V1_140501");
    }

    #[test]
    fn test_analyze_subject() {
        let (subject, source, config) = setup();
        let filter = config.event_filter().unwrap();

        let report = analyze_subject(&subject, &source, &config, &filter).unwrap();

        assert_eq!(report.subject, "V1");
        assert_eq!(report.session_count(), 2);
        assert_eq!(report.sessions[0].session_id, "s1");
        assert_eq!(report.sessions[1].session_number, 2);
        assert_eq!(report.total_trials(), 5);
        assert_eq!(report.series.overall.total_trials, vec![3, 2]);

        let rot_0 = report
            .pooled_groups
            .iter()
            .find(|g| g.key == Some(GroupKey::new(0.0)))
            .unwrap();
        assert_eq!(rot_0.counts.successes, 2);
        assert_eq!(rot_0.counts.ignores, 1);

        assert_eq!(report.bins.len(), 1);
        assert_eq!(report.range_progress.len(), 2);
        assert_eq!(report.presentation.len(), 2);
    }

    #[test]
    fn test_analyze_subject_deterministic() {
        let (subject, source, config) = setup();
        let filter = config.event_filter().unwrap();

        let first = analyze_subject(&subject, &source, &config, &filter).unwrap();
        let second = analyze_subject(&subject, &source, &config, &filter).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bootstrap_disabled() {
        let (subject, source, mut config) = setup();
        config.bootstrap_enabled = false;
        let filter = config.event_filter().unwrap();

        let report = analyze_subject(&subject, &source, &config, &filter).unwrap();
        assert!(report.bins.is_empty());
    }

    #[test]
    fn test_reference_ignores_trial_filter() {
        let subject = SubjectSessions::new("V1", ["V1/s1.jsonl"]);
        let mut events = boundary_session(&[(0.0, "success"), (15.0, "failure")]);
        // Two size-40 trials at rotation 0, one of them correct
        for (i, outcome) in ["success", "failure"].into_iter().enumerate() {
            let t = 100.0 + i as f64 * 10.0;
            events.extend([
                Event::new("stm_size", 40.0, t),
                Event::new("stm_rotation_in_depth", 0.0, t + 1.0),
                Event::new("Announce_TrialStart", 1.0, t + 2.0),
                Event::new(outcome, 1.0, t + 3.0),
            ]);
        }
        let source = MemorySource::new().with_session("data/V1/s1.jsonl", events);
        let config = AnalysisConfig {
            root: PathBuf::from("data"),
            bootstrap_enabled: false,
            filter: TrialFilter {
                size: Some(30.0),
                rotation: None,
            },
            reference: Some(TrialFilter {
                size: Some(40.0),
                rotation: Some(0.0),
            }),
            ..AnalysisConfig::default()
        };
        let filter = config.event_filter().unwrap();

        let report = analyze_subject(&subject, &source, &config, &filter).unwrap();

        assert_eq!(report.total_trials(), 2);
        let reference = report.reference.unwrap();
        assert_eq!(reference.total_trials, 2);
        assert_eq!(reference.percent_correct, Some(50.0));
    }

    #[test]
    fn test_no_reference_configured() {
        let (subject, source, config) = setup();
        let filter = config.event_filter().unwrap();

        let report = analyze_subject(&subject, &source, &config, &filter).unwrap();
        assert!(report.reference.is_none());
    }

    #[test]
    fn test_missing_session_fails_subject() {
        let (mut subject, source, config) = setup();
        subject.sessions.push(PathBuf::from("V1/s3.jsonl"));
        let filter = config.event_filter().unwrap();

        let err = analyze_subject(&subject, &source, &config, &filter).unwrap_err();
        assert!(matches!(err, EventSourceError::MissingSession { .. }));
    }
}
