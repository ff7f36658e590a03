//! JSON output format for analysis runs
//!
//! `--format json` emits one document holding the run settings, a headline
//! summary, every subject's outcome and the cross-subject stats.

use crate::bootstrap::BootstrapConfig;
use crate::config::AnalysisConfig;
use crate::coordinator::{AnalysisRun, SubjectOutcome};
use crate::cross_subject::CrossSubjectSummary;
use crate::segment::SegmentationPolicy;
use crate::summary::{GroupBy, TrialFilter};
use serde::{Deserialize, Serialize};

/// Settings the run was made with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSettings {
    pub policy: SegmentationPolicy,
    pub group_by: GroupBy,
    pub filter: TrialFilter,
    pub center_tolerance: f64,
    /// Absent when bootstrapping was disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<BootstrapConfig>,
}

/// Headline counts for the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub subjects: usize,
    pub completed: usize,
    pub failed: usize,
    pub total_sessions: usize,
    pub total_trials: u64,
}

/// Complete JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Output format version
    pub version: String,
    /// Format identifier
    pub format: String,
    pub settings: JsonSettings,
    pub summary: JsonSummary,
    pub subjects: Vec<SubjectOutcome>,
    pub cross_subject: CrossSubjectSummary,
}

impl JsonOutput {
    pub fn new(run: &AnalysisRun, config: &AnalysisConfig) -> Self {
        let summary = JsonSummary {
            subjects: run.outcomes.len(),
            completed: run.reports().count(),
            failed: run.failures().count(),
            total_sessions: run.reports().map(|r| r.session_count()).sum(),
            total_trials: run.reports().map(|r| r.total_trials()).sum(),
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "trialstat-json-v1".to_string(),
            settings: JsonSettings {
                policy: config.policy,
                group_by: config.group_by,
                filter: config.filter,
                center_tolerance: config.center_tolerance,
                bootstrap: config.bootstrap_enabled.then_some(config.bootstrap),
            },
            summary,
            subjects: run.outcomes.clone(),
            cross_subject: run.cross_subject.clone(),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Serialize a run to pretty-printed JSON
pub fn to_json(run: &AnalysisRun, config: &AnalysisConfig) -> serde_json::Result<String> {
    JsonOutput::new(run, config).to_json()
}
