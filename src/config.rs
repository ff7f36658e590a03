//! Analysis configuration file
//!
//! One TOML file describes a whole run: how sessions are segmented and
//! grouped, the bootstrap settings, the event names the rig writes, and the
//! manifest of subjects with their sessions in chronological order.
//!
//! # Example trialstat.toml
//!
//! ```toml
//! root = "input/phase3"
//! policy = "boundary-anchored"
//! group_by = "rotation"
//!
//! [filter]
//! size = 30.0
//!
//! [reference]
//! size = 40.0
//! rotation = 0.0
//!
//! [bootstrap]
//! bin_size = 5
//! iterations = 10000
//!
//! [[subject]]
//! name = "V1"
//! sessions = ["V1/V1_140501.jsonl", "V1/V1_140502.jsonl"]
//! ```

use crate::bootstrap::BootstrapConfig;
use crate::event::EventNames;
use crate::filter::EventFilter;
use crate::progress::DEFAULT_TRIALS_PER_BIN;
use crate::segment::SegmentationPolicy;
use crate::summary::{GroupBy, SummaryOptions, TrialFilter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One subject and its session logs, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSessions {
    pub name: String,
    /// Paths relative to the config's `root` (absolute paths are kept)
    #[serde(default)]
    pub sessions: Vec<PathBuf>,
}

impl SubjectSessions {
    pub fn new<I, P>(name: impl Into<String>, sessions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            name: name.into(),
            sessions: sessions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Root configuration for trialstat.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory session paths are resolved against
    pub root: PathBuf,
    pub policy: SegmentationPolicy,
    pub group_by: GroupBy,
    /// Worker threads; 0 uses the available parallelism
    pub workers: usize,
    /// Max |position_x| for a trial to count as centred
    pub center_tolerance: f64,
    pub progress_bin_trials: usize,
    pub bootstrap_enabled: bool,
    /// Optional override of the events read, e.g. "events=outcomes,stimulus"
    pub event_filter: Option<String>,
    pub filter: TrialFilter,
    /// Condition scored over all of a subject's trials, ignoring `filter`
    pub reference: Option<TrialFilter>,
    pub bootstrap: BootstrapConfig,
    pub events: EventNames,
    #[serde(rename = "subject")]
    pub subjects: Vec<SubjectSessions>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            policy: SegmentationPolicy::default(),
            group_by: GroupBy::default(),
            workers: 0,
            center_tolerance: 0.0,
            progress_bin_trials: DEFAULT_TRIALS_PER_BIN,
            bootstrap_enabled: true,
            event_filter: None,
            filter: TrialFilter::default(),
            reference: None,
            bootstrap: BootstrapConfig::default(),
            events: EventNames::default(),
            subjects: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a TOML file
    ///
    /// ```no_run
    /// use trialstat::config::AnalysisConfig;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = AnalysisConfig::from_file("trialstat.toml")?;
    /// println!("Loaded {} subjects", config.subjects.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bootstrap_enabled {
            self.bootstrap.validate()?;
        }

        if self.center_tolerance.is_nan() || self.center_tolerance < 0.0 {
            return Err(format!(
                "center_tolerance must be non-negative, got {}",
                self.center_tolerance
            ));
        }

        if self.progress_bin_trials < 1 {
            return Err(format!(
                "progress_bin_trials must be >= 1, got {}",
                self.progress_bin_trials
            ));
        }

        self.validate_policy_fields()?;

        let mut seen = std::collections::HashSet::new();
        for subject in &self.subjects {
            if subject.name.trim().is_empty() {
                return Err("subject name must not be empty".to_string());
            }
            if !seen.insert(subject.name.as_str()) {
                return Err(format!("duplicate subject '{}'", subject.name));
            }
        }

        if let Some(expr) = &self.event_filter {
            EventFilter::from_expr(expr, &self.events).map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    /// Reject groupings and filters on a parameter the policy never records
    fn validate_policy_fields(&self) -> Result<(), String> {
        if !self.policy.provides(self.group_by) {
            return Err(format!(
                "group_by = {} is never recorded by the {:?} policy",
                self.group_by.label(),
                self.policy
            ));
        }

        if !self.policy.provides(GroupBy::Rotation) {
            if self.filter.rotation.is_some() {
                return Err(format!(
                    "filter.rotation can never match: the {:?} policy does not record rotation",
                    self.policy
                ));
            }
            if self.reference.is_some_and(|r| r.rotation.is_some()) {
                return Err(format!(
                    "reference.rotation can never match: the {:?} policy does not record rotation",
                    self.policy
                ));
            }
        }

        if self.reference.is_some_and(|r| !r.is_active()) {
            return Err("reference must set size or rotation".to_string());
        }

        Ok(())
    }

    /// Events handed to the segmenter
    ///
    /// The explicit `event_filter` expression when set, else the names the
    /// segmentation policy needs.
    pub fn event_filter(&self) -> Result<EventFilter> {
        match &self.event_filter {
            Some(expr) => EventFilter::from_expr(expr, &self.events),
            None => Ok(EventFilter::for_policy(&self.events, self.policy)),
        }
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            group_by: self.group_by,
            filter: self.filter,
            center_tolerance: self.center_tolerance,
        }
    }

    /// Resolve a manifest path against `root`
    pub fn session_path(&self, session: &Path) -> PathBuf {
        self.root.join(session)
    }
}
