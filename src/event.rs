//! Event stream ingestion
//!
//! Events come from the experiment-control software as named, valued,
//! timestamped records. The core never parses the native log format itself;
//! it asks an [`EventSource`] for one session's events, already filtered to
//! the names a segmentation policy cares about.
//!
//! Two sources ship with the crate:
//! - [`JsonLinesSource`]: one `{"name", "value", "time"}` object per line
//! - [`MemorySource`]: in-memory sessions keyed by path (tests, embedding)

use crate::filter::EventFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single timestamped event from the experiment log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub value: f64,
    pub time: f64,
}

impl Event {
    pub fn new(name: impl Into<String>, value: f64, time: f64) -> Self {
        Self {
            name: name.into(),
            value,
            time,
        }
    }
}

/// Errors raised while opening or decoding a session's events
#[derive(Error, Debug)]
pub enum EventSourceError {
    #[error("Failed to read session {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed event at {path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Session not found: {path}")]
    MissingSession { path: PathBuf },
}

/// Event names for each role the segmenter understands
///
/// Defaults match the variable names used by the behavioural rigs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventNames {
    pub trial_start: String,
    pub trial_end: String,
    pub size: String,
    pub rotation: String,
    pub position_x: String,
    pub success: String,
    pub failure: String,
    pub ignore: String,
}

impl Default for EventNames {
    fn default() -> Self {
        Self {
            trial_start: "Announce_TrialStart".to_string(),
            trial_end: "Announce_TrialEnd".to_string(),
            size: "stm_size".to_string(),
            rotation: "stm_rotation_in_depth".to_string(),
            position_x: "stm_pos_x".to_string(),
            success: "success".to_string(),
            failure: "failure".to_string(),
            ignore: "ignore".to_string(),
        }
    }
}

impl EventNames {
    /// The three outcome names, in success / failure / ignore order
    pub fn outcome_names(&self) -> [&str; 3] {
        [&self.success, &self.failure, &self.ignore]
    }

    pub fn is_outcome(&self, name: &str) -> bool {
        self.outcome_names().contains(&name)
    }
}

/// Supplies one session's events in their original chronological order
///
/// Implementations must not reorder or deduplicate. An empty result is a
/// valid, zero-trial session.
pub trait EventSource: Send + Sync {
    fn open_and_filter(
        &self,
        path: &Path,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, EventSourceError>;
}

/// Reads line-delimited JSON event logs
///
/// Blank lines and lines starting with `#` are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesSource;

impl JsonLinesSource {
    pub fn new() -> Self {
        Self
    }

    /// Parse a whole log held in memory
    ///
    /// `path` is only used to label errors.
    pub fn parse_str(
        content: &str,
        path: &Path,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, EventSourceError> {
        let mut events = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let event: Event =
                serde_json::from_str(trimmed).map_err(|e| EventSourceError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    message: e.to_string(),
                })?;

            if filter.should_keep(&event.name) {
                events.push(event);
            }
        }

        Ok(events)
    }
}

impl EventSource for JsonLinesSource {
    fn open_and_filter(
        &self,
        path: &Path,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, EventSourceError> {
        let content = fs::read_to_string(path).map_err(|source| EventSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let events = Self::parse_str(&content, path, filter)?;
        tracing::debug!("Read {} events from {}", events.len(), path.display());
        Ok(events)
    }
}

/// Serves sessions held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sessions: HashMap<PathBuf, Vec<Event>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session's events under `path`
    pub fn insert(&mut self, path: impl Into<PathBuf>, events: Vec<Event>) {
        self.sessions.insert(path.into(), events);
    }

    pub fn with_session(mut self, path: impl Into<PathBuf>, events: Vec<Event>) -> Self {
        self.insert(path, events);
        self
    }
}

impl EventSource for MemorySource {
    fn open_and_filter(
        &self,
        path: &Path,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, EventSourceError> {
        let events = self
            .sessions
            .get(path)
            .ok_or_else(|| EventSourceError::MissingSession {
                path: path.to_path_buf(),
            })?;

        Ok(events
            .iter()
            .filter(|e| filter.should_keep(&e.name))
            .cloned()
            .collect())
    }
}
