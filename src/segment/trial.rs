use crate::event::EventNames;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioural outcome of a trial
///
/// The segmenter only produces the three recognized variants. Trials built
/// elsewhere can carry any label, which aggregation reports and excludes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Success,
    Failure,
    /// No decision registered
    Ignore,
    Unrecognized(String),
}

impl Outcome {
    /// Classify an event name using the configured outcome names
    pub fn from_event_name(name: &str, names: &EventNames) -> Option<Self> {
        if name == names.success {
            Some(Self::Success)
        } else if name == names.failure {
            Some(Self::Failure)
        } else if name == names.ignore {
            Some(Self::Ignore)
        } else {
            None
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Ignore => "ignore",
            Self::Unrecognized(label) => label,
        }
    }
}

impl From<String> for Outcome {
    fn from(label: String) -> Self {
        match label.as_str() {
            "success" => Self::Success,
            "failure" => Self::Failure,
            "ignore" => Self::Ignore,
            _ => Self::Unrecognized(label),
        }
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.label().to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reconstructed trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// 1-based, counts appended trials only
    pub trial_number: u32,
    /// Time of the anchor event
    pub time: f64,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimulus_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimulus_rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimulus_position_x: Option<f64>,
}
