//! Event-name filtering for session reads
//!
//! Supports:
//! - The names a segmentation policy needs: [`EventFilter::for_policy`]
//! - Explicit names: `events=stm_size,success,failure`
//! - Role classes resolved against [`EventNames`]: `events=outcomes,stimulus`

use crate::event::EventNames;
use crate::segment::SegmentationPolicy;
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Filter that determines which events a source hands to the segmenter
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Set of event names to keep (None = all events)
    include: Option<HashSet<String>>,
}

impl EventFilter {
    /// Create a filter that keeps every event
    pub fn all() -> Self {
        Self { include: None }
    }

    /// Keep exactly the given names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Names of interest for a segmentation policy
    pub fn for_policy(names: &EventNames, policy: SegmentationPolicy) -> Self {
        let mut include: HashSet<String> = names
            .outcome_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        include.insert(names.size.clone());

        match policy {
            SegmentationPolicy::BoundaryAnchored => {
                include.insert(names.trial_start.clone());
                include.insert(names.trial_end.clone());
                include.insert(names.rotation.clone());
            }
            SegmentationPolicy::OutcomeAnchored => {}
            SegmentationPolicy::OutcomeAnchoredWithPosition => {
                include.insert(names.position_x.clone());
            }
        }

        Self {
            include: Some(include),
        }
    }

    /// Parse a filter expression like "events=stm_size,success" or "events=outcomes"
    pub fn from_expr(expr: &str, names: &EventNames) -> Result<Self> {
        if let Some(list) = expr.strip_prefix("events=") {
            Ok(Self::from_event_list(list, names))
        } else {
            bail!(
                "Invalid event filter expression: {}. Expected format: events=NAME[,NAME...]",
                expr
            );
        }
    }

    /// Parse the comma-separated list after "events="
    fn from_event_list(list: &str, names: &EventNames) -> Self {
        let mut include = HashSet::new();

        for part in list.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            match part {
                "outcomes" => {
                    include.extend(names.outcome_names().iter().map(|s| s.to_string()));
                }
                "stimulus" => {
                    include.extend(
                        [&names.size, &names.rotation, &names.position_x]
                            .into_iter()
                            .cloned(),
                    );
                }
                "boundary" => {
                    include.insert(names.trial_start.clone());
                    include.insert(names.trial_end.clone());
                }
                _ => {
                    include.insert(part.to_string());
                }
            }
        }

        Self {
            include: Some(include),
        }
    }

    /// Check if an event should be kept
    pub fn should_keep(&self, event_name: &str) -> bool {
        match &self.include {
            None => true,
            Some(set) => set.contains(event_name),
        }
    }
}
