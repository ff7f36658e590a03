//! Parallel per-subject coordinator
//!
//! Runs one pipeline per subject on a bounded rayon pool. Subjects share no
//! mutable state; each task sends its outcome over a channel and the pool
//! scope is the join barrier. A subject whose sessions cannot be read, or
//! whose pipeline panics, is reported as failed without affecting the others.

use crate::config::{AnalysisConfig, SubjectSessions};
use crate::cross_subject::{summarize_subjects, CrossSubjectSummary};
use crate::event::EventSource;
use crate::filter::EventFilter;
use crate::pipeline::{analyze_subject, SubjectReport};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};

/// Why a subject produced no report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A session could not be read or parsed
    Source,
    /// The pipeline panicked
    Panic,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source error"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectFailure {
    pub subject: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Result of one subject's task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubjectOutcome {
    Completed(Box<SubjectReport>),
    Failed(SubjectFailure),
}

impl SubjectOutcome {
    pub fn subject(&self) -> &str {
        match self {
            Self::Completed(report) => &report.subject,
            Self::Failed(failure) => &failure.subject,
        }
    }

    pub fn report(&self) -> Option<&SubjectReport> {
        match self {
            Self::Completed(report) => Some(report.as_ref()),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SubjectFailure> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// All subjects' outcomes, ordered by subject name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub outcomes: Vec<SubjectOutcome>,
    /// Computed from the completed subjects only
    pub cross_subject: CrossSubjectSummary,
}

impl AnalysisRun {
    pub fn reports(&self) -> impl Iterator<Item = &SubjectReport> {
        self.outcomes.iter().filter_map(SubjectOutcome::report)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SubjectFailure> {
        self.outcomes.iter().filter_map(SubjectOutcome::failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Worker count for a configured value; 0 means available parallelism
pub fn resolve_workers(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Owns the worker pool and the shared, read-only run inputs
pub struct Coordinator<S: EventSource> {
    config: AnalysisConfig,
    filter: EventFilter,
    source: S,
    pool: rayon::ThreadPool,
}

impl<S: EventSource> Coordinator<S> {
    pub fn new(config: AnalysisConfig, source: S) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
        let filter = config.event_filter()?;

        let workers = resolve_workers(config.workers);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("trialstat-worker-{}", index))
            .build()
            .context("Failed to build worker pool")?;
        tracing::debug!("Worker pool ready with {} threads", workers);

        Ok(Self {
            config,
            filter,
            source,
            pool,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Analyze every subject in the configuration's manifest
    pub fn run(&self) -> AnalysisRun {
        self.run_subjects(&self.config.subjects)
    }

    /// Analyze the given subjects; returns after every task has finished
    pub fn run_subjects(&self, subjects: &[SubjectSessions]) -> AnalysisRun {
        let (tx, rx) = crossbeam::channel::unbounded();

        self.pool.scope(|scope| {
            for subject in subjects {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // The receiver lives until after the scope, so send cannot fail
                    let _ = tx.send(self.run_subject(subject));
                });
            }
        });
        drop(tx);

        let mut outcomes: Vec<SubjectOutcome> = rx.into_iter().collect();
        outcomes.sort_by(|a, b| a.subject().cmp(b.subject()));

        let reports: Vec<SubjectReport> = outcomes
            .iter()
            .filter_map(SubjectOutcome::report)
            .cloned()
            .collect();
        let cross_subject = summarize_subjects(&reports, self.config.group_by);

        tracing::info!(
            "Analysis finished: {} subjects, {} failed",
            outcomes.len(),
            outcomes.len() - reports.len()
        );

        AnalysisRun {
            outcomes,
            cross_subject,
        }
    }

    fn run_subject(&self, subject: &SubjectSessions) -> SubjectOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            analyze_subject(subject, &self.source, &self.config, &self.filter)
        }));

        let (kind, message) = match result {
            Ok(Ok(report)) => return SubjectOutcome::Completed(Box::new(report)),
            Ok(Err(err)) => (FailureKind::Source, err.to_string()),
            Err(payload) => (FailureKind::Panic, panic_message(payload.as_ref())),
        };

        tracing::error!("Subject {} failed ({}): {}", subject.name, kind, message);
        SubjectOutcome::Failed(SubjectFailure {
            subject: subject.name.clone(),
            kind,
            message,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
