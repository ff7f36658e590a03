//! trialstat - behavioural trial segmentation and learning-curve statistics
//!
//! This library turns per-session event logs from behavioural experiments into
//! trials, per-session outcome statistics, cross-session learning curves and
//! bootstrap estimates of discriminability, running one subject per worker.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod cross_subject;
pub mod csv_output;
pub mod event;
pub mod filter;
pub mod json_output;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod segment;
pub mod series;
pub mod summary;
