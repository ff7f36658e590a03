// Bootstrap estimate of discriminability variability over session bins
//
// Sessions are grouped into contiguous fixed-size bins. Within each bin the
// outcome counts of every stimulus value are pooled, the observed index is
// computed from the pooled counts, and its spread is estimated by resampling
// the pooled outcome labels with replacement.
//
// Reference:
// Efron, B. & Tibshirani, R. (1993). An Introduction to the Bootstrap.
//     Chapman & Hall. Nonparametric resampling of an empirical distribution.
//
// Everything here is pure: the random source is passed in by the caller, so a
// fixed seed gives bit-identical results.

mod config;
mod resample;

pub use config::BootstrapConfig;
pub use resample::{
    bin_sessions, bootstrap_bins, label_pool, resample_discriminability, sample_std_dev,
    subject_seed, BinReport, BinStat,
};
