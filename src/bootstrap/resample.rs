// Session binning, label pools and the resampling loop

use super::BootstrapConfig;
use crate::segment::Outcome;
use crate::summary::{
    discriminability, pool_summaries, GroupBy, GroupKey, OutcomeCounts, SessionSummary,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

/// Bootstrap result for one stimulus value within one bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinStat {
    pub key: GroupKey,
    /// Pooled counts over the bin's sessions
    pub counts: OutcomeCounts,
    /// Index from the pooled counts
    pub observed: Option<f64>,
    /// Sample SD of the index across determinate iterations
    pub std_dev: Option<f64>,
    /// Iterations that drew at least one success or failure
    pub determinate_iterations: usize,
}

/// One bin of consecutive sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinReport {
    /// 1-based
    pub bin_number: usize,
    pub first_session: u32,
    pub last_session: u32,
    /// One entry per value present in the bin, in series order
    pub stats: Vec<BinStat>,
}

/// Split sessions into contiguous bins of `bin_size`
///
/// The trailing partial bin is discarded; `bin_size == 0` yields no bins.
pub fn bin_sessions(summaries: &[SessionSummary], bin_size: usize) -> Vec<&[SessionSummary]> {
    if bin_size == 0 {
        return Vec::new();
    }
    summaries.chunks_exact(bin_size).collect()
}

/// Flat pool holding one label per counted trial
pub fn label_pool(counts: &OutcomeCounts) -> Vec<Outcome> {
    let mut pool = Vec::with_capacity(counts.total() as usize);
    pool.extend((0..counts.successes).map(|_| Outcome::Success));
    pool.extend((0..counts.failures).map(|_| Outcome::Failure));
    pool.extend((0..counts.ignores).map(|_| Outcome::Ignore));
    pool
}

/// Resample `pool` with replacement `iterations` times
///
/// Each iteration draws `pool.len()` labels and yields the index of the draw,
/// `None` when the draw holds no success or failure.
pub fn resample_discriminability<R: Rng + ?Sized>(
    pool: &[Outcome],
    iterations: usize,
    rng: &mut R,
) -> Vec<Option<f64>> {
    if pool.is_empty() {
        return vec![None; iterations];
    }

    (0..iterations)
        .map(|_| {
            let mut successes = 0u64;
            let mut failures = 0u64;
            for _ in 0..pool.len() {
                match pool[rng.gen_range(0..pool.len())] {
                    Outcome::Success => successes += 1,
                    Outcome::Failure => failures += 1,
                    _ => {}
                }
            }
            discriminability(successes, failures)
        })
        .collect()
}

/// Sample standard deviation (N-1) over the determinate values
///
/// `None` when fewer than two values are determinate.
pub fn sample_std_dev(values: &[Option<f64>]) -> Option<f64> {
    let determinate: Vec<f64> = values.iter().flatten().copied().collect();
    if determinate.len() < 2 {
        return None;
    }

    let n = determinate.len() as f64;
    let mean = determinate.iter().sum::<f64>() / n;
    let variance = determinate
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);

    Some(variance.sqrt())
}

/// Seed for one subject: the base seed mixed with an FNV-1a hash of the name
///
/// Results do not depend on which worker runs the subject or when.
pub fn subject_seed(seed: u64, subject: &str) -> u64 {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(subject.as_bytes());
    seed ^ hasher.finish()
}

/// Bootstrap every bin of a subject's sessions
pub fn bootstrap_bins<R: Rng + ?Sized>(
    summaries: &[SessionSummary],
    group_by: GroupBy,
    config: &BootstrapConfig,
    rng: &mut R,
) -> Vec<BinReport> {
    bin_sessions(summaries, config.bin_size)
        .into_iter()
        .enumerate()
        .map(|(index, bin)| {
            let (_, pooled) = pool_summaries(bin, group_by);
            let stats = pooled
                .into_iter()
                .filter_map(|group| {
                    let key = group.key?;
                    let pool = label_pool(&group.counts);
                    let draws = resample_discriminability(&pool, config.iterations, rng);
                    Some(BinStat {
                        key,
                        counts: group.counts,
                        observed: group.counts.discriminability(),
                        std_dev: sample_std_dev(&draws),
                        determinate_iterations: draws.iter().filter(|d| d.is_some()).count(),
                    })
                })
                .collect();

            BinReport {
                bin_number: index + 1,
                first_session: bin.first().map_or(0, |s| s.session_number),
                last_session: bin.last().map_or(0, |s| s.session_number),
                stats,
            }
        })
        .collect()
}
