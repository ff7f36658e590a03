// Configuration for the session-bin bootstrap

use serde::{Deserialize, Serialize};

/// Default seed for the resampler's random source
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Configuration for bootstrap resampling
///
/// # Example
/// ```
/// use trialstat::bootstrap::BootstrapConfig;
///
/// let config = BootstrapConfig::default();
/// assert_eq!(config.bin_size, 5);
/// assert_eq!(config.iterations, 10_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Consecutive sessions pooled into one bin
    ///
    /// A trailing bin with fewer sessions is discarded.
    pub bin_size: usize,

    /// Resampling iterations per bin and stimulus value
    pub iterations: usize,

    /// Base seed; each subject mixes in a hash of its name
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            bin_size: 5,
            iterations: 10_000,
            seed: DEFAULT_SEED,
        }
    }
}

impl BootstrapConfig {
    /// A cheap configuration for smoke runs
    pub fn quick() -> Self {
        Self {
            iterations: 500,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bin_size < 1 {
            return Err(format!("bin_size must be >= 1, got {}", self.bin_size));
        }

        if self.iterations < 1 {
            return Err(format!("iterations must be >= 1, got {}", self.iterations));
        }

        Ok(())
    }
}
