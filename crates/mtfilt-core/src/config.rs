//! Kernel execution configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default minimum element count before a kernel fans out across threads.
const DEFAULT_PARALLEL_THRESHOLD: usize = 32 * 1024;

/// Environment variable overriding [`KernelConfig::parallel_threshold`].
pub const ENV_PARALLEL_THRESHOLD: &str = "MTFILT_PARALLEL_THRESHOLD";
/// Environment variable overriding [`KernelConfig::warn_on_clamp`].
pub const ENV_WARN_ON_CLAMP: &str = "MTFILT_WARN_ON_CLAMP";

/// Runtime knobs shared by the correlation and LUT kernels.
///
/// None of these affect numeric results: serial and parallel execution are
/// bit-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// Minimum number of output elements before work is split across the
    /// rayon pool. `usize::MAX` forces serial execution.
    pub parallel_threshold: usize,
    /// Whether LUT boundary clamping is logged (once per side per call).
    pub warn_on_clamp: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            warn_on_clamp: true,
        }
    }
}

impl KernelConfig {
    /// Parse a JSON object. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults, overridden by `MTFILT_*` environment variables that parse.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(threshold) = lookup(ENV_PARALLEL_THRESHOLD).and_then(|s| s.parse().ok()) {
            self.parallel_threshold = threshold;
        }
        if let Some(warn) = lookup(ENV_WARN_ON_CLAMP).and_then(|s| parse_flag(&s)) {
            self.warn_on_clamp = warn;
        }
        self
    }

    /// Configuration that never spawns parallel work.
    pub fn serial() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            ..Self::default()
        }
    }

    pub(crate) fn runs_parallel(&self, work: usize) -> bool {
        work >= self.parallel_threshold
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
