//! Resource limits for snippet execution.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resource constraints applied to a single snippet run.
///
/// Use the builder methods to customise limits:
///
/// ```rust
/// use algolab_sandbox::SandboxLimits;
/// use std::time::Duration;
///
/// let limits = SandboxLimits::new()
///     .with_fuel_limit(1_000_000)
///     .with_output_limit(64 * 1024)
///     .with_time_limit(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxLimits {
    /// Interpreter step budget (default: 50,000,000).
    pub max_fuel: u64,
    /// Largest array a builtin may allocate (default: 1,000,000 elements).
    pub max_array_len: usize,
    /// Captured stdout cap in bytes (default: 256 KiB).
    pub max_output_bytes: usize,
    /// Per-binding display-string cap for snapshots (default: 4 KiB).
    pub max_render_bytes: usize,
    /// Largest accepted snippet source in bytes (default: 64 KiB).
    pub max_source_bytes: usize,
    /// Wall-clock limit applied when a request does not carry its own.
    #[serde(with = "duration_serde")]
    pub default_time_limit: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_fuel: 50_000_000,
            max_array_len: 1_000_000,
            max_output_bytes: 256 * 1024,
            max_render_bytes: 4096,
            max_source_bytes: 64 * 1024,
            default_time_limit: Duration::from_secs(30),
        }
    }
}

impl SandboxLimits {
    /// Create limits with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interpreter step budget.
    pub fn with_fuel_limit(mut self, fuel: u64) -> Self {
        self.max_fuel = fuel;
        self
    }

    /// Set the largest array a builtin may allocate.
    pub fn with_array_limit(mut self, elements: usize) -> Self {
        self.max_array_len = elements;
        self
    }

    /// Set the captured stdout cap in bytes.
    pub fn with_output_limit(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Set the per-binding display-string cap for snapshots.
    pub fn with_render_limit(mut self, bytes: usize) -> Self {
        self.max_render_bytes = bytes;
        self
    }

    /// Set the largest accepted snippet source in bytes.
    pub fn with_source_limit(mut self, bytes: usize) -> Self {
        self.max_source_bytes = bytes;
        self
    }

    /// Set the fallback wall-clock execution limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.default_time_limit = duration;
        self
    }
}

/// Custom serde module for `std::time::Duration`, serialised as a
/// `{ secs, nanos }` pair so it round-trips through JSON cleanly.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct DurationRepr {
        secs: u64,
        nanos: u32,
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let repr = DurationRepr {
            secs: duration.as_secs(),
            nanos: duration.subsec_nanos(),
        };
        repr.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = DurationRepr::deserialize(deserializer)?;
        Ok(Duration::new(repr.secs, repr.nanos))
    }
}
