//! Bounds applied while reading untrusted archives.

use serde::{Deserialize, Serialize};

/// Read limits for archive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadLimits {
    pub max_entries: usize,
    /// Sum of decompressed entry sizes.
    pub max_total_bytes: u64,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            max_total_bytes: 1 << 30,
        }
    }
}

/// `ReadLimits` fields as they appear in a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadLimitsOverrides {
    pub max_entries: Option<usize>,
    pub max_total_bytes: Option<u64>,
}

impl ReadLimits {
    /// Fields set in `overrides` replace ours.
    pub fn apply(self, overrides: ReadLimitsOverrides) -> Self {
        Self {
            max_entries: overrides.max_entries.unwrap_or(self.max_entries),
            max_total_bytes: overrides.max_total_bytes.unwrap_or(self.max_total_bytes),
        }
    }
}

/// Running decompressed-byte budget for one archive.
#[derive(Debug)]
pub(crate) struct ByteBudget {
    remaining: u64,
    limit: u64,
}

impl ByteBudget {
    pub(crate) fn new(limit: u64) -> Self {
        Self {
            remaining: limit,
            limit,
        }
    }

    /// Bytes that may still be read, plus one so overflow is observable.
    pub(crate) fn probe(&self) -> u64 {
        self.remaining.saturating_add(1)
    }

    /// Charge `n` bytes. Returns the limit description on overflow.
    pub(crate) fn charge(&mut self, n: u64) -> Result<(), String> {
        if n > self.remaining {
            return Err(format!(
                "total decompressed size exceeds {} bytes",
                self.limit
            ));
        }
        self.remaining -= n;
        Ok(())
    }
}
