//! Optimistic-concurrency version of the server-side models.
//!
//! Every successful save or deploy returns the version the server is now at.
//! The cached version is monotonic: a response carrying an older version
//! than the one already cached is ignored, so a late reply can never make
//! the session overwrite a newer server state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A monotonically increasing model version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVersion(u64);

impl ModelVersion {
    /// Creates a version from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Moves this version forward to `other` if it is newer.
    ///
    /// Returns true if the version changed.
    pub fn advance_to(&mut self, other: ModelVersion) -> bool {
        if other.0 > self.0 {
            self.0 = other.0;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for ModelVersion {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
