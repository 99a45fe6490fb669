//! Identifier types used throughout the ModelStack core.
//!
//! Model nodes and attributes live in an arena owned by the model tree, so
//! their handles are plain indices. Deployment sessions are tagged with a
//! UUID v7 so that log lines from one session sort together.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Handle of a model node (class, definition, field, region, ...) inside a
/// model tree arena.
///
/// Handles are only meaningful for the tree that issued them. Two handles are
/// equal iff they denote the same node instance, which is what identity
/// comparisons in the inheritance logic rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Largest arena index a handle can address.
    pub const MAX_INDEX: usize = u32::MAX as usize;

    /// Creates a handle from an arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds [`NodeId::MAX_INDEX`].
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX_INDEX, "node index out of handle range");
        Self(index as u32)
    }

    /// Creates a handle from an arena index, or `None` past
    /// [`NodeId::MAX_INDEX`].
    #[must_use]
    pub fn try_from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle of a model attribute inside a model tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(u32);

impl AttributeId {
    /// Largest arena index a handle can address.
    pub const MAX_INDEX: usize = u32::MAX as usize;

    /// Creates a handle from an arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds [`AttributeId::MAX_INDEX`].
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX_INDEX, "attribute index out of handle range");
        Self(index as u32)
    }

    /// Creates a handle from an arena index, or `None` past
    /// [`AttributeId::MAX_INDEX`].
    #[must_use]
    pub fn try_from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attribute#{}", self.0)
    }
}

/// Unique identifier of one deployment session.
/// Uses UUID v7 which embeds a timestamp for natural ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentId(Uuid);

impl DeploymentId {
    /// Creates a new deployment ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a deployment ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a deployment ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeploymentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
