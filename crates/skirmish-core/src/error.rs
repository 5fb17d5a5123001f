//! Error types for the simulation core.
//!
//! Only construction, configuration, persistence and thread management can
//! fail. Stale encounters, lost kill races and an empty encounter queue are
//! ordinary outcomes and never surface here.

use std::io;
use std::path::PathBuf;

use crate::agent::AgentId;

/// Invalid simulation configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The grid must have at least one cell per axis.
    #[error("map size must be positive, got {0}")]
    InvalidMapSize(i32),

    /// At least one combat resolver must run.
    #[error("resolver_threads must be at least 1")]
    NoResolvers,

    /// Movement ranges are symmetric around zero and cannot be negative.
    #[error("move range for {kind} must not be negative, got {range}")]
    NegativeMoveRange {
        /// Label of the offending kind.
        kind: &'static str,
        /// The configured range.
        range: i32,
    },

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The config document is not valid JSON for [`SimConfig`](crate::config::SimConfig).
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A population that violates the arena preconditions.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Agent ids double as arena slots, so they must be `0..len` in order.
    #[error("agent {id} stored in slot {slot}")]
    SlotMismatch {
        /// The id carried by the agent.
        id: AgentId,
        /// The slot it was found in.
        slot: usize,
    },

    /// The initial position lies outside the grid.
    #[error("agent {id} starts outside the grid at ({x}, {y})")]
    OutOfBounds {
        /// The offending agent.
        id: AgentId,
        /// Initial x coordinate.
        x: i32,
        /// Initial y coordinate.
        y: i32,
    },

    /// Every agent must enter the world alive.
    #[error("agent {0} is already dead")]
    AlreadyDead(AgentId),
}

/// Failure reading or writing agent records.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The kind tag line is not one of the known tags.
    #[error("line {line}: unknown kind tag {tag:?}")]
    UnknownKind {
        /// 1-based line number.
        line: usize,
        /// The text found.
        tag: String,
    },

    /// A record ended before all four lines were read.
    #[error("line {line}: record truncated, expected {expected}")]
    Truncated {
        /// 1-based line number where the record stopped.
        line: usize,
        /// The field that was missing.
        expected: &'static str,
    },

    /// A coordinate line is not an integer.
    #[error("line {line}: invalid coordinate {value:?}")]
    InvalidCoordinate {
        /// 1-based line number.
        line: usize,
        /// The text found.
        value: String,
    },

    /// Names are stored one per line and must not be empty or contain line breaks.
    #[error("agent name {0:?} cannot be stored as a single line")]
    InvalidName(String),
}

/// Top-level error for building and running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Population rejected.
    #[error(transparent)]
    World(#[from] WorldError),

    /// Record I/O failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker {name}: {source}")]
    ThreadSpawn {
        /// Thread name.
        name: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A worker thread panicked before it could be joined.
    #[error("worker {name} panicked")]
    WorkerPanicked {
        /// Thread name.
        name: String,
    },
}
