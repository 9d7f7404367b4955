//! Error types for the roundlog record store.

use std::time::Duration;

use thiserror::Error;

/// The main error type for all roundlog operations.
///
/// Appends never fail, so this covers the read path, configuration
/// validation and generator startup.
#[derive(Error, Debug)]
pub enum RoundlogError {
    /// Error during query operation (read path).
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Error during store or generator configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error while starting the generator.
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
}

/// Errors that can occur during query operations (read path).
///
/// Both variants carry the requested and the current value so the caller can
/// correct its coordinates and retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The requested round is ahead of the store's current round.
    #[error("requested round {requested} is ahead of current round {current}")]
    InvalidRound {
        /// The round the caller asked for.
        requested: i64,
        /// The round the store is currently writing.
        current: u64,
    },

    /// The requested slot has not been written yet in the current round.
    #[error("requested slot {requested} is past current slot {current}")]
    InvalidSlot {
        /// The slot the caller asked for.
        requested: i64,
        /// The most recently written slot, or -1 if nothing was written yet.
        current: i64,
    },
}

/// Errors that can occur while validating configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The store capacity must hold at least one record.
    #[error("invalid capacity: {capacity} (must be > 0)")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The generator tick interval must be non-zero.
    #[error("invalid tick interval: {interval:?}")]
    InvalidInterval {
        /// The rejected interval.
        interval: Duration,
    },

    /// The image draw space is empty or smaller than the candidate set.
    #[error("invalid image draw space: {candidates} candidates out of {draws} draws")]
    InvalidImageDraws {
        /// Number of draws that attach an image.
        candidates: u32,
        /// Total size of the draw space.
        draws: u32,
    },

    /// The timestamp format string is not a valid `strftime` pattern.
    #[error("invalid timestamp format: {format:?}")]
    InvalidTimestampFormat {
        /// The rejected format string.
        format: String,
    },
}

/// Errors that can occur while starting the generator.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The operating system random source could not be read.
    #[error("random source unavailable: {reason}")]
    Entropy {
        /// Description of the underlying failure.
        reason: String,
    },

    /// The generator thread could not be spawned.
    #[error("failed to spawn generator thread: {source}")]
    Spawn {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for `Result<T, RoundlogError>`.
pub type Result<T> = std::result::Result<T, RoundlogError>;
