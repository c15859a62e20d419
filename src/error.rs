//! Error types.
//!
//! None of these are fatal. Round errors are rejected host requests that
//! get logged and ignored; store errors are persistence failures that get
//! logged while the game carries on.

use std::path::PathBuf;

use crate::sim::round::RoundPhase;

/// A host request the round controller refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoundError {
    /// The requested animal is not in the catalog.
    #[error("unknown animal: {0}")]
    UnknownAnimal(String),

    /// The requested animal has not been unlocked yet.
    #[error("animal {0} is locked")]
    Locked(String),

    /// The action is only valid while a round is being played.
    #[error("{action} ignored: round is {phase:?}, not playing")]
    NotPlaying {
        /// What the host asked for.
        action: &'static str,
        /// Phase at the time of the request.
        phase: RoundPhase,
    },

    /// A found report named an animal other than the active target.
    #[error("found report for {got}, but the target is {expected}")]
    WrongTarget {
        /// Active target id.
        expected: &'static str,
        /// Id the host reported.
        got: String,
    },

    /// The round's found latch is already set.
    #[error("target already found this round")]
    AlreadyFound,

    /// Resume requested without a paused round.
    #[error("nothing to resume")]
    NothingToResume,
}

/// Persistence failure in the key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading the backing file failed.
    #[error("could not read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the backing file failed.
    #[error("could not write {path}: {source}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The store refused the write (used by tests and read-only stores).
    #[error("store is read-only")]
    ReadOnly,
}
