//! Guest/cloud sync state machine.
//!
//! The tracker is always in one of four states:
//!
//! ```text
//! Loading       -> Guest          (NoSession, SessionCheckFailed)
//! Loading       -> Cloud          (ProfileLoaded)
//! Loading       -> CloudDegraded  (ProfileLoadFailed)
//! Cloud         -> CloudDegraded  (WriteFailed)
//! CloudDegraded -> Cloud          (WriteSucceeded)
//! Guest         -> Loading        (SignedIn)
//! Cloud         -> Guest          (SignedOut)
//! CloudDegraded -> Guest          (SignedOut)
//! ```
//!
//! `CloudDegraded` keeps the user signed in but shows state that may not
//! match the server.

pub mod local;
pub mod remote;
pub mod tracker;

use std::fmt;

use thiserror::Error;

use crate::measurements::MeasurementError;

pub use local::{GuestState, JsonFileStore, LocalStore};
pub use remote::{RemoteStore, StoreRemote};
pub use tracker::{SaveStatus, Tracker};

/// Where tracker state currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Loading,
    Guest,
    Cloud,
    CloudDegraded,
}

impl SyncState {
    pub fn is_signed_in(self) -> bool {
        matches!(self, Self::Cloud | Self::CloudDegraded)
    }

    /// Short label for status lines: `Cloud` only when fully in sync.
    pub fn label(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Cloud => "Cloud",
            Self::Guest | Self::CloudDegraded => "Local",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Guest => "guest",
            Self::Cloud => "cloud",
            Self::CloudDegraded => "cloud_degraded",
        };
        f.write_str(s)
    }
}

/// Outcome of a collaborator call that drives a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    NoSession,
    SessionCheckFailed,
    ProfileLoaded,
    ProfileLoadFailed,
    WriteFailed,
    WriteSucceeded,
    SignedIn,
    SignedOut,
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoSession => "no_session",
            Self::SessionCheckFailed => "session_check_failed",
            Self::ProfileLoaded => "profile_loaded",
            Self::ProfileLoadFailed => "profile_load_failed",
            Self::WriteFailed => "write_failed",
            Self::WriteSucceeded => "write_succeeded",
            Self::SignedIn => "signed_in",
            Self::SignedOut => "signed_out",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("invalid sync transition: {event} in state {from}")]
    InvalidTransition { from: SyncState, event: SyncEvent },

    #[error("tracker is still loading")]
    NotReady,

    #[error("signed-in state without a remote store")]
    NoRemote,

    #[error(transparent)]
    Measurement(#[from] MeasurementError),
}

/// The sync state machine.
pub struct SyncMachine;

impl SyncMachine {
    /// The state reached from `from` on `event`, if that edge exists.
    pub fn next(from: SyncState, event: SyncEvent) -> Result<SyncState, SyncError> {
        use SyncEvent as E;
        use SyncState as S;

        let to = match (from, event) {
            (S::Loading, E::NoSession | E::SessionCheckFailed) => S::Guest,
            (S::Loading, E::ProfileLoaded) => S::Cloud,
            (S::Loading, E::ProfileLoadFailed) => S::CloudDegraded,
            (S::Cloud, E::WriteFailed) => S::CloudDegraded,
            (S::CloudDegraded, E::WriteSucceeded) => S::Cloud,
            (S::Guest, E::SignedIn) => S::Loading,
            (S::Cloud | S::CloudDegraded, E::SignedOut) => S::Guest,
            _ => return Err(SyncError::InvalidTransition { from, event }),
        };
        Ok(to)
    }
}
