use std::io;

use thiserror::Error;

/// Rejected command input. The scheduler is left untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    /// Value is not a finite, positive number of minutes.
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// Positive, but below the smallest interval the settings page accepts.
    #[error("interval {0} is below the minimum of {min} minutes", min = crate::commands::MIN_INTERVAL_MINUTES)]
    IntervalTooShort(f64),

    #[error("interval {0} is above the maximum of {max} minutes", max = crate::commands::MAX_INTERVAL_MINUTES)]
    IntervalTooLong(f64),

    /// Message did not match any known action.
    #[error("malformed command: {0}")]
    Malformed(String),
}

/// Window host failures.
#[derive(Debug, Error)]
pub enum HostError {
    /// The popup process could not be started.
    #[error("failed to spawn popup: {0}")]
    Spawn(#[source] io::Error),

    /// The popup process no longer accepts control lines.
    #[error("popup {0} is not reachable")]
    Unreachable(u64),

    /// No surface is tracked under this handle.
    #[error("unknown surface handle {0}")]
    UnknownHandle(u64),
}

/// Settings persistence failures.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io: {0}")]
    Io(#[from] io::Error),

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Control client failures.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Could not reach the daemon at all.
    #[error("daemon unreachable at {addr}: {reason}")]
    Unreachable { addr: String, reason: String },

    /// The daemon answered with a non-success status.
    #[error("daemon rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid daemon response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The daemon's event loop has gone away.
    #[error("daemon is shutting down")]
    Closed,
}
