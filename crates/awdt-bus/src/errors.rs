//! Bus and runtime error types.

use thiserror::Error;

/// Errors raised by the station runtime and the boundary link.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The other side of the boundary is gone.
    #[error("Boundary link closed")]
    LinkClosed,

    /// A persistent station's mailbox no longer accepts signals.
    #[error("Station {station} is no longer running")]
    StationStopped {
        /// Station name
        station: String,
    },

    /// The role already ended its run.
    #[error("Role already terminated")]
    Terminated,
}
