use std::fmt;

use thiserror::Error;

/// Result type for RIO operations
pub type Result<T> = std::result::Result<T, RioError>;

/// Which kind of protocol address failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Controller,
    Zone,
    Source,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Controller => write!(f, "controller"),
            AddressKind::Zone => write!(f, "zone"),
            AddressKind::Source => write!(f, "source"),
        }
    }
}

/// Errors that can occur when talking to a Russound system
#[derive(Error, Debug)]
pub enum RioError {
    /// A controller, zone or source number fell outside the configured bounds.
    /// Updates carrying such an address are never applied to storage.
    #[error("{kind} number {number} out of range 1..={max}")]
    OutOfRangeAddress {
        /// Address component that failed validation
        kind: AddressKind,
        /// The offending number as it appeared on the wire or in the call
        number: u16,
        /// Upper bound from the system configuration
        max: u16,
    },

    /// System configuration rejected (zero controllers, zones or sources)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection was closed unexpectedly
    #[error("connection closed")]
    ConnectionClosed,

    /// I/O error from the transport layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RioError {
    pub(crate) fn out_of_range(kind: AddressKind, number: u16, max: u16) -> Self {
        RioError::OutOfRangeAddress { kind, number, max }
    }
}
