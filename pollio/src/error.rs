/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for I/O points.
//!
//! Two error enums model the two failure layers:
//!
//! * [`PointError`]: the error code stored in a channel state.  It is
//!   `Copy` because it lives inside the lock-free state block and is copied
//!   out by every reader.
//! * [`AccessError`]: misuse of the attribute interface (unknown attribute,
//!   writing a read-only attribute, wrong value type).
//!
//! Consumers never receive a `PointError` as a return value from the
//! accessor paths; they observe it through the `error` / `quality`
//! attributes and the `error` / `writeError` events.

use std::io;

use thiserror::Error;

use crate::point::AttributeId;
use crate::value::DataType;

// ── PointError ────────────────────────────────────────────────────────────────

/// Error code of a read, a write, or the device connection.
///
/// The variants fall into three categories:
///
/// | Category | Variants |
/// |---|---|
/// | connection-level | `NotConnected`, `ConnectionLost` |
/// | per-operation | `Timeout`, `InvalidFormat`, `DeviceFault`, `Io` |
/// | no data yet | `NoData` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PointError {
    /// The point has not completed an operation since it was created.
    #[error("no data has been read yet")]
    NoData,

    /// The device connection is down (or was deliberately closed).
    #[error("device is not connected")]
    NotConnected,

    /// An established connection broke.
    #[error("connection to device lost")]
    ConnectionLost,

    #[error("operation timed out")]
    Timeout,

    /// The device answered, but the payload could not be interpreted.
    #[error("device returned data in an invalid format")]
    InvalidFormat,

    /// The device reported a fault with its own code.
    #[error("device reported fault code {code}")]
    DeviceFault { code: u32 },

    /// Any other I/O failure of the transport.
    #[error("I/O error: {0}")]
    Io(io::ErrorKind),
}

impl PointError {
    /// Stable numeric code exposed through the `error` attributes.
    ///
    /// `0` is reserved for "no error" (see [`error_code`]).  Device fault
    /// codes are reported with the high bit set.
    pub fn code(&self) -> u32 {
        match self {
            PointError::NoData => 1,
            PointError::NotConnected => 2,
            PointError::ConnectionLost => 3,
            PointError::Timeout => 4,
            PointError::InvalidFormat => 5,
            PointError::Io(_) => 6,
            PointError::DeviceFault { code } => 0x8000_0000 | (code & 0x7FFF_FFFF),
        }
    }

    /// Returns `true` for errors that say something about the whole
    /// connection rather than a single operation.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, PointError::NotConnected | PointError::ConnectionLost)
    }
}

impl From<io::Error> for PointError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => PointError::Timeout,
            io::ErrorKind::InvalidData => PointError::InvalidFormat,
            io::ErrorKind::NotConnected => PointError::NotConnected,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => PointError::ConnectionLost,
            kind => PointError::Io(kind),
        }
    }
}

/// Numeric attribute code of an optional error (`0` = none).
pub fn error_code(error: Option<PointError>) -> u32 {
    error.map_or(0, |e| e.code())
}

// ── Quality ───────────────────────────────────────────────────────────────────

/// Quality of a published value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Good,
    /// The value is stale, never read, or the last operation failed.
    #[default]
    Bad,
}

impl Quality {
    pub fn from_error(error: Option<PointError>) -> Self {
        match error {
            None => Quality::Good,
            Some(_) => Quality::Bad,
        }
    }
}

// ── AccessError ───────────────────────────────────────────────────────────────

/// Misuse of a point's attribute interface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    /// The attribute exists, but not on this kind of point.
    #[error("attribute '{}' is not provided by point '{point}'", .attribute.name())]
    NotSupported {
        point: String,
        attribute: AttributeId,
    },

    #[error("attribute '{}' of point '{point}' is read-only", .attribute.name())]
    ReadOnly {
        point: String,
        attribute: AttributeId,
    },

    #[error("point '{point}' expects a {expected} value, got {actual}")]
    TypeMismatch {
        point: String,
        expected: DataType,
        actual: DataType,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
