/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Contract between I/O points and the device connection they share.
//!
//! ```text
//!   Input ──┐ request_connect / request_disconnect / report_error
//!   Output ─┼──────────────────────────────────►  DeviceConnection
//!   Input ──┘ ◄────────────────────────────────   (fan-out via ErrorSinkRegistry)
//!             connection_state_changed(ts, error)
//! ```
//!
//! The connection holds its sinks weakly: it never keeps a point alive.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::SystemTime;

use crate::error::PointError;

/// Receives connectivity transitions of the connection a point depends on.
pub trait ErrorSink: Send + Sync {
    /// Called once per real transition.  `None` means the connection is up.
    ///
    /// Implementations must not call back into the connection.
    fn connection_state_changed(&self, timestamp: SystemTime, error: Option<PointError>);
}

/// A connection shared by every point attached to one physical device.
///
/// All methods are non-blocking signals from the point's point of view.
/// Connect and disconnect requests are reference counted: the connection
/// stays up until every request to connect has been matched by a request to
/// disconnect.
pub trait DeviceConnection: Send + Sync {
    fn name(&self) -> &str;

    fn request_connect(&self, timestamp: SystemTime);

    fn request_disconnect(&self, timestamp: SystemTime);

    /// Safe to call concurrently with callback delivery.
    fn connected(&self) -> bool;

    /// Reports a failed operation of one point.  The connection decides
    /// whether it means the whole connection is unhealthy.
    fn report_error(&self, timestamp: SystemTime, error: PointError, source: &str);

    fn add_error_sink(&self, sink: Weak<dyn ErrorSink>);
}

// ── ErrorSinkRegistry ─────────────────────────────────────────────────────────

/// Weak set of error sinks with fan-out.
#[derive(Default)]
pub struct ErrorSinkRegistry {
    sinks: Mutex<Vec<Weak<dyn ErrorSink>>>,
}

impl ErrorSinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sink: Weak<dyn ErrorSink>) {
        self.lock().push(sink);
    }

    /// Number of registered sinks that are still alive.
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|s| s.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers a transition to every live sink and forgets dropped ones.
    ///
    /// Sinks are called outside the registry lock, so a sink registering a
    /// new sink from its callback cannot deadlock.  Returns the number of
    /// sinks notified.
    pub fn notify(&self, timestamp: SystemTime, error: Option<PointError>) -> usize {
        let live: Vec<Arc<dyn ErrorSink>> = {
            let mut sinks = self.lock();
            sinks.retain(|s| s.strong_count() > 0);
            sinks.iter().filter_map(Weak::upgrade).collect()
        };

        for sink in &live {
            sink.connection_state_changed(timestamp, error);
        }
        live.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn ErrorSink>>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
