/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Named events fired by the channel states.
//!
//! An [`Event`] is owned by the state that fires it.  The framework looks
//! events up by name ([`EventKind::from_name`]) and either polls the fire
//! counter or subscribes to a `tokio::sync::broadcast` receiver.  Firing never
//! blocks: with no subscribers the notice is simply discarded, and a slow
//! subscriber only lags (it never holds up the scheduler thread).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use tokio::sync::broadcast;

/// Notices buffered per event before a slow receiver starts lagging.
const EVENT_CAPACITY: usize = 64;

// ── EventKind ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The read value differs from the previously published one.
    ValueChanged,
    /// The quality of the read state changed.
    QualityChanged,
    /// Anything observable in the read state changed.
    Changed,
    /// The read state was published, changed or not.
    Updated,
    /// A read failed, or the connection reported an error.
    Error,
    /// A pending value was written successfully.
    Written,
    /// Writing a pending value failed.
    WriteError,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::ValueChanged,
        EventKind::QualityChanged,
        EventKind::Changed,
        EventKind::Updated,
        EventKind::Error,
        EventKind::Written,
        EventKind::WriteError,
    ];

    /// The name under which the framework resolves this event.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ValueChanged => "valueChanged",
            EventKind::QualityChanged => "qualityChanged",
            EventKind::Changed => "changed",
            EventKind::Updated => "updated",
            EventKind::Error => "error",
            EventKind::Written => "written",
            EventKind::WriteError => "writeError",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// What a subscriber receives when an event fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventNotice {
    pub kind: EventKind,
    pub timestamp: SystemTime,
}

// ── Event ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Event {
    kind: EventKind,
    fired: AtomicU64,
    sender: broadcast::Sender<EventNotice>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            kind,
            fired: AtomicU64::new(0),
            sender,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn fire(&self, timestamp: SystemTime) {
        self.fired.fetch_add(1, Ordering::Relaxed);
        // Err only means nobody is subscribed.
        let _ = self.sender.send(EventNotice {
            kind: self.kind,
            timestamp,
        });
    }

    /// Number of times this event has fired since creation.
    pub fn fire_count(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventNotice> {
        self.sender.subscribe()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
