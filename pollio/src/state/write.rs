/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Write side of an output: the result of the last write attempt.

use std::time::SystemTime;

use crate::error::PointError;
use crate::event::{Event, EventKind};

use super::block::StateBlock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSnapshot {
    /// Last time a value was written, successfully or not.
    pub write_time: Option<SystemTime>,
    /// Error of the last write.  Starts as `None`: never writing is not an
    /// error, and connection errors do not touch this field.
    pub write_error: Option<PointError>,
}

pub struct WriteState {
    block: StateBlock<WriteSnapshot>,
    written: Event,
    write_error: Event,
}

impl WriteState {
    pub fn new() -> Self {
        Self {
            block: StateBlock::default(),
            written: Event::new(EventKind::Written),
            write_error: Event::new(EventKind::WriteError),
        }
    }

    pub fn snapshot(&self) -> WriteSnapshot {
        self.block.read_snapshot()
    }

    /// Publishes the outcome of one write and fires exactly one of
    /// `written` / `writeError`.
    pub fn update(&self, timestamp: SystemTime, result: Result<(), PointError>) {
        let write_error = result.err();
        self.block.publish(WriteSnapshot {
            write_time: Some(timestamp),
            write_error,
        });

        match write_error {
            None => self.written.fire(timestamp),
            Some(_) => self.write_error.fire(timestamp),
        }
    }

    pub fn event(&self, kind: EventKind) -> Option<&Event> {
        match kind {
            EventKind::Written => Some(&self.written),
            EventKind::WriteError => Some(&self.write_error),
            _ => None,
        }
    }
}

impl Default for WriteState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
