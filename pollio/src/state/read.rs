/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Read side of a point: the last read result.

use std::time::SystemTime;

use crate::error::{PointError, Quality};
use crate::event::{Event, EventKind};
use crate::value::PointValue;

use super::block::StateBlock;

/// One consistent view of a point's read state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadSnapshot<T> {
    /// Last time the state was published, successfully or not.
    pub update_time: Option<SystemTime>,
    /// Last successfully read value.  Kept (stale) while `error` is set.
    pub value: T,
    /// Last time the value, quality or error changed.
    pub change_time: Option<SystemTime>,
    pub quality: Quality,
    pub error: Option<PointError>,
}

impl<T: PointValue> Default for ReadSnapshot<T> {
    /// Never read: `NoData`, bad quality, no timestamps.
    fn default() -> Self {
        Self {
            update_time: None,
            value: T::default(),
            change_time: None,
            quality: Quality::Bad,
            error: Some(PointError::NoData),
        }
    }
}

/// Which parts of the state a publish changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Changes {
    value: bool,
    quality: bool,
    error: bool,
}

impl Changes {
    fn any(&self) -> bool {
        self.value || self.quality || self.error
    }
}

pub struct ReadState<T: PointValue> {
    block: StateBlock<ReadSnapshot<T>>,
    value_changed: Event,
    quality_changed: Event,
    changed: Event,
    updated: Event,
    error: Event,
}

impl<T: PointValue> ReadState<T> {
    pub fn new() -> Self {
        Self {
            block: StateBlock::new(ReadSnapshot::default()),
            value_changed: Event::new(EventKind::ValueChanged),
            quality_changed: Event::new(EventKind::QualityChanged),
            changed: Event::new(EventKind::Changed),
            updated: Event::new(EventKind::Updated),
            error: Event::new(EventKind::Error),
        }
    }

    pub fn snapshot(&self) -> ReadSnapshot<T> {
        self.block.read_snapshot()
    }

    /// Number of publishes so far.
    pub fn version(&self) -> u64 {
        self.block.version()
    }

    /// Publishes a successful read.
    pub fn update_value(&self, timestamp: SystemTime, value: T) {
        self.apply(timestamp, Some(value), None);
    }

    /// Publishes a failed read.  The last good value is kept.
    pub fn update_error(&self, timestamp: SystemTime, error: PointError) {
        self.apply(timestamp, None, Some(error));
    }

    pub fn update(&self, timestamp: SystemTime, result: Result<T, PointError>) {
        match result {
            Ok(value) => self.update_value(timestamp, value),
            Err(error) => self.update_error(timestamp, error),
        }
    }

    /// Mirrors a connection transition into the state without touching the
    /// value.  A connection coming up publishes `NoData`: quality stays bad
    /// until the next successful read.
    pub fn update_connection(&self, timestamp: SystemTime, error: Option<PointError>) {
        self.apply(timestamp, None, Some(error.unwrap_or(PointError::NoData)));
    }

    /// Looks up one of the events this state fires.
    pub fn event(&self, kind: EventKind) -> Option<&Event> {
        match kind {
            EventKind::ValueChanged => Some(&self.value_changed),
            EventKind::QualityChanged => Some(&self.quality_changed),
            EventKind::Changed => Some(&self.changed),
            EventKind::Updated => Some(&self.updated),
            EventKind::Error => Some(&self.error),
            EventKind::Written | EventKind::WriteError => None,
        }
    }

    fn apply(&self, timestamp: SystemTime, value: Option<T>, error: Option<PointError>) {
        let changes = self.block.update(|state| {
            let quality = Quality::from_error(error);
            let changes = Changes {
                // Packed words compare NaN equal to itself.
                value: value.is_some_and(|v| v.pack() != state.value.pack()),
                quality: quality != state.quality,
                error: error != state.error,
            };

            state.update_time = Some(timestamp);
            if let Some(v) = value {
                state.value = v;
            }
            state.quality = quality;
            state.error = error;
            if changes.any() {
                state.change_time = Some(timestamp);
            }
            changes
        });

        // Events go out only after the new state is visible to readers.
        if changes.value {
            self.value_changed.fire(timestamp);
        }
        if changes.quality {
            self.quality_changed.fire(timestamp);
        }
        if changes.any() {
            self.changed.fire(timestamp);
        }
        if error.is_some_and(|e| e != PointError::NoData) {
            self.error.fire(timestamp);
        }
        self.updated.fire(timestamp);
    }
}

impl<T: PointValue> Default for ReadState<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(ms: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(ms)
    }

    fn count(state: &ReadState<f64>, kind: EventKind) -> u64 {
        state.event(kind).map_or(0, Event::fire_count)
    }

    #[test]
    fn new_state_reports_no_data() {
        let state = ReadState::<f64>::new();
        let snap = state.snapshot();
        assert_eq!(snap.error, Some(PointError::NoData));
        assert_eq!(snap.quality, Quality::Bad);
        assert_eq!(snap.update_time, None);
        assert_eq!(snap.change_time, None);
    }

    #[test]
    fn same_value_twice_only_moves_update_time() {
        let state = ReadState::<f64>::new();
        state.update_value(at(100), 4.2);
        state.update_value(at(200), 4.2);

        let snap = state.snapshot();
        assert_eq!(snap.update_time, Some(at(200)));
        assert_eq!(snap.change_time, Some(at(100)));
        assert_eq!(count(&state, EventKind::ValueChanged), 1);
        assert_eq!(count(&state, EventKind::Changed), 1);
        assert_eq!(count(&state, EventKind::Updated), 2);
    }

    #[test]
    fn first_read_of_default_value_still_changes_quality() {
        let state = ReadState::<f64>::new();
        state.update_value(at(1), 0.0);

        let snap = state.snapshot();
        assert_eq!(snap.error, None);
        assert_eq!(snap.quality, Quality::Good);
        assert_eq!(snap.change_time, Some(at(1)));
        assert_eq!(count(&state, EventKind::ValueChanged), 0);
        assert_eq!(count(&state, EventKind::QualityChanged), 1);
        assert_eq!(count(&state, EventKind::Changed), 1);
    }

    #[test]
    fn read_error_keeps_value_and_fires_error() {
        let state = ReadState::<f64>::new();
        state.update_value(at(1), 3.0);
        state.update_error(at(2), PointError::Timeout);

        let snap = state.snapshot();
        assert_eq!(snap.value, 3.0);
        assert_eq!(snap.error, Some(PointError::Timeout));
        assert_eq!(snap.quality, Quality::Bad);
        assert_eq!(snap.change_time, Some(at(2)));
        assert_eq!(count(&state, EventKind::Error), 1);
        assert_eq!(count(&state, EventKind::QualityChanged), 2);
    }

    #[test]
    fn repeated_identical_error_does_not_change() {
        let state = ReadState::<f64>::new();
        state.update_error(at(1), PointError::Timeout);
        state.update_error(at(2), PointError::Timeout);

        assert_eq!(state.snapshot().change_time, Some(at(1)));
        assert_eq!(count(&state, EventKind::Error), 2);
        // NoData → Timeout is a change, Timeout → Timeout is not
        assert_eq!(count(&state, EventKind::Changed), 1);
    }

    #[test]
    fn connection_recovery_waits_for_a_fresh_read() {
        let state = ReadState::<f64>::new();
        state.update_value(at(1), 9.0);
        state.update_connection(at(2), Some(PointError::ConnectionLost));
        state.update_connection(at(3), None);

        let snap = state.snapshot();
        assert_eq!(snap.value, 9.0);
        assert_eq!(snap.error, Some(PointError::NoData));
        assert_eq!(snap.quality, Quality::Bad);
        assert_eq!(snap.change_time, Some(at(3)));
        assert_eq!(count(&state, EventKind::Error), 1);

        state.update_value(at(4), 9.0);
        let snap = state.snapshot();
        assert_eq!(snap.error, None);
        assert_eq!(snap.quality, Quality::Good);
        assert_eq!(count(&state, EventKind::ValueChanged), 1);
    }

    #[test]
    fn connection_up_keeps_never_read_state_bad() {
        let state = ReadState::<f64>::new();
        state.update_connection(at(1), None);

        let snap = state.snapshot();
        assert_eq!(snap.error, Some(PointError::NoData));
        assert_eq!(snap.quality, Quality::Bad);
        assert_eq!(snap.change_time, None);
        assert_eq!(count(&state, EventKind::Changed), 0);
        assert_eq!(count(&state, EventKind::QualityChanged), 0);
        assert_eq!(count(&state, EventKind::Error), 0);
    }

    #[test]
    fn repeated_nan_reads_are_not_changes() {
        let state = ReadState::<f64>::new();
        state.update_value(at(1), f64::NAN);
        state.update_value(at(2), f64::NAN);
        state.update_value(at(3), f64::NAN);

        let snap = state.snapshot();
        assert!(snap.value.is_nan());
        assert_eq!(snap.change_time, Some(at(1)));
        assert_eq!(count(&state, EventKind::ValueChanged), 1);
        assert_eq!(count(&state, EventKind::Changed), 1);
        assert_eq!(count(&state, EventKind::Updated), 3);
    }

    #[test]
    fn update_dispatches_on_result() {
        let state = ReadState::<f64>::new();
        state.update(at(1), Ok(1.0));
        assert_eq!(state.snapshot().value, 1.0);
        state.update(at(2), Err(PointError::InvalidFormat));
        assert_eq!(state.snapshot().error, Some(PointError::InvalidFormat));
        assert_eq!(state.version(), 2);
    }

    #[test]
    fn write_events_are_not_part_of_read_state() {
        let state = ReadState::<bool>::new();
        assert!(state.event(EventKind::Written).is_none());
        assert!(state.event(EventKind::WriteError).is_none());
        assert!(state.event(EventKind::Updated).is_some());
    }
}
