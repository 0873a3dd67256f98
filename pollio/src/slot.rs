/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Single-slot, last-write-wins handoff of output values.
//!
//! Any thread may [`enqueue`](PendingSlot::enqueue); only the write task
//! [`dequeue`](PendingSlot::dequeue)s.  The slot is one `AtomicU64` holding
//! the [packed](crate::value::PointValue::pack) value, or
//! [`EMPTY_WORD`] when nothing is pending, so both sides are a single atomic
//! instruction: wait-free, allocation-free, and a stalled writer can never
//! hold up the scheduler.
//!
//! A newer value overwrites an undelivered older one.  A value enqueued
//! before a cycle starts is always seen by that cycle's `dequeue`; a value
//! enqueued concurrently with it is seen by this cycle or the next.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::{PointValue, EMPTY_WORD};

pub struct PendingSlot<T> {
    word: AtomicU64,
    _value: PhantomData<fn() -> T>,
}

impl<T: PointValue> PendingSlot<T> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            word: AtomicU64::new(EMPTY_WORD),
            _value: PhantomData,
        }
    }

    /// Stores `value`, replacing any value that has not been taken yet.
    pub fn enqueue(&self, value: T) {
        self.word.store(value.pack(), Ordering::Release);
    }

    /// Takes the pending value, leaving the slot empty.
    pub fn dequeue(&self) -> Option<T> {
        match self.word.swap(EMPTY_WORD, Ordering::AcqRel) {
            EMPTY_WORD => None,
            word => Some(T::unpack(word)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.word.load(Ordering::Acquire) != EMPTY_WORD
    }
}

impl<T: PointValue> Default for PendingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PointValue> fmt::Debug for PendingSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.word.load(Ordering::Acquire);
        let pending = (word != EMPTY_WORD).then(|| T::unpack(word));
        f.debug_struct("PendingSlot").field("pending", &pending).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn new_slot_is_empty() {
        let slot = PendingSlot::<f64>::new();
        assert!(!slot.is_pending());
        assert_eq!(slot.dequeue(), None);
    }

    #[test]
    fn last_write_wins() {
        let slot = PendingSlot::<f64>::new();
        slot.enqueue(1.0);
        slot.enqueue(2.0);
        assert!(slot.is_pending());
        assert_eq!(slot.dequeue(), Some(2.0));
        assert_eq!(slot.dequeue(), None);
    }

    #[test]
    fn false_is_a_real_value() {
        let slot = PendingSlot::<bool>::new();
        slot.enqueue(false);
        assert_eq!(slot.dequeue(), Some(false));
    }

    #[test]
    fn value_enqueued_before_sync_point_is_never_lost() {
        let slot = PendingSlot::<u32>::new();
        let barrier = Barrier::new(2);

        std::thread::scope(|s| {
            s.spawn(|| {
                slot.enqueue(77);
                barrier.wait();
            });
            barrier.wait();
            assert_eq!(slot.dequeue(), Some(77));
        });
    }

    #[test]
    fn concurrent_writers_deliver_one_of_their_values() {
        let slot = PendingSlot::<i32>::new();
        std::thread::scope(|s| {
            for t in 0..4 {
                let slot = &slot;
                s.spawn(move || {
                    for i in 0..1_000 {
                        slot.enqueue(t * 10_000 + i);
                    }
                });
            }
        });

        let v = slot.dequeue().unwrap();
        // Whichever writer finished last left its final value.
        assert_eq!(v % 10_000, 999, "unexpected survivor {v}");
        assert_eq!(slot.dequeue(), None);
    }

    #[test]
    fn every_dequeued_value_was_enqueued() {
        let slot = PendingSlot::<u32>::new();
        let mut seen = Vec::new();
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 1..=10_000u32 {
                    slot.enqueue(i);
                }
            });
            for _ in 0..10_000 {
                if let Some(v) = slot.dequeue() {
                    seen.push(v);
                }
            }
        });
        if let Some(v) = slot.dequeue() {
            seen.push(v);
        }
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "values went backwards");
        assert!(seen.iter().all(|v| (1..=10_000).contains(v)));
    }
}
