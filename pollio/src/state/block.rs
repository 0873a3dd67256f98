/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Versioned double buffer for lock-free snapshot reads.
//!
//! ```text
//!             version = 6 (even → buffer 0 is current)
//!   ┌──────────────┐   ┌──────────────┐
//!   │  buffer 0    │   │  buffer 1    │◄── next publish writes here,
//!   │  (readers)   │   │  (writer)    │    then stores version = 7
//!   └──────────────┘   └──────────────┘
//! ```
//!
//! # Protocol
//! * **Writer** (serialised by `writer`): copies the current buffer, applies
//!   the change, stores the result into the inactive buffer and publishes it
//!   by incrementing `version` with `Release`.
//! * **Reader**: loads `version` (`Acquire`), copies buffer `version & 1`,
//!   re-checks `version`.  If it moved, a publish completed during the copy
//!   and the buffer may since have been recycled, so the copy is retried.
//!
//! # Retry bound
//! A reader never waits for an in-progress write: the writer only touches the
//! inactive buffer.  A retry happens only when a whole publish completed
//! during the copy of one small `Copy` struct.  Publishes to one block happen
//! at most once per scheduler cycle plus once per connection transition, so
//! in practice a read completes on the first or second attempt; the number of
//! retries is bounded by the number of publishes that overlap the read.

use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_utils::CachePadded;

pub struct StateBlock<S> {
    /// Number of completed publishes.  Its low bit selects the current buffer.
    version: CachePadded<AtomicU64>,
    buffers: [CachePadded<UnsafeCell<S>>; 2],
    /// Serialises writers.  Readers never touch it.
    writer: Mutex<()>,
}

// SAFETY: readers only copy `S` out of a buffer and discard the copy unless
// the version check proves no write overlapped it; writers are serialised by
// `writer`.  `S: Copy` guarantees a discarded torn copy owns no resources.
unsafe impl<S: Copy + Send> Sync for StateBlock<S> {}

impl<S: Copy> StateBlock<S> {
    pub fn new(initial: S) -> Self {
        Self {
            version: CachePadded::new(AtomicU64::new(0)),
            buffers: [
                CachePadded::new(UnsafeCell::new(initial)),
                CachePadded::new(UnsafeCell::new(initial)),
            ],
            writer: Mutex::new(()),
        }
    }

    /// Returns the most recently published state.
    ///
    /// Never blocks; see the module docs for the retry bound.
    pub fn read_snapshot(&self) -> S {
        loop {
            let before = self.version.load(Ordering::Acquire);
            let cell = &self.buffers[(before & 1) as usize];
            // SAFETY: the pointer is valid for the lifetime of `self`.  The
            // copy may race with a writer recycling this buffer; such a copy
            // is detected below and thrown away without being used.
            let snapshot = unsafe { ptr::read_volatile(cell.get()) };
            fence(Ordering::Acquire);
            let after = self.version.load(Ordering::Relaxed);
            if before == after {
                return snapshot;
            }
            std::hint::spin_loop();
        }
    }

    /// Applies `f` to a copy of the current state and publishes the result
    /// as one atomic unit.
    ///
    /// Returns whatever `f` returns, which lets callers compute change flags
    /// against the previous state while holding the writer side.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.version.load(Ordering::Relaxed);
        // SAFETY: only the writer (serialised above) ever writes a buffer, and
        // it never writes the current one, so this read cannot race.
        let mut next = unsafe { ptr::read(self.buffers[(current & 1) as usize].get()) };
        let result = f(&mut next);

        // Order the previous version stores before touching the buffer that
        // readers of `current - 1` may still be copying.
        fence(Ordering::Release);
        // SAFETY: the inactive buffer is only read by stale readers, which
        // will see `version` move and discard their copy.
        unsafe { ptr::write_volatile(self.buffers[((current + 1) & 1) as usize].get(), next) };
        self.version.store(current + 1, Ordering::Release);

        result
    }

    /// Publishes `state`, replacing the current one.
    pub fn publish(&self, state: S) {
        self.update(|s| *s = state);
    }

    /// Number of publishes since creation.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl<S: Copy + Default> Default for StateBlock<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Copy + std::fmt::Debug> std::fmt::Debug for StateBlock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateBlock")
            .field("version", &self.version())
            .field("state", &self.read_snapshot())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
