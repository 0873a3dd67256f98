/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! In-process transport: a link that can be taken down and registers that
//! hold one value each.
//!
//! Used by the binary to run a configured system without hardware, and by
//! the tests to inject failures.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use crate::device::Link;
use crate::error::PointError;
use crate::point::{ReadChannel, WriteChannel};
use crate::value::PointValue;

// ── SimulatedLink ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SimulatedLink {
    available: AtomicBool,
    open: AtomicBool,
    opens: AtomicU32,
    closes: AtomicU32,
}

impl SimulatedLink {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            open: AtomicBool::new(false),
            opens: AtomicU32::new(0),
            closes: AtomicU32::new(0),
        }
    }

    /// While unavailable, `open` fails with `NotConnected`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Successful opens so far.
    pub fn open_count(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Link for SimulatedLink {
    fn open(&self) -> Result<(), PointError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(PointError::NotConnected);
        }
        self.open.store(true, Ordering::SeqCst);
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Register ──────────────────────────────────────────────────────────────────

/// One simulated device register.
///
/// Reads return the last written (or [`set`](Self::set)) value.  Failures
/// can be injected once ([`fail_next_read`](Self::fail_next_read)) or
/// periodically ([`fail_every`](Self::fail_every)).
pub struct Register<T: PointValue> {
    word: AtomicU64,
    fail_read: Mutex<Option<PointError>>,
    fail_write: Mutex<Option<PointError>>,
    /// Every n-th read fails with `Timeout`; 0 disables.
    fail_every: AtomicU32,
    reads: AtomicU32,
    writes: AtomicU32,
    _value: std::marker::PhantomData<fn() -> T>,
}

impl<T: PointValue> Register<T> {
    pub fn new(initial: T) -> Self {
        Self {
            word: AtomicU64::new(initial.pack()),
            fail_read: Mutex::new(None),
            fail_write: Mutex::new(None),
            fail_every: AtomicU32::new(0),
            reads: AtomicU32::new(0),
            writes: AtomicU32::new(0),
            _value: std::marker::PhantomData,
        }
    }

    pub fn get(&self) -> T {
        T::unpack(self.word.load(Ordering::Acquire))
    }

    /// Changes the value as if the device had done it.
    pub fn set(&self, value: T) {
        self.word.store(value.pack(), Ordering::Release);
    }

    pub fn fail_next_read(&self, error: PointError) {
        *self.fail_read.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn fail_next_write(&self, error: PointError) {
        *self.fail_write.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn fail_every(&self, n: u32) {
        self.fail_every.store(n, Ordering::SeqCst);
    }

    /// Read attempts so far, failed ones included.
    pub fn read_count(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl<T: PointValue> ReadChannel<T> for Register<T> {
    fn read(&self) -> Result<T, PointError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(error) = self
            .fail_read
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(error);
        }
        let every = self.fail_every.load(Ordering::SeqCst);
        if every != 0 && n % every == 0 {
            return Err(PointError::Timeout);
        }
        Ok(self.get())
    }
}

impl<T: PointValue> WriteChannel<T> for Register<T> {
    fn write(&self, value: T) -> Result<(), PointError> {
        if let Some(error) = self
            .fail_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(error);
        }
        trace!(?value, "register written");
        self.set(value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Type-erased handle to drive a register from outside, the way the real
/// process would change a sensor value.
pub trait Stimulus: Send + Sync {
    fn set_number(&self, value: f64);
}

impl<T: PointValue> Stimulus for Register<T> {
    fn set_number(&self, value: f64) {
        self.set(T::from_number(value));
    }
}

impl<T: PointValue> std::fmt::Debug for Register<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Register")
            .field("value", &self.get())
            .field("reads", &self.read_count())
            .field("writes", &self.write_count())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
