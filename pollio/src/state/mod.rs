/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Published channel states.
//!
//! * [`block`] – the lock-free versioned double buffer all states sit on.
//! * [`read`]  – last read result of a point (value, times, quality, error).
//! * [`write`] – last write result of an output (write time, write error).

pub mod block;
pub mod read;
pub mod write;

pub use block::StateBlock;
pub use read::{ReadSnapshot, ReadState};
pub use write::{WriteSnapshot, WriteState};
