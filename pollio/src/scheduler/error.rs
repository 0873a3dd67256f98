/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the cycle scheduler.
//!
//! Every variant is a sequencing mistake by the caller; the scheduler itself
//! never fails once running.  Task failures are not errors here: they are
//! published into the point's state and reported to its device.
//!
//! | Variant | Raised by |
//! |---|---|
//! | `NotStarted` | `run_cycle` / `shutdown` before `start` |
//! | `AlreadyStarted` | `start` twice, `add_task` after `start` |
//! | `AlreadyStopped` | anything after `shutdown` |
//! | `DuplicateTask` | `add_task` with a label already in use |

use thiserror::Error;

use super::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The scheduler is still idle.
    #[error("scheduler has not been started")]
    NotStarted,

    /// Tasks only run through the pre-operational stage once.
    #[error("scheduler is already running (cycle {cycle})")]
    AlreadyStarted { cycle: u64 },

    /// Post-operational has been run; nothing may follow it.
    #[error("scheduler has been shut down")]
    AlreadyStopped,

    #[error("a task labelled '{label}' is already registered")]
    DuplicateTask { label: String },
}

impl SchedulerError {
    /// The error for a call made while the scheduler was in `phase`, when the
    /// call needed some other phase.
    pub(super) fn wrong_phase(phase: Phase, cycle: u64) -> Self {
        match phase {
            Phase::Idle => SchedulerError::NotStarted,
            Phase::Running => SchedulerError::AlreadyStarted { cycle },
            Phase::Stopped => SchedulerError::AlreadyStopped,
        }
    }
}
