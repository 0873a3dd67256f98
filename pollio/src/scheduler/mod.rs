/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cycle scheduler.
//!
//! [`CycleScheduler`] owns every task of a runtime and drives each one
//! through its stages, one task at a time, in registration order:
//!
//! ```text
//!   Idle ──start()──► Running ──run_cycle()*──► ──shutdown()──► Stopped
//!         prepare_pre_operational   pre_operational (while Pending)
//!                                   operational      (once Ready)
//!                                                    prepare_post_operational
//! ```
//!
//! # Guarantees
//! | Property | How |
//! |---|---|
//! | one call at a time per task | single caller thread, `&mut self` |
//! | post-operational exactly once | `shutdown` moves to `Stopped` before the loop; any second call is `AlreadyStopped` |
//! | deterministic order | tasks run in the order they were added; device tasks are added first by the runtime |
//!
//! The scheduler does not own a clock: the caller passes the scheduled time
//! of each cycle, so tests run on a fixed timeline.

pub mod error;

pub use error::SchedulerError;

use std::time::SystemTime;

use tracing::{debug, info, trace};

use crate::task::{ExecutionContext, Stage, StageStatus, Task};

// ── Phase ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
}

/// Where one task currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskStage {
    /// Not started yet.
    Registered,
    /// Preparation returned `Pending`; `pre_operational` runs every cycle.
    PreOperational,
    Operational,
    PostOperational,
}

struct Entry {
    label: String,
    task: Box<dyn Task>,
    stage: TaskStage,
}

impl Entry {
    fn has(&self, stage: Stage) -> bool {
        self.task.stages().contains(&stage)
    }
}

// ── CycleScheduler ────────────────────────────────────────────────────────────

pub struct CycleScheduler {
    tasks: Vec<Entry>,
    phase: Phase,
    cycle: u64,
}

impl CycleScheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            phase: Phase::Idle,
            cycle: 0,
        }
    }

    /// Registers a task.  Only allowed before [`start`](Self::start).
    pub fn add_task(
        &mut self,
        label: impl Into<String>,
        task: Box<dyn Task>,
    ) -> Result<(), SchedulerError> {
        if self.phase != Phase::Idle {
            return Err(SchedulerError::wrong_phase(self.phase, self.cycle));
        }
        let label = label.into();
        if self.tasks.iter().any(|e| e.label == label) {
            return Err(SchedulerError::DuplicateTask { label });
        }
        debug!(task = %label, "task registered");
        self.tasks.push(Entry {
            label,
            task,
            stage: TaskStage::Registered,
        });
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cycles run since `start`; the pre-operational pass is cycle 0.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_labels(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|e| e.label.as_str())
    }

    /// Tasks that have finished preparing and run `operational` each cycle.
    pub fn operational_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|e| e.stage == TaskStage::Operational)
            .count()
    }

    /// Runs `prepare_pre_operational` once for every task.
    pub fn start(&mut self, timestamp: SystemTime) -> Result<(), SchedulerError> {
        if self.phase != Phase::Idle {
            return Err(SchedulerError::wrong_phase(self.phase, self.cycle));
        }
        self.phase = Phase::Running;
        let context = ExecutionContext::new(timestamp, self.cycle);

        info!(task_count = self.tasks.len(), "=== entering pre-operational ===");
        for entry in &mut self.tasks {
            entry.stage = if !entry.has(Stage::PreOperational) {
                TaskStage::Operational
            } else {
                match entry.task.prepare_pre_operational(&context) {
                    StageStatus::Ready => TaskStage::Operational,
                    StageStatus::Pending => {
                        debug!(task = %entry.label, "pre-operational pending");
                        TaskStage::PreOperational
                    }
                }
            };
        }
        info!(
            operational = self.operational_count(),
            "=== pre-operational complete ==="
        );
        Ok(())
    }

    /// Runs one cycle: `pre_operational` for tasks still preparing,
    /// `operational` for everything else.
    ///
    /// Returns the number of the cycle just run.
    pub fn run_cycle(&mut self, timestamp: SystemTime) -> Result<u64, SchedulerError> {
        if self.phase != Phase::Running {
            return Err(match self.phase {
                Phase::Idle => SchedulerError::NotStarted,
                _ => SchedulerError::AlreadyStopped,
            });
        }
        self.cycle += 1;
        let context = ExecutionContext::new(timestamp, self.cycle);

        for entry in &mut self.tasks {
            match entry.stage {
                TaskStage::PreOperational => {
                    if entry.task.pre_operational(&context) == StageStatus::Ready {
                        debug!(task = %entry.label, cycle = self.cycle, "task operational");
                        entry.stage = TaskStage::Operational;
                    }
                }
                TaskStage::Operational => {
                    if entry.has(Stage::Operational) {
                        entry.task.operational(&context);
                    }
                }
                TaskStage::Registered | TaskStage::PostOperational => {}
            }
        }
        trace!(cycle = self.cycle, "cycle complete");
        Ok(self.cycle)
    }

    /// Runs `prepare_post_operational` exactly once for every task.
    ///
    /// A task that answers `Pending` is not called again: the runtime is
    /// going away.
    pub fn shutdown(&mut self, timestamp: SystemTime) -> Result<(), SchedulerError> {
        if self.phase != Phase::Running {
            return Err(match self.phase {
                Phase::Idle => SchedulerError::NotStarted,
                _ => SchedulerError::AlreadyStopped,
            });
        }
        self.phase = Phase::Stopped;
        let context = ExecutionContext::new(timestamp, self.cycle);

        info!(cycle = self.cycle, "=== entering post-operational ===");
        for entry in &mut self.tasks {
            if entry.has(Stage::PostOperational)
                && entry.task.prepare_post_operational(&context) == StageStatus::Pending
            {
                debug!(task = %entry.label, "post-operational left pending at shutdown");
            }
            entry.stage = TaskStage::PostOperational;
        }
        info!("=== post-operational complete ===");
        Ok(())
    }
}

impl Default for CycleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CycleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleScheduler")
            .field("phase", &self.phase)
            .field("cycle", &self.cycle)
            .field("tasks", &self.task_labels().collect::<Vec<_>>())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
