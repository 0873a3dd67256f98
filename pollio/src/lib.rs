/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! pollio – runtime core for polled I/O points
//!
//! Module layout (leaf first):
//!
//! ```text
//! lib.rs
//! ├── value/        – point data types and their packed/erased forms
//! ├── error/        – per-point error codes and quality
//! ├── event/        – named events fired by the state blocks
//! ├── state/        – lock-free published state (read side / write side)
//! ├── slot/         – last-write-wins pending output value
//! ├── task/         – Pre/Operational/Post stage drivers
//! ├── connection/   – device connection contract + error sink fan-out
//! ├── device/       – reference device connection
//! ├── point/        – inputs, outputs and attribute discovery
//! ├── sim/          – simulated link and registers
//! ├── scheduler/    – cycle scheduler driving the tasks
//! ├── config/       – YAML device / point configuration
//! └── runtime/      – wiring configuration into devices, points, tasks
//! ```

pub mod config;
pub mod connection;
pub mod device;
pub mod error;
pub mod event;
pub mod point;
pub mod runtime;
pub mod scheduler;
pub mod sim;
pub mod slot;
pub mod state;
pub mod task;
pub mod value;
