/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Static attribute registry.
//!
//! Attribute names are resolved once, at wiring time, into an
//! [`AttributeId`]; the hot path only ever matches on the enum.

use std::time::SystemTime;

use crate::error::Quality;
use crate::value::DataValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    Value,
    UpdateTime,
    ChangeTime,
    Quality,
    Error,
    WriteTime,
    WriteError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Attributes of a point with a read state only.
pub const INPUT_ATTRIBUTES: &[AttributeId] = &[
    AttributeId::Value,
    AttributeId::UpdateTime,
    AttributeId::ChangeTime,
    AttributeId::Quality,
    AttributeId::Error,
];

/// Attributes of a point with both a read and a write state.
pub const OUTPUT_ATTRIBUTES: &[AttributeId] = &[
    AttributeId::Value,
    AttributeId::UpdateTime,
    AttributeId::ChangeTime,
    AttributeId::Quality,
    AttributeId::Error,
    AttributeId::WriteTime,
    AttributeId::WriteError,
];

impl AttributeId {
    pub const ALL: [AttributeId; 7] = [
        AttributeId::Value,
        AttributeId::UpdateTime,
        AttributeId::ChangeTime,
        AttributeId::Quality,
        AttributeId::Error,
        AttributeId::WriteTime,
        AttributeId::WriteError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AttributeId::Value => "value",
            AttributeId::UpdateTime => "updateTime",
            AttributeId::ChangeTime => "changeTime",
            AttributeId::Quality => "quality",
            AttributeId::Error => "error",
            AttributeId::WriteTime => "writeTime",
            AttributeId::WriteError => "writeError",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

/// Value returned by an attribute read handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Data(DataValue),
    /// `None` until the first publish.
    Time(Option<SystemTime>),
    Quality(Quality),
    /// Numeric error code, `0` = no error.
    ErrorCode(u32),
}
