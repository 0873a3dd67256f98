/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Data types carried by I/O points.
//!
//! Every point is generic over one [`PointValue`] type.  The trait gives the
//! runtime three views of a value:
//!
//! ```text
//!  T  ──pack()──►  u64 word        (pending-value slot, one atomic)
//!  T  ──into_data()──►  DataValue  (type-erased attribute handles)
//!  f64 ──from_number()──►  T       (numbers from the YAML configuration)
//! ```
//!
//! The packed form reserves [`EMPTY_WORD`] to mean "no value".  No
//! implementation may ever produce it from a real value.

use std::fmt;

use serde::Deserialize;

/// Packed word reserved for "slot is empty".
///
/// For `f64` this bit pattern is a NaN with a full payload; NaNs are
/// canonicalised before packing so a real value never collides with it.
pub const EMPTY_WORD: u64 = u64::MAX;

// ── DataType ──────────────────────────────────────────────────────────────────

/// The declared data type of a point's value attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Bool,
    I32,
    U32,
    F32,
    F64,
}

impl DataType {
    /// A value of this type built from a number, with
    /// [`PointValue::from_number`] semantics.
    pub fn value_from_number(self, value: f64) -> DataValue {
        match self {
            DataType::Bool => bool::from_number(value).into_data(),
            DataType::I32 => i32::from_number(value).into_data(),
            DataType::U32 => u32::from_number(value).into_data(),
            DataType::F32 => f32::from_number(value).into_data(),
            DataType::F64 => f64::from_number(value).into_data(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::I32 => "i32",
            DataType::U32 => "u32",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        };
        f.write_str(name)
    }
}

// ── DataValue ─────────────────────────────────────────────────────────────────

/// A value with its type attached, handed across the attribute interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataValue {
    Bool(bool),
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
}

impl DataValue {
    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::Bool(_) => DataType::Bool,
            DataValue::I32(_) => DataType::I32,
            DataValue::U32(_) => DataType::U32,
            DataValue::F32(_) => DataType::F32,
            DataValue::F64(_) => DataType::F64,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Bool(v) => write!(f, "{v}"),
            DataValue::I32(v) => write!(f, "{v}"),
            DataValue::U32(v) => write!(f, "{v}"),
            DataValue::F32(v) => write!(f, "{v}"),
            DataValue::F64(v) => write!(f, "{v}"),
        }
    }
}

// ── PointValue ────────────────────────────────────────────────────────────────

/// A scalar type that can be carried by an I/O point.
///
/// `PartialEq` drives change detection; `Copy` is required by the
/// lock-free state block, which copies snapshots out by value.
pub trait PointValue:
    Copy + PartialEq + Default + Send + Sync + fmt::Debug + 'static
{
    /// The declared type reported through discovery.
    const DATA_TYPE: DataType;

    /// Pack into a single word.  Must never return [`EMPTY_WORD`].
    fn pack(self) -> u64;

    /// Inverse of [`pack`](Self::pack).
    fn unpack(word: u64) -> Self;

    fn into_data(self) -> DataValue;

    /// Returns `None` if `value` is of a different type.  No implicit
    /// numeric conversion takes place.
    fn from_data(value: DataValue) -> Option<Self>;

    /// Lossy conversion from a configured number (`as` semantics).
    fn from_number(value: f64) -> Self;
}

impl PointValue for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn pack(self) -> u64 {
        self as u64
    }

    fn unpack(word: u64) -> Self {
        word != 0
    }

    fn into_data(self) -> DataValue {
        DataValue::Bool(self)
    }

    fn from_data(value: DataValue) -> Option<Self> {
        match value {
            DataValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn from_number(value: f64) -> Self {
        value != 0.0
    }
}

impl PointValue for i32 {
    const DATA_TYPE: DataType = DataType::I32;

    fn pack(self) -> u64 {
        self as u32 as u64
    }

    fn unpack(word: u64) -> Self {
        word as u32 as i32
    }

    fn into_data(self) -> DataValue {
        DataValue::I32(self)
    }

    fn from_data(value: DataValue) -> Option<Self> {
        match value {
            DataValue::I32(v) => Some(v),
            _ => None,
        }
    }

    fn from_number(value: f64) -> Self {
        value as i32
    }
}

impl PointValue for u32 {
    const DATA_TYPE: DataType = DataType::U32;

    fn pack(self) -> u64 {
        self as u64
    }

    fn unpack(word: u64) -> Self {
        word as u32
    }

    fn into_data(self) -> DataValue {
        DataValue::U32(self)
    }

    fn from_data(value: DataValue) -> Option<Self> {
        match value {
            DataValue::U32(v) => Some(v),
            _ => None,
        }
    }

    fn from_number(value: f64) -> Self {
        value as u32
    }
}

impl PointValue for f32 {
    const DATA_TYPE: DataType = DataType::F32;

    fn pack(self) -> u64 {
        self.to_bits() as u64
    }

    fn unpack(word: u64) -> Self {
        f32::from_bits(word as u32)
    }

    fn into_data(self) -> DataValue {
        DataValue::F32(self)
    }

    fn from_data(value: DataValue) -> Option<Self> {
        match value {
            DataValue::F32(v) => Some(v),
            _ => None,
        }
    }

    fn from_number(value: f64) -> Self {
        value as f32
    }
}

impl PointValue for f64 {
    const DATA_TYPE: DataType = DataType::F64;

    fn pack(self) -> u64 {
        if self.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.to_bits()
        }
    }

    fn unpack(word: u64) -> Self {
        f64::from_bits(word)
    }

    fn into_data(self) -> DataValue {
        DataValue::F64(self)
    }

    fn from_data(value: DataValue) -> Option<Self> {
        match value {
            DataValue::F64(v) => Some(v),
            _ => None,
        }
    }

    fn from_number(value: f64) -> Self {
        value
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_i32_survives_packing() {
        assert_eq!(i32::unpack((-42i32).pack()), -42);
        assert_eq!(i32::unpack(i32::MIN.pack()), i32::MIN);
    }

    #[test]
    fn no_value_packs_to_the_empty_word() {
        assert_ne!(u32::MAX.pack(), EMPTY_WORD);
        assert_ne!((-1i32).pack(), EMPTY_WORD);
        assert_ne!(f32::NAN.pack(), EMPTY_WORD);
        assert_ne!(f64::from_bits(EMPTY_WORD).pack(), EMPTY_WORD);
        assert_ne!(true.pack(), EMPTY_WORD);
    }

    #[test]
    fn f64_nan_is_canonicalised() {
        let weird_nan = f64::from_bits(EMPTY_WORD);
        assert!(weird_nan.is_nan());
        assert_eq!(weird_nan.pack(), f64::NAN.to_bits());
        assert!(f64::unpack(weird_nan.pack()).is_nan());
    }

    #[test]
    fn from_data_rejects_other_types() {
        assert_eq!(f64::from_data(DataValue::F64(1.5)), Some(1.5));
        assert_eq!(f64::from_data(DataValue::F32(1.5)), None);
        assert_eq!(bool::from_data(DataValue::I32(1)), None);
    }

    #[test]
    fn data_value_reports_its_type() {
        assert_eq!(7u32.into_data().data_type(), DataType::U32);
        assert_eq!(DataValue::Bool(true).data_type(), bool::DATA_TYPE);
    }

    #[test]
    fn from_number_uses_cast_semantics() {
        assert_eq!(i32::from_number(3.9), 3);
        assert_eq!(u32::from_number(-5.0), 0);
        assert!(bool::from_number(2.0));
        assert!(!bool::from_number(0.0));
    }

    #[test]
    fn value_from_number_matches_declared_type() {
        assert_eq!(DataType::I32.value_from_number(-2.0), DataValue::I32(-2));
        assert_eq!(DataType::Bool.value_from_number(1.0), DataValue::Bool(true));
        for t in [DataType::Bool, DataType::I32, DataType::U32, DataType::F32, DataType::F64] {
            assert_eq!(t.value_from_number(1.0).data_type(), t);
        }
    }

    #[test]
    fn data_type_deserialises_lowercase() {
        let t: DataType = serde_yaml::from_str("f64").unwrap();
        assert_eq!(t, DataType::F64);
        assert!(serde_yaml::from_str::<DataType>("string").is_err());
    }
}
