#![allow(clippy::module_name_repetitions)]

pub(crate) mod codec;
pub(crate) mod fields;
pub(crate) mod time;

pub use codec::{FieldSlot, Schema};
pub use fields::{FieldId, PointRecord};
pub use time::{TimeBase, GPS_WEEK_SECONDS};

use crate::endian;
use std::fmt::Display;
use strum::{EnumCount, IntoStaticStr};

/// On-disk type of a record field
///
/// Stored in the contents header as a 4 byte little-endian integer per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum DataType {
    /// Signed 8 bit integer (type code 0)
    Char,
    /// Unsigned 8 bit integer (type code 1)
    UnsignedChar,
    /// Single byte boolean (type code 2)
    Bool,
    /// Signed 16 bit integer (type code 3)
    Short,
    /// Unsigned 16 bit integer (type code 4)
    UnsignedShort,
    /// Signed 32 bit integer (type code 5)
    Int,
    /// Unsigned 32 bit integer (type code 6)
    UnsignedInt,
    /// 32 bit float (type code 7)
    Float,
    /// 64 bit float (type code 8)
    Double,
    /// Signed 64 bit integer (type code 9)
    LongLong,
    /// Unsigned 64 bit integer (type code 10)
    UnsignedLongLong,
}

impl DataType {
    /// Returns the number of bytes a value of this type occupies in a packed record
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Char | Self::UnsignedChar | Self::Bool => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Double | Self::LongLong | Self::UnsignedLongLong => 8,
        }
    }

    /// Returns the type code stored in the contents header
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Char => 0,
            Self::UnsignedChar => 1,
            Self::Bool => 2,
            Self::Short => 3,
            Self::UnsignedShort => 4,
            Self::Int => 5,
            Self::UnsignedInt => 6,
            Self::Float => 7,
            Self::Double => 8,
            Self::LongLong => 9,
            Self::UnsignedLongLong => 10,
        }
    }

    /// Decodes one value of this type from the start of `bytes`
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`Self::width`]
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Value {
        match self {
            Self::Char => Value::Char(bytes[0] as i8),
            Self::UnsignedChar => Value::UnsignedChar(bytes[0]),
            Self::Bool => Value::Bool(bytes[0] != 0),
            Self::Short => Value::Short(endian::read_u16(bytes) as i16),
            Self::UnsignedShort => Value::UnsignedShort(endian::read_u16(bytes)),
            Self::Int => Value::Int(endian::read_u32(bytes) as i32),
            Self::UnsignedInt => Value::UnsignedInt(endian::read_u32(bytes)),
            Self::Float => Value::Float(f32::from_bits(endian::read_u32(bytes))),
            Self::Double => Value::Double(f64::from_bits(endian::read_u64(bytes))),
            Self::LongLong => Value::LongLong(endian::read_u64(bytes) as i64),
            Self::UnsignedLongLong => Value::UnsignedLongLong(endian::read_u64(bytes)),
        }
    }

    /// Converts `value` to this type and encodes it at the start of `out`
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`Self::width`]
    #[allow(clippy::cast_sign_loss)]
    pub fn encode(self, value: Value, out: &mut [u8]) {
        match value.convert(self) {
            Value::Char(v) => out[0] = v as u8,
            Value::UnsignedChar(v) => out[0] = v,
            Value::Bool(v) => out[0] = u8::from(v),
            Value::Short(v) => endian::write_u16(out, v as u16),
            Value::UnsignedShort(v) => endian::write_u16(out, v),
            Value::Int(v) => endian::write_u32(out, v as u32),
            Value::UnsignedInt(v) => endian::write_u32(out, v),
            Value::Float(v) => endian::write_u32(out, v.to_bits()),
            Value::Double(v) => endian::write_u64(out, v.to_bits()),
            Value::LongLong(v) => endian::write_u64(out, v as u64),
            Value::UnsignedLongLong(v) => endian::write_u64(out, v),
        }
    }
}

impl TryFrom<i32> for DataType {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Char),
            1 => Ok(Self::UnsignedChar),
            2 => Ok(Self::Bool),
            3 => Ok(Self::Short),
            4 => Ok(Self::UnsignedShort),
            5 => Ok(Self::Int),
            6 => Ok(Self::UnsignedInt),
            7 => Ok(Self::Float),
            8 => Ok(Self::Double),
            9 => Ok(Self::LongLong),
            10 => Ok(Self::UnsignedLongLong),
            other => Err(other),
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.into())
    }
}

/// A single typed field value
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[allow(missing_docs)]
pub enum Value {
    Char(i8),
    UnsignedChar(u8),
    Bool(bool),
    Short(i16),
    UnsignedShort(u16),
    Int(i32),
    UnsignedInt(u32),
    Float(f32),
    Double(f64),
    LongLong(i64),
    UnsignedLongLong(u64),
}

impl Value {
    /// Returns the value as a 64 bit float
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Char(v) => f64::from(v),
            Self::UnsignedChar(v) => f64::from(v),
            Self::Bool(v) => f64::from(u8::from(v)),
            Self::Short(v) => f64::from(v),
            Self::UnsignedShort(v) => f64::from(v),
            Self::Int(v) => f64::from(v),
            Self::UnsignedInt(v) => f64::from(v),
            Self::Float(v) => f64::from(v),
            Self::Double(v) => v,
            Self::LongLong(v) => v as f64,
            Self::UnsignedLongLong(v) => v as f64,
        }
    }

    /// Returns the value as a wide integer, truncating floats toward zero
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn as_i128(self) -> i128 {
        match self {
            Self::Char(v) => i128::from(v),
            Self::UnsignedChar(v) => i128::from(v),
            Self::Bool(v) => i128::from(v),
            Self::Short(v) => i128::from(v),
            Self::UnsignedShort(v) => i128::from(v),
            Self::Int(v) => i128::from(v),
            Self::UnsignedInt(v) => i128::from(v),
            Self::Float(v) => v as i128,
            Self::Double(v) => v as i128,
            Self::LongLong(v) => i128::from(v),
            Self::UnsignedLongLong(v) => i128::from(v),
        }
    }

    /// Converts the value to the given [`DataType`]
    ///
    /// Conversions follow `as` cast semantics; a value converted to its own type is unchanged.
    #[must_use]
    pub fn convert(self, data_type: DataType) -> Self {
        match data_type {
            DataType::Char => i8::from_value(self).to_value(),
            DataType::UnsignedChar => u8::from_value(self).to_value(),
            DataType::Bool => bool::from_value(self).to_value(),
            DataType::Short => i16::from_value(self).to_value(),
            DataType::UnsignedShort => u16::from_value(self).to_value(),
            DataType::Int => i32::from_value(self).to_value(),
            DataType::UnsignedInt => u32::from_value(self).to_value(),
            DataType::Float => f32::from_value(self).to_value(),
            DataType::Double => f64::from_value(self).to_value(),
            DataType::LongLong => i64::from_value(self).to_value(),
            DataType::UnsignedLongLong => u64::from_value(self).to_value(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char(v) => write!(f, "{v}"),
            Self::UnsignedChar(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{}", u8::from(*v)),
            Self::Short(v) => write!(f, "{v}"),
            Self::UnsignedShort(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UnsignedInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.6}"),
            Self::Double(v) => write!(f, "{v:.11}"),
            Self::LongLong(v) => write!(f, "{v}"),
            Self::UnsignedLongLong(v) => write!(f, "{v}"),
        }
    }
}

/// Rust types that can back a [`PointRecord`] member
pub(crate) trait FieldValue: Copy {
    fn to_value(self) -> Value;
    fn from_value(value: Value) -> Self;
}

macro_rules! integer_field_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn to_value(self) -> Value {
                    Value::$variant(self)
                }

                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_possible_wrap
                )]
                fn from_value(value: Value) -> Self {
                    match value {
                        Value::$variant(v) => v,
                        Value::Float(v) => v as Self,
                        Value::Double(v) => v as Self,
                        other => other.as_i128() as Self,
                    }
                }
            }
        )+
    };
}

integer_field_value!(
    i8 => Char,
    u8 => UnsignedChar,
    i16 => Short,
    u16 => UnsignedShort,
    i32 => Int,
    u32 => UnsignedInt,
    i64 => LongLong,
    u64 => UnsignedLongLong,
);

impl FieldValue for bool {
    fn to_value(self) -> Value {
        Value::Bool(self)
    }

    #[allow(clippy::float_cmp)]
    fn from_value(value: Value) -> Self {
        match value {
            Value::Bool(v) => v,
            Value::Float(v) => v != 0.0,
            Value::Double(v) => v != 0.0,
            other => other.as_i128() != 0,
        }
    }
}

impl FieldValue for f32 {
    fn to_value(self) -> Value {
        Value::Float(self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Self {
        match value {
            Value::Float(v) => v,
            other => other.as_f64() as Self,
        }
    }
}

impl FieldValue for f64 {
    fn to_value(self) -> Value {
        Value::Double(self)
    }

    fn from_value(value: Value) -> Self {
        value.as_f64()
    }
}

/// The set of [`PointRecord`] members a file actually stores
///
/// Members outside of this set are always zero after a record is decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct Availability([bool; FieldId::COUNT]);

impl Availability {
    /// Creates an empty set
    #[must_use]
    pub const fn empty() -> Self {
        Self([false; FieldId::COUNT])
    }

    /// Returns whether `field` is stored in the file
    #[must_use]
    pub const fn contains(&self, field: FieldId) -> bool {
        self.0[field as usize]
    }

    /// Marks `field` as stored, returning `false` if it already was
    pub fn insert(&mut self, field: FieldId) -> bool {
        !std::mem::replace(&mut self.0[field as usize], true)
    }

    /// Iterates over the available fields in [`FieldId`] order
    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        use strum::IntoEnumIterator;
        FieldId::iter().filter(|f| self.contains(*f))
    }

    /// Returns the number of available fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.iter().filter(|a| **a).count()
    }

    /// Returns `true` if no field is available
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<FieldId> for Availability {
    fn from_iter<T: IntoIterator<Item = FieldId>>(iter: T) -> Self {
        let mut set = Self::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}
