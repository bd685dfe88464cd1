//! FromValue trait for converting store values to Rust types

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

/// Trait for types that can be constructed from a store value.
///
/// Implemented for the primitive column types; implement it manually for
/// custom scalar types such as enums stored as strings.
pub trait FromValue: Sized {
    /// Convert a store value to this type.
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::TypeConversion {
        expected,
        actual: value.type_name().to_string(),
    }
}

fn narrow<S, T>(v: S, expected: &'static str, source: &str) -> Result<T>
where
    S: Copy + std::fmt::Display,
    T: TryFrom<S>,
{
    T::try_from(v).map_err(|_| Error::TypeConversion {
        expected,
        actual: format!("{}({}) out of range", source, v),
    })
}

// Drivers disagree on integer widths (MySQL hands back i64 for most integer
// columns), so every integer target accepts every integer source in range.
macro_rules! int_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    let name = stringify!($ty);
                    match value {
                        Value::I8(v) => narrow(v, name, "i8"),
                        Value::I16(v) => narrow(v, name, "i16"),
                        Value::I32(v) => narrow(v, name, "i32"),
                        Value::I64(v) => narrow(v, name, "i64"),
                        Value::U8(v) => narrow(v, name, "u8"),
                        Value::U16(v) => narrow(v, name, "u16"),
                        Value::U32(v) => narrow(v, name, "u32"),
                        Value::U64(v) => narrow(v, name, "u64"),
                        Value::Bool(v) => Ok(<$ty>::from(v)),
                        other => Err(mismatch(name, &other)),
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::I8(v) => Ok(v != 0),
            Value::I16(v) => Ok(v != 0),
            Value::I32(v) => Ok(v != 0),
            Value::I64(v) => Ok(v != 0),
            Value::U8(v) => Ok(v != 0),
            Value::U16(v) => Ok(v != 0),
            Value::U32(v) => Ok(v != 0),
            Value::U64(v) => Ok(v != 0),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F32(v) => Ok(v),
            Value::F64(v) => Ok(v as f32),
            other => Err(mismatch("f32", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F32(v) => Ok(v.into()),
            Value::F64(v) => Ok(v),
            Value::Decimal(v) => v
                .to_string()
                .parse()
                .map_err(|_| mismatch("f64", &Value::Decimal(v))),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            Value::Bytes(v) => String::from_utf8(v).map_err(|e| Error::TypeConversion {
                expected: "utf8 string",
                actual: format!("invalid utf8: {}", e),
            }),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::String(v) => Ok(v.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(v) => Ok(v),
            Value::DateTime(v) => Ok(v.date()),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => Ok(v),
            Value::Date(v) => Ok(v.and_time(NaiveTime::MIN)),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self> {
        NaiveDateTime::from_value(value).map(|v| v.and_utc())
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(v) => Ok(v),
            Value::DateTime(v) => Ok(v.time()),
            other => Err(mismatch("time", &other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::I64(v) => Ok(Decimal::from(v)),
            Value::U64(v) => Ok(Decimal::from(v)),
            Value::String(v) => v.parse().map_err(|_| Error::TypeConversion {
                expected: "decimal",
                actual: format!("invalid decimal string: {}", v),
            }),
            other => Err(mismatch("decimal", &other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v),
            Value::String(v) => Ok(serde_json::from_str(&v)?),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

/// Decode a JSON column into any deserializable type.
///
/// Accepts native JSON values as well as the textual and binary forms some
/// drivers return for JSON columns. `NULL` decodes as JSON `null`, which
/// lets `Option<T>` fields read back as `None`.
pub fn from_json<T: DeserializeOwned>(value: Value) -> Result<T> {
    let decoded = match value {
        Value::Json(v) => serde_json::from_value(v)?,
        Value::Null => serde_json::from_value(serde_json::Value::Null)?,
        Value::String(v) => serde_json::from_str(&v)?,
        Value::Bytes(v) => serde_json::from_slice(&v)?,
        other => return Err(mismatch("json", &other)),
    };
    Ok(decoded)
}
