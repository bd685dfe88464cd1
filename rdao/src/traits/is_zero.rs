//! Zero-value detection used by the `*_none_zero` DAO operations

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rust_decimal::Decimal;

/// A field whose current value may be the type's zero value.
///
/// Partial writes skip every column whose field reports `is_zero()`.
/// Zero means: `0`, `false`, empty strings and collections, `None`,
/// the Unix epoch for dates and JSON `null`.
pub trait IsZero {
    fn is_zero(&self) -> bool;
}

macro_rules! zero_by_default {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IsZero for $ty {
                fn is_zero(&self) -> bool {
                    *self == <$ty>::default()
                }
            }
        )*
    };
}

zero_by_default!(
    bool,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
);

impl IsZero for Decimal {
    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }
}

impl<Tz: TimeZone> IsZero for DateTime<Tz> {
    fn is_zero(&self) -> bool {
        self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0
    }
}

impl IsZero for str {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! zero_when_empty {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<T> IsZero for $ty<T> {
                fn is_zero(&self) -> bool {
                    self.is_empty()
                }
            }
        )*
    };
}

zero_when_empty!(Vec, VecDeque, HashSet, BTreeSet);

impl<T> IsZero for [T] {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Fixed-size arrays are zero when every element is.
impl<T: IsZero, const N: usize> IsZero for [T; N] {
    fn is_zero(&self) -> bool {
        self.iter().all(IsZero::is_zero)
    }
}

impl<T> IsZero for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl IsZero for serde_json::Value {
    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

macro_rules! zero_through_pointer {
    ($($ptr:ident),* $(,)?) => {
        $(
            impl<T: IsZero + ?Sized> IsZero for $ptr<T> {
                fn is_zero(&self) -> bool {
                    (**self).is_zero()
                }
            }
        )*
    };
}

zero_through_pointer!(Box, Arc, Rc);

impl<T: IsZero + ?Sized> IsZero for &T {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}
