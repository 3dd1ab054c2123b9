//! Comparison primitives shared by the directive catalog.
//!
//! All of them are pure: they only look at their arguments and
//! allocate only to describe a failure.

use crate::{
    errors::{ConfigError, Error, ErrorValue},
    field::{Integer, Payload},
};
use chrono::{DateTime, TimeDelta, Utc};
use core::fmt::Display;
use std::net::IpAddr;
use url::Url;

/// Fails with [OutOfRange](ErrorValue::OutOfRange) unless `min <= value <= max`.
///
/// Values that are not comparable to the bounds (NaN) are out of range.
pub fn in_range<T: PartialOrd + Display + ?Sized>(value: &T, min: &T, max: &T) -> Result<(), Error> {
    if value >= min && value <= max {
        return Ok(());
    }

    Err(ErrorValue::OutOfRange {
        value: value.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
    .into())
}

/// Fails with [LessThanMin](ErrorValue::LessThanMin) unless `value >= min`.
pub fn at_least<T: PartialOrd + Display + ?Sized>(value: &T, min: &T) -> Result<(), Error> {
    if value >= min {
        return Ok(());
    }

    Err(ErrorValue::LessThanMin {
        value: value.to_string(),
        min: min.to_string(),
    }
    .into())
}

/// Fails with [MoreThanMax](ErrorValue::MoreThanMax) unless `value <= max`.
pub fn at_most<T: PartialOrd + Display + ?Sized>(value: &T, max: &T) -> Result<(), Error> {
    if value <= max {
        return Ok(());
    }

    Err(ErrorValue::MoreThanMax {
        value: value.to_string(),
        max: max.to_string(),
    }
    .into())
}

/// Fails with [Negative](ErrorValue::Negative) if the value is below zero.
pub fn non_negative<T: PartialOrd + Display + Zero>(value: &T) -> Result<(), Error> {
    if *value < T::zero() {
        return Err(ErrorValue::Negative {
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Fails with [Positive](ErrorValue::Positive) if the value is above zero.
pub fn non_positive<T: PartialOrd + Display + Zero>(value: &T) -> Result<(), Error> {
    if *value > T::zero() {
        return Err(ErrorValue::Positive {
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Fails with [NotAllowed](ErrorValue::NotAllowed) if the value is not in the set.
///
/// An empty set is a configuration error, never a membership failure.
pub fn member_of<T: PartialEq + Display>(
    value: &T,
    set: &[T],
    param: &'static str,
) -> Result<(), Error> {
    if set.is_empty() {
        return Err(ConfigError::EmptySet { param }.into());
    }

    if set.contains(value) {
        return Ok(());
    }

    Err(ErrorValue::NotAllowed {
        value: value.to_string(),
    }
    .into())
}

/// Returns true if the value is the zero representation of its type.
pub fn is_zero_value<T: IsZero + ?Sized>(value: &T) -> bool {
    value.is_zero()
}

/// Types that have a zero value to compare to.
pub trait Zero {
    fn zero() -> Self;
}

/// Types that can tell whether they hold their zero value.
pub trait IsZero {
    fn is_zero(&self) -> bool;
}

macro_rules! impl_zero {
    ($($ty:ty => $zero:expr),* $(,)?) => {
        $(
            impl Zero for $ty {
                fn zero() -> Self {
                    $zero
                }
            }

            impl IsZero for $ty {
                fn is_zero(&self) -> bool {
                    *self == $zero
                }
            }
        )*
    };
}

impl_zero! {
    i8 => 0, i16 => 0, i32 => 0, i64 => 0, i128 => 0, isize => 0,
    u8 => 0, u16 => 0, u32 => 0, u64 => 0, u128 => 0, usize => 0,
    f32 => 0.0, f64 => 0.0,
    TimeDelta => TimeDelta::zero(),
    Integer => Integer::ZERO,
}

impl IsZero for bool {
    fn is_zero(&self) -> bool {
        !*self
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

impl IsZero for DateTime<Utc> {
    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}

impl IsZero for IpAddr {
    fn is_zero(&self) -> bool {
        self.is_unspecified()
    }
}

/// A URL with neither a host nor a path carries no information.
impl IsZero for Url {
    fn is_zero(&self) -> bool {
        self.host().is_none() && (self.path().is_empty() || self.path() == "/")
    }
}

impl<T: IsZero> IsZero for Option<T> {
    fn is_zero(&self) -> bool {
        match self {
            Some(v) => v.is_zero(),
            None => true,
        }
    }
}

impl<T> IsZero for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsZero for [T] {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: IsZero + ?Sized> IsZero for &T {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl IsZero for Payload<'_> {
    fn is_zero(&self) -> bool {
        match self {
            Payload::Int(v) => v.is_zero(),
            Payload::Float(v) => v.is_zero(),
            Payload::Bool(v) => v.is_zero(),
            Payload::Str(v) => v.is_zero(),
            Payload::Time(v) => v.is_zero(),
            Payload::Duration(v) => v.is_zero(),
            Payload::Ip(v) => v.is_zero(),
            Payload::Url(v) => v.is_zero(),
            Payload::Seq(len) | Payload::Map(len) => *len == 0,
            Payload::Absent => true,
        }
    }
}
