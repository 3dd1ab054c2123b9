//! The view of a record that directives and the form binder work with.
//!
//! A [Record] lists its fields to a [Visitor]. Each tagged field is handed
//! over as a [FieldValue], which exposes a borrowed [Payload] for evaluation
//! and can accept writes from mutating directives and the form binder.

use crate::errors::{ConversionError, Error, ErrorValue};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::Url;

/// A declared field of a record together with its tags.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// The field name, or its index for tuple structs.
    pub name: &'static str,

    /// `(namespace key, tag value)` pairs in declaration order.
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldInfo {
    pub const fn new(name: &'static str, tags: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, tags }
    }

    /// All tag values for the given namespace key, in declaration order.
    pub fn tags_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.tags
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

/// Structured data that can list its tagged fields.
///
/// It is usually derived, see [Record](derive@crate::Record).
pub trait Record {
    /// Visit the fields in declaration order.
    fn walk(&self, visitor: &mut dyn Visitor) -> Result<(), Error>;

    /// Visit the fields in declaration order, allowing writes.
    fn walk_mut(&mut self, visitor: &mut dyn VisitorMut) -> Result<(), Error>;
}

/// A missing child record is not walked.
impl<T: Record> Record for Option<T> {
    fn walk(&self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        match self {
            Some(r) => r.walk(visitor),
            None => Ok(()),
        }
    }

    fn walk_mut(&mut self, visitor: &mut dyn VisitorMut) -> Result<(), Error> {
        match self {
            Some(r) => r.walk_mut(visitor),
            None => Ok(()),
        }
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn walk(&self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        (**self).walk(visitor)
    }

    fn walk_mut(&mut self, visitor: &mut dyn VisitorMut) -> Result<(), Error> {
        (**self).walk_mut(visitor)
    }
}

/// Receives the fields of a [Record].
pub trait Visitor {
    /// Visit a tagged field.
    fn visit_field(&mut self, field: &FieldInfo, value: &dyn FieldValue) -> Result<(), Error>;

    /// Visit a nested record.
    fn visit_record(&mut self, name: &'static str, record: &dyn Record) -> Result<(), Error>;
}

/// Receives the fields of a [Record] with write access.
pub trait VisitorMut {
    /// Visit a tagged field.
    fn visit_field(&mut self, field: &FieldInfo, value: &mut dyn FieldValue) -> Result<(), Error>;

    /// Visit a nested record.
    fn visit_record(&mut self, name: &'static str, record: &mut dyn Record) -> Result<(), Error>;
}

/// A borrowed, type-erased view of a field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    /// An integer of any primitive width.
    Int(Integer),
    Float(f64),
    Bool(bool),
    Str(&'a str),
    Time(DateTime<Utc>),
    Duration(TimeDelta),
    Ip(IpAddr),
    Url(&'a Url),
    /// A sequence with the given length.
    Seq(usize),
    /// A map with the given length.
    Map(usize),
    /// An optional field without a value.
    Absent,
}

impl Payload<'_> {
    /// A short name of the payload type for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Payload::Int(_) => "integer",
            Payload::Float(_) => "float",
            Payload::Bool(_) => "bool",
            Payload::Str(_) => "string",
            Payload::Time(_) => "time",
            Payload::Duration(_) => "duration",
            Payload::Ip(_) => "ip address",
            Payload::Url(_) => "url",
            Payload::Seq(_) => "sequence",
            Payload::Map(_) => "map",
            Payload::Absent => "nothing",
        }
    }
}

/// An integer payload, compared by value whatever the width of the field.
///
/// ```
/// use valex::field::Integer;
///
/// assert!(Integer::from(u64::MAX) > Integer::from(i64::MAX));
/// assert!(Integer::from(u128::MAX) > Integer::from(i128::MAX));
/// assert_eq!(Integer::from(-1_i8), Integer::from(-1_i64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Integer(IntegerRepr);

// Every value that fits into an `i128` is `Signed`, so the derived ordering is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum IntegerRepr {
    Signed(i128),
    Large(u128),
}

impl Integer {
    pub const ZERO: Integer = Integer(IntegerRepr::Signed(0));

    /// The value as an `i64`, if it fits.
    pub fn to_i64(self) -> Option<i64> {
        match self.0 {
            IntegerRepr::Signed(v) => i64::try_from(v).ok(),
            IntegerRepr::Large(_) => None,
        }
    }
}

macro_rules! impl_integer_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Integer {
                #[allow(unreachable_patterns)]
                fn from(v: $ty) -> Self {
                    match i128::try_from(v) {
                        Ok(v) => Integer(IntegerRepr::Signed(v)),
                        Err(_) => Integer(IntegerRepr::Large(v as u128)),
                    }
                }
            }
        )*
    };
}

impl_integer_from!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl core::fmt::Display for Integer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            IntegerRepr::Signed(v) => core::fmt::Display::fmt(&v, f),
            IntegerRepr::Large(v) => core::fmt::Display::fmt(&v, f),
        }
    }
}

/// The kind of a value and whether it holds the zero value of that kind.
///
/// Directives bound to it accept fields of any type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    /// The payload type name, see [Payload::type_name].
    pub kind: &'static str,
    pub zero: bool,
}

/// The length of a string, sequence or map.
///
/// Strings are measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Length {
    /// The payload type name, see [Payload::type_name].
    pub kind: &'static str,
    pub len: usize,
}

/// An owned value written back to a field by a mutating directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }
}

/// A field value that directives can inspect and the binder can populate.
pub trait FieldValue {
    /// The current value.
    fn payload(&self) -> Payload<'_>;

    /// The Rust type name of the field.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Replace the value with the output of a mutating directive.
    fn assign(&mut self, value: Value) -> Result<(), Error> {
        Err(ErrorValue::Invalid(format!(
            "cannot assign {} to a field of type {}",
            value.type_name(),
            self.type_name()
        ))
        .into())
    }

    /// Populate the value from raw form values.
    ///
    /// The binder guarantees that `raw` is not empty.
    fn bind_raw(&mut self, _raw: &[String]) -> Result<(), Error> {
        Err(ErrorValue::UnsupportedFieldType {
            type_name: self.type_name(),
        }
        .into())
    }
}

/// Values that can be parsed from a single raw form value.
pub trait Scalar: Sized {
    fn parse_raw(raw: &str) -> Result<Self, Error>;
}

/// Parses booleans the way HTML forms and query strings usually spell them.
pub fn parse_bool(raw: &str) -> Result<bool, ConversionError> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "on" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" | "off" => Ok(false),
        _ => Err(ConversionError::new(raw, "bool", "invalid syntax")),
    }
}

fn first(raw: &[String]) -> &str {
    raw.first().map(String::as_str).unwrap_or_default()
}

macro_rules! impl_scalar_field {
    ($ty:ty) => {
        impl FieldValue for Option<$ty> {
            fn payload(&self) -> Payload<'_> {
                match self {
                    Some(v) => v.payload(),
                    None => Payload::Absent,
                }
            }

            fn assign(&mut self, value: Value) -> Result<(), Error> {
                let mut inner = match self.take() {
                    Some(v) => v,
                    None => <$ty as ScalarDefault>::zero(),
                };
                let res = inner.assign(value);
                *self = Some(inner);
                res
            }

            fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
                *self = Some(<$ty as Scalar>::parse_raw(first(raw))?);
                Ok(())
            }
        }

        impl FieldValue for Vec<$ty> {
            fn payload(&self) -> Payload<'_> {
                Payload::Seq(self.len())
            }

            fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
                let items = raw
                    .iter()
                    .map(|r| <$ty as Scalar>::parse_raw(r))
                    .collect::<Result<Vec<_>, _>>()?;
                *self = items;
                Ok(())
            }
        }
    };
}

/// Starting point for `Option` fields that receive a write without holding a value.
trait ScalarDefault {
    fn zero() -> Self;
}

macro_rules! impl_int_field {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn payload(&self) -> Payload<'_> {
                    Payload::Int(Integer::from(*self))
                }

                fn assign(&mut self, value: Value) -> Result<(), Error> {
                    match value {
                        Value::Int(v) => {
                            *self = <$ty>::try_from(v).map_err(|_| {
                                ErrorValue::Invalid(format!(
                                    "value {} does not fit into {}",
                                    v,
                                    stringify!($ty)
                                ))
                            })?;
                            Ok(())
                        }
                        other => Err(ErrorValue::Invalid(format!(
                            "cannot assign {} to a field of type {}",
                            other.type_name(),
                            stringify!($ty)
                        ))
                        .into()),
                    }
                }

                fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
                    *self = <$ty as Scalar>::parse_raw(first(raw))?;
                    Ok(())
                }
            }

            impl Scalar for $ty {
                fn parse_raw(raw: &str) -> Result<Self, Error> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|e| ConversionError::new(raw, stringify!($ty), e).into())
                }
            }

            impl ScalarDefault for $ty {
                fn zero() -> Self {
                    0
                }
            }

            impl_scalar_field!($ty);
        )*
    };
}

impl_int_field!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_float_field {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn payload(&self) -> Payload<'_> {
                    Payload::Float(f64::from(*self))
                }

                fn assign(&mut self, value: Value) -> Result<(), Error> {
                    match value {
                        Value::Float(v) => {
                            *self = v as $ty;
                            Ok(())
                        }
                        Value::Int(v) => {
                            *self = v as $ty;
                            Ok(())
                        }
                        other => Err(ErrorValue::Invalid(format!(
                            "cannot assign {} to a field of type {}",
                            other.type_name(),
                            stringify!($ty)
                        ))
                        .into()),
                    }
                }

                fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
                    *self = <$ty as Scalar>::parse_raw(first(raw))?;
                    Ok(())
                }
            }

            impl Scalar for $ty {
                fn parse_raw(raw: &str) -> Result<Self, Error> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|e| ConversionError::new(raw, stringify!($ty), e).into())
                }
            }

            impl ScalarDefault for $ty {
                fn zero() -> Self {
                    0.0
                }
            }

            impl_scalar_field!($ty);
        )*
    };
}

impl_float_field!(f32, f64);

impl FieldValue for bool {
    fn payload(&self) -> Payload<'_> {
        Payload::Bool(*self)
    }

    fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
        *self = <bool as Scalar>::parse_raw(first(raw))?;
        Ok(())
    }
}

impl Scalar for bool {
    fn parse_raw(raw: &str) -> Result<Self, Error> {
        Ok(parse_bool(raw.trim())?)
    }
}

impl ScalarDefault for bool {
    fn zero() -> Self {
        false
    }
}

impl_scalar_field!(bool);

impl FieldValue for String {
    fn payload(&self) -> Payload<'_> {
        Payload::Str(self)
    }

    fn assign(&mut self, value: Value) -> Result<(), Error> {
        match value {
            Value::Str(s) => {
                *self = s;
                Ok(())
            }
            other => Err(ErrorValue::Invalid(format!(
                "cannot assign {} to a field of type String",
                other.type_name()
            ))
            .into()),
        }
    }

    fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
        *self = first(raw).to_string();
        Ok(())
    }
}

impl Scalar for String {
    fn parse_raw(raw: &str) -> Result<Self, Error> {
        Ok(raw.to_string())
    }
}

impl ScalarDefault for String {
    fn zero() -> Self {
        String::new()
    }
}

impl_scalar_field!(String);

impl FieldValue for &str {
    fn payload(&self) -> Payload<'_> {
        Payload::Str(self)
    }
}

impl FieldValue for DateTime<Utc> {
    fn payload(&self) -> Payload<'_> {
        Payload::Time(*self)
    }

    fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
        *self = <Self as Scalar>::parse_raw(first(raw))?;
        Ok(())
    }
}

impl Scalar for DateTime<Utc> {
    fn parse_raw(raw: &str) -> Result<Self, Error> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| ConversionError::new(raw, "RFC 3339 timestamp", e).into())
    }
}

impl ScalarDefault for DateTime<Utc> {
    fn zero() -> Self {
        DateTime::<Utc>::default()
    }
}

impl_scalar_field!(DateTime<Utc>);

impl FieldValue for TimeDelta {
    fn payload(&self) -> Payload<'_> {
        Payload::Duration(*self)
    }
}

impl FieldValue for Option<TimeDelta> {
    fn payload(&self) -> Payload<'_> {
        match self {
            Some(v) => Payload::Duration(*v),
            None => Payload::Absent,
        }
    }
}

/// Durations beyond the range of [TimeDelta] saturate.
impl FieldValue for std::time::Duration {
    fn payload(&self) -> Payload<'_> {
        Payload::Duration(TimeDelta::from_std(*self).unwrap_or(TimeDelta::MAX))
    }
}

impl FieldValue for Option<std::time::Duration> {
    fn payload(&self) -> Payload<'_> {
        match self {
            Some(v) => v.payload(),
            None => Payload::Absent,
        }
    }
}

macro_rules! impl_ip_field {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn payload(&self) -> Payload<'_> {
                    Payload::Ip(IpAddr::from(*self))
                }

                fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
                    *self = <$ty as Scalar>::parse_raw(first(raw))?;
                    Ok(())
                }
            }

            impl Scalar for $ty {
                fn parse_raw(raw: &str) -> Result<Self, Error> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|e| ConversionError::new(raw, "ip address", e).into())
                }
            }

            impl FieldValue for Option<$ty> {
                fn payload(&self) -> Payload<'_> {
                    match self {
                        Some(v) => v.payload(),
                        None => Payload::Absent,
                    }
                }

                fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
                    *self = Some(<$ty as Scalar>::parse_raw(first(raw))?);
                    Ok(())
                }
            }
        )*
    };
}

impl_ip_field!(IpAddr, Ipv4Addr, Ipv6Addr);

impl FieldValue for Url {
    fn payload(&self) -> Payload<'_> {
        Payload::Url(self)
    }

    fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
        *self = <Url as Scalar>::parse_raw(first(raw))?;
        Ok(())
    }
}

impl Scalar for Url {
    fn parse_raw(raw: &str) -> Result<Self, Error> {
        Url::parse(raw.trim()).map_err(|e| ConversionError::new(raw, "url", e).into())
    }
}

impl FieldValue for Option<Url> {
    fn payload(&self) -> Payload<'_> {
        match self {
            Some(v) => Payload::Url(v),
            None => Payload::Absent,
        }
    }

    fn bind_raw(&mut self, raw: &[String]) -> Result<(), Error> {
        *self = Some(<Url as Scalar>::parse_raw(first(raw))?);
        Ok(())
    }
}

impl<K, V, S> FieldValue for HashMap<K, V, S> {
    fn payload(&self) -> Payload<'_> {
        Payload::Map(self.len())
    }
}
