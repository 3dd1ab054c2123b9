//! The contract between tag directives and the record processor.
//!
//! A directive is registered once as an immutable prototype. Every tag
//! occurrence [materializes](Directive::materialize) a fresh, fully configured
//! instance from the tag parameters, which is then evaluated against the
//! field value and dropped.

use crate::{
    errors::{ConfigError, ConversionError, Error, ErrorValue},
    field::{Integer, Length, Payload, Presence, Value},
    predicate::is_zero_value,
    Validator,
};
use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use std::{borrow::Cow, net::IpAddr};
use url::Url;

/// How a directive is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// The directive only checks the value.
    Eval,

    /// The directive may replace the value, it needs a mutable pass.
    Mut,
}

/// A named, configurable unit of validation bound to a tag.
pub trait Directive: Validator<Self::Payload> + Sized + Send + Sync + 'static {
    /// The value type the directive evaluates.
    type Payload: ?Sized + Extract;

    /// The name matched inside a tag.
    fn name(&self) -> &str;

    fn mode(&self) -> Mode {
        Mode::Eval
    }

    /// Create a configured instance from the tag parameters.
    ///
    /// Every parameter must be read through `params`, the ones left
    /// over are reported as unknown.
    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error>;

    /// Evaluate in [Mut](Mode::Mut) mode, returning the replacement value if any.
    fn transform(&self, value: &Self::Payload) -> Result<Option<Value>, Error> {
        self.validate(value).map(|_| None)
    }

    /// Evaluate an optional field without a value.
    ///
    /// Absent values pass by default, directives that require a value override this.
    fn validate_absent(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Payload types directives can be bound to.
///
/// Most types borrow from the payload. Views that do not exist in the
/// payload itself, like an `i64` out of an [Integer], are extracted owned.
pub trait Extract: ToOwned {
    /// The type name reported on mismatches.
    const EXPECTED: &'static str;

    fn extract<'p>(payload: &'p Payload<'_>) -> Option<Cow<'p, Self>>;
}

macro_rules! impl_extract {
    ($($ty:ty => $expected:literal, $variant:ident;)*) => {
        $(
            impl Extract for $ty {
                const EXPECTED: &'static str = $expected;

                fn extract<'p>(payload: &'p Payload<'_>) -> Option<Cow<'p, Self>> {
                    match payload {
                        Payload::$variant(v) => Some(Cow::Borrowed(v)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_extract! {
    Integer => "integer", Int;
    f64 => "float", Float;
    DateTime<Utc> => "time", Time;
    TimeDelta => "duration", Duration;
    IpAddr => "ip address", Ip;
}

/// Integers that do not fit are a mismatch, directives that
/// must see every integer are bound to [Integer].
impl Extract for i64 {
    const EXPECTED: &'static str = "64-bit integer";

    fn extract<'p>(payload: &'p Payload<'_>) -> Option<Cow<'p, Self>> {
        match payload {
            Payload::Int(v) => v.to_i64().map(Cow::Owned),
            _ => None,
        }
    }
}

impl Extract for str {
    const EXPECTED: &'static str = "string";

    fn extract<'p>(payload: &'p Payload<'_>) -> Option<Cow<'p, Self>> {
        match payload {
            Payload::Str(v) => Some(Cow::Borrowed(*v)),
            _ => None,
        }
    }
}

impl Extract for Url {
    const EXPECTED: &'static str = "url";

    fn extract<'p>(payload: &'p Payload<'_>) -> Option<Cow<'p, Self>> {
        match payload {
            Payload::Url(v) => Some(Cow::Borrowed(*v)),
            _ => None,
        }
    }
}

impl Extract for Length {
    const EXPECTED: &'static str = "string or collection";

    fn extract<'p>(payload: &'p Payload<'_>) -> Option<Cow<'p, Self>> {
        let len = match payload {
            Payload::Str(v) => v.chars().count(),
            Payload::Seq(len) | Payload::Map(len) => *len,
            _ => return None,
        };
        Some(Cow::Owned(Length {
            kind: payload.type_name(),
            len,
        }))
    }
}

impl Extract for Presence {
    const EXPECTED: &'static str = "any value";

    fn extract<'p>(payload: &'p Payload<'_>) -> Option<Cow<'p, Self>> {
        Some(Cow::Owned(Presence {
            kind: payload.type_name(),
            zero: is_zero_value(payload),
        }))
    }
}

/// The object-safe face of a [Directive] stored in a [Namespace](crate::Namespace).
pub trait DynDirective: Send + Sync {
    fn name(&self) -> &str;

    fn mode(&self) -> Mode;

    /// The payload type name the directive is bound to.
    fn expects(&self) -> &'static str;

    /// Materialize a fresh instance from `params` and evaluate it against `payload`.
    fn invoke(&self, params: &mut Params<'_>, payload: &Payload<'_>) -> Result<Option<Value>, Error>;
}

impl<D: Directive> DynDirective for D {
    fn name(&self) -> &str {
        Directive::name(self)
    }

    fn mode(&self) -> Mode {
        Directive::mode(self)
    }

    fn expects(&self) -> &'static str {
        <D::Payload as Extract>::EXPECTED
    }

    fn invoke(&self, params: &mut Params<'_>, payload: &Payload<'_>) -> Result<Option<Value>, Error> {
        let configured = self.materialize(params)?;
        params.finish(Directive::name(self))?;

        if let Payload::Absent = payload {
            return configured.validate_absent().map(|_| None);
        }

        let value = <D::Payload as Extract>::extract(payload).ok_or_else(|| {
            Error::new(ErrorValue::TypeMismatch {
                directive: Directive::name(self).to_string(),
                expected: <D::Payload as Extract>::EXPECTED,
                found: payload.type_name(),
            })
        })?;

        match Directive::mode(self) {
            Mode::Eval => configured.validate(&*value).map(|_| None),
            Mode::Mut => configured.transform(&*value),
        }
    }
}

/// Registers a directive under a second name.
///
/// The wrapped directive keeps its parameters and evaluation, only the
/// name differs.
#[derive(Debug, Clone)]
pub struct Alias<D> {
    name: &'static str,
    inner: D,
}

impl<D: Directive> Alias<D> {
    pub fn new(name: &'static str, inner: D) -> Self {
        Self { name, inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<T: ?Sized, D: Validator<T>> Validator<T> for Alias<D> {
    fn validate(&self, value: &T) -> Result<(), Error> {
        self.inner.validate(value)
    }
}

impl<D: Directive> Directive for Alias<D> {
    type Payload = D::Payload;

    fn name(&self) -> &str {
        self.name
    }

    fn mode(&self) -> Mode {
        self.inner.mode()
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        Ok(Alias {
            name: self.name,
            inner: self.inner.materialize(params)?,
        })
    }

    fn transform(&self, value: &Self::Payload) -> Result<Option<Value>, Error> {
        self.inner.transform(value)
    }

    fn validate_absent(&self) -> Result<(), Error> {
        self.inner.validate_absent()
    }
}

/// A parsed tag value: the directive name and its raw parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec<'t> {
    pub name: &'t str,
    pub params: Params<'t>,
}

impl<'t> TagSpec<'t> {
    /// Parse `name ("," key "=" value)*`.
    ///
    /// Whitespace around names, keys and values is trimmed. An empty pair,
    /// a pair without `=`, or a pair with an empty key or value is an error.
    pub fn parse(tag: &'t str) -> Result<Self, Error> {
        let mut parts = tag.split(',');

        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(malformed(tag, "directive name is required"));
        }

        let mut entries = Vec::new();
        for pair in parts {
            let (key, value) = split_pair(tag, pair)?;

            if entries.iter().any(|e: &Entry<'_>| e.key == key) {
                return Err(ConfigError::DuplicateParam {
                    param: key.to_string(),
                }
                .into());
            }

            entries.push(Entry {
                key,
                value,
                used: false,
            });
        }

        Ok(TagSpec {
            name,
            params: Params { entries },
        })
    }
}

/// Split one `key=value` pair, both sides trimmed and non-empty.
pub(crate) fn split_pair<'t>(tag: &str, pair: &'t str) -> Result<(&'t str, &'t str), Error> {
    let (key, value) = match pair.split_once('=') {
        Some(kv) => kv,
        None => {
            return Err(malformed(
                tag,
                format!(r#"malformed key value pair "{}", expected format is "key=value""#, pair.trim()),
            ))
        }
    };

    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(malformed(
            tag,
            format!(r#"malformed key value pair "{}", expected format is "key=value""#, pair.trim()),
        ));
    }

    Ok((key, value))
}

fn malformed(tag: &str, reason: impl Into<String>) -> Error {
    ConfigError::MalformedTag {
        tag: tag.to_string(),
        reason: reason.into(),
    }
    .into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<'t> {
    key: &'t str,
    value: &'t str,
    used: bool,
}

/// The raw parameters of one tag occurrence.
///
/// Reading a parameter marks it as used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'t> {
    entries: Vec<Entry<'t>>,
}

impl<'t> Params<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw parameter, mostly useful for materializing directives by hand.
    pub fn with(mut self, key: &'t str, value: &'t str) -> Self {
        self.entries.push(Entry {
            key,
            value,
            used: false,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw text of a parameter.
    pub fn raw(&mut self, key: &str) -> Option<&'t str> {
        self.entries.iter_mut().find(|e| e.key == key).map(|e| {
            e.used = true;
            e.value
        })
    }

    /// A parameter that must be present.
    pub fn required<T: FromParam>(&mut self, key: &'static str) -> Result<T, Error> {
        match self.optional(key)? {
            Some(v) => Ok(v),
            None => Err(ConfigError::MissingParam { param: key }.into()),
        }
    }

    /// A parameter that may be omitted.
    pub fn optional<T: FromParam>(&mut self, key: &'static str) -> Result<Option<T>, Error> {
        match self.raw(key) {
            Some(raw) => T::from_param(raw)
                .map(Some)
                .map_err(|e| e.for_param(key).into()),
            None => Ok(None),
        }
    }

    /// Fail on parameters that were never read.
    pub fn finish(&self, directive: &str) -> Result<(), Error> {
        match self.entries.iter().find(|e| !e.used) {
            Some(e) => Err(ConfigError::UnknownParam {
                directive: directive.to_string(),
                param: e.key.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Conversion of raw parameter text into a typed parameter.
pub trait FromParam: Sized {
    fn from_param(raw: &str) -> Result<Self, ConversionError>;
}

macro_rules! impl_from_param_parse {
    ($($ty:ty => $expected:expr),*) => {
        $(
            impl FromParam for $ty {
                fn from_param(raw: &str) -> Result<Self, ConversionError> {
                    raw.trim()
                        .parse::<$ty>()
                        .map_err(|e| ConversionError::new(raw, $expected, e))
                }
            }
        )*
    };
}

impl_from_param_parse! {
    i64 => "int",
    i32 => "int",
    u32 => "uint",
    usize => "uint",
    f64 => "float",
    IpAddr => "ip address"
}

impl FromParam for bool {
    fn from_param(raw: &str) -> Result<Self, ConversionError> {
        crate::field::parse_bool(raw.trim())
    }
}

impl FromParam for String {
    fn from_param(raw: &str) -> Result<Self, ConversionError> {
        Ok(raw.to_string())
    }
}

impl FromParam for Regex {
    fn from_param(raw: &str) -> Result<Self, ConversionError> {
        Regex::new(raw).map_err(|e| ConversionError::new(raw, "regex", format!("invalid regex pattern: {}", e)))
    }
}

/// Timestamps are given in RFC 3339.
impl FromParam for DateTime<Utc> {
    fn from_param(raw: &str) -> Result<Self, ConversionError> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| ConversionError::new(raw, "RFC 3339 timestamp", e))
    }
}

/// A `|`-separated list parameter, for example `values=a|b|c`.
///
/// Blank items are skipped, so the list may end up empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List<T>(pub Vec<T>);

impl<T: FromParam> FromParam for List<T> {
    fn from_param(raw: &str) -> Result<Self, ConversionError> {
        raw.split('|')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(T::from_param)
            .collect::<Result<Vec<_>, _>>()
            .map(List)
            .map_err(|e| ConversionError {
                raw: raw.to_string(),
                reason: format!(r#"invalid {} "{}""#, e.expected, e.raw),
                ..e
            })
    }
}
