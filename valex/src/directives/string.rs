//! String directives.

use crate::{
    directive::List, field::Length, ConfigError, Directive, Error, ErrorValue, Params, Validator,
};
use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
    Engine as _,
};
use once_cell::sync::Lazy;
use quick_xml::{events::Event, Reader};
use regex::Regex;
use url::Url;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .unwrap()
});

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-([0-9a-fA-F])[0-9a-fA-F]{3}-([0-9a-fA-F])[0-9a-fA-F]{3}-[0-9a-fA-F]{12}$",
    )
    .unwrap()
});

fn invalid(msg: String) -> Error {
    ErrorValue::Invalid(msg).into()
}

/// Validates that a string is an absolute URL or an absolute path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlFormat;

impl Validator<str> for UrlFormat {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if value.starts_with('/') || Url::parse(value).is_ok() {
            return Ok(());
        }
        Err(invalid(format!("value {:?} is not a valid URL", value)))
    }
}

unit_directive!(UrlFormat, "url", str);

/// Validates that a string is an email address, optionally with a display name
/// as in `Jane Doe <jane@example.com>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Email;

impl Validator<str> for Email {
    fn validate(&self, value: &str) -> Result<(), Error> {
        let trimmed = value.trim();

        let address = match (trimmed.rfind('<'), trimmed.strip_suffix('>')) {
            (Some(start), Some(rest)) => &rest[start + 1..],
            _ => trimmed,
        };

        if EMAIL.is_match(address) {
            return Ok(());
        }
        Err(invalid(format!("value {:?} is not a valid email address", value)))
    }
}

unit_directive!(Email, "email", str);

/// Validates that a string, sequence or map is not empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonEmpty;

impl Validator<str> for NonEmpty {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if value.is_empty() {
            return Err(invalid("string is empty".into()));
        }
        Ok(())
    }
}

impl Validator<Length> for NonEmpty {
    fn validate(&self, value: &Length) -> Result<(), Error> {
        if value.len == 0 {
            return Err(invalid(format!("{} is empty", value.kind)));
        }
        Ok(())
    }
}

impl Directive for NonEmpty {
    type Payload = Length;

    fn name(&self) -> &str {
        "!empty"
    }

    fn materialize(&self, _params: &mut Params<'_>) -> Result<Self, Error> {
        Ok(NonEmpty)
    }

    /// Only scalar fields are optional, so an absent value is a missing string.
    fn validate_absent(&self) -> Result<(), Error> {
        Err(invalid("string is empty".into()))
    }
}

fn size_param(params: &mut Params<'_>, name: &'static str) -> Result<usize, Error> {
    let size: i64 = params.required(name)?;
    if size < 0 {
        return Err(ConfigError::InvalidParam {
            param: name,
            reason: "cannot be negative".into(),
        }
        .into());
    }
    Ok(size as usize)
}

fn nonzero_size(name: &'static str, size: usize) -> Result<(), Error> {
    if size == 0 {
        return Err(ConfigError::InvalidParam {
            param: name,
            reason: "cannot be 0".into(),
        }
        .into());
    }
    Ok(())
}

/// Validates that a string has at least `size` characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinLength {
    pub size: usize,
}

impl MinLength {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Validator<str> for MinLength {
    fn validate(&self, value: &str) -> Result<(), Error> {
        nonzero_size("size", self.size)?;

        let len = value.chars().count();
        if len < self.size {
            return Err(invalid(format!(
                "value {:?} with length {} is shorter than minimum length {}",
                value, len, self.size
            )));
        }
        Ok(())
    }
}

impl Directive for MinLength {
    type Payload = str;

    fn name(&self) -> &str {
        "min"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let size = size_param(params, "size")?;
        nonzero_size("size", size)?;
        Ok(Self { size })
    }
}

/// Validates that a string has at most `size` characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxLength {
    pub size: usize,
}

impl MaxLength {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Validator<str> for MaxLength {
    fn validate(&self, value: &str) -> Result<(), Error> {
        nonzero_size("size", self.size)?;

        let len = value.chars().count();
        if len > self.size {
            return Err(invalid(format!(
                "value {:?} with length {} exceeds maximum length {}",
                value, len, self.size
            )));
        }
        Ok(())
    }
}

impl Directive for MaxLength {
    type Payload = str;

    fn name(&self) -> &str {
        "max"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let size = size_param(params, "size")?;
        nonzero_size("size", size)?;
        Ok(Self { size })
    }
}

/// Validates that the character count of a string is within an inclusive range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    fn check(&self) -> Result<(), Error> {
        nonzero_size("min", self.min)?;
        nonzero_size("max", self.max)?;

        if self.min > self.max {
            return Err(ConfigError::InvalidParam {
                param: "min",
                reason: r#"cannot exceed "max""#.into(),
            }
            .into());
        }
        Ok(())
    }
}

impl Validator<str> for LengthRange {
    fn validate(&self, value: &str) -> Result<(), Error> {
        self.check()?;

        let len = value.chars().count();
        if len < self.min || len > self.max {
            return Err(invalid(format!(
                "value {:?} with length {} is not in range [{}, {}]",
                value, len, self.min, self.max
            )));
        }
        Ok(())
    }
}

impl Directive for LengthRange {
    type Payload = str;

    fn name(&self) -> &str {
        "len"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let configured = Self {
            min: size_param(params, "min")?,
            max: size_param(params, "max")?,
        };
        configured.check()?;
        Ok(configured)
    }
}

/// Validates that a string matches a regular expression.
///
/// The pattern is not anchored, use `^` and `$` to match the whole value.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    pub pattern: Option<Regex>,
}

impl Pattern {
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern: Some(pattern),
        }
    }
}

impl Validator<str> for Pattern {
    fn validate(&self, value: &str) -> Result<(), Error> {
        let pattern = self
            .pattern
            .as_ref()
            .ok_or(ConfigError::MissingParam { param: "pattern" })?;

        if !pattern.is_match(value) {
            return Err(invalid(format!(
                "value {:?} does not match pattern {:?}",
                value,
                pattern.as_str()
            )));
        }
        Ok(())
    }
}

impl Directive for Pattern {
    type Payload = str;

    fn name(&self) -> &str {
        "regex"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        Ok(Self {
            pattern: Some(params.required("pattern")?),
        })
    }
}

macro_rules! substring_directive {
    ($(#[$doc:meta])* $ty:ident($name:literal), $check:ident, $verb:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $ty {
            pub value: String,
        }

        impl $ty {
            pub fn new(value: impl Into<String>) -> Self {
                Self {
                    value: value.into(),
                }
            }
        }

        impl Validator<str> for $ty {
            fn validate(&self, value: &str) -> Result<(), Error> {
                if self.value.is_empty() {
                    return Err(ConfigError::EmptySet { param: "value" }.into());
                }

                if !value.$check(self.value.as_str()) {
                    return Err(invalid(format!(
                        concat!("value {:?} ", $verb, " {:?}"),
                        value, self.value
                    )));
                }
                Ok(())
            }
        }

        impl Directive for $ty {
            type Payload = str;

            fn name(&self) -> &str {
                $name
            }

            fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
                Ok(Self {
                    value: params.required("value")?,
                })
            }
        }
    };
}

substring_directive!(
    /// Validates that a string starts with the given value.
    Prefix("prefix"),
    starts_with,
    "does not have prefix"
);

substring_directive!(
    /// Validates that a string ends with the given value.
    Suffix("suffix"),
    ends_with,
    "does not have suffix"
);

substring_directive!(
    /// Validates that a string contains the given value.
    Contains("contains"),
    contains,
    "does not contain"
);

/// Validates that a string is one of the allowed values.
///
/// In tags the values are separated by `|`, for example `values=red|green|blue`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneOfString {
    pub values: Vec<String>,
}

impl OneOfString {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator<str> for OneOfString {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if self.values.is_empty() {
            return Err(ConfigError::EmptySet { param: "values" }.into());
        }

        if self.values.iter().any(|v| v == value) {
            return Ok(());
        }

        Err(ErrorValue::NotAllowed {
            value: format!("{:?}", value),
        }
        .into())
    }
}

impl Directive for OneOfString {
    type Payload = str;

    fn name(&self) -> &str {
        "oneof"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let List(values) = params.required("values")?;
        if values.is_empty() {
            return Err(ConfigError::EmptySet { param: "values" }.into());
        }
        Ok(Self { values })
    }
}

/// Validates that a string only consists of ASCII letters and digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlphaNumeric;

impl Validator<str> for AlphaNumeric {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid(format!("value {:?} is not alphanumeric", value)));
        }
        Ok(())
    }
}

unit_directive!(AlphaNumeric, "alphanum", str);

/// Validates that a string is well-formed XML with at least one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Xml;

impl Validator<str> for Xml {
    fn validate(&self, value: &str) -> Result<(), Error> {
        let mut reader = Reader::from_str(value);
        let mut depth = 0usize;
        let mut has_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(_)) => {
                    depth += 1;
                    has_element = true;
                }
                Ok(Event::End(_)) => depth = depth.saturating_sub(1),
                Ok(Event::Empty(_)) => has_element = true,
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => return Err(invalid(format!("XML parsing error: {}", err))),
            }
        }

        if depth != 0 {
            return Err(invalid("XML parsing error: unexpected EOF".into()));
        }

        if !has_element {
            return Err(invalid(
                "XML document must contain at least one element".into(),
            ));
        }

        Ok(())
    }
}

unit_directive!(Xml, "xml", str);

/// Validates that a string is a JSON document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

impl Validator<str> for Json {
    fn validate(&self, value: &str) -> Result<(), Error> {
        match serde_json::from_str::<serde_json::Value>(value) {
            Ok(_) => Ok(()),
            Err(_) => Err(invalid("invalid JSON".into())),
        }
    }
}

unit_directive!(Json, "json", str);

/// Validates that a string is an RFC 4122 UUID of a given version.
///
/// A version of 0 stands for version 4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uuid {
    pub version: i64,
}

impl Uuid {
    pub fn new(version: i64) -> Self {
        Self { version }
    }

    fn expected_version(&self) -> Result<u32, Error> {
        let expected = if self.version == 0 { 4 } else { self.version };

        if !(1..=8).contains(&expected) {
            return Err(ConfigError::InvalidParam {
                param: "version",
                reason: format!("{} is not a UUID version", expected),
            }
            .into());
        }

        Ok(expected as u32)
    }
}

impl Validator<str> for Uuid {
    fn validate(&self, value: &str) -> Result<(), Error> {
        let expected = self.expected_version()?;

        let captures = UUID
            .captures(value)
            .ok_or_else(|| invalid(format!("value {:?} is not a valid UUID", value)))?;

        let version = captures
            .get(1)
            .and_then(|m| u32::from_str_radix(m.as_str(), 16).ok())
            .ok_or_else(|| invalid(format!("value {:?} is not a valid UUID", value)))?;

        let variant = captures
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        if !matches!(variant.as_str(), "8" | "9" | "a" | "b") {
            return Err(invalid(format!(
                "value {:?} is not a valid UUID variant",
                value
            )));
        }

        if version != expected {
            return Err(invalid(format!(
                "value {:?} is not a UUIDv{}",
                value, expected
            )));
        }

        Ok(())
    }
}

impl Directive for Uuid {
    type Payload = str;

    fn name(&self) -> &str {
        "uuid"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let configured = Self {
            version: params.optional("version")?.unwrap_or(0),
        };
        configured.expected_version()?;
        Ok(configured)
    }
}

/// Validates that a string is standard base64, with or without padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base64;

impl Validator<str> for Base64 {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if value.is_empty() {
            return Err(invalid("value is empty".into()));
        }

        if STANDARD.decode(value).is_ok() || STANDARD_NO_PAD.decode(value).is_ok() {
            return Ok(());
        }

        Err(invalid(format!("value {:?} is not valid base64", value)))
    }
}

unit_directive!(Base64, "base64", str);

/// Validates that a string is hex encoded bytes, optionally prefixed with `0x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hex;

impl Validator<str> for Hex {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if value.is_empty() {
            return Err(invalid("value is empty".into()));
        }

        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);

        if hex::decode(digits).is_err() {
            return Err(invalid(format!("value {:?} is not valid hex", value)));
        }
        Ok(())
    }
}

unit_directive!(Hex, "hex", str);
