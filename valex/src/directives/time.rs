//! Timestamps, durations and time layouts.

use crate::{
    errors::ConversionError, ConfigError, Directive, Error, ErrorValue, Params, Validator,
};
use chrono::{
    format::{parse, Item, Parsed, StrftimeItems},
    DateTime, TimeDelta, Utc,
};

fn invalid(msg: String) -> Error {
    ErrorValue::Invalid(msg).into()
}

/// A time layout that strings are parsed with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Layout {
    /// RFC 3339, with optional fractional seconds.
    #[default]
    Rfc3339,

    /// A strftime-style format string.
    Format(String),
}

impl Layout {
    /// Resolve a well-known layout name, or accept a raw format string.
    ///
    /// Format strings with unknown specifiers are rejected.
    pub fn resolve(raw: &str) -> Result<Self, ConversionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConversionError::new(raw, "time layout", "format cannot be empty"));
        }

        let format = match raw {
            "RFC3339" | "RFC3339Nano" => return Ok(Layout::Rfc3339),
            "ANSIC" => "%a %b %e %H:%M:%S %Y",
            "UnixDate" => "%a %b %e %H:%M:%S %Z %Y",
            "RubyDate" => "%a %b %d %H:%M:%S %z %Y",
            "RFC822" => "%d %b %y %H:%M %Z",
            "RFC822Z" => "%d %b %y %H:%M %z",
            "RFC850" => "%A, %d-%b-%y %H:%M:%S %Z",
            "RFC1123" => "%a, %d %b %Y %H:%M:%S %Z",
            "RFC1123Z" => "%a, %d %b %Y %H:%M:%S %z",
            "Kitchen" => "%-I:%M%p",
            "Stamp" => "%b %e %H:%M:%S",
            "StampMilli" => "%b %e %H:%M:%S%.3f",
            "StampMicro" => "%b %e %H:%M:%S%.6f",
            "StampNano" => "%b %e %H:%M:%S%.9f",
            "DateTime" => "%Y-%m-%d %H:%M:%S",
            "DateOnly" => "%Y-%m-%d",
            "TimeOnly" => "%H:%M:%S",
            other => other,
        };

        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(ConversionError::new(
                raw,
                "time layout",
                "invalid format specifier",
            ));
        }

        Ok(Layout::Format(format.to_string()))
    }

    pub fn parse(&self, value: &str) -> Result<(), String> {
        match self {
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(value)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Layout::Format(format) => {
                let mut parsed = Parsed::new();
                parse(&mut parsed, value, StrftimeItems::new(format)).map_err(|e| e.to_string())
            }
        }
    }
}

impl core::fmt::Display for Layout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Layout::Rfc3339 => f.write_str("RFC3339"),
            Layout::Format(format) => f.write_str(format),
        }
    }
}

/// Validates that a string is a time in the given layout.
///
/// The `format` parameter accepts the layout names ANSIC, UnixDate, RubyDate,
/// RFC822, RFC822Z, RFC850, RFC1123, RFC1123Z, RFC3339, RFC3339Nano, Kitchen,
/// Stamp, StampMilli, StampMicro, StampNano, DateTime, DateOnly and TimeOnly,
/// or a strftime format string. RFC 3339 is used without it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeLayout {
    pub layout: Layout,
}

impl TimeLayout {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Validator<str> for TimeLayout {
    fn validate(&self, value: &str) -> Result<(), Error> {
        self.layout.parse(value).map_err(|reason| {
            invalid(format!(
                "invalid time {:?} for layout {:?}: {}",
                value,
                self.layout.to_string(),
                reason
            ))
        })
    }
}

impl Directive for TimeLayout {
    type Payload = str;

    fn name(&self) -> &str {
        "time"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let layout = match params.raw("format") {
            Some(raw) => Layout::resolve(raw).map_err(|e| e.for_param("format"))?,
            None => Layout::Rfc3339,
        };
        Ok(Self { layout })
    }
}

/// Validates that a time is not the Unix epoch, the zero value of [DateTime].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonZeroTime;

impl Validator<DateTime<Utc>> for NonZeroTime {
    fn validate(&self, value: &DateTime<Utc>) -> Result<(), Error> {
        if crate::predicate::is_zero_value(value) {
            return Err(ErrorValue::Zero { subject: "time" }.into());
        }
        Ok(())
    }
}

unit_directive!(NonZeroTime, "!zerotime", DateTime<Utc>, zero = "time");

/// Validates that a time is strictly before a given time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBefore {
    pub before: Option<DateTime<Utc>>,
}

impl TimeBefore {
    pub fn new(before: DateTime<Utc>) -> Self {
        Self {
            before: Some(before),
        }
    }
}

impl Validator<DateTime<Utc>> for TimeBefore {
    fn validate(&self, value: &DateTime<Utc>) -> Result<(), Error> {
        let before = self
            .before
            .ok_or(ConfigError::MissingParam { param: "before" })?;

        if *value >= before {
            return Err(invalid(format!("time {} is not before {}", value, before)));
        }
        Ok(())
    }
}

impl Directive for TimeBefore {
    type Payload = DateTime<Utc>;

    fn name(&self) -> &str {
        "beforetime"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        Ok(Self {
            before: Some(params.required("before")?),
        })
    }
}

/// Validates that a time is strictly after a given time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeAfter {
    pub after: Option<DateTime<Utc>>,
}

impl TimeAfter {
    pub fn new(after: DateTime<Utc>) -> Self {
        Self { after: Some(after) }
    }
}

impl Validator<DateTime<Utc>> for TimeAfter {
    fn validate(&self, value: &DateTime<Utc>) -> Result<(), Error> {
        let after = self
            .after
            .ok_or(ConfigError::MissingParam { param: "after" })?;

        if *value <= after {
            return Err(invalid(format!("time {} is not after {}", value, after)));
        }
        Ok(())
    }
}

impl Directive for TimeAfter {
    type Payload = DateTime<Utc>;

    fn name(&self) -> &str {
        "aftertime"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        Ok(Self {
            after: Some(params.required("after")?),
        })
    }
}

/// Validates that a time is within an inclusive range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBetween {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeBetween {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), Error> {
        let start = self.start.ok_or(ConfigError::MissingParam { param: "start" })?;
        let end = self.end.ok_or(ConfigError::MissingParam { param: "end" })?;

        if start > end {
            return Err(ConfigError::InvalidParam {
                param: "start",
                reason: r#"cannot be after "end""#.into(),
            }
            .into());
        }
        Ok((start, end))
    }
}

impl Validator<DateTime<Utc>> for TimeBetween {
    fn validate(&self, value: &DateTime<Utc>) -> Result<(), Error> {
        let (start, end) = self.bounds()?;

        if *value < start || *value > end {
            return Err(invalid(format!(
                "time {} is not in range [{}, {}]",
                value, start, end
            )));
        }
        Ok(())
    }
}

impl Directive for TimeBetween {
    type Payload = DateTime<Utc>;

    fn name(&self) -> &str {
        "betweentime"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let configured = Self {
            start: Some(params.required("start")?),
            end: Some(params.required("end")?),
        };
        configured.bounds()?;
        Ok(configured)
    }
}

/// Validates that a duration is above zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositiveDuration;

impl Validator<TimeDelta> for PositiveDuration {
    fn validate(&self, value: &TimeDelta) -> Result<(), Error> {
        if *value <= TimeDelta::zero() {
            return Err(invalid("duration is not positive".into()));
        }
        Ok(())
    }
}

unit_directive!(PositiveDuration, "posduration", TimeDelta);

/// Validates that a duration is not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonZeroDuration;

impl Validator<TimeDelta> for NonZeroDuration {
    fn validate(&self, value: &TimeDelta) -> Result<(), Error> {
        if crate::predicate::is_zero_value(value) {
            return Err(ErrorValue::Zero {
                subject: "duration",
            }
            .into());
        }
        Ok(())
    }
}

unit_directive!(NonZeroDuration, "!zeroduration", TimeDelta, zero = "duration");
