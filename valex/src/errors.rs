//! Error definitions used during validation, directive processing and form binding.

use crate::span::Keys;

/// A validation or processing error.
///
/// It contains the path of the offending field when the error
/// was produced while walking a [Record](crate::Record).
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The path of the field that caused the error.
    pub span: Option<Keys>,

    /// The actual error details.
    pub value: ErrorValue,
}

impl Error {
    pub fn new(value: ErrorValue) -> Self {
        Self { span: None, value }
    }

    /// Any error that does not originate from a built-in validator.
    pub fn custom<T: core::fmt::Display>(error: T) -> Self {
        Self::new(ErrorValue::Custom(error.to_string()))
    }

    /// A validation failure with a free-form description.
    pub fn invalid<T: core::fmt::Display>(reason: T) -> Self {
        Self::new(ErrorValue::Invalid(reason.to_string()))
    }

    pub fn config(err: ConfigError) -> Self {
        Self::new(ErrorValue::Config(err))
    }

    /// Attach a span unless the error already has one.
    ///
    /// Errors from nested records keep their innermost, already complete path.
    pub fn with_span(mut self, span: Keys) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.value.kind()
    }

    /// Whether the value itself was rejected, as opposed to the
    /// validator or the record being misconfigured.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<ErrorValue> for Error {
    fn from(value: ErrorValue) -> Self {
        Error::new(value)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::new(ErrorValue::Config(err))
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Error::new(ErrorValue::Conversion(err))
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(span) = &self.span {
            if !span.is_empty() {
                write!(f, r#"field "{}": "#, span)?;
            }
        }

        write!(f, "{}", self.value)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.value {
            ErrorValue::Config(err) => Some(err),
            ErrorValue::Conversion(err) => Some(err),
            _ => None,
        }
    }
}

/// The broad class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The directive or the record is misconfigured, independent of the value.
    Configuration,

    /// A raw parameter string could not be converted to its expected type.
    Conversion,

    /// The value failed the predicate.
    Validation,

    /// Form binding could not populate a field.
    Binding,
}

/// All the errors that can occur.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorValue {
    /// Indicates that the value is outside of an inclusive range.
    #[error("value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        value: String,
        min: String,
        max: String,
    },

    /// Indicates that the value is less than the given minimum.
    #[error("value {value} is less than minimum {min}")]
    LessThanMin { value: String, min: String },

    /// Indicates that the value is more than the given maximum.
    #[error("value {value} exceeds maximum {max}")]
    MoreThanMax { value: String, max: String },

    /// Indicates that the value is below zero.
    #[error("value {value} is negative")]
    Negative { value: String },

    /// Indicates that the value is above zero.
    #[error("value {value} is positive")]
    Positive { value: String },

    /// Indicates that the value is the zero value of its type.
    #[error("{subject} is zero")]
    Zero { subject: &'static str },

    /// Indicates that the value is not a member of the allowed set.
    #[error("value {value} is not in allowed set")]
    NotAllowed { value: String },

    /// Any other validation failure.
    #[error("{0}")]
    Invalid(String),

    /// Indicates misuse of a directive or validator.
    #[error("invalid configuration: {0}")]
    Config(ConfigError),

    /// Indicates that a parameter could not be converted.
    #[error(transparent)]
    Conversion(ConversionError),

    /// Indicates a tag naming a directive that is not registered.
    #[error("unknown directive \"{name}\"")]
    UnknownDirective { name: String },

    /// Indicates that a directive cannot handle the type of the field.
    #[error("directive \"{directive}\" expects {expected}, but the field holds {found}")]
    TypeMismatch {
        directive: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Indicates a guarded value without a validator.
    #[error("no validator set")]
    NoValidator,

    /// Indicates a field that form binding cannot populate.
    #[error("unsupported field type {type_name}")]
    UnsupportedFieldType { type_name: &'static str },

    /// Indicates more submitted values than the field accepts.
    #[error("too many values ({count}), max {max}")]
    TooManyValues { count: usize, max: usize },

    /// Indicates a required form field that was missing or empty.
    #[error("field is required")]
    Required,

    /// Any error that does not originate from the library.
    #[error("{0}")]
    Custom(String),
}

impl ErrorValue {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorValue::Config(_)
            | ErrorValue::UnknownDirective { .. }
            | ErrorValue::TypeMismatch { .. }
            | ErrorValue::NoValidator => ErrorKind::Configuration,
            ErrorValue::Conversion(_) => ErrorKind::Conversion,
            ErrorValue::UnsupportedFieldType { .. }
            | ErrorValue::TooManyValues { .. }
            | ErrorValue::Required => ErrorKind::Binding,
            ErrorValue::OutOfRange { .. }
            | ErrorValue::LessThanMin { .. }
            | ErrorValue::MoreThanMax { .. }
            | ErrorValue::Negative { .. }
            | ErrorValue::Positive { .. }
            | ErrorValue::Zero { .. }
            | ErrorValue::NotAllowed { .. }
            | ErrorValue::Invalid(_)
            | ErrorValue::Custom(_) => ErrorKind::Validation,
        }
    }
}

/// All errors related to a directive or validator being misconfigured.
///
/// These never depend on the value being validated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Indicates an empty set of allowed values.
    #[error(r#"value of parameter "{param}" cannot be empty"#)]
    EmptySet { param: &'static str },

    /// Indicates a parameter with an unusable value.
    #[error(r#"value of parameter "{param}" {reason}"#)]
    InvalidParam { param: &'static str, reason: String },

    /// Indicates a required parameter that was not provided.
    #[error(r#"missing required parameter "{param}""#)]
    MissingParam { param: &'static str },

    /// Indicates a parameter the directive does not declare.
    #[error(r#"directive "{directive}" has no parameter "{param}""#)]
    UnknownParam { directive: String, param: String },

    /// Indicates a parameter given more than once.
    #[error(r#"parameter "{param}" is given more than once"#)]
    DuplicateParam { param: String },

    /// Indicates a tag that does not follow the `name,key=value,...` syntax.
    #[error(r#"malformed tag "{tag}": {reason}"#)]
    MalformedTag { tag: String, reason: String },

    /// Indicates IP addresses of different families compared to each other.
    #[error("ip family mismatch: expected {expected}, found {found}")]
    IpFamilyMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Indicates a mutating directive used in a read-only pass.
    #[error(r#"directive "{directive}" mutates the field and needs a mutable pass"#)]
    MutationRequired { directive: String },
}

/// Indicates a raw parameter that could not be converted to the expected type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(r#"cannot convert "{raw}"{} to {expected}: {reason}"#, param_suffix(.param))]
pub struct ConversionError {
    /// The parameter name, if the raw text came from a tag parameter.
    pub param: Option<String>,

    /// The raw text.
    pub raw: String,

    /// The name of the expected type.
    pub expected: &'static str,

    /// Why the conversion failed.
    pub reason: String,
}

impl ConversionError {
    pub fn new(raw: &str, expected: &'static str, reason: impl core::fmt::Display) -> Self {
        Self {
            param: None,
            raw: raw.to_string(),
            expected,
            reason: reason.to_string(),
        }
    }

    pub fn for_param(mut self, param: &str) -> Self {
        self.param = Some(param.to_string());
        self
    }
}

fn param_suffix(param: &Option<String>) -> String {
    match param {
        Some(p) => format!(r#" in parameter "{}""#, p),
        None => String::new(),
    }
}
