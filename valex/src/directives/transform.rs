//! Directives that rewrite the field instead of checking it.
//!
//! They run in [Mut](crate::Mode::Mut) mode, so they need a mutable pass such as
//! [process_struct](crate::process_struct) or form binding.

use crate::{field::Integer, ConfigError, Directive, Error, Mode, Params, Validator, Value};

macro_rules! string_transform {
    ($(#[$doc:meta])* $ty:ident($name:literal), $apply:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $ty;

        impl $ty {
            /// The rewritten value.
            pub fn apply(&self, value: &str) -> String {
                let f: fn(&str) -> String = $apply;
                f(value)
            }
        }

        /// Any string is accepted.
        impl Validator<str> for $ty {
            fn validate(&self, _value: &str) -> Result<(), Error> {
                Ok(())
            }
        }

        impl Directive for $ty {
            type Payload = str;

            fn name(&self) -> &str {
                $name
            }

            fn mode(&self) -> Mode {
                Mode::Mut
            }

            fn materialize(&self, _params: &mut Params<'_>) -> Result<Self, Error> {
                Ok($ty)
            }

            fn transform(&self, value: &str) -> Result<Option<Value>, Error> {
                let out = self.apply(value);
                if out == value {
                    return Ok(None);
                }
                Ok(Some(Value::Str(out)))
            }
        }
    };
}

string_transform!(
    /// Removes leading and trailing whitespace.
    Trim("trim"),
    |s| s.trim().to_string()
);

string_transform!(
    /// Converts a string to lowercase.
    Lowercase("lower"),
    |s| s.to_lowercase()
);

string_transform!(
    /// Converts a string to uppercase.
    Uppercase("upper"),
    |s| s.to_uppercase()
);

/// Limits an integer to an inclusive range.
///
/// Fields of any integer width can be clamped, the written value is always one of the bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClampInt {
    pub min: i64,
    pub max: i64,
}

impl ClampInt {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    fn check(&self) -> Result<(), Error> {
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

/// Only the bounds are checked, any value can be clamped.
impl Validator<Integer> for ClampInt {
    fn validate(&self, _value: &Integer) -> Result<(), Error> {
        self.check()
    }
}

impl Directive for ClampInt {
    type Payload = Integer;

    fn name(&self) -> &str {
        "clampint"
    }

    fn mode(&self) -> Mode {
        Mode::Mut
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let configured = Self {
            min: params.required("min")?,
            max: params.required("max")?,
        };
        configured.check()?;
        Ok(configured)
    }

    fn transform(&self, value: &Integer) -> Result<Option<Value>, Error> {
        self.check()?;

        if *value < Integer::from(self.min) {
            return Ok(Some(Value::Int(self.min)));
        }
        if *value > Integer::from(self.max) {
            return Ok(Some(Value::Int(self.max)));
        }
        Ok(None)
    }
}
