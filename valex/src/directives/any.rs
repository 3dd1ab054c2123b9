//! Directives that accept fields of any type.

use crate::{field::Presence, Error, ErrorValue, Validator};

/// Validates that a value is not the zero value of its kind.
///
/// Numbers must not be zero and booleans must be true. Strings and
/// collections must not be empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonZeroValue;

impl Validator<Presence> for NonZeroValue {
    fn validate(&self, value: &Presence) -> Result<(), Error> {
        if value.zero {
            return Err(ErrorValue::Zero {
                subject: value.kind,
            }
            .into());
        }
        Ok(())
    }
}

unit_directive!(NonZeroValue, "!zero", Presence, zero = "value");
