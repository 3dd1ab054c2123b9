//! Integer directives.
//!
//! Parameters are `i64`, while field values of any primitive integer type
//! are compared exactly as an [Integer], so `u64::MAX` is above every bound.

use super::numeric::numeric_directives;
use crate::{field::Integer, Error, Validator};

numeric_directives! {
    payload = Integer,
    bound = i64,
    range = IntRange("rangeint"),
    non_negative = NonNegativeInt("posint"),
    non_positive = NonPositiveInt("negint"),
    min = MinInt("minint"),
    max = MaxInt("maxint"),
    non_zero = NonZeroInt("!zeroint"),
    one_of = OneOfInt("oneofint"),
}

macro_rules! validate_i64 {
    ($($ty:ty),*) => {
        $(
            impl Validator<i64> for $ty {
                fn validate(&self, value: &i64) -> Result<(), Error> {
                    Validator::<Integer>::validate(self, &Integer::from(*value))
                }
            }
        )*
    };
}

validate_i64!(IntRange, NonNegativeInt, NonPositiveInt, MinInt, MaxInt, NonZeroInt, OneOfInt);
