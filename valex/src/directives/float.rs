//! Floating point directives, bound to `f64` payloads.

use super::numeric::numeric_directives;

numeric_directives! {
    payload = f64,
    bound = f64,
    range = FloatRange("rangefloat"),
    non_negative = NonNegativeFloat("posfloat"),
    non_positive = NonPositiveFloat("negfloat"),
    min = MinFloat("minfloat"),
    max = MaxFloat("maxfloat"),
    non_zero = NonZeroFloat("!zerofloat"),
    one_of = OneOfFloat("oneoffloat"),
}
