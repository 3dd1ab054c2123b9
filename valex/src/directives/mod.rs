//! The built-in directive catalog.
//!
//! Every directive is a plain validator as well, so the catalog can be
//! used without tags:
//!
//! ```
//! use valex::{directives::Uuid, Validator};
//!
//! assert!(Uuid::default().validate("550e8400-e29b-41d4-a716-446655440000").is_ok());
//! ```

use crate::{directive::Alias, registry::Namespace};

/// Implements [Directive](crate::Directive) for a unit struct without parameters.
///
/// With `zero`, the directive also rejects absent values with "`zero` is zero".
macro_rules! unit_directive {
    ($ty:ident, $name:literal, $payload:ty) => {
        impl $crate::Directive for $ty {
            type Payload = $payload;

            fn name(&self) -> &str {
                $name
            }

            fn materialize(
                &self,
                _params: &mut $crate::Params<'_>,
            ) -> Result<Self, $crate::Error> {
                Ok($ty)
            }
        }
    };
    ($ty:ident, $name:literal, $payload:ty, zero = $subject:literal) => {
        impl $crate::Directive for $ty {
            type Payload = $payload;

            fn name(&self) -> &str {
                $name
            }

            fn materialize(
                &self,
                _params: &mut $crate::Params<'_>,
            ) -> Result<Self, $crate::Error> {
                Ok($ty)
            }

            fn validate_absent(&self) -> Result<(), $crate::Error> {
                Err($crate::ErrorValue::Zero { subject: $subject }.into())
            }
        }
    };
}

mod any;
mod float;
mod int;
mod net;
mod numeric;
mod string;
mod time;
mod transform;

pub use any::*;
pub use float::*;
pub use int::*;
pub use net::*;
pub use string::*;
pub use time::*;
pub use transform::*;

/// Register the whole catalog into a namespace.
pub fn register_builtins(ns: &Namespace) {
    ns.register(NonZeroValue);
    ns.register(Alias::new("nonzero", NonZeroValue));

    // Integers
    ns.register(IntRange::default());
    ns.register(NonNegativeInt);
    ns.register(NonPositiveInt);
    ns.register(MinInt::default());
    ns.register(MaxInt::default());
    ns.register(NonZeroInt);
    ns.register(Alias::new("nonzeroint", NonZeroInt));
    ns.register(OneOfInt::default());

    // Floats
    ns.register(FloatRange::default());
    ns.register(NonNegativeFloat);
    ns.register(NonPositiveFloat);
    ns.register(MinFloat::default());
    ns.register(MaxFloat::default());
    ns.register(NonZeroFloat);
    ns.register(Alias::new("nonzerofloat", NonZeroFloat));
    ns.register(OneOfFloat::default());

    // Strings
    ns.register(UrlFormat);
    ns.register(Email);
    ns.register(NonEmpty);
    ns.register(Alias::new("nonempty", NonEmpty));
    ns.register(MinLength::default());
    ns.register(MaxLength::default());
    ns.register(LengthRange::default());
    ns.register(Pattern::default());
    ns.register(Prefix::default());
    ns.register(Suffix::default());
    ns.register(Contains::default());
    ns.register(OneOfString::default());
    ns.register(AlphaNumeric);
    ns.register(Xml);
    ns.register(Json);
    ns.register(Uuid::default());
    ns.register(Base64);
    ns.register(Hex);
    ns.register(TimeLayout::default());

    // Network strings
    ns.register(MacAddress);
    ns.register(IpFormat::any());
    ns.register(IpFormat::v4());
    ns.register(IpFormat::v6());
    ns.register(Hostname);
    ns.register(Cidr);

    // Time and duration
    ns.register(NonZeroTime);
    ns.register(Alias::new("nonzerotime", NonZeroTime));
    ns.register(TimeBefore::default());
    ns.register(TimeAfter::default());
    ns.register(TimeBetween::default());
    ns.register(PositiveDuration);
    ns.register(NonZeroDuration);
    ns.register(Alias::new("nonzeroduration", NonZeroDuration));

    // Addresses
    ns.register(NonZeroIp);
    ns.register(Alias::new("nonzeroip", NonZeroIp));
    ns.register(IpRange::default());
    ns.register(NonZeroUrl);
    ns.register(Alias::new("nonzerourl", NonZeroUrl));

    // Transforms
    ns.register(Trim);
    ns.register(Lowercase);
    ns.register(Uppercase);
    ns.register(ClampInt::default());
}
