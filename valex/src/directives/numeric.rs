// The integer and float catalogs only differ in their types and names.
// Parameters are read as `$bound` and widened to the `$ty` payload for comparisons.

macro_rules! numeric_directives {
    (
        payload = $ty:ty,
        bound = $bound:ty,
        range = $range:ident($range_name:literal),
        non_negative = $non_negative:ident($non_negative_name:literal),
        non_positive = $non_positive:ident($non_positive_name:literal),
        min = $min:ident($min_name:literal),
        max = $max:ident($max_name:literal),
        non_zero = $non_zero:ident($non_zero_name:literal),
        one_of = $one_of:ident($one_of_name:literal),
    ) => {
        /// Validates that a value is within an inclusive range.
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        pub struct $range {
            pub min: $bound,
            pub max: $bound,
        }

        impl $range {
            pub fn new(min: $bound, max: $bound) -> Self {
                Self { min, max }
            }

            fn check(&self) -> Result<(), $crate::Error> {
                if self.min > self.max {
                    return Err($crate::ConfigError::InvalidParam {
                        param: "min",
                        reason: r#"cannot exceed "max""#.into(),
                    }
                    .into());
                }
                Ok(())
            }
        }

        impl $crate::Validator<$ty> for $range {
            fn validate(&self, value: &$ty) -> Result<(), $crate::Error> {
                self.check()?;
                $crate::predicate::in_range(value, &<$ty>::from(self.min), &<$ty>::from(self.max))
            }
        }

        impl $crate::Directive for $range {
            type Payload = $ty;

            fn name(&self) -> &str {
                $range_name
            }

            fn materialize(&self, params: &mut $crate::Params<'_>) -> Result<Self, $crate::Error> {
                let configured = Self {
                    min: params.required("min")?,
                    max: params.required("max")?,
                };
                configured.check()?;
                Ok(configured)
            }
        }

        /// Validates that a value is not negative.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $non_negative;

        impl $crate::Validator<$ty> for $non_negative {
            fn validate(&self, value: &$ty) -> Result<(), $crate::Error> {
                $crate::predicate::non_negative(value)
            }
        }

        unit_directive!($non_negative, $non_negative_name, $ty);

        /// Validates that a value is not positive.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $non_positive;

        impl $crate::Validator<$ty> for $non_positive {
            fn validate(&self, value: &$ty) -> Result<(), $crate::Error> {
                $crate::predicate::non_positive(value)
            }
        }

        unit_directive!($non_positive, $non_positive_name, $ty);

        /// Validates that a value is greater than or equal to a minimum.
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        pub struct $min {
            pub min: $bound,
        }

        impl $min {
            pub fn new(min: $bound) -> Self {
                Self { min }
            }
        }

        impl $crate::Validator<$ty> for $min {
            fn validate(&self, value: &$ty) -> Result<(), $crate::Error> {
                $crate::predicate::at_least(value, &<$ty>::from(self.min))
            }
        }

        impl $crate::Directive for $min {
            type Payload = $ty;

            fn name(&self) -> &str {
                $min_name
            }

            fn materialize(&self, params: &mut $crate::Params<'_>) -> Result<Self, $crate::Error> {
                Ok(Self {
                    min: params.required("min")?,
                })
            }
        }

        /// Validates that a value is less than or equal to a maximum.
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        pub struct $max {
            pub max: $bound,
        }

        impl $max {
            pub fn new(max: $bound) -> Self {
                Self { max }
            }
        }

        impl $crate::Validator<$ty> for $max {
            fn validate(&self, value: &$ty) -> Result<(), $crate::Error> {
                $crate::predicate::at_most(value, &<$ty>::from(self.max))
            }
        }

        impl $crate::Directive for $max {
            type Payload = $ty;

            fn name(&self) -> &str {
                $max_name
            }

            fn materialize(&self, params: &mut $crate::Params<'_>) -> Result<Self, $crate::Error> {
                Ok(Self {
                    max: params.required("max")?,
                })
            }
        }

        /// Validates that a value is not zero.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $non_zero;

        impl $crate::Validator<$ty> for $non_zero {
            fn validate(&self, value: &$ty) -> Result<(), $crate::Error> {
                if $crate::predicate::is_zero_value(value) {
                    return Err($crate::ErrorValue::Zero { subject: "value" }.into());
                }
                Ok(())
            }
        }

        unit_directive!($non_zero, $non_zero_name, $ty, zero = "value");

        /// Validates that a value is one of the allowed values.
        ///
        /// In tags the values are separated by `|`, for example `values=1|2|3`.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $one_of {
            pub values: Vec<$bound>,
        }

        impl $one_of {
            pub fn new(values: impl IntoIterator<Item = $bound>) -> Self {
                Self {
                    values: values.into_iter().collect(),
                }
            }
        }

        impl $crate::Validator<$ty> for $one_of {
            fn validate(&self, value: &$ty) -> Result<(), $crate::Error> {
                let allowed: Vec<$ty> = self.values.iter().copied().map(<$ty>::from).collect();
                $crate::predicate::member_of(value, &allowed, "values")
            }
        }

        impl $crate::Directive for $one_of {
            type Payload = $ty;

            fn name(&self) -> &str {
                $one_of_name
            }

            fn materialize(&self, params: &mut $crate::Params<'_>) -> Result<Self, $crate::Error> {
                let $crate::directive::List(values) = params.required("values")?;
                if values.is_empty() {
                    return Err($crate::ConfigError::EmptySet { param: "values" }.into());
                }
                Ok(Self { values })
            }
        }
    };
}

pub(crate) use numeric_directives;
