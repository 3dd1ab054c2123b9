#![cfg_attr(feature = "docs", feature(doc_cfg))]

/*!

# Overview

Valex is a library of type-bound validators and a way to attach them to structured data
with declarative tags on fields.

A [Validator](Validator) checks a single value and either accepts it or returns an [Error](Error).
Validators can be chained with a [CompositeValidator](CompositeValidator), and a [ValidatedValue](ValidatedValue)
refuses to store anything its validator rejects.

Records are validated with [directives](directive::Directive). A directive is a named, configurable
validator that is attached to a field by a tag such as `rangeint,min=0,max=120`. Directives live in
[namespaces](Namespace), the default one is matched by the `val` attribute and holds the
[built-in catalog](directives).

[Spans](span::Keys) contain the path of the field being validated, so any nested field
can be identified from the error alone.

# Basic Usage

```
use valex::Record;

#[derive(Record)]
struct Person {
    #[val("rangeint,min=0,max=120")]
    age: i32,

    #[val("min,size=3")]
    name: String,
}

let person = Person { age: 200, name: "Alice".into() };
let err = valex::validate_struct(&person).unwrap_err();

assert_eq!(err.to_string(), r#"field "age": value 200 is out of range [0, 120]"#);
```

Validators can also be used on their own:

```
use valex::{directives::IntRange, ValidatedValue};

let mut age = ValidatedValue::new(30_i64, IntRange::new(0, 120));

assert!(age.set(200).is_err());
assert_eq!(*age.get(), 30);
```

*/

pub mod directive;
pub mod directives;
pub mod errors;
pub mod field;
pub mod predicate;
pub mod registry;
pub mod span;

#[cfg(feature = "form")]
#[cfg_attr(feature = "docs", doc(cfg(feature = "form")))]
pub mod form;

pub use directive::{Alias, Directive, Mode, Params};
pub use errors::{ConfigError, ConversionError, Error, ErrorKind, ErrorValue};
pub use field::{FieldInfo, FieldValue, Integer, Payload, Record, Value};
pub use registry::{
    default_namespace, process_struct, register_directive, validate_struct, validate_struct_with,
    Namespace, Processor,
};

/**

Macro for deriving [Record](field::Record).

# Attributes

All options are set on fields, the container takes no attributes.
Only structs are supported.

## val

A tag in the default `val` namespace.

The attribute can be repeated, the tags are evaluated in declaration order.

**Example:**

```ignore
#[val("nonempty")]
#[val("max,size=64")]
name: String,
```

## field

A form binding tag, see [form](crate::form).

**Example:**

```ignore
#[field("user_name,required=true")]
name: String,
```

## tag

Tags in arbitrary namespaces, and nested records.

**Options:**

- ns (optional): The namespace key, followed by the tag value.
- nested (optional): Walk the field as a record. The field must implement [Record](field::Record),
`Option<T>` and `Box<T>` of records do.

**Example:**

```ignore
#[tag(ns = "admin", "nonzeroint")]
level: i64,

#[tag(nested)]
address: Address,
```

*/
pub use valex_macros::Record;

/// Types that check a value.
///
/// `Ok(())` means the value is valid, otherwise the error describes why it is not.
///
/// Closures taking a reference to the value are validators as well.
pub trait Validator<T: ?Sized> {
    /// Validate a single value.
    fn validate(&self, value: &T) -> Result<(), Error>;
}

impl<T, F> Validator<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Result<(), Error>,
{
    fn validate(&self, value: &T) -> Result<(), Error> {
        self(value)
    }
}

/// Runs validators in order and returns the first failure.
///
/// Validators after a failing one are not invoked.
pub struct CompositeValidator<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T> + Send + Sync>>,
}

impl<T: ?Sized> CompositeValidator<T> {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Append a validator to the chain.
    pub fn with<V>(mut self, validator: V) -> Self
    where
        V: Validator<T> + Send + Sync + 'static,
    {
        self.push(validator);
        self
    }

    pub fn push<V>(&mut self, validator: V)
    where
        V: Validator<T> + Send + Sync + 'static,
    {
        self.validators.push(Box::new(validator));
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<T: ?Sized> Default for CompositeValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Validator<T> for CompositeValidator<T> {
    fn validate(&self, value: &T) -> Result<(), Error> {
        for validator in &self.validators {
            validator.validate(value)?;
        }
        Ok(())
    }
}

impl<T: ?Sized> core::fmt::Debug for CompositeValidator<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompositeValidator")
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// A value that only accepts updates passing its validator.
///
/// The stored value cannot be changed other than through [set](ValidatedValue::set).
pub struct ValidatedValue<T> {
    value: T,
    validator: Option<Box<dyn Validator<T> + Send + Sync>>,
}

impl<T> ValidatedValue<T> {
    /// Bind an initial value to a validator.
    ///
    /// The initial value is not validated, use [try_new](ValidatedValue::try_new) for that.
    pub fn new<V>(value: T, validator: V) -> Self
    where
        V: Validator<T> + Send + Sync + 'static,
    {
        Self {
            value,
            validator: Some(Box::new(validator)),
        }
    }

    /// Bind an initial value to a validator, validating the value first.
    pub fn try_new<V>(value: T, validator: V) -> Result<Self, Error>
    where
        V: Validator<T> + Send + Sync + 'static,
    {
        validator.validate(&value)?;
        Ok(Self::new(value, validator))
    }

    /// A value without a validator, every [set](ValidatedValue::set) fails until one is bound.
    pub fn unbound(value: T) -> Self {
        Self {
            value,
            validator: None,
        }
    }

    /// Bind a validator, replacing the previous one.
    ///
    /// The current value is kept as is.
    pub fn bind<V>(&mut self, validator: V)
    where
        V: Validator<T> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
    }

    /// Replace the value if it passes the validator.
    ///
    /// On failure the stored value is left unchanged.
    pub fn set(&mut self, value: T) -> Result<(), Error> {
        let validator = match &self.validator {
            Some(v) => v,
            None => return Err(ErrorValue::NoValidator.into()),
        };

        validator.validate(&value)?;
        self.value = value;
        Ok(())
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn is_bound(&self) -> bool {
        self.validator.is_some()
    }
}

impl<T: Default> Default for ValidatedValue<T> {
    fn default() -> Self {
        Self::unbound(T::default())
    }
}

impl<T: core::fmt::Display> core::fmt::Display for ValidatedValue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for ValidatedValue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValidatedValue")
            .field("value", &self.value)
            .field("bound", &self.validator.is_some())
            .finish()
    }
}

/// Return the value if it passes the validator, panic otherwise.
///
/// Meant for values fixed at initialization, such as constants and configuration defaults.
///
/// # Panics
///
/// Panics with the validation error if the value is invalid.
pub fn must_validate<T, V>(value: T, validator: &V) -> T
where
    V: Validator<T> + ?Sized,
{
    if let Err(err) = validator.validate(&value) {
        panic!("validation failed: {}", err);
    }
    value
}
