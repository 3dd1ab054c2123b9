/*!
Binding of URL-encoded form values to records.

Fields are bound by `field` tags, each tag holds the lookup key followed by options:

```text
key[,max=N][,required=BOOL][,default=VALUE]
```

- key: The form key, the field name is used if it is empty.
- max (optional): The maximum number of values accepted, 1 by default.
- required (optional): Missing or empty values are an error, false by default.
- default (optional): Raw value bound when the key is missing or empty.

After binding the record is processed with the `val` namespace.

```
use valex::{form::validate_form, Record};

#[derive(Default, Record)]
struct Signup {
    #[field("user")]
    #[val("min,size=3")]
    name: String,

    #[field("age,required=true")]
    #[val("rangeint,min=18,max=130")]
    age: u32,

    #[field("tags,max=3")]
    tags: Vec<String>,
}

let mut signup = Signup::default();
validate_form("user=alice&age=30&tags=a&tags=b", &mut signup).unwrap();
assert_eq!(signup.tags, ["a", "b"]);

let err = validate_form("user=alice", &mut Signup::default()).unwrap_err();
assert_eq!(err.status_code(), 422);
```
*/

use crate::{
    directive::{split_pair, Params},
    errors::{ConfigError, Error, ErrorValue},
    field::{FieldInfo, FieldValue, Record, VisitorMut},
    registry::{default_namespace, Namespace, Processor, FORM_KEY},
    span::Keys,
};
use http::{header::CONTENT_TYPE, Method, Request, StatusCode, Uri};
use std::collections::HashMap;
use url::{form_urlencoded, Url};

/// String keys mapped to one or more string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: HashMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body or query string.
    pub fn parse(input: &str) -> Self {
        Self::parse_bytes(input.as_bytes())
    }

    pub fn parse_bytes(input: &[u8]) -> Self {
        form_urlencoded::parse(input).collect()
    }

    /// The query parameters of a URL.
    pub fn from_query(url: &Url) -> Self {
        url.query_pairs().collect()
    }

    /// The query parameters of a request URI.
    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    /// The query parameters of a request, followed by the URL-encoded body
    /// for `POST`, `PUT` and `PATCH` requests.
    ///
    /// Body values come first for keys present in both.
    pub fn from_request<B: AsRef<[u8]>>(req: &Request<B>) -> Self {
        let query = Self::from_uri(req.uri());

        let has_form_body = matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH)
            && req
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim_start().starts_with("application/x-www-form-urlencoded"))
                .unwrap_or(false);

        if !has_form_body {
            return query;
        }

        let mut values = Self::parse_bytes(req.body().as_ref());
        values.extend(query);
        values
    }

    /// Append a value to a key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Replace all values of a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), vec![value.into()]);
    }

    /// The first value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values of a key, empty if it is missing.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.values.remove(key)
    }

    /// The number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append all values of another instance.
    pub fn extend(&mut self, other: FormValues) {
        for (key, values) in other.values {
            self.values.entry(key).or_default().extend(values);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FormValues::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

/// Binding options of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOptions {
    pub key: String,
    pub max: usize,
    pub required: bool,
    pub default: Option<String>,
}

impl FieldOptions {
    /// Parse a `field` tag, `field_name` is the key if the tag does not name one.
    ///
    /// Blank options are skipped, options that are not `key=value` pairs are an error.
    pub fn parse(tag: &str, field_name: &str) -> Result<Self, Error> {
        let mut parts = tag.split(',');
        let key = parts.next().unwrap_or_default().trim();

        let mut params = Params::new();
        for pair in parts.filter(|p| !p.trim().is_empty()) {
            let (k, v) = split_pair(tag, pair)?;
            params = params.with(k, v);
        }

        let max = match params.optional::<i64>("max")? {
            Some(max) if max <= 0 => {
                return Err(ConfigError::InvalidParam {
                    param: "max",
                    reason: "must be positive".into(),
                }
                .into())
            }
            Some(max) => max as usize,
            None => 1,
        };

        let required = params.optional("required")?.unwrap_or(false);
        let default = params.optional("default")?;
        let key_override = params.optional::<String>("key")?;

        params.finish(FORM_KEY)?;

        let key = match key_override {
            Some(k) => k,
            None if key.is_empty() => field_name.to_string(),
            None => key.to_string(),
        };

        Ok(Self {
            key,
            max,
            required,
            default,
        })
    }

    /// Bind the matching form values to a field.
    pub fn bind(&self, values: &FormValues, field: &mut dyn FieldValue) -> Result<(), Error> {
        let raw = values.get_all(&self.key);

        if raw.first().map(|v| v.is_empty()).unwrap_or(true) {
            if self.required {
                return Err(ErrorValue::Required.into());
            }

            return match &self.default {
                Some(default) => field.bind_raw(&[default.clone()]),
                None => Ok(()),
            };
        }

        if raw.len() > self.max {
            return Err(ErrorValue::TooManyValues {
                count: raw.len(),
                max: self.max,
            }
            .into());
        }

        field.bind_raw(raw)
    }
}

/// Populates tagged fields from form values.
struct Binder<'v> {
    values: &'v FormValues,
    path: Keys,
}

impl VisitorMut for Binder<'_> {
    fn visit_field(&mut self, field: &FieldInfo, value: &mut dyn FieldValue) -> Result<(), Error> {
        let span = || self.path.clone() + field.name;

        for tag in field.tags_for(FORM_KEY) {
            let opts = FieldOptions::parse(tag, field.name).map_err(|e| e.with_span(span()))?;
            opts.bind(self.values, &mut *value)
                .map_err(|e| e.with_span(span()))?;
        }
        Ok(())
    }

    fn visit_record(&mut self, name: &'static str, record: &mut dyn Record) -> Result<(), Error> {
        self.path.push(name);
        let res = record.walk_mut(self);
        self.path.pop();
        res
    }
}

/// Bind form values to a record, without any validation.
pub fn bind<R: Record + ?Sized>(values: &FormValues, dst: &mut R) -> Result<(), Error> {
    let mut binder = Binder {
        values,
        path: Keys::new(),
    };
    dst.walk_mut(&mut binder)
}

/// Binds form values to a record, then processes it.
///
/// Extra namespaces are processed before the default one.
#[derive(Debug)]
pub struct FormValidator<'n> {
    values: FormValues,
    namespaces: Vec<&'n Namespace>,
}

impl<'n> FormValidator<'n> {
    pub fn new(values: FormValues) -> Self {
        Self {
            values,
            namespaces: Vec::new(),
        }
    }

    /// Form values of a request, see [from_request](FormValues::from_request).
    pub fn from_request<B: AsRef<[u8]>>(req: &Request<B>) -> Self {
        Self::new(FormValues::from_request(req))
    }

    pub fn with_namespace(mut self, ns: &'n Namespace) -> Self {
        self.namespaces.push(ns);
        self
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn validate<R: Record + ?Sized>(&self, dst: &mut R) -> Result<(), Error> {
        bind(&self.values, dst).map_err(|err| {
            tracing::debug!(error = %err, "form binding failed");
            err
        })?;

        let namespaces = self
            .namespaces
            .iter()
            .copied()
            .chain([default_namespace()]);
        Processor::new(namespaces).process(dst)
    }
}

/// An error with the HTTP status it maps to.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{source}")]
pub struct FormError {
    status: StatusCode,
    source: Error,
}

impl FormError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn error(&self) -> &Error {
        &self.source
    }

    pub fn into_error(self) -> Error {
        self.source
    }
}

impl From<Error> for FormError {
    fn from(err: Error) -> Self {
        Self {
            status: form_status(Some(&err)),
            source: err,
        }
    }
}

/// The status of a form processing outcome.
///
/// Rejected values and missing required fields are `422 Unprocessable Entity`,
/// anything else that went wrong is `400 Bad Request`.
pub fn form_status(err: Option<&Error>) -> StatusCode {
    match err {
        None => StatusCode::OK,
        Some(err) if err.is_validation() || err.value == ErrorValue::Required => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Some(_) => StatusCode::BAD_REQUEST,
    }
}

/// Bind and validate a URL-encoded body.
pub fn validate_form<R: Record + ?Sized>(body: &str, dst: &mut R) -> Result<(), FormError> {
    FormValidator::new(FormValues::parse(body))
        .validate(dst)
        .map_err(FormError::from)
}

/// Bind and validate the form values of a request.
pub fn validate_request<B, R>(req: &Request<B>, dst: &mut R) -> Result<(), FormError>
where
    B: AsRef<[u8]>,
    R: Record + ?Sized,
{
    FormValidator::from_request(req)
        .validate(dst)
        .map_err(FormError::from)
}
