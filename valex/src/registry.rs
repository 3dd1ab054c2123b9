//! Directive namespaces and the processor that evaluates them over records.

use crate::{
    directive::{Directive, DynDirective, Mode, TagSpec},
    directives,
    errors::{ConfigError, Error, ErrorValue},
    field::{FieldInfo, FieldValue, Record, Visitor, VisitorMut},
    span::Keys,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// The tag key of the default namespace.
pub const DEFAULT_KEY: &str = "val";

/// The tag key of form binding options, read by the form binder
/// and never evaluated as directives.
pub const FORM_KEY: &str = "field";

/// A tag key together with the directives it can name.
///
/// Lookups take a shared lock, registration an exclusive one, so a
/// namespace can be extended while other threads validate.
pub struct Namespace {
    key: String,
    directives: RwLock<HashMap<String, Arc<dyn DynDirective>>>,
}

impl Namespace {
    /// An empty namespace matching tags with the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            directives: RwLock::new(HashMap::new()),
        }
    }

    /// A namespace with the whole built-in catalog registered.
    pub fn with_builtins(key: impl Into<String>) -> Self {
        let ns = Self::new(key);
        directives::register_builtins(&ns);
        ns
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Register a directive under its own name.
    ///
    /// A directive already registered with the same name is replaced.
    pub fn register<D: Directive>(&self, directive: D) {
        self.register_dyn(Arc::new(directive));
    }

    /// Register a type-erased directive.
    pub fn register_dyn(&self, directive: Arc<dyn DynDirective>) {
        let name = directive.name().to_string();
        let previous = self.directives.write().insert(name.clone(), directive);

        if previous.is_some() {
            tracing::debug!(namespace = %self.key, directive = %name, "replaced directive");
        } else {
            tracing::trace!(namespace = %self.key, directive = %name, "registered directive");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn DynDirective>> {
        self.directives.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.read().contains_key(name)
    }

    /// The registered directive names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.directives.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.directives.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.read().is_empty()
    }
}

impl core::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Namespace")
            .field("key", &self.key)
            .field("directives", &self.len())
            .finish()
    }
}

static DEFAULT_NAMESPACE: Lazy<Namespace> = Lazy::new(|| {
    let ns = Namespace::with_builtins(DEFAULT_KEY);
    tracing::debug!(directives = ns.len(), "initialized default namespace");
    ns
});

/// The process-wide `val` namespace with the built-in catalog.
pub fn default_namespace() -> &'static Namespace {
    &DEFAULT_NAMESPACE
}

/// Add a directive to the default namespace.
pub fn register_directive<D: Directive>(directive: D) {
    default_namespace().register(directive);
}

/// Evaluates the tags of one or more namespaces over a record.
///
/// Namespaces are evaluated in the given order for every field, fields in
/// declaration order. The first failure stops the processing.
#[derive(Debug)]
pub struct Processor<'n> {
    namespaces: Vec<&'n Namespace>,
    path: Keys,
}

impl<'n> Processor<'n> {
    pub fn new(namespaces: impl IntoIterator<Item = &'n Namespace>) -> Self {
        Self {
            namespaces: namespaces.into_iter().collect(),
            path: Keys::new(),
        }
    }

    /// Evaluate without modifying the record.
    ///
    /// Mutating directives are rejected.
    pub fn validate<R: Record + ?Sized>(&mut self, record: &R) -> Result<(), Error> {
        self.path = Keys::new();
        record.walk(self).map_err(log_failure)
    }

    /// Evaluate and write back the results of mutating directives.
    pub fn process<R: Record + ?Sized>(&mut self, record: &mut R) -> Result<(), Error> {
        self.path = Keys::new();
        record.walk_mut(self).map_err(log_failure)
    }

    fn evaluate(&self, field: &FieldInfo, value: &mut dyn FieldAccess) -> Result<(), Error> {
        for ns in &self.namespaces {
            for tag in field.tags_for(ns.key()) {
                apply(ns, tag, value).map_err(|e| e.with_span(self.path.clone() + field.name))?;
            }
        }
        Ok(())
    }

    fn descend(
        &mut self,
        name: &'static str,
        walk: impl FnOnce(&mut Self) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.path.push(name);
        let res = walk(self);
        self.path.pop();
        res
    }
}

fn log_failure(err: Error) -> Error {
    tracing::debug!(error = %err, "record processing failed");
    err
}

/// Read or write access to a field, depending on the pass.
trait FieldAccess {
    fn value(&self) -> &dyn FieldValue;

    /// `None` during read-only passes.
    fn value_mut(&mut self) -> Option<&mut dyn FieldValue>;
}

impl FieldAccess for &dyn FieldValue {
    fn value(&self) -> &dyn FieldValue {
        *self
    }

    fn value_mut(&mut self) -> Option<&mut dyn FieldValue> {
        None
    }
}

impl FieldAccess for &mut dyn FieldValue {
    fn value(&self) -> &dyn FieldValue {
        &**self
    }

    fn value_mut(&mut self) -> Option<&mut dyn FieldValue> {
        Some(&mut **self)
    }
}

fn apply(ns: &Namespace, tag: &str, field: &mut dyn FieldAccess) -> Result<(), Error> {
    let TagSpec { name, mut params } = TagSpec::parse(tag)?;

    let directive = ns.lookup(name).ok_or_else(|| {
        Error::new(ErrorValue::UnknownDirective {
            name: name.to_string(),
        })
    })?;

    tracing::trace!(namespace = %ns.key(), directive = name, "evaluating directive");

    match directive.mode() {
        Mode::Eval => directive
            .invoke(&mut params, &field.value().payload())
            .map(|_| ()),
        Mode::Mut => {
            let value = field.value_mut().ok_or_else(|| {
                Error::config(ConfigError::MutationRequired {
                    directive: name.to_string(),
                })
            })?;

            let replacement = directive.invoke(&mut params, &value.payload())?;
            match replacement {
                Some(v) => value.assign(v),
                None => Ok(()),
            }
        }
    }
}

impl Visitor for Processor<'_> {
    fn visit_field(&mut self, field: &FieldInfo, value: &dyn FieldValue) -> Result<(), Error> {
        self.evaluate(field, &mut { value })
    }

    fn visit_record(&mut self, name: &'static str, record: &dyn Record) -> Result<(), Error> {
        self.descend(name, |p| record.walk(p))
    }
}

impl VisitorMut for Processor<'_> {
    fn visit_field(&mut self, field: &FieldInfo, value: &mut dyn FieldValue) -> Result<(), Error> {
        self.evaluate(field, &mut { value })
    }

    fn visit_record(&mut self, name: &'static str, record: &mut dyn Record) -> Result<(), Error> {
        self.descend(name, |p| record.walk_mut(p))
    }
}

/// Validate a record against the default namespace.
pub fn validate_struct<R: Record + ?Sized>(record: &R) -> Result<(), Error> {
    Processor::new([default_namespace()]).validate(record)
}

/// Validate a record against additional namespaces, followed by the default one.
pub fn validate_struct_with<R: Record + ?Sized>(
    record: &R,
    extra: &[&Namespace],
) -> Result<(), Error> {
    Processor::new(extra.iter().copied().chain([default_namespace()])).validate(record)
}

/// Evaluate the given namespaces in order, writing back mutations.
pub fn process_struct<R: Record + ?Sized>(
    record: &mut R,
    namespaces: &[&Namespace],
) -> Result<(), Error> {
    Processor::new(namespaces.iter().copied()).process(record)
}
