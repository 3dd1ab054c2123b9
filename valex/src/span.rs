//! Field paths attached to errors during record processing.

use std::ops::Add;

#[cfg(feature = "smallvec")]
type KeysSmallVecArray = [&'static str; 8];

#[cfg(feature = "smallvec")]
/// Records are rarely nested deeper than a handful of levels,
/// so the path usually stays on the stack.
type KeysInner = smallvec_crate::SmallVec<KeysSmallVecArray>;

#[cfg(not(feature = "smallvec"))]
type KeysInner = Vec<&'static str>;

/// A path consisting of consecutive field names, outermost first.
///
/// Field names come from the derived [Record](crate::Record) implementations,
/// so they are always `'static`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Keys(KeysInner);

impl Keys {
    /// Create a new instance with no keys.
    pub fn new() -> Self {
        Keys(KeysInner::new())
    }

    /// Iterator over the keys.
    pub fn iter(&self) -> impl Iterator<Item = &&'static str> {
        self.0.iter()
    }

    /// Returns the keys joined by dots.
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// Add a new key.
    pub fn push(&mut self, key: &'static str) {
        self.0.push(key)
    }

    /// Remove the innermost key.
    pub fn pop(&mut self) -> Option<&'static str> {
        self.0.pop()
    }

    /// The number of keys in the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path is empty, that is it points to the record itself.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Add<&'static str> for Keys {
    type Output = Self;
    fn add(mut self, rhs: &'static str) -> Self::Output {
        self.push(rhs);
        self
    }
}

impl core::fmt::Display for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, k) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            f.write_str(k)?;
        }
        Ok(())
    }
}
