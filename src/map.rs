//! Ordered table type.
//!
//! This module provides [`Table`], a wrapper around [`IndexMap`] that keeps
//! keys in insertion order. Output shape depends on that order: the encoder
//! never sorts keys, it only moves nested tables after the plain entries.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::{Table, Value};
//!
//! let mut table = Table::new();
//! table.insert("name".to_string(), Value::from("Alice"));
//! table.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;

/// An insertion-ordered map of string keys to values.
///
/// Keys are unique; inserting an existing key replaces its value in place
/// without moving it.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{Table, Value};
///
/// let mut table = Table::new();
/// table.insert("first".to_string(), Value::from(1));
/// table.insert("second".to_string(), Value::from(2));
///
/// let keys: Vec<_> = table.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table(IndexMap<String, crate::Value>);

/// The root table of a decoded or to-be-encoded document.
pub type Document = Table;

impl Table {
    /// Creates an empty `Table`.
    #[must_use]
    pub fn new() -> Self {
        Table(IndexMap::new())
    }

    /// Creates an empty `Table` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Table(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::{Table, Value};
    ///
    /// let mut table = Table::new();
    /// assert!(table.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(table.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut crate::Value> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, shifting later entries down so order is preserved.
    pub fn remove(&mut self, key: &str) -> Option<crate::Value> {
        self.0.shift_remove(key)
    }

    /// Returns the table stored under `key`, inserting an empty one if the
    /// key is vacant.
    ///
    /// Returns `None` when the key already holds a non-table value.
    pub fn table_entry(&mut self, key: &str) -> Option<&mut Table> {
        match self
            .0
            .entry(key.to_string())
            .or_insert_with(|| crate::Value::Table(Table::new()))
        {
            crate::Value::Table(table) => Some(table),
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, crate::Value>> for Table {
    fn from(map: HashMap<String, crate::Value>) -> Self {
        Table(map.into_iter().collect())
    }
}

impl From<Table> for HashMap<String, crate::Value> {
    fn from(table: Table) -> Self {
        table.0.into_iter().collect()
    }
}

impl IntoIterator for Table {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a String, &'a crate::Value);
    type IntoIter = indexmap::map::Iter<'a, String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, crate::Value)> for Table {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        Table(IndexMap::from_iter(iter))
    }
}
