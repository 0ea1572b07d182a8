//! Dynamic value representation.
//!
//! This module provides the [`Value`] enum: the tagged union every decoded
//! document is made of and every encoded document is rendered from.
//!
//! ## Core Types
//!
//! - [`Value`]: string, integer, float, boolean, the four date/time kinds,
//!   array, and table
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use serde_tomlet::{toml, Value};
//!
//! let boolean = Value::from(true);
//! let number = Value::from(42);
//! let text = Value::from("hello");
//!
//! let table = toml!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(table.is_table());
//! ```
//!
//! ### Extracting Values
//!
//! ```rust
//! use serde_tomlet::Value;
//! use std::convert::TryFrom;
//!
//! let value = Value::from(42);
//! let num: i64 = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```

use crate::codec;
use crate::Table;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Newtype name under which date/time values are serialized.
pub(crate) const DATETIME_MARKER: &str = "$__serde_tomlet_private_datetime";

/// A dynamically-typed representation of any value in a document.
///
/// Arrays may mix element kinds freely. Tables keep insertion order.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::Value;
///
/// let num = Value::Integer(42);
/// let text = Value::String("hello".to_string());
///
/// assert!(num.is_integer());
/// assert!(text.is_str());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Date-time carrying a UTC offset.
    OffsetDatetime(DateTime<FixedOffset>),
    /// Date-time with no timezone information.
    LocalDatetime(NaiveDateTime),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    Array(Vec<Value>),
    Table(Table),
}

impl Value {
    /// Human readable name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::OffsetDatetime(_) => "offset datetime",
            Value::LocalDatetime(_) => "local datetime",
            Value::LocalDate(_) => "local date",
            Value::LocalTime(_) => "local time",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_str(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    /// Returns `true` for any of the four date/time kinds.
    #[inline]
    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(
            self,
            Value::OffsetDatetime(_)
                | Value::LocalDatetime(_)
                | Value::LocalDate(_)
                | Value::LocalTime(_)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Returns `true` if the value is not an array or table.
    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Table(_))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as `f64`, widening integers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::Value;
    ///
    /// assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
    /// assert_eq!(Value::Integer(2).as_float(), Some(2.0));
    /// assert_eq!(Value::from("2").as_float(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    #[inline]
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Follows a dotted path of keys through nested tables.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::decode;
    ///
    /// let doc = decode("[server.http]\nport = 8080").unwrap();
    /// let port = serde_tomlet::Value::Table(doc).pointer(&["server", "http", "port"]).cloned();
    /// assert_eq!(port, Some(serde_tomlet::Value::Integer(8080)));
    /// ```
    #[must_use]
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |value, key| value.as_table()?.get(key))
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            // Other formats see a plain string; `ValueSerializer` recognises
            // the marker and restores the date/time kind.
            Value::OffsetDatetime(dt) => serializer
                .serialize_newtype_struct(DATETIME_MARKER, &codec::format_offset_datetime(dt)),
            Value::LocalDatetime(dt) => serializer
                .serialize_newtype_struct(DATETIME_MARKER, &codec::format_local_datetime(dt)),
            Value::LocalDate(d) => {
                serializer.serialize_newtype_struct(DATETIME_MARKER, &codec::format_local_date(d))
            }
            Value::LocalTime(t) => {
                serializer.serialize_newtype_struct(DATETIME_MARKER, &codec::format_local_time(t))
            }
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Table(table) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(table.len()))?;
                for (k, v) in table.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid TOML value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Boolean(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(Value::Integer)
                    .map_err(|_| E::custom(format!("integer {value} out of range for i64")))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Err(E::custom("null has no TOML representation"))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Err(E::custom("null has no TOML representation"))
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = Table::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Table(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(crate::Error::custom(format!(
                "expected integer, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(crate::Error::custom(format!(
                "expected float, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(crate::Error::custom(format!(
                "expected boolean, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(crate::Error::custom(format!(
                "expected string, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for Table {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Table(table) => Ok(table),
            other => Err(crate::Error::custom(format!(
                "expected table, found {}",
                other.type_name()
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Value::Table(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::OffsetDatetime(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::OffsetDatetime(value.with_timezone(&Utc.fix()))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::LocalDatetime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::LocalDate(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::LocalTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::convert::TryFrom;

    #[test]
    fn test_tryfrom_i64() {
        let result: i64 = TryFrom::try_from(Value::Integer(42)).unwrap();
        assert_eq!(result, 42);

        assert!(i64::try_from(Value::Float(42.0)).is_err());
        assert!(i64::try_from(Value::String("test".to_string())).is_err());
    }

    #[test]
    fn test_tryfrom_f64() {
        let result: f64 = TryFrom::try_from(Value::Float(3.5)).unwrap();
        assert_eq!(result, 3.5);

        let result: f64 = TryFrom::try_from(Value::Integer(42)).unwrap();
        assert_eq!(result, 42.0);
    }

    #[test]
    fn test_tryfrom_bool_and_string() {
        assert!(bool::try_from(Value::Boolean(true)).unwrap());
        assert!(bool::try_from(Value::Integer(1)).is_err());

        assert_eq!(String::try_from(Value::from("hello")).unwrap(), "hello");
        assert!(String::try_from(Value::Integer(42)).is_err());
    }

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from(42u8), Value::Integer(42));
        assert_eq!(Value::from(3.5f64), Value::Float(3.5));
        assert_eq!(Value::from("test"), Value::String("test".to_string()));
    }

    #[test]
    fn test_from_chrono() {
        let date = NaiveDate::from_ymd_opt(1979, 5, 27).unwrap();
        assert_eq!(Value::from(date), Value::LocalDate(date));

        let utc = Utc.with_ymd_and_hms(1979, 5, 27, 7, 32, 0).unwrap();
        match Value::from(utc) {
            Value::OffsetDatetime(dt) => {
                assert_eq!(dt.offset().local_minus_utc(), 0);
                assert_eq!(dt.naive_utc(), utc.naive_utc());
            }
            other => panic!("Expected offset datetime, got {other:?}"),
        }
    }

    #[test]
    fn test_pointer_walks_tables() {
        let mut inner = Table::new();
        inner.insert("port".to_string(), Value::from(80));
        let mut root = Table::new();
        root.insert("server".to_string(), Value::Table(inner));
        let root = Value::Table(root);

        assert_eq!(root.pointer(&["server", "port"]), Some(&Value::Integer(80)));
        assert_eq!(root.pointer(&["server", "host"]), None);
        assert_eq!(root.pointer(&["server", "port", "x"]), None);
        assert_eq!(root.pointer(&[]), Some(&root));
    }

    #[test]
    fn test_scalar_classification() {
        assert!(Value::from(1).is_scalar());
        assert!(Value::LocalTime(NaiveTime::from_hms_opt(1, 2, 3).unwrap()).is_datetime());
        assert!(!Value::Array(vec![]).is_scalar());
        assert!(!Value::Table(Table::new()).is_scalar());
    }

    #[test]
    fn test_deserialize_u64_range() {
        use serde::de::value::{Error as DeError, U64Deserializer};
        use serde::de::IntoDeserializer;

        let small: U64Deserializer<DeError> = 7u64.into_deserializer();
        assert_eq!(Value::deserialize(small).unwrap(), Value::Integer(7));

        let large: U64Deserializer<DeError> = u64::MAX.into_deserializer();
        assert!(Value::deserialize(large).is_err());
    }
}
