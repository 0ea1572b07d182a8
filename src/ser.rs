//! Document rendering and Serde serialization.
//!
//! Any `Serialize` type is first turned into a [`Value`] by
//! [`ValueSerializer`], and the resulting root table is written out by
//! [`render_document`].
//!
//! ## Layout
//!
//! Within each table, plain entries come first (in insertion order) as
//! `key = value` lines. Nested tables follow as `[dotted.path]` sections,
//! each preceded by a blank line:
//!
//! ```rust
//! use serde_tomlet::{toml, render_document};
//!
//! let doc = toml!({
//!     "server": { "port": 8080 },
//!     "name": "demo"
//! });
//! let text = render_document(doc.as_table().unwrap()).unwrap();
//! assert_eq!(text, "name = \"demo\"\n\n[server]\nport = 8080");
//! ```
//!
//! ## Serde mapping
//!
//! - structs and maps become tables; map keys must serialize as strings
//! - `None` struct fields and map entries are left out
//! - unit variants become strings, other variants a one-entry table
//! - `()`, unit structs and `None` anywhere else are rejected

use crate::codec::{self, encode, encode_key};
use crate::value::DATETIME_MARKER;
use crate::{Error, Result, Table, Value};
use serde::{ser, Serialize};
use tracing::debug;

/// Renders a table as document text.
///
/// There is no trailing newline; an empty table renders as `""`.
///
/// # Errors
///
/// [`Error::UnsupportedType`] if a table appears inside an array.
pub fn render_document(table: &Table) -> Result<String> {
    let text = render_table(table, "")?;
    debug!(entries = table.len(), bytes = text.len(), "rendered document");
    Ok(text)
}

fn render_table(table: &Table, prefix: &str) -> Result<String> {
    let (sections, entries): (Vec<_>, Vec<_>) =
        table.iter().partition(|(_, value)| value.is_table());

    let mut lines = Vec::with_capacity(entries.len() + 2 * sections.len());
    for (key, value) in entries {
        lines.push(format!("{} = {}", encode_key(key), encode(value)?));
    }
    for (key, value) in sections {
        if let Value::Table(nested) = value {
            let title = format!("{prefix}{}", encode_key(key));
            lines.push(format!("\n[{title}]"));
            lines.push(render_table(nested, &format!("{title}."))?);
        }
    }
    Ok(lines.join("\n"))
}

/// Converts any `Serialize` value into a [`Value`].
///
/// # Errors
///
/// Returns an error for units, top-level `None`, non-string map keys and
/// integers beyond `i64`.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use serde_tomlet::{to_value, Value};
///
/// #[derive(Serialize)]
/// struct Point { x: i32, label: Option<String> }
///
/// let value = to_value(&Point { x: 1, label: None }).unwrap();
/// let table = value.as_table().unwrap();
/// assert_eq!(table.get("x"), Some(&Value::Integer(1)));
/// assert!(!table.contains_key("label"));
/// ```
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Serializer producing a [`Value`] tree.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: Table,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

/// Wraps `value` as `{ variant = value }`.
fn tagged(variant: &'static str, value: Value) -> Value {
    let mut table = Table::with_capacity(1);
    table.insert(variant.to_string(), value);
    Value::Table(table)
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| Error::unsupported_type("u64 value out of range for a 64-bit signed integer"))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Array(v.iter().map(|&b| Value::from(b)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Err(Error::UnsupportedNone)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Err(Error::unsupported_type("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Err(Error::unsupported_type(&format!("unit struct {name}")))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(self)?;
        if name != DATETIME_MARKER {
            return Ok(inner);
        }
        match inner {
            Value::String(text) => codec::decode_datetime_str(&text)
                .ok_or_else(|| Error::custom(format!("malformed date-time {text:?}"))),
            other => Ok(other),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len.unwrap_or(0), None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let array = Value::Array(self.vec);
        match self.variant {
            Some(variant) => tagged(variant, array),
            None => array,
        }
    }
}

impl SerializeMap {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: Table::with_capacity(capacity),
            current_key: None,
            variant,
        }
    }

    /// Inserts an entry, dropping it if the value itself is `None`.
    ///
    /// A `None` nested deeper in the value still fails with
    /// [`Error::UnsupportedNone`].
    fn insert<T>(&mut self, key: String, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if is_none(value) {
            return Ok(());
        }
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let table = Value::Table(self.map);
        match self.variant {
            Some(variant) => tagged(variant, table),
            None => table,
        }
    }
}

fn is_none<T>(value: &T) -> bool
where
    T: ?Sized + Serialize,
{
    value.serialize(NoneCheck).unwrap_or(false)
}

/// Answers whether a value serializes as a bare `None`, without looking
/// inside it.
struct NoneCheck;

type NotNone = ser::Impossible<bool, Error>;

fn not_none<T>() -> Result<T> {
    Err(Error::custom("not none"))
}

impl ser::Serializer for NoneCheck {
    type Ok = bool;
    type Error = Error;

    type SerializeSeq = NotNone;
    type SerializeTuple = NotNone;
    type SerializeTupleStruct = NotNone;
    type SerializeTupleVariant = NotNone;
    type SerializeMap = NotNone;
    type SerializeStruct = NotNone;
    type SerializeStructVariant = NotNone;

    fn serialize_bool(self, _v: bool) -> Result<bool> {
        Ok(false)
    }

    fn serialize_i8(self, _v: i8) -> Result<bool> {
        Ok(false)
    }

    fn serialize_i16(self, _v: i16) -> Result<bool> {
        Ok(false)
    }

    fn serialize_i32(self, _v: i32) -> Result<bool> {
        Ok(false)
    }

    fn serialize_i64(self, _v: i64) -> Result<bool> {
        Ok(false)
    }

    fn serialize_u8(self, _v: u8) -> Result<bool> {
        Ok(false)
    }

    fn serialize_u16(self, _v: u16) -> Result<bool> {
        Ok(false)
    }

    fn serialize_u32(self, _v: u32) -> Result<bool> {
        Ok(false)
    }

    fn serialize_u64(self, _v: u64) -> Result<bool> {
        Ok(false)
    }

    fn serialize_f32(self, _v: f32) -> Result<bool> {
        Ok(false)
    }

    fn serialize_f64(self, _v: f64) -> Result<bool> {
        Ok(false)
    }

    fn serialize_char(self, _v: char) -> Result<bool> {
        Ok(false)
    }

    fn serialize_str(self, _v: &str) -> Result<bool> {
        Ok(false)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<bool> {
        Ok(false)
    }

    fn serialize_none(self) -> Result<bool> {
        Ok(true)
    }

    fn serialize_some<T>(self, _value: &T) -> Result<bool>
    where
        T: ?Sized + Serialize,
    {
        Ok(false)
    }

    fn serialize_unit(self) -> Result<bool> {
        Ok(false)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<bool> {
        Ok(false)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<bool> {
        Ok(false)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<bool>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<bool>
    where
        T: ?Sized + Serialize,
    {
        Ok(false)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<NotNone> {
        not_none()
    }

    fn serialize_tuple(self, _len: usize) -> Result<NotNone> {
        not_none()
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<NotNone> {
        not_none()
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<NotNone> {
        not_none()
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<NotNone> {
        not_none()
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<NotNone> {
        not_none()
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<NotNone> {
        not_none()
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            Value::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            other => Err(Error::unsupported_type(&format!(
                "map key of type {}; keys must be strings",
                other.type_name()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.insert(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.insert(key.to_string(), value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.insert(key.to_string(), value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toml;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[test]
    fn test_scalars_before_sections() {
        let doc = toml!({
            "a": { "x": 1 },
            "b": 2
        });
        let text = render_document(doc.as_table().unwrap()).unwrap();
        assert_eq!(text, "b = 2\n\n[a]\nx = 1");
    }

    #[test]
    fn test_leading_section_gets_blank_line() {
        let doc = toml!({ "only": { "k": "v" } });
        let text = render_document(doc.as_table().unwrap()).unwrap();
        assert_eq!(text, "\n[only]\nk = \"v\"");
    }

    #[test]
    fn test_empty_section_and_empty_document() {
        assert_eq!(render_document(&Table::new()).unwrap(), "");
        let doc = toml!({ "empty": {} });
        let text = render_document(doc.as_table().unwrap()).unwrap();
        assert_eq!(text, "\n[empty]\n");
    }

    #[test]
    fn test_section_titles_quote_keys() {
        let doc = toml!({ "t": { "b.c": { "e": 5 } } });
        let text = render_document(doc.as_table().unwrap()).unwrap();
        assert_eq!(text, "\n[t]\n\n[t.\"b.c\"]\ne = 5");
    }

    #[test]
    fn test_table_in_array_rejected() {
        let doc = toml!({ "list": [{ "a": 1 }] });
        let err = render_document(doc.as_table().unwrap()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[derive(Serialize)]
    enum Shape {
        Unit,
        Circle(f64),
        Rect { w: i32, h: i32 },
    }

    #[test]
    fn test_enum_variants() {
        assert_eq!(to_value(&Shape::Unit).unwrap(), Value::from("Unit"));
        assert_eq!(
            to_value(&Shape::Circle(1.5)).unwrap(),
            toml!({ "Circle": 1.5 })
        );
        assert_eq!(
            to_value(&Shape::Rect { w: 2, h: 3 }).unwrap(),
            toml!({ "Rect": { "w": 2, "h": 3 } })
        );
    }

    #[test]
    fn test_none_handling() {
        let mut map = BTreeMap::new();
        map.insert("kept", Some(1));
        map.insert("dropped", None);
        assert_eq!(to_value(&map).unwrap(), toml!({ "kept": 1 }));

        assert!(matches!(
            to_value(&vec![Some(1), None]),
            Err(Error::UnsupportedNone)
        ));
        assert!(matches!(to_value(&None::<i32>), Err(Error::UnsupportedNone)));
    }

    #[derive(Serialize)]
    struct Samples {
        name: &'static str,
        samples: Vec<Option<i32>>,
        label: Option<&'static str>,
    }

    #[test]
    fn test_nested_none_is_not_dropped() {
        let samples = Samples {
            name: "x",
            samples: vec![Some(1), None],
            label: None,
        };
        assert!(matches!(to_value(&samples), Err(Error::UnsupportedNone)));

        let ok = Samples {
            samples: vec![Some(1), Some(2)],
            ..samples
        };
        assert_eq!(
            to_value(&ok).unwrap(),
            toml!({ "name": "x", "samples": [1, 2] })
        );

        let mut map = BTreeMap::new();
        map.insert("values", vec![None, Some(3)]);
        assert!(matches!(to_value(&map), Err(Error::UnsupportedNone)));

        let mut nested = BTreeMap::new();
        nested.insert("inner", Some(Some(None::<i32>)));
        assert!(matches!(to_value(&nested), Err(Error::UnsupportedNone)));
    }

    #[test]
    fn test_rejected_types() {
        assert!(matches!(to_value(&()), Err(Error::UnsupportedType(_))));
        assert!(to_value(&u64::MAX).is_err());

        let mut map = BTreeMap::new();
        map.insert(1, "one");
        assert!(matches!(to_value(&map), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_datetime_survives_value_round_trip() {
        let date = chrono::NaiveDate::from_ymd_opt(1979, 5, 27).unwrap();
        let value = Value::LocalDate(date);
        assert_eq!(to_value(&value).unwrap(), value);
    }
}
