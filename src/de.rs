//! Serde deserialization.
//!
//! Text is decoded into a [`Table`] first; [`ValueDeserializer`] then
//! drives the visitor over that tree.
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_tomlet::from_str;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Server { host: String, port: u16 }
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Config { name: String, server: Server }
//!
//! let config: Config = from_str("name = 'demo'\n[server]\nhost = \"::1\"\nport = 8080").unwrap();
//! assert_eq!(config.server.port, 8080);
//! ```
//!
//! Date/time values reach visitors as their rendered text, so they
//! deserialize into `String` or any type that parses one, such as chrono's.

use crate::codec;
use crate::{Error, Result, Table, Value};
use serde::de::{self, IntoDeserializer};
use serde::forward_to_deserialize_any;

/// Deserializer over document text.
pub struct Deserializer<'de> {
    input: &'de str,
}

impl<'de> Deserializer<'de> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'de str) -> Self {
        Deserializer { input }
    }
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let root = crate::parser::decode(self.input)?;
        ValueDeserializer::new(Value::Table(root)).deserialize_any(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

/// Deserializer over an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::OffsetDatetime(dt) => visitor.visit_string(codec::format_offset_datetime(&dt)),
            Value::LocalDatetime(dt) => visitor.visit_string(codec::format_local_datetime(&dt)),
            Value::LocalDate(d) => visitor.visit_string(codec::format_local_date(&d)),
            Value::LocalTime(t) => visitor.visit_string(codec::format_local_time(&t)),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Table(table) => visitor.visit_map(MapDeserializer::new(table)),
        }
    }

    /// A present value is always `Some`; absent struct fields become `None`
    /// through serde's missing-field handling.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Table(table) if table.len() == 1 => match table.into_iter().next() {
                Some((variant, value)) => visitor.visit_enum(EnumDeserializer::new(variant, value)),
                None => Err(Error::custom("Expected enum variant")),
            },
            other => Err(Error::custom(format!(
                "Expected enum as string or single-entry table, found {}",
                other.type_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(table: Table) -> Self {
        MapDeserializer {
            iter: table.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl EnumDeserializer {
    fn new(variant: String, value: Value) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Err(Error::custom("Expected unit variant as a bare string"))
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(Error::custom("Expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Table(table) => visitor.visit_map(MapDeserializer::new(table)),
            _ => Err(Error::custom("Expected struct variant")),
        }
    }
}
