//! # serde_tomlet
//!
//! A Serde-compatible codec for a compact subset of TOML.
//!
//! Text goes in, an insertion-ordered [`Table`] of [`Value`]s comes out;
//! a table goes in, conforming text comes out. Any type implementing
//! `Serialize`/`Deserialize` can ride on top of that.
//!
//! ## Supported Syntax
//!
//! - basic (`"…"`) and literal (`'…'`) strings, plus their `"""`/`'''`
//!   multi-line forms
//! - integers with `_` separators, floats, `inf`/`nan`, booleans
//! - offset and local date-times, local dates and local times
//! - arrays (nested, mixed, multi-line)
//! - `[dotted."quoted".headers]`
//!
//! Inline tables are recognised and skipped. Arrays of tables, dotted keys
//! on the left of `=` and strict duplicate-key checks are not supported.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_tomlet::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Database {
//!     server: String,
//!     ports: Vec<u16>,
//!     enabled: bool,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Config {
//!     title: String,
//!     database: Database,
//! }
//!
//! let config = Config {
//!     title: "example".to_string(),
//!     database: Database {
//!         server: "192.168.1.1".to_string(),
//!         ports: vec![8000, 8001],
//!         enabled: true,
//!     },
//! };
//!
//! let text = to_string(&config).unwrap();
//! assert_eq!(
//!     text,
//!     "title = \"example\"\n\n[database]\nserver = \"192.168.1.1\"\nports = [ 8000, 8001 ]\nenabled = true"
//! );
//!
//! let back: Config = from_str(&text).unwrap();
//! assert_eq!(config, back);
//! ```
//!
//! ## Dynamic Values
//!
//! ```rust
//! use serde_tomlet::{decode, render_document, Value};
//!
//! let doc = decode("[owner]\nname = \"Tom\"\ndob = 1979-05-27T07:32:00-08:00").unwrap();
//! let dob = doc.get("owner").and_then(|o| o.as_table()).and_then(|o| o.get("dob"));
//! assert!(matches!(dob, Some(Value::OffsetDatetime(_))));
//!
//! // Offsets are normalised to UTC on the way out.
//! assert_eq!(
//!     render_document(&doc).unwrap(),
//!     "\n[owner]\nname = \"Tom\"\ndob = 1979-05-27T15:32:00Z"
//! );
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events: `trace` per token, `debug` when a
//! table is opened, an inline table is skipped, or a document is finished.
//! Nothing is printed unless the application installs a subscriber.

pub mod codec;
pub mod de;
pub mod error;
pub mod lexer;
pub mod macros;
pub mod map;
pub mod parser;
pub mod ser;
pub mod value;

pub use codec::{encode, encode_key};
pub use de::{Deserializer, ValueDeserializer};
pub use error::{Error, Result};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use map::{Document, Table};
pub use parser::{decode, parse};
pub use ser::{render_document, to_value, ValueSerializer};
pub use value::Value;

use serde::{Deserialize, Serialize};
use std::io;

/// Serialize any `T: Serialize` to document text.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert_eq!(to_string(&Point { x: 1, y: 2 }).unwrap(), "x = 1\ny = 2");
/// ```
///
/// # Errors
///
/// [`Error::UnsupportedType`] if `value` does not serialize to a table, or
/// contains something the format cannot express.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    match to_value(value)? {
        Value::Table(table) => render_document(&table),
        other => Err(Error::unsupported_type(&format!(
            "document root must be a table, found {}",
            other.type_name()
        ))),
    }
}

/// Serialize any `T: Serialize` to a writer.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::to_writer;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(buffer, b"x = 1\ny = 2");
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(mut writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string(value)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Deserialize an instance of type `T` from document text.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("x = 1\ny = 2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the text does not decode or the result does not fit
/// `T`. Decoding errors carry line and column.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<'a, T>(s: &'a str) -> Result<T>
where
    T: Deserialize<'a>,
{
    T::deserialize(Deserializer::from_str(s))
}

/// Deserialize an instance of type `T` from an I/O stream.
///
/// # Errors
///
/// Returns an error if reading fails, the input does not decode, or the
/// result does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: for<'de> Deserialize<'de>,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Deserialize an instance of type `T` from UTF-8 bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, do not decode, or do
/// not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<'a, T>(v: &'a [u8]) -> Result<T>
where
    T: Deserialize<'a>,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Deserialize an instance of type `T` from a [`Value`].
///
/// # Errors
///
/// Returns an error if the value does not fit `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(ValueDeserializer::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::io::Cursor;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
        home: Option<Point>,
    }

    #[test]
    fn test_serialize_deserialize_point() {
        let point = Point { x: 1, y: -2 };
        let text = to_string(&point).unwrap();
        assert_eq!(text, "x = 1\ny = -2");
        let point_back: Point = from_str(&text).unwrap();
        assert_eq!(point, point_back);
    }

    #[test]
    fn test_serialize_deserialize_user() {
        let user = User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
            home: Some(Point { x: 3, y: 4 }),
        };

        let text = to_string(&user).unwrap();
        let user_back: User = from_str(&text).unwrap();
        assert_eq!(user, user_back);
    }

    #[test]
    fn test_none_field_omitted() {
        let user = User {
            id: 1,
            name: "Bob".to_string(),
            active: false,
            tags: vec![],
            home: None,
        };
        let text = to_string(&user).unwrap();
        assert!(!text.contains("home"));
        let user_back: User = from_str(&text).unwrap();
        assert_eq!(user, user_back);
    }

    #[test]
    fn test_non_table_root_rejected() {
        assert!(matches!(to_string(&vec![1, 2]), Err(Error::UnsupportedType(_))));
        assert!(matches!(to_string(&5), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_reader_and_slice() {
        let point: Point = from_reader(Cursor::new(b"x = 1\ny = 2")).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
        let point: Point = from_slice(b"x = 3\ny = 4").unwrap();
        assert_eq!(point, Point { x: 3, y: 4 });
        assert!(from_slice::<Point>(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_to_value_and_back() {
        let point = Point { x: 1, y: 2 };
        let value = to_value(&point).unwrap();
        assert_eq!(value, toml!({ "x": 1, "y": 2 }));
        assert_eq!(from_value::<Point>(value).unwrap(), point);
    }
}
