//! Scalar conversion between lexemes and [`Value`]s.
//!
//! Decoding turns one classified [`Token`] into a value; encoding renders
//! one value as the text that would decode back to it.
//!
//! ```rust
//! use serde_tomlet::{encode, Value};
//!
//! assert_eq!(encode(&Value::from("tab\there")).unwrap(), r#""tab\there""#);
//! assert_eq!(encode(&Value::Float(-3.0)).unwrap(), "-3.0");
//! assert_eq!(
//!     encode(&Value::Array(vec![Value::from(1), Value::from(2)])).unwrap(),
//!     "[ 1, 2 ]"
//! );
//! ```

use crate::lexer::{self, Token, TokenKind};
use crate::{Error, Result, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

/// Escape sequences of basic strings, applied in this order.
const BASIC_STRING_ESCAPES: [(&str, &str); 6] = [
    ("\\b", "\u{8}"),
    ("\\t", "\t"),
    ("\\n", "\n"),
    ("\\f", "\u{c}"),
    ("\\r", "\r"),
    ("\\\"", "\""),
];

/// Decodes a scalar token into its value.
///
/// # Errors
///
/// [`Error::InvalidValue`] when the lexeme has the right shape but no
/// representable value (integer overflow, February 30th), and
/// [`Error::Syntax`] for tokens that are not scalars at all.
pub fn decode_scalar(token: &Token<'_>) -> Result<Value> {
    let lexeme = token.lexeme;
    let invalid = |msg: &str| Error::invalid_value(token.line, token.column, lexeme, msg);

    match token.kind {
        TokenKind::BasicString => Ok(Value::String(unescape_basic(strip_delimiters(lexeme, 1)))),
        TokenKind::BasicStringMultiline => Ok(Value::String(decode_basic_multiline(lexeme))),
        TokenKind::LiteralString => Ok(Value::String(strip_delimiters(lexeme, 1).to_string())),
        TokenKind::LiteralStringMultiline => Ok(Value::String(
            strip_leading_newline(strip_delimiters(lexeme, 3)).to_string(),
        )),
        TokenKind::Integer => decode_integer(lexeme)
            .map(Value::Integer)
            .ok_or_else(|| invalid("integer does not fit in 64 bits")),
        TokenKind::Float => decode_float(lexeme)
            .map(Value::Float)
            .ok_or_else(|| invalid("not a valid float")),
        TokenKind::Keyword => keyword_value(lexeme).ok_or_else(|| invalid("unknown keyword")),
        TokenKind::Datetime => decode_offset_datetime(lexeme)
            .map(Value::OffsetDatetime)
            .ok_or_else(|| invalid("not a valid date-time")),
        TokenKind::LocalDatetime => decode_local_datetime(lexeme)
            .map(Value::LocalDatetime)
            .ok_or_else(|| invalid("not a valid date-time")),
        TokenKind::LocalDate => decode_local_date(lexeme)
            .map(Value::LocalDate)
            .ok_or_else(|| invalid("not a valid date")),
        TokenKind::LocalTime => decode_local_time(lexeme)
            .map(Value::LocalTime)
            .ok_or_else(|| invalid("not a valid time")),
        _ => Err(Error::syntax(token.line, token.column, lexeme)),
    }
}

/// Decodes one key: basic-string keys are unquoted and unescaped, bare keys
/// are returned as-is.
#[must_use]
pub fn decode_key(raw: &str) -> String {
    if raw.starts_with('"') {
        unescape_basic(strip_delimiters(raw, 1))
    } else {
        raw.to_string()
    }
}

/// Key part of a key-value lexeme such as `"a b" =`.
#[must_use]
pub fn key_value_key(lexeme: &str) -> String {
    decode_key(lexeme.trim_end_matches(['=', ' ', '\t']))
}

/// Decoded key components of a `[table.header]` lexeme.
#[must_use]
pub fn header_path(lexeme: &str) -> Vec<String> {
    lexer::split_dotted_key(strip_delimiters(lexeme, 1))
        .into_iter()
        .map(decode_key)
        .collect()
}

fn keyword_value(lexeme: &str) -> Option<Value> {
    match lexeme {
        "true" => Some(Value::Boolean(true)),
        "false" => Some(Value::Boolean(false)),
        "inf" | "+inf" => Some(Value::Float(f64::INFINITY)),
        "-inf" => Some(Value::Float(f64::NEG_INFINITY)),
        "nan" | "+nan" => Some(Value::Float(f64::NAN)),
        "-nan" => Some(Value::Float(-f64::NAN)),
        _ => None,
    }
}

fn strip_delimiters(lexeme: &str, width: usize) -> &str {
    lexeme
        .get(width..lexeme.len().saturating_sub(width))
        .unwrap_or_default()
}

fn strip_leading_newline(content: &str) -> &str {
    content
        .strip_prefix("\r\n")
        .or_else(|| content.strip_prefix('\n'))
        .unwrap_or(content)
}

fn unescape_basic(content: &str) -> String {
    BASIC_STRING_ESCAPES
        .iter()
        .fold(content.to_string(), |acc, (escape, replacement)| {
            acc.replace(escape, replacement)
        })
}

/// A `\` at the end of a line joins it to the next one, dropping the
/// spaces and newlines that start the continuation.
fn decode_basic_multiline(lexeme: &str) -> String {
    let content = unescape_basic(strip_leading_newline(strip_delimiters(lexeme, 3)));
    let mut segments = content.split("\\\n");
    let mut decoded = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        decoded.push_str(segment.trim_start_matches([' ', '\n']));
    }
    decoded
}

fn decode_integer(lexeme: &str) -> Option<i64> {
    lexeme.replace('_', "").parse().ok()
}

fn decode_float(lexeme: &str) -> Option<f64> {
    let digits = lexeme.replace('_', "");
    if digits.starts_with(['e', 'E']) {
        format!("0{digits}").parse().ok()
    } else {
        digits.parse().ok()
    }
}

/// `Z`/`z` or the trailing `±HH:MM`, split from the local part.
fn split_offset(lexeme: &str) -> Option<(&str, FixedOffset)> {
    if let Some(local) = lexeme.strip_suffix(['Z', 'z']) {
        return Some((local, FixedOffset::east_opt(0)?));
    }
    let (local, offset) = lexeme.split_at(lexeme.len().checked_sub(6)?);
    let sign = match offset.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = offset.get(1..3)?.parse().ok()?;
    let minutes: i32 = offset.get(4..6)?.parse().ok()?;
    Some((local, FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?))
}

fn decode_offset_datetime(lexeme: &str) -> Option<DateTime<FixedOffset>> {
    let (local, offset) = split_offset(lexeme)?;
    offset
        .from_local_datetime(&decode_local_datetime(local)?)
        .single()
}

fn decode_local_datetime(lexeme: &str) -> Option<NaiveDateTime> {
    let date = decode_local_date(lexeme.get(..10)?)?;
    let time = decode_local_time(lexeme.get(11..)?)?;
    Some(NaiveDateTime::new(date, time))
}

fn decode_local_date(lexeme: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(lexeme, "%Y-%m-%d").ok()
}

fn decode_local_time(lexeme: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(lexeme, "%H:%M:%S%.f").ok()
}

/// Parses rendered date/time text back into the matching variant.
pub(crate) fn decode_datetime_str(text: &str) -> Option<Value> {
    if lexer::is_datetime(text) {
        decode_offset_datetime(text).map(Value::OffsetDatetime)
    } else if lexer::is_local_datetime(text) {
        decode_local_datetime(text).map(Value::LocalDatetime)
    } else if lexer::is_local_date(text) {
        decode_local_date(text).map(Value::LocalDate)
    } else if lexer::is_local_time(text) {
        decode_local_time(text).map(Value::LocalTime)
    } else {
        None
    }
}

/// Renders a single non-table value.
///
/// # Errors
///
/// [`Error::UnsupportedType`] for tables, which only have a section form,
/// including tables nested in arrays.
pub fn encode(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(encode_str(s)),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(encode_float(*f)),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::OffsetDatetime(dt) => Ok(format_offset_datetime(dt)),
        Value::LocalDatetime(dt) => Ok(format_local_datetime(dt)),
        Value::LocalDate(d) => Ok(format_local_date(d)),
        Value::LocalTime(t) => Ok(format_local_time(t)),
        Value::Array(elements) if elements.is_empty() => Ok("[]".to_string()),
        Value::Array(elements) => {
            let rendered = elements.iter().map(encode).collect::<Result<Vec<_>>>()?;
            Ok(format!("[ {} ]", rendered.join(", ")))
        }
        Value::Table(_) => Err(Error::unsupported_type(
            "a table has no inline form; only top-level sections are rendered",
        )),
    }
}

/// Renders a key, quoting it unless it is non-empty and entirely bare
/// characters.
#[must_use]
pub fn encode_key(key: &str) -> String {
    if lexer::is_bare_key(key) {
        key.to_string()
    } else {
        encode_str(key)
    }
}

/// Double-quoted with `\`, `"`, tab, newline and other control characters
/// escaped; single quotes stay literal.
fn encode_str(s: &str) -> String {
    format!("{s:?}")
}

fn encode_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else {
        let rendered = f.to_string();
        if rendered.contains('.') {
            rendered
        } else {
            format!("{rendered}.0")
        }
    }
}

/// Normalized to UTC and rendered with a `Z` suffix.
pub(crate) fn format_offset_datetime(dt: &DateTime<FixedOffset>) -> String {
    format!("{}Z", format_local_datetime(&dt.naive_utc()))
}

pub(crate) fn format_local_datetime(dt: &NaiveDateTime) -> String {
    format!(
        "{}T{}",
        format_local_date(&dt.date()),
        format_local_time(&dt.time())
    )
}

pub(crate) fn format_local_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Microseconds are appended only when non-zero.
pub(crate) fn format_local_time(t: &NaiveTime) -> String {
    let micros = t.nanosecond() % 1_000_000_000 / 1_000;
    if micros == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        format!("{}.{micros:06}", t.format("%H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn scalar(source: &str) -> Result<Value> {
        let tokens = tokenize(source)?;
        decode_scalar(&tokens[0])
    }

    #[test]
    fn test_basic_string_escapes() {
        assert_eq!(
            scalar(r#""a\tb\nc\"d""#).unwrap(),
            Value::from("a\tb\nc\"d")
        );
        assert_eq!(scalar(r#""""#).unwrap(), Value::from(""));
    }

    #[test]
    fn test_basic_multiline_line_continuation() {
        let source = "\"\"\"\nThe quick \\\n    brown \\\n\n  fox.\"\"\"";
        assert_eq!(scalar(source).unwrap(), Value::from("The quick brown fox."));
    }

    #[test]
    fn test_literal_strings_are_raw() {
        assert_eq!(scalar(r"'C:\Users\n'").unwrap(), Value::from(r"C:\Users\n"));
        assert_eq!(
            scalar("'''\nfirst\n  second\\n'''").unwrap(),
            Value::from("first\n  second\\n")
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(scalar("-1_000_000").unwrap(), Value::Integer(-1_000_000));
        assert_eq!(scalar("+20").unwrap(), Value::Integer(20));
        assert_eq!(scalar("3.2").unwrap(), Value::Float(3.2));
        assert_eq!(scalar("e2").unwrap(), Value::Float(0.0));
        assert_eq!(scalar("1_0.5e-1").unwrap(), Value::Float(1.05));
    }

    #[test]
    fn test_integer_overflow_is_invalid_value() {
        let err = scalar("9_223_372_036_854_775_808").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { line: 1, col: 0, .. }));
        assert_eq!(
            scalar("-9223372036854775808").unwrap(),
            Value::Integer(i64::MIN)
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(scalar("true").unwrap(), Value::Boolean(true));
        assert_eq!(scalar("false").unwrap(), Value::Boolean(false));
        assert_eq!(scalar("-inf").unwrap(), Value::Float(f64::NEG_INFINITY));
        assert!(scalar("+nan").unwrap().as_float().unwrap().is_nan());
    }

    #[test]
    fn test_offset_datetimes() {
        let Value::OffsetDatetime(dt) = scalar("1979-05-27T00:32:00.999999-07:00").unwrap() else {
            panic!("expected offset datetime");
        };
        assert_eq!(dt.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(format_offset_datetime(&dt), "1979-05-27T07:32:00.999999Z");

        let Value::OffsetDatetime(dt) = scalar("1979-05-27 07:32:00z").unwrap() else {
            panic!("expected offset datetime");
        };
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_calendar_invalid_date() {
        let err = scalar("2021-02-30").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        let err = scalar("2021-01-01T25:00:00Z").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn test_non_scalar_token_is_syntax_error() {
        assert!(matches!(scalar(","), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_encode_strings() {
        assert_eq!(encode(&Value::from("")).unwrap(), r#""""#);
        assert_eq!(encode(&Value::from("\t")).unwrap(), r#""\t""#);
        assert_eq!(encode(&Value::from("\n")).unwrap(), r#""\n""#);
        assert_eq!(encode(&Value::from("it's")).unwrap(), r#""it's""#);
        assert_eq!(encode(&Value::from(r#"a"b\"#)).unwrap(), r#""a\"b\\""#);
    }

    #[test]
    fn test_encode_numbers() {
        assert_eq!(encode(&Value::Integer(43)).unwrap(), "43");
        assert_eq!(encode(&Value::Integer(-21)).unwrap(), "-21");
        assert_eq!(encode(&Value::Float(4.3)).unwrap(), "4.3");
        assert_eq!(encode(&Value::Float(0.9)).unwrap(), "0.9");
        assert_eq!(encode(&Value::Float(-3.0)).unwrap(), "-3.0");
        assert_eq!(encode(&Value::Float(f64::INFINITY)).unwrap(), "inf");
        assert_eq!(encode(&Value::Float(f64::NEG_INFINITY)).unwrap(), "-inf");
        assert_eq!(encode(&Value::Float(f64::NAN)).unwrap(), "nan");
    }

    #[test]
    fn test_encode_booleans_and_datetimes() {
        assert_eq!(encode(&Value::Boolean(true)).unwrap(), "true");
        assert_eq!(encode(&Value::Boolean(false)).unwrap(), "false");

        let dt = NaiveDate::from_ymd_opt(2132, 11, 3)
            .unwrap()
            .and_hms_opt(13, 37, 45)
            .unwrap();
        assert_eq!(
            encode(&Value::LocalDatetime(dt)).unwrap(),
            "2132-11-03T13:37:45"
        );

        let early = NaiveDate::from_ymd_opt(432, 1, 5)
            .unwrap()
            .and_hms_micro_opt(5, 32, 0, 1_500)
            .unwrap();
        assert_eq!(
            encode(&Value::LocalDatetime(early)).unwrap(),
            "0432-01-05T05:32:00.001500"
        );
    }

    #[test]
    fn test_encode_arrays() {
        assert_eq!(encode(&Value::Array(vec![])).unwrap(), "[]");
        let nested = Value::Array(vec![
            Value::Array(vec![Value::Float(4.1), Value::Float(0.1)]),
            Value::Array(vec![]),
            Value::Array(vec![Value::Boolean(true)]),
        ]);
        assert_eq!(encode(&nested).unwrap(), "[ [ 4.1, 0.1 ], [], [ true ] ]");
    }

    #[test]
    fn test_encode_table_unsupported() {
        let table = Value::Table(crate::Table::new());
        assert!(matches!(encode(&table), Err(Error::UnsupportedType(_))));
        let in_array = Value::Array(vec![table]);
        assert!(matches!(encode(&in_array), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("neg-inf"), "neg-inf");
        assert_eq!(encode_key("snake_case_9"), "snake_case_9");
        assert_eq!(encode_key("b.c"), r#""b.c""#);
        assert_eq!(encode_key("with space"), r#""with space""#);
        assert_eq!(encode_key(""), r#""""#);
    }

    #[test]
    fn test_header_path() {
        assert_eq!(
            header_path(r#"[table."b.c".x]"#),
            vec!["table".to_string(), "b.c".to_string(), "x".to_string()]
        );
        assert_eq!(key_value_key("\"a b\" ="), "a b");
        assert_eq!(key_value_key("plain\t="), "plain");
    }

    #[test]
    fn test_decode_datetime_str() {
        assert!(matches!(
            decode_datetime_str("1979-05-27"),
            Some(Value::LocalDate(_))
        ));
        assert!(matches!(
            decode_datetime_str("07:32:00"),
            Some(Value::LocalTime(_))
        ));
        assert_eq!(decode_datetime_str("not a date"), None);
    }
}
