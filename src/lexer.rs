//! Tokenizer.
//!
//! [`Lexer`] turns source text into a lazy stream of classified [`Token`]s.
//! At each position the rules in [`RULES`] are tried in order and the first
//! one that accepts a non-empty prefix wins; several rules can accept a
//! prefix of the same text, so the order is part of the grammar.
//!
//! Whitespace and comments are consumed but never yielded. Anything only the
//! catch-all rule accepts aborts lexing with [`Error::Syntax`].
//!
//! ```rust
//! use serde_tomlet::{tokenize, TokenKind};
//!
//! let tokens = tokenize("answer = 42 # comment\n").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![TokenKind::KeyValue, TokenKind::Integer, TokenKind::Newline]
//! );
//! ```

use crate::{Error, Result};
use tracing::trace;

/// Classification of a lexeme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Horizontal whitespace or a `#` comment. Never yielded.
    Skip,
    LiteralStringMultiline,
    LiteralString,
    BasicStringMultiline,
    BasicString,
    /// `[dotted.key.path]`
    TableHeader,
    /// A key followed by optional spacing and `=`.
    KeyValue,
    /// Date and time with a `Z` or `±HH:MM` suffix.
    Datetime,
    LocalDatetime,
    LocalDate,
    LocalTime,
    Float,
    Integer,
    /// `true`, `false` and the signed `inf`/`nan` spellings.
    Keyword,
    ArrayOpen,
    ArrayClose,
    InlineTableOpen,
    InlineTableClose,
    Separator,
    Newline,
    /// Text no other rule accepts. Always an error.
    Mismatch,
}

/// A classified lexeme borrowed from the source.
///
/// `line` starts at 1; `column` is the character offset from the start of
/// the line, starting at 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: usize,
    pub column: usize,
}

type Rule = fn(&str) -> Option<usize>;

/// Token rules in priority order. Each returns the byte length of the
/// prefix it accepts.
pub static RULES: [(TokenKind, Rule); 21] = [
    (TokenKind::Skip, lex_skip),
    (TokenKind::LiteralStringMultiline, lex_literal_string_multiline),
    (TokenKind::LiteralString, lex_literal_string),
    (TokenKind::BasicStringMultiline, lex_basic_string_multiline),
    (TokenKind::BasicString, lex_basic_string),
    (TokenKind::TableHeader, lex_table_header),
    (TokenKind::KeyValue, lex_key_value),
    (TokenKind::Datetime, lex_datetime),
    (TokenKind::LocalDatetime, lex_local_datetime),
    (TokenKind::LocalDate, lex_local_date),
    (TokenKind::LocalTime, lex_local_time),
    (TokenKind::Float, lex_float),
    (TokenKind::Integer, lex_integer),
    (TokenKind::Keyword, lex_keyword),
    (TokenKind::ArrayOpen, |s| single(s, b'[')),
    (TokenKind::ArrayClose, |s| single(s, b']')),
    (TokenKind::InlineTableOpen, |s| single(s, b'{')),
    (TokenKind::InlineTableClose, |s| single(s, b'}')),
    (TokenKind::Separator, |s| single(s, b',')),
    (TokenKind::Newline, lex_newline),
    (TokenKind::Mismatch, lex_mismatch),
];

/// Keyword literals, in matching order.
pub const KEYWORDS: [&str; 8] = ["true", "false", "inf", "+inf", "-inf", "nan", "+nan", "-nan"];

/// Lazy, forward-only token stream over a source string.
///
/// Yields `Err` once on the first mismatch and then stops.
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self::with_origin(source, 1, 0)
    }

    /// Lexes `source` as if it started at `line`/`column` of a larger input.
    pub(crate) fn with_origin(source: &'a str, line: usize, column: usize) -> Self {
        Lexer {
            source,
            offset: 0,
            line,
            column,
            failed: false,
        }
    }

    fn classify(rest: &str) -> (TokenKind, usize) {
        RULES
            .iter()
            .find_map(|(kind, rule)| rule(rest).filter(|&len| len > 0).map(|len| (*kind, len)))
            .unwrap_or((TokenKind::Mismatch, rest.len()))
    }

    fn advance_position(&mut self, lexeme: &str) {
        match lexeme.rfind('\n') {
            Some(last) => {
                self.line += lexeme.matches('\n').count();
                self.column = lexeme[last + 1..].chars().count();
            }
            None => self.column += lexeme.chars().count(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed {
            let rest = self.source.get(self.offset..).filter(|rest| !rest.is_empty())?;
            let (kind, len) = Self::classify(rest);
            let lexeme = &rest[..len];
            let (line, column) = (self.line, self.column);

            self.offset += len;
            self.advance_position(lexeme);

            match kind {
                TokenKind::Skip => continue,
                TokenKind::Mismatch => {
                    self.failed = true;
                    return Some(Err(Error::syntax(
                        line,
                        column,
                        lexeme.trim_end_matches('\r'),
                    )));
                }
                _ => {
                    trace!(?kind, lexeme, line, column, "token");
                    return Some(Ok(Token {
                        kind,
                        lexeme,
                        line,
                        column,
                    }));
                }
            }
        }
        None
    }
}

/// Tokenizes the whole source, failing on the first lexical error.
///
/// No partial token stream is returned on failure.
///
/// # Errors
///
/// Returns [`Error::Syntax`] with the offending text and its position.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(source).collect()
}

/// `true` if the whole of `s` is an integer literal.
///
/// ```rust
/// use serde_tomlet::lexer::is_integer;
///
/// assert!(is_integer("-1_000_000"));
/// assert!(!is_integer("01"));
/// assert!(!is_integer("1__0"));
/// ```
#[must_use]
pub fn is_integer(s: &str) -> bool {
    match_integer(s.as_bytes(), 0) == Some(s.len())
}

/// `true` if the whole of `s` is a float literal.
#[must_use]
pub fn is_float(s: &str) -> bool {
    match_float(s.as_bytes()) == Some(s.len())
}

/// `true` if `s` is exactly one of [`KEYWORDS`].
#[must_use]
pub fn is_keyword(s: &str) -> bool {
    match_keyword(s) == Some(s.len())
}

/// `true` if the whole of `s` is a date-time with an offset or `Z` suffix.
#[must_use]
pub fn is_datetime(s: &str) -> bool {
    match_datetime(s.as_bytes()) == Some(s.len())
}

#[must_use]
pub fn is_local_datetime(s: &str) -> bool {
    match_local_datetime(s.as_bytes()) == Some(s.len())
}

#[must_use]
pub fn is_local_date(s: &str) -> bool {
    match_date(s.as_bytes(), 0) == Some(s.len())
}

#[must_use]
pub fn is_local_time(s: &str) -> bool {
    match_time(s.as_bytes(), 0) == Some(s.len())
}

/// `true` if `key` can be written without quotes.
#[must_use]
pub fn is_bare_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(is_bare_key_byte)
}

/// Splits the inside of a table header into its raw key components.
///
/// Quoted components keep their quotes; `.` inside quotes does not split.
pub(crate) fn split_dotted_key(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(end) = match_key(path, start) {
        parts.push(&path[start..end]);
        if bytes.get(end) != Some(&b'.') {
            break;
        }
        start = end + 1;
    }
    parts
}

fn is_bare_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Numbers, keywords and dates may not run straight into more key-like text.
fn at_boundary(bytes: &[u8], end: usize) -> bool {
    !matches!(bytes.get(end), Some(&b) if is_bare_key_byte(b) || matches!(b, b'.' | b'+' | b':'))
}

fn bounded(s: &str, end: Option<usize>) -> Option<usize> {
    end.filter(|&end| at_boundary(s.as_bytes(), end))
}

fn single(s: &str, byte: u8) -> Option<usize> {
    (s.as_bytes().first() == Some(&byte)).then_some(1)
}

fn count_digits(bytes: &[u8], start: usize) -> usize {
    bytes
        .get(start..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}

fn exact_digits(bytes: &[u8], start: usize, n: usize) -> Option<usize> {
    (count_digits(bytes, start) >= n).then_some(start + n)
}

fn expect(bytes: &[u8], at: usize, byte: u8) -> Option<usize> {
    (bytes.get(at) == Some(&byte)).then_some(at + 1)
}

/// Continues a digit run through `_` that sits between two digits.
fn underscored_digits(bytes: &[u8], mut end: usize) -> usize {
    while bytes.get(end) == Some(&b'_') && count_digits(bytes, end + 1) > 0 {
        end += 1 + count_digits(bytes, end + 1);
    }
    end
}

/// `0` or `[1-9]\d*(_\d+)*`
fn match_digits(bytes: &[u8], start: usize) -> Option<usize> {
    match bytes.get(start)? {
        b'0' => Some(start + 1),
        b'1'..=b'9' => Some(underscored_digits(
            bytes,
            start + 1 + count_digits(bytes, start + 1),
        )),
        _ => None,
    }
}

/// `[-+]?` followed by [`match_digits`]
fn match_integer(bytes: &[u8], start: usize) -> Option<usize> {
    let signed = matches!(bytes.get(start), Some(b'+' | b'-'));
    match_digits(bytes, start + usize::from(signed))
}

/// Fraction digits: `\d+(_\d+)*`
fn match_fraction(bytes: &[u8], start: usize) -> Option<usize> {
    let n = count_digits(bytes, start);
    (n > 0).then(|| underscored_digits(bytes, start + n))
}

fn match_float(bytes: &[u8]) -> Option<usize> {
    if matches!(bytes.first(), Some(b'e' | b'E')) {
        return match_integer(bytes, 1);
    }

    let mut end = match_integer(bytes, 0)?;
    let mut fractional = false;
    if bytes.get(end) == Some(&b'.') {
        if let Some(after) = match_fraction(bytes, end + 1) {
            end = after;
            fractional = true;
        }
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        if let Some(after) = match_integer(bytes, end + 1) {
            end = after;
            fractional = true;
        }
    }
    fractional.then_some(end)
}

fn match_keyword(s: &str) -> Option<usize> {
    KEYWORDS
        .iter()
        .find(|keyword| s.starts_with(*keyword))
        .map(|keyword| keyword.len())
}

/// `\d{4}-\d{2}-\d{2}`
fn match_date(bytes: &[u8], start: usize) -> Option<usize> {
    let end = exact_digits(bytes, start, 4)?;
    let end = exact_digits(bytes, expect(bytes, end, b'-')?, 2)?;
    exact_digits(bytes, expect(bytes, end, b'-')?, 2)
}

/// `\d{2}:\d{2}:\d{2}(\.\d{3,6})?`
fn match_time(bytes: &[u8], start: usize) -> Option<usize> {
    let end = exact_digits(bytes, start, 2)?;
    let end = exact_digits(bytes, expect(bytes, end, b':')?, 2)?;
    let end = exact_digits(bytes, expect(bytes, end, b':')?, 2)?;
    if bytes.get(end) == Some(&b'.') {
        let fraction = count_digits(bytes, end + 1);
        if fraction >= 3 {
            return Some(end + 1 + fraction.min(6));
        }
    }
    Some(end)
}

/// `[Zz]` or `[+-]\d{2}:\d{2}`
fn match_offset(bytes: &[u8], start: usize) -> Option<usize> {
    match bytes.get(start)? {
        b'Z' | b'z' => Some(start + 1),
        b'+' | b'-' => {
            let end = exact_digits(bytes, start + 1, 2)?;
            exact_digits(bytes, expect(bytes, end, b':')?, 2)
        }
        _ => None,
    }
}

fn match_local_datetime(bytes: &[u8]) -> Option<usize> {
    let end = match_date(bytes, 0)?;
    match bytes.get(end)? {
        b' ' | b'T' | b't' => match_time(bytes, end + 1),
        _ => None,
    }
}

fn match_datetime(bytes: &[u8]) -> Option<usize> {
    match_offset(bytes, match_local_datetime(bytes)?)
}

/// `'[^\n]*?'`
fn match_literal_string(s: &str) -> Option<usize> {
    let body = s.strip_prefix('\'')?;
    let close = body.find(['\'', '\n'])?;
    (body.as_bytes().get(close) == Some(&b'\'')).then_some(close + 2)
}

/// `"[^\n]*?(?<!\\)"`
fn match_basic_string(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'\n' => return None,
            b'"' if bytes.get(i - 1) != Some(&b'\\') => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn match_multiline(s: &str, delimiter: &str) -> Option<usize> {
    let body = s.strip_prefix(delimiter)?;
    body.find(delimiter)
        .map(|close| 2 * delimiter.len() + close)
}

/// A bare key or a basic string, starting at `start`.
fn match_key(s: &str, start: usize) -> Option<usize> {
    let rest = s.get(start..)?;
    let bare = rest.bytes().take_while(|&b| is_bare_key_byte(b)).count();
    if bare > 0 {
        return Some(start + bare);
    }
    match_basic_string(rest).map(|len| start + len)
}

/// Key, optional spacing, `=`. Returns the end of the `=`.
fn match_key_value(s: &str) -> Option<usize> {
    let end = match_key(s, 0)?;
    let spacing = s[end..].bytes().take_while(|b| matches!(b, b' ' | b'\t')).count();
    expect(s.as_bytes(), end + spacing, b'=')
}

fn lex_skip(s: &str) -> Option<usize> {
    if s.starts_with('#') {
        return Some(s.find('\n').unwrap_or(s.len()));
    }
    Some(s.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count())
}

fn lex_literal_string_multiline(s: &str) -> Option<usize> {
    match_multiline(s, "'''")
}

fn lex_literal_string(s: &str) -> Option<usize> {
    match_literal_string(s)
}

fn lex_basic_string_multiline(s: &str) -> Option<usize> {
    match_multiline(s, "\"\"\"")
}

/// A basic string directly followed by `=` is a quoted key; leave it to
/// the key-value rule.
fn lex_basic_string(s: &str) -> Option<usize> {
    let end = match_basic_string(s)?;
    match match_key_value(s) {
        Some(_) => None,
        None => Some(end),
    }
}

fn lex_table_header(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut end = match_key(s, expect(bytes, 0, b'[')?)?;
    while bytes.get(end) == Some(&b'.') {
        end = match_key(s, end + 1)?;
    }
    expect(bytes, end, b']')
}

fn lex_key_value(s: &str) -> Option<usize> {
    match_key_value(s)
}

fn lex_datetime(s: &str) -> Option<usize> {
    bounded(s, match_datetime(s.as_bytes()))
}

fn lex_local_datetime(s: &str) -> Option<usize> {
    bounded(s, match_local_datetime(s.as_bytes()))
}

fn lex_local_date(s: &str) -> Option<usize> {
    bounded(s, match_date(s.as_bytes(), 0))
}

fn lex_local_time(s: &str) -> Option<usize> {
    bounded(s, match_time(s.as_bytes(), 0))
}

fn lex_float(s: &str) -> Option<usize> {
    bounded(s, match_float(s.as_bytes()))
}

fn lex_integer(s: &str) -> Option<usize> {
    bounded(s, match_integer(s.as_bytes(), 0))
}

fn lex_keyword(s: &str) -> Option<usize> {
    bounded(s, match_keyword(s))
}

fn lex_newline(s: &str) -> Option<usize> {
    if s.starts_with('\n') {
        Some(1)
    } else if s.starts_with("\r\n") {
        Some(2)
    } else {
        None
    }
}

/// `[^\n]+`
fn lex_mismatch(s: &str) -> Option<usize> {
    Some(s.find('\n').unwrap_or(s.len()))
}
