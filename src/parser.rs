//! Document assembly.
//!
//! Walks the token stream once, tracking the table that `[header]` lines
//! select and assigning each `key = value` into it.

use crate::codec::{self, decode_scalar};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::{Error, Result, Table, Value};
use tracing::debug;

/// Decodes document text into its root table.
///
/// # Errors
///
/// Any lexing, value or table-conflict error; nothing partial is returned.
///
/// # Examples
///
/// ```rust
/// use serde_tomlet::{decode, Value};
///
/// let doc = decode("title = 'x'\n[owner]\nage = 30").unwrap();
/// assert_eq!(doc.get("title"), Some(&Value::from("x")));
/// assert_eq!(
///     doc.get("owner").and_then(|o| o.as_table()).and_then(|o| o.get("age")),
///     Some(&Value::Integer(30))
/// );
/// ```
pub fn decode(source: &str) -> Result<Table> {
    let root = parse(Lexer::new(source))?;
    debug!(keys = root.len(), bytes = source.len(), "decoded document");
    Ok(root)
}

/// Builds the root table from a token stream.
///
/// Tokens other than table headers and key-value markers are ignored at
/// the top level. Lexing errors in the stream abort the parse.
pub fn parse<'a, I>(tokens: I) -> Result<Table>
where
    I: IntoIterator<Item = Result<Token<'a>>>,
{
    let mut tokens = tokens.into_iter();
    let mut root = Table::new();
    let mut current: Vec<String> = Vec::new();

    while let Some(token) = tokens.next().transpose()? {
        match token.kind {
            TokenKind::TableHeader => {
                let path = codec::header_path(token.lexeme);
                table_at(&mut root, &path).ok_or_else(|| conflict(&token))?;
                debug!(path = token.lexeme, line = token.line, "opened table");
                current = path;
            }
            TokenKind::KeyValue => {
                let key = codec::key_value_key(token.lexeme);
                let value_token = tokens
                    .next()
                    .transpose()?
                    .ok_or_else(|| Error::syntax(token.line, token.column, token.lexeme))?;
                if let Some(value) = decode_value(&mut tokens, &value_token)? {
                    table_at(&mut root, &current)
                        .ok_or_else(|| conflict(&token))?
                        .insert(key, value);
                }
            }
            _ => {}
        }
    }
    Ok(root)
}

/// Walks `path` from `root`, creating missing tables.
fn table_at<'t>(root: &'t mut Table, path: &[String]) -> Option<&'t mut Table> {
    path.iter()
        .try_fold(root, |table, key| table.table_entry(key))
}

fn conflict(header: &Token<'_>) -> Error {
    let path = header
        .lexeme
        .trim_start_matches('[')
        .trim_end_matches(']');
    Error::table_conflict(path, header.line, header.column)
}

/// Decodes the value that starts with `token`.
///
/// Returns `None` for an inline table, which is consumed and dropped.
fn decode_value<'a, I>(tokens: &mut I, token: &Token<'a>) -> Result<Option<Value>>
where
    I: Iterator<Item = Result<Token<'a>>>,
{
    match token.kind {
        TokenKind::ArrayOpen => parse_array(tokens, token, Close::Bracket).map(Some),
        // `[1]` or `["a"]` lexes as a header; re-read its inside as elements.
        TokenKind::TableHeader => {
            let inner = &token.lexeme[1..token.lexeme.len() - 1];
            let mut nested = Lexer::with_origin(inner, token.line, token.column + 1);
            parse_array(&mut nested, token, Close::EndOfInput).map(Some)
        }
        TokenKind::InlineTableOpen => {
            skip_inline_table(tokens, token)?;
            Ok(None)
        }
        _ => decode_scalar(token).map(Some),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Close {
    Bracket,
    EndOfInput,
}

fn next_significant<'a, I>(tokens: &mut I) -> Result<Option<Token<'a>>>
where
    I: Iterator<Item = Result<Token<'a>>>,
{
    for token in tokens.by_ref() {
        let token = token?;
        if token.kind != TokenKind::Newline {
            return Ok(Some(token));
        }
    }
    Ok(None)
}

/// Elements separated by `,`; newlines and one trailing comma allowed.
fn parse_array<'a, I>(tokens: &mut I, open: &Token<'a>, close: Close) -> Result<Value>
where
    I: Iterator<Item = Result<Token<'a>>>,
{
    let unterminated = || Error::syntax(open.line, open.column, open.lexeme);
    let mut elements = Vec::new();

    loop {
        let token = match next_significant(tokens)? {
            Some(token) if token.kind == TokenKind::ArrayClose && close == Close::Bracket => break,
            Some(token) => token,
            None if close == Close::EndOfInput => break,
            None => return Err(unterminated()),
        };
        if let Some(element) = decode_value(tokens, &token)? {
            elements.push(element);
        }
        match next_significant(tokens)? {
            Some(token) if token.kind == TokenKind::Separator => {}
            Some(token) if token.kind == TokenKind::ArrayClose && close == Close::Bracket => break,
            Some(token) => return Err(Error::syntax(token.line, token.column, token.lexeme)),
            None if close == Close::EndOfInput => break,
            None => return Err(unterminated()),
        }
    }
    Ok(Value::Array(elements))
}

fn skip_inline_table<'a, I>(tokens: &mut I, open: &Token<'a>) -> Result<()>
where
    I: Iterator<Item = Result<Token<'a>>>,
{
    let mut depth = 1usize;
    for token in tokens.by_ref() {
        match token?.kind {
            TokenKind::InlineTableOpen => depth += 1,
            TokenKind::InlineTableClose => {
                depth -= 1;
                if depth == 0 {
                    debug!(line = open.line, column = open.column, "skipped inline table");
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    Err(Error::syntax(open.line, open.column, open.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toml;

    fn doc(source: &str) -> Value {
        Value::Table(decode(source).unwrap())
    }

    #[test]
    fn test_empty_input() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("\n\n# nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_headers_create_nested_tables() {
        assert_eq!(
            doc("a = 1\n[x.y]\nb = 2\n[z]\nc = 3"),
            toml!({ "a": 1, "x": { "y": { "b": 2 } }, "z": { "c": 3 } })
        );
    }

    #[test]
    fn test_reopened_header_merges() {
        assert_eq!(
            doc("[a]\nx = 1\n[b]\ny = 2\n[a]\nz = 3"),
            toml!({ "a": { "x": 1, "z": 3 }, "b": { "y": 2 } })
        );
    }

    #[test]
    fn test_quoted_keys() {
        assert_eq!(
            doc("[t.\"b.c\"]\n\"key with space\" = 1"),
            toml!({ "t": { "b.c": { "key with space": 1 } } })
        );
    }

    #[test]
    fn test_last_assignment_wins() {
        assert_eq!(doc("a = 1\na = 2"), toml!({ "a": 2 }));
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            doc("a = [ 1, 'two', 3.0 ]\nb = []\nc = [\n  [1, 2],\n  [true],\n]"),
            toml!({
                "a": [1, "two", 3.0],
                "b": [],
                "c": [[1, 2], [true]]
            })
        );
    }

    #[test]
    fn test_bracketed_values_that_look_like_headers() {
        assert_eq!(
            doc("a = [1]\nb = [[3], [\"x\"]]\nc = 2"),
            toml!({ "a": [1], "b": [[3], ["x"]], "c": 2 })
        );
    }

    #[test]
    fn test_array_errors() {
        assert!(matches!(decode("a = [1 2]"), Err(Error::Syntax { .. })));
        assert!(matches!(decode("a = [1,"), Err(Error::Syntax { .. })));
        assert!(matches!(decode("a = [, 1]"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_inline_table_skipped_whole() {
        assert_eq!(
            doc("a = 1\nb = { x = 1, y = { z = 2 } }\nc = 3"),
            toml!({ "a": 1, "c": 3 })
        );
        assert!(matches!(decode("b = { x = 1"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_table_conflict() {
        let err = decode("a = 1\n[a.b]").unwrap_err();
        assert_eq!(err, Error::table_conflict("a.b", 2, 0));
    }

    #[test]
    fn test_missing_value_is_syntax_error() {
        assert!(matches!(decode("a ="), Err(Error::Syntax { line: 1, .. })));
        assert!(matches!(decode("a =\nb = 1"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_stray_values_ignored_at_top_level() {
        assert_eq!(doc("42\na = 1 2"), toml!({ "a": 1 }));
    }
}
