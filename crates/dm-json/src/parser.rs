//! Recursive-descent parser for JSON templates
//!
//! Accepts plain JSON plus:
//! - `//` and `/* */` comments, trailing commas
//! - placeholders `$1`, `$name` and their quoted forms `"$1"`, `"$name"`
//! - operators, bare (`NotZero`, `Between(40, 45)`) or prefixed
//!   (`$^NotZero`, `"$^Len(3)"`)

use crate::error::{TemplateError, TemplateErrorKind, TemplateResult};
use crate::operators;
use crate::params::Params;
use dm_core::{ops, Pattern, RecordMode, Value, DEFAULT_MAX_DEPTH};
use indexmap::IndexMap;
use serde_json::Number;

/// Error with its byte offset, converted to line/column at the boundary
struct Failure {
    pos: usize,
    kind: TemplateErrorKind,
}

type Parsed<T> = Result<T, Failure>;

/// Deepest nesting of arrays, objects and operator calls
const MAX_NESTING: usize = DEFAULT_MAX_DEPTH;

pub(crate) fn parse(src: &str, params: &Params, mode: RecordMode) -> TemplateResult<Pattern> {
    Parser::new(src, params, mode)
        .document()
        .map_err(|failure| located(src, failure))
}

fn located(src: &str, failure: Failure) -> TemplateError {
    let mut pos = failure.pos.min(src.len());
    while !src.is_char_boundary(pos) {
        pos -= 1;
    }
    let before = &src[..pos];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |last| last.chars().count())
        + 1;
    TemplateError {
        line,
        column,
        kind: failure.kind,
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    params: &'a Params,
    mode: RecordMode,
    depth: usize,
    /// First unbound placeholder or bad operator call. Reported only once
    /// the whole document is syntactically valid.
    deferred: Option<Failure>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, params: &'a Params, mode: RecordMode) -> Self {
        Self {
            src,
            pos: 0,
            params,
            mode,
            depth: 0,
            deferred: None,
        }
    }

    fn document(&mut self) -> Parsed<Pattern> {
        self.skip_trivia()?;
        let pattern = self.value()?;
        self.skip_trivia()?;
        if self.pos < self.src.len() {
            return Err(self.fail(TemplateErrorKind::TrailingInput));
        }
        match self.deferred.take() {
            Some(failure) => Err(failure),
            None => Ok(pattern),
        }
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn fail(&self, kind: TemplateErrorKind) -> Failure {
        Failure {
            pos: self.pos,
            kind,
        }
    }

    /// Keep the first semantic failure and stand in for the faulty value
    fn defer(&mut self, failure: Failure) -> Pattern {
        if self.deferred.is_none() {
            self.deferred = Some(failure);
        }
        ops::ignore()
    }

    fn unexpected(&self) -> Failure {
        match self.peek() {
            Some(c) => self.fail(TemplateErrorKind::UnexpectedChar(c)),
            None => self.fail(TemplateErrorKind::UnexpectedEnd),
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Parsed<()> {
        loop {
            let rest = &self.src[self.pos..];
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(self.fail(TemplateErrorKind::UnterminatedComment)),
                }
            } else {
                return Ok(());
            }
        }
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn value(&mut self) -> Parsed<Pattern> {
        if self.depth >= MAX_NESTING {
            return Err(self.fail(TemplateErrorKind::TooDeep { limit: MAX_NESTING }));
        }
        self.depth += 1;
        let value = self.scalar_or_nested();
        self.depth -= 1;
        value
    }

    fn scalar_or_nested(&mut self) -> Parsed<Pattern> {
        match self.peek() {
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some('"') => self.string_value(),
            Some('$') => self.placeholder(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.word(),
            _ => Err(self.unexpected()),
        }
    }

    fn object(&mut self) -> Parsed<Pattern> {
        self.bump();
        let mut fields = IndexMap::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                break;
            }
            if self.peek() != Some('"') {
                return Err(self.unexpected());
            }
            let key_pos = self.pos;
            let key = self.string()?;
            if fields.contains_key(&key) {
                return Err(Failure {
                    pos: key_pos,
                    kind: TemplateErrorKind::DuplicateKey(key),
                });
            }

            self.skip_trivia()?;
            self.expect(':', "':'")?;
            self.skip_trivia()?;
            let value = self.value()?;
            fields.insert(key, value);

            self.skip_trivia()?;
            if !self.separator('}', "',' or '}'")? {
                break;
            }
        }
        Ok(Pattern::Record {
            fields,
            mode: self.mode,
        })
    }

    fn array(&mut self) -> Parsed<Pattern> {
        self.bump();
        Ok(Pattern::Sequence(self.items(']', "',' or ']'")?))
    }

    /// Comma separated values up to `close`, trailing comma allowed
    fn items(&mut self, close: char, expected: &'static str) -> Parsed<Vec<Pattern>> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(close) {
                break;
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            if !self.separator(close, expected)? {
                break;
            }
        }
        Ok(items)
    }

    /// Consume ',' (returns true) or `close` (returns false)
    fn separator(&mut self, close: char, expected: &'static str) -> Parsed<bool> {
        match self.peek() {
            Some(',') => {
                self.bump();
                Ok(true)
            }
            Some(c) if c == close => {
                self.bump();
                Ok(false)
            }
            Some(found) => Err(self.fail(TemplateErrorKind::ExpectedSeparator { expected, found })),
            None => Err(self.fail(TemplateErrorKind::UnexpectedEnd)),
        }
    }

    fn expect(&mut self, c: char, expected: &'static str) -> Parsed<()> {
        match self.peek() {
            Some(found) if found == c => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(self.fail(TemplateErrorKind::ExpectedSeparator { expected, found })),
            None => Err(self.fail(TemplateErrorKind::UnexpectedEnd)),
        }
    }

    fn number(&mut self) -> Parsed<Pattern> {
        let start = self.pos;
        let mut float = false;
        self.eat('-');
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' | 'e' | 'E' => float = true,
                '+' | '-' if float => {}
                _ => break,
            }
            self.bump();
        }

        let text = &self.src[start..self.pos];
        let invalid = || Failure {
            pos: start,
            kind: TemplateErrorKind::InvalidNumber(text.to_string()),
        };
        let number = if float {
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(invalid)?
        } else if let Ok(n) = text.parse::<i64>() {
            Number::from(n)
        } else {
            text.parse::<u64>().map(Number::from).map_err(|_| invalid())?
        };
        Ok(Pattern::Literal(Value::Number(number)))
    }

    /// `true`, `false`, `null` or a bare operator
    fn word(&mut self) -> Parsed<Pattern> {
        let start = self.pos;
        let name = self.identifier();
        match name {
            "true" => Ok(Pattern::Literal(Value::Bool(true))),
            "false" => Ok(Pattern::Literal(Value::Bool(false))),
            "null" => Ok(Pattern::Literal(Value::Null)),
            _ if name.starts_with(|c: char| c.is_ascii_uppercase()) => {
                self.operator(start, name)
            }
            _ => {
                self.pos = start;
                Err(self.unexpected())
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Operator `name` starting at `start`, with optional `(args)`
    fn operator(&mut self, start: usize, name: &str) -> Parsed<Pattern> {
        let args = if self.eat('(') {
            self.items(')', "',' or ')'")?
        } else {
            Vec::new()
        };
        match operators::build(name, args) {
            Ok(pattern) => Ok(pattern),
            Err(err) => Ok(self.defer(Failure {
                pos: start,
                kind: TemplateErrorKind::Operator(err),
            })),
        }
    }

    /// `$1`, `$name` or `$^Operator(args)`
    fn placeholder(&mut self) -> Parsed<Pattern> {
        let start = self.pos;
        self.bump();

        if self.eat('^') {
            let name_pos = self.pos;
            let name = self.identifier();
            if name.is_empty() {
                return Err(self.unexpected());
            }
            return self.operator(name_pos, name);
        }

        let reference = match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let digits_start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
                let digits = &self.src[digits_start..self.pos];
                digits
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.params.positional(index))
                    .ok_or(digits)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let name = self.identifier();
                self.params.named(name).ok_or(name)
            }
            _ => return Err(self.unexpected()),
        };

        match reference {
            Ok(pattern) => Ok(pattern.clone()),
            Err(name) => {
                let kind = TemplateErrorKind::UnknownPlaceholder(name.to_string());
                Ok(self.defer(Failure { pos: start, kind }))
            }
        }
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    /// A string literal, or a placeholder when quoted (`"$1"`, `"$^NotZero"`)
    fn string_value(&mut self) -> Parsed<Pattern> {
        let start = self.pos;
        let text = self.string()?;
        if !is_placeholder(&text) {
            return Ok(Pattern::Literal(Value::String(text)));
        }

        // Inner offsets are only exact when the raw text had no escapes
        let exact = &self.src[start + 1..self.pos - 1] == text;
        let relocate = |failure: Failure| Failure {
            pos: if exact { start + 1 + failure.pos } else { start },
            kind: failure.kind,
        };

        let mut inner = Parser::new(&text, self.params, self.mode);
        inner.depth = self.depth;
        let pattern = inner
            .placeholder()
            .and_then(|pattern| {
                inner.skip_trivia()?;
                if inner.pos < text.len() {
                    Err(inner.fail(TemplateErrorKind::TrailingInput))
                } else {
                    Ok(pattern)
                }
            })
            .map_err(relocate)?;
        match inner.deferred.take() {
            Some(failure) => Ok(self.defer(relocate(failure))),
            None => Ok(pattern),
        }
    }

    fn string(&mut self) -> Parsed<String> {
        self.bump();
        let mut out = String::new();
        loop {
            let escape_pos = self.pos;
            match self.bump() {
                None => return Err(self.fail(TemplateErrorKind::UnexpectedEnd)),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{0008}',
                        Some('f') => '\u{000c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => self.unicode_escape(escape_pos)?,
                        Some(other) => {
                            return Err(Failure {
                                pos: escape_pos,
                                kind: TemplateErrorKind::InvalidEscape(format!("\\{}", other)),
                            })
                        }
                        None => return Err(self.fail(TemplateErrorKind::UnexpectedEnd)),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn hex4(&mut self, escape_pos: usize) -> Parsed<u32> {
        let end = self.pos + 4;
        let digits = self
            .src
            .get(self.pos..end)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| Failure {
                pos: escape_pos,
                kind: TemplateErrorKind::InvalidEscape(
                    self.src[escape_pos..].chars().take(6).collect(),
                ),
            })?;
        self.pos = end;
        u32::from_str_radix(digits, 16).map_err(|_| Failure {
            pos: escape_pos,
            kind: TemplateErrorKind::InvalidEscape(digits.to_string()),
        })
    }

    fn unicode_escape(&mut self, escape_pos: usize) -> Parsed<char> {
        let high = self.hex4(escape_pos)?;
        let code = if (0xD800..0xDC00).contains(&high) {
            // Surrogate pair
            if !self.src[self.pos..].starts_with("\\u") {
                return Err(Failure {
                    pos: escape_pos,
                    kind: TemplateErrorKind::InvalidEscape("unpaired surrogate".to_string()),
                });
            }
            self.pos += 2;
            let low = self.hex4(escape_pos)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(Failure {
                    pos: escape_pos,
                    kind: TemplateErrorKind::InvalidEscape("unpaired surrogate".to_string()),
                });
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| Failure {
            pos: escape_pos,
            kind: TemplateErrorKind::InvalidEscape(format!("\\u{:04x}", code)),
        })
    }
}

/// `$` followed by digits, an identifier or `^`
fn is_placeholder(text: &str) -> bool {
    let Some(rest) = text.strip_prefix('$') else {
        return false;
    };
    if rest.starts_with('^') {
        return rest.len() > 1;
    }
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => rest.chars().all(|c| c.is_ascii_digit()),
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
