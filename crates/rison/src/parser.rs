// crates/rison/src/parser.rs
//! Rison parsing logic

use crate::encoder::{NOT_ID_CHAR, NOT_ID_START};
use crate::error::{RisonError, RisonResult};
use serde_json::{Map, Number, Value};

/// Deepest array/object nesting accepted before parsing fails
pub const MAX_DEPTH: usize = 128;

/// Parses rison text into a JSON value
///
/// The whole input must be consumed; trailing characters are an error.
pub fn from_str(input: &str) -> RisonResult<Value> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_value()?;

    if parser.pos < input.len() {
        return Err(RisonError::syntax(parser.pos, "unexpected trailing characters"));
    }

    Ok(value)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next_char(&mut self) -> RisonResult<char> {
        let c = self.peek().ok_or(RisonError::UnexpectedEnd)?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    fn parse_value(&mut self) -> RisonResult<Value> {
        let start = self.pos;
        let c = self.peek().ok_or(RisonError::UnexpectedEnd)?;

        match c {
            '!' => {
                self.pos += 1;
                match self.next_char()? {
                    't' => Ok(Value::Bool(true)),
                    'f' => Ok(Value::Bool(false)),
                    'n' => Ok(Value::Null),
                    '(' => self.nested(start, Self::parse_array),
                    other => Err(RisonError::syntax(
                        start,
                        format!("unknown literal '!{}'", other),
                    )),
                }
            }
            '(' => {
                self.pos += 1;
                self.nested(start, Self::parse_object)
            }
            '\'' => {
                self.pos += 1;
                self.parse_quoted().map(Value::String)
            }
            '-' | '0'..='9' => self.parse_number(),
            c if !NOT_ID_CHAR.contains(c) && !NOT_ID_START.contains(c) => {
                Ok(Value::String(self.parse_id()))
            }
            other => Err(RisonError::syntax(
                start,
                format!("invalid character '{}'", other),
            )),
        }
    }

    fn nested<F>(&mut self, start: usize, parse: F) -> RisonResult<Value>
    where
        F: FnOnce(&mut Self) -> RisonResult<Value>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(RisonError::syntax(start, "nesting too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    /// Parses the body of an array; the opening `!(` is already consumed
    fn parse_array(&mut self) -> RisonResult<Value> {
        let mut items = Vec::new();

        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_value()?);

            let pos = self.pos;
            match self.next_char()? {
                ',' => continue,
                ')' => return Ok(Value::Array(items)),
                other => {
                    return Err(RisonError::syntax(
                        pos,
                        format!("expected ',' or ')' in array, got '{}'", other),
                    ))
                }
            }
        }
    }

    /// Parses the body of an object; the opening `(` is already consumed
    fn parse_object(&mut self) -> RisonResult<Value> {
        let mut map = Map::new();

        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(Value::Object(map));
        }

        loop {
            let key_pos = self.pos;
            let key = match self.parse_value()? {
                Value::String(key) => key,
                _ => return Err(RisonError::syntax(key_pos, "object keys must be strings")),
            };

            let pos = self.pos;
            if self.next_char()? != ':' {
                return Err(RisonError::syntax(pos, "expected ':' after object key"));
            }

            let value = self.parse_value()?;
            map.insert(key, value);

            let pos = self.pos;
            match self.next_char()? {
                ',' => continue,
                ')' => return Ok(Value::Object(map)),
                other => {
                    return Err(RisonError::syntax(
                        pos,
                        format!("expected ',' or ')' in object, got '{}'", other),
                    ))
                }
            }
        }
    }

    /// Parses a quoted string; the opening quote is already consumed
    fn parse_quoted(&mut self) -> RisonResult<String> {
        let mut out = String::new();

        loop {
            match self.next_char()? {
                '\'' => return Ok(out),
                '!' => {
                    let pos = self.pos;
                    match self.next_char()? {
                        c @ ('!' | '\'') => out.push(c),
                        other => {
                            return Err(RisonError::syntax(
                                pos,
                                format!("invalid string escape '!{}'", other),
                            ))
                        }
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn parse_id(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if NOT_ID_CHAR.contains(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_number(&mut self) -> RisonResult<Value> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut is_float = false;

        if bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        self.expect_digits(start)?;

        if bytes.get(self.pos) == Some(&b'.') {
            is_float = true;
            self.pos += 1;
            self.expect_digits(start)?;
        }

        if matches!(bytes.get(self.pos), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(bytes.get(self.pos), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            self.expect_digits(start)?;
        }

        let text = &self.input[start..self.pos];
        let invalid = || RisonError::syntax(start, format!("invalid number '{}'", text));

        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = text.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
        }

        let f = text.parse::<f64>().map_err(|_| invalid())?;
        Number::from_f64(f).map(Value::Number).ok_or_else(invalid)
    }

    fn expect_digits(&mut self, number_start: usize) -> RisonResult<()> {
        let begin = self.pos;
        while self
            .input
            .as_bytes()
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit())
        {
            self.pos += 1;
        }

        if self.pos == begin {
            return Err(RisonError::syntax(number_start, "expected digits in number"));
        }
        Ok(())
    }
}
