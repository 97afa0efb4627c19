//! Reader for the protobuf text format used by `ops.pbtxt`.
//!
//! The text is first parsed into an untyped field tree, then the tree is
//! mapped onto the registry model. Only the fields the generator consumes are
//! interpreted; everything else is parsed and skipped.

use std::iter::Peekable;
use std::str::Chars;

use super::{AttrValue, AttributeDefinition, ArgDef, OpList, OperationDefinition, non_empty};
use crate::dtype::DataType;
use crate::error::{GenerateError, GenerateResult};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    Punct(char),
}

#[derive(Debug, Clone, Copy)]
struct Pos {
    line: usize,
    column: usize,
}

#[derive(Debug)]
enum Value {
    /// Identifier, number, or (possibly signed) literal token text.
    Scalar(Token),
    Message(Vec<Field>),
    List(Vec<Value>),
}

#[derive(Debug)]
struct Field {
    name: String,
    value: Value,
    pos: Pos,
}

fn error_at(pos: Pos, message: impl Into<String>) -> GenerateError {
    GenerateError::RegistryParse {
        line: pos.line,
        column: pos.column,
        message: message.into(),
    }
}

// =============================================================================
// Lexer
// =============================================================================

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn tokenize(mut self) -> GenerateResult<Vec<(Token, Pos)>> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            let pos = self.pos();
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c == '"' || c == '\'' {
                self.bump();
                let s = self.string_body(c, pos)?;
                tokens.push((Token::Str(s), pos));
            } else if c.is_ascii_digit() || c == '.' {
                tokens.push((Token::Number(self.number()), pos));
            } else if c.is_ascii_alphabetic() || c == '_' {
                tokens.push((Token::Ident(self.ident()), pos));
            } else if "{}<>[]:,;-".contains(c) {
                self.bump();
                tokens.push((Token::Punct(c), pos));
            } else {
                return Err(error_at(pos, format!("unexpected character '{c}'")));
            }
        }
        Ok(tokens)
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    fn number(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            let exponent_sign = (c == '-' || c == '+') && out.ends_with(['e', 'E']);
            if c.is_ascii_alphanumeric() || c == '.' || exponent_sign {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    /// Read a quoted string after its opening quote, decoding C escapes.
    fn string_body(&mut self, quote: char, start: Pos) -> GenerateResult<String> {
        let mut bytes = Vec::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(error_at(start, "unterminated string literal"));
            };
            match c {
                c if c == quote => break,
                '\n' => return Err(error_at(start, "newline in string literal")),
                '\\' => {
                    let Some(esc) = self.bump() else {
                        return Err(error_at(start, "unterminated string literal"));
                    };
                    match esc {
                        'n' => bytes.push(b'\n'),
                        't' => bytes.push(b'\t'),
                        'r' => bytes.push(b'\r'),
                        'a' => bytes.push(0x07),
                        'b' => bytes.push(0x08),
                        'f' => bytes.push(0x0c),
                        'v' => bytes.push(0x0b),
                        '\\' | '\'' | '"' | '?' => bytes.push(esc as u8),
                        'x' | 'X' => {
                            let digits = self.take_digits(2, 16);
                            let byte = u8::from_str_radix(&digits, 16)
                                .map_err(|_| error_at(start, "invalid hex escape"))?;
                            bytes.push(byte);
                        }
                        '0'..='7' => {
                            let mut digits = esc.to_string();
                            digits.push_str(&self.take_digits(2, 8));
                            let byte = u8::from_str_radix(&digits, 8)
                                .map_err(|_| error_at(start, "invalid octal escape"))?;
                            bytes.push(byte);
                        }
                        other => {
                            return Err(error_at(start, format!("unknown escape '\\{other}'")));
                        }
                    }
                }
                c => {
                    let mut buf = [0; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn take_digits(&mut self, max: usize, radix: u32) -> String {
        let mut out = String::new();
        while out.len() < max {
            match self.chars.peek() {
                Some(&c) if c.is_digit(radix) => {
                    out.push(c);
                    self.bump();
                }
                _ => break,
            }
        }
        out
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<(Token, Pos)>,
    index: usize,
    end: Pos,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(t, _)| t)
    }

    fn pos(&self) -> Pos {
        self.tokens.get(self.index).map_or(self.end, |(_, p)| *p)
    }

    fn advance(&mut self) -> Option<(Token, Pos)> {
        let item = self.tokens.get(self.index).cloned();
        if item.is_some() {
            self.index += 1;
        }
        item
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Parse fields until `close` (or end of input when `close` is `None`).
    fn fields(&mut self, close: Option<char>) -> GenerateResult<Vec<Field>> {
        let mut fields = Vec::new();
        loop {
            match (self.peek(), close) {
                (None, None) => return Ok(fields),
                (None, Some(c)) => return Err(error_at(self.end, format!("expected '{c}'"))),
                (Some(Token::Punct(p)), Some(c)) if *p == c => {
                    self.index += 1;
                    return Ok(fields);
                }
                _ => {}
            }
            fields.push(self.field()?);
            if !self.eat(';') {
                self.eat(',');
            }
        }
    }

    fn field(&mut self) -> GenerateResult<Field> {
        let pos = self.pos();
        let name = match self.advance() {
            Some((Token::Ident(name), _)) => name,
            Some((tok, p)) => return Err(error_at(p, format!("expected field name, found {tok:?}"))),
            None => return Err(error_at(pos, "expected field name")),
        };
        let had_colon = self.eat(':');
        let value = if let Some(close) = self.open_message() {
            Value::Message(self.fields(Some(close))?)
        } else if !had_colon {
            return Err(error_at(self.pos(), format!("expected ':' after '{name}'")));
        } else if self.eat('[') {
            self.list()?
        } else {
            Value::Scalar(self.scalar()?)
        };
        Ok(Field { name, value, pos })
    }

    fn open_message(&mut self) -> Option<char> {
        if self.eat('{') {
            Some('}')
        } else if self.eat('<') {
            Some('>')
        } else {
            None
        }
    }

    fn list(&mut self) -> GenerateResult<Value> {
        let mut items = Vec::new();
        if self.eat(']') {
            return Ok(Value::List(items));
        }
        loop {
            if let Some(close) = self.open_message() {
                items.push(Value::Message(self.fields(Some(close))?));
            } else {
                items.push(Value::Scalar(self.scalar()?));
            }
            if self.eat(']') {
                return Ok(Value::List(items));
            }
            if !self.eat(',') {
                return Err(error_at(self.pos(), "expected ',' or ']' in list"));
            }
        }
    }

    fn scalar(&mut self) -> GenerateResult<Token> {
        let pos = self.pos();
        let negative = self.eat('-');
        match self.advance() {
            Some((Token::Str(mut s), _)) if !negative => {
                // Adjacent string literals concatenate.
                while let Some(Token::Str(more)) = self.peek() {
                    s.push_str(more);
                    self.index += 1;
                }
                Ok(Token::Str(s))
            }
            Some((Token::Number(n), _)) if negative => Ok(Token::Number(format!("-{n}"))),
            Some((Token::Ident(i), _)) if negative => Ok(Token::Ident(format!("-{i}"))),
            Some((tok @ (Token::Number(_) | Token::Ident(_)), _)) => Ok(tok),
            Some((tok, p)) => Err(error_at(p, format!("expected value, found {tok:?}"))),
            None => Err(error_at(pos, "expected value")),
        }
    }
}

// =============================================================================
// Tree -> registry model
// =============================================================================

/// Parse a full `OpList` in text format.
pub fn parse_op_list(text: &str) -> GenerateResult<OpList> {
    let lexer = Lexer::new(text);
    let end = lexer_end(text);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser {
        tokens,
        index: 0,
        end,
    };
    let root = parser.fields(None)?;

    let mut ops = Vec::new();
    for field in root {
        if field.name == "op" {
            ops.push(op_from(&field)?);
        }
    }
    Ok(OpList { ops })
}

fn lexer_end(text: &str) -> Pos {
    let line = text.lines().count().max(1);
    let column = text.lines().last().map_or(1, |l| l.chars().count() + 1);
    Pos { line, column }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Scalar(Token::Str(_)) => "a string".to_string(),
        Value::Scalar(Token::Number(n)) => format!("number {n}"),
        Value::Scalar(Token::Ident(i)) => format!("identifier {i}"),
        Value::Scalar(Token::Punct(c)) => format!("'{c}'"),
        Value::Message(_) => "a message".to_string(),
        Value::List(items) => format!("a list of {} values", items.len()),
    }
}

fn mismatch(field: &Field, expected: &str) -> GenerateError {
    error_at(
        field.pos,
        format!(
            "'{}' must be {expected}, found {}",
            field.name,
            describe(&field.value)
        ),
    )
}

fn message(field: &Field) -> GenerateResult<&[Field]> {
    match &field.value {
        Value::Message(fields) => Ok(fields),
        _ => Err(mismatch(field, "a message")),
    }
}

fn string(field: &Field) -> GenerateResult<String> {
    match &field.value {
        Value::Scalar(Token::Str(s)) => Ok(s.clone()),
        _ => Err(mismatch(field, "a string")),
    }
}

fn ident(field: &Field) -> GenerateResult<&str> {
    match &field.value {
        Value::Scalar(Token::Ident(s)) => Ok(s),
        _ => Err(mismatch(field, "an identifier")),
    }
}

fn scalar_text(field: &Field) -> GenerateResult<&str> {
    match &field.value {
        Value::Scalar(Token::Ident(s) | Token::Number(s)) => Ok(s),
        _ => Err(mismatch(field, "a number")),
    }
}

fn dtype(field: &Field) -> GenerateResult<DataType> {
    let name = ident(field)?;
    DataType::from_proto_name(name).ok_or_else(|| GenerateError::UnknownDataType {
        name: name.to_string(),
    })
}

fn op_from(field: &Field) -> GenerateResult<OperationDefinition> {
    let mut op = OperationDefinition::default();
    for f in message(field)? {
        match f.name.as_str() {
            "name" => op.name = string(f)?,
            "input_arg" => op.input_args.push(arg_from(f)?),
            "output_arg" => op.output_args.push(arg_from(f)?),
            "attr" => op.attrs.push(attr_from(f)?),
            "summary" => op.summary = non_empty(Some(string(f)?)),
            "description" => op.description = non_empty(Some(string(f)?)),
            _ => {}
        }
    }
    if op.name.is_empty() {
        return Err(error_at(field.pos, "op without a name"));
    }
    Ok(op)
}

fn arg_from(field: &Field) -> GenerateResult<ArgDef> {
    let mut arg = ArgDef::default();
    for f in message(field)? {
        match f.name.as_str() {
            "name" => arg.name = string(f)?,
            "type" => arg.dtype = Some(dtype(f)?),
            "type_attr" => arg.type_attr = non_empty(Some(string(f)?)),
            "number_attr" => arg.number_attr = non_empty(Some(string(f)?)),
            "type_list_attr" => arg.type_list_attr = non_empty(Some(string(f)?)),
            _ => {}
        }
    }
    Ok(arg)
}

fn attr_from(field: &Field) -> GenerateResult<AttributeDefinition> {
    let mut attr = AttributeDefinition::default();
    for f in message(field)? {
        match f.name.as_str() {
            "name" => attr.name = string(f)?,
            "type" => attr.kind = string(f)?,
            "default_value" => attr.default = attr_value_from(f)?,
            _ => {}
        }
    }
    Ok(attr)
}

/// Map an `AttrValue` message. An empty message means "no default".
fn attr_value_from(field: &Field) -> GenerateResult<Option<AttrValue>> {
    let Some(f) = message(field)?.first() else {
        return Ok(None);
    };
    let value = match f.name.as_str() {
        "i" => {
            let text = scalar_text(f)?;
            AttrValue::Int(
                text.parse()
                    .map_err(|_| error_at(f.pos, format!("invalid integer '{text}'")))?,
            )
        }
        "f" => AttrValue::Float(parse_float(scalar_text(f)?).ok_or_else(|| {
            error_at(f.pos, "invalid float")
        })?),
        "b" => AttrValue::Bool(parse_bool(scalar_text(f)?).ok_or_else(|| {
            error_at(f.pos, "invalid bool")
        })?),
        "s" => AttrValue::String(string(f)?),
        "type" => AttrValue::Type(dtype(f)?),
        _ => AttrValue::Opaque,
    };
    Ok(Some(value))
}

fn parse_float(text: &str) -> Option<f32> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let lower = body.to_ascii_lowercase();
    let magnitude = match lower.as_str() {
        "inf" | "infinity" => f32::INFINITY,
        "nan" => f32::NAN,
        _ => lower.trim_end_matches('f').parse().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "t" | "1" => Some(true),
        "false" | "False" | "f" | "0" => Some(false),
        _ => None,
    }
}
