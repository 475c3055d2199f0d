//! Default-value expressions.
//!
//! Optional parameters carry an expression that is evaluated when the user
//! leaves them out. Three forms are accepted:
//!
//! ```text
//! 10                      plain text, evaluates to the string "10"
//! ${source.author}        a single expression, evaluates to its value
//! Hello ${source.author}  text with interpolations, evaluates to a string
//! ```
//!
//! Inside `${...}` an expression is a string (`'a'` or `"a"`), a number, a
//! boolean, an array (`[e, ...]`) or a dotted path rooted at one of the
//! variables exposed by [`Variables`]. For events these are `event`,
//! `action`, `integration` and `source` (see [`EventScope`]).

use crate::foundation::error::ExpressionError;
use crate::foundation::event::ActionEvent;
use crate::foundation::value::Value;

/// Variables visible to an expression.
pub trait Variables {
    /// Resolves `variable.path[0].path[1]...`.
    fn lookup(&self, variable: &str, path: &[&str]) -> Result<Value, ExpressionError>;
}

/// Exposes an [`ActionEvent`] to expressions.
///
/// | path                     | value                                  |
/// |--------------------------|----------------------------------------|
/// | `event.content`          | raw message content                    |
/// | `event.controller`       | controller display name                |
/// | `event.command`          | command name                           |
/// | `event.header.KEY`       | request header `KEY`                   |
/// | `action.id`              | action id                              |
/// | `action.content`         | action content                         |
/// | `action.controller`      | controller type id                     |
/// | `action.command`         | command name                           |
/// | `integration.name`       | integration name (also `integration`)  |
/// | `source.NAME`            | property `NAME` of the request source  |
#[derive(Debug, Clone, Copy)]
pub struct EventScope<'a>(pub &'a ActionEvent);

impl EventScope<'_> {
    /// Root variables an event scope resolves.
    pub const VARIABLES: &'static [&'static str] = &["event", "action", "integration", "source"];
}

impl Variables for EventScope<'_> {
    fn lookup(&self, variable: &str, path: &[&str]) -> Result<Value, ExpressionError> {
        let event = self.0;
        let unknown = || ExpressionError::UnknownProperty {
            variable: variable.to_string(),
            property: path.join("."),
        };

        match (variable, path) {
            ("event", ["content"]) => Ok(event.request().content().into()),
            ("event", ["controller"]) => Ok(event.controller().name().into()),
            ("event", ["command"]) => Ok(event.command().name().into()),
            ("event", ["header", key]) => event.request().header(key).map(Value::from).ok_or_else(unknown),
            ("action", ["id"]) => Ok(event.action().id().as_str().into()),
            ("action", ["content"]) => Ok(event.action().content().into()),
            ("action", ["controller"]) => Ok(event.action().controller_type().into()),
            ("action", ["command"]) => Ok(event.action().command_name().into()),
            ("integration", [] | ["name"]) => Ok(event.request().integration().into()),
            ("source", [name]) => event.request().source().property(name).ok_or_else(unknown),
            ("event" | "action" | "integration" | "source", _) => Err(unknown()),
            _ => Err(ExpressionError::UnknownVariable(variable.to_string())),
        }
    }
}

/// Evaluates a default-value expression.
pub fn evaluate(expression: &str, vars: &impl Variables) -> Result<Value, ExpressionError> {
    let Some(start) = expression.find("${") else {
        return Ok(Value::String(expression.to_string()));
    };

    let trimmed = expression.trim();
    if let Some(inner) = trimmed.strip_prefix("${") {
        let end = closing_brace(expression, inner)?;
        if end + 1 == inner.len() {
            return Parser::new(expression, &inner[..end]).parse(vars);
        }
    }

    let mut out = expression[..start].to_string();
    let mut rest = &expression[start..];
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let inner = &rest[start + 2..];
        let end = closing_brace(expression, inner)?;
        let value = Parser::new(expression, &inner[..end]).parse(vars)?;
        out.push_str(&value.to_string());
        rest = &inner[end + 1..];
    }
    out.push_str(rest);
    Ok(Value::String(out))
}

/// Parses `expression` without evaluating it.
///
/// Paths are accepted whenever their root is one of `variables`; properties
/// are only known once a request exists.
pub fn check(expression: &str, variables: &[&str]) -> Result<(), ExpressionError> {
    evaluate(expression, &SyntaxOnly(variables)).map(drop)
}

struct SyntaxOnly<'a>(&'a [&'a str]);

impl Variables for SyntaxOnly<'_> {
    fn lookup(&self, variable: &str, _path: &[&str]) -> Result<Value, ExpressionError> {
        if self.0.contains(&variable) {
            Ok(Value::String(String::new()))
        } else {
            Err(ExpressionError::UnknownVariable(variable.to_string()))
        }
    }
}

/// Byte offset of the `}` closing an expression, skipping quoted text.
fn closing_brace(expression: &str, inner: &str) -> Result<usize, ExpressionError> {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in inner.char_indices() {
        match (quote, c) {
            (Some(_), _) if escaped => escaped = false,
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '}') => return Ok(i),
            (None, _) => {}
        }
    }
    Err(ExpressionError::syntax(expression, expression.len(), "missing closing '}'"))
}

struct Parser<'s> {
    expression: &'s str,
    src: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn new(expression: &'s str, src: &'s str) -> Self {
        Self {
            expression,
            src,
            pos: 0,
        }
    }

    fn parse(mut self, vars: &impl Variables) -> Result<Value, ExpressionError> {
        let value = self.value(vars)?;
        self.skip_whitespace();
        if self.pos != self.src.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(value)
    }

    fn error(&self, reason: &str) -> ExpressionError {
        ExpressionError::syntax(self.expression, self.pos, reason)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn value(&mut self, vars: &impl Variables) -> Result<Value, ExpressionError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.array(vars),
            Some(quote @ ('\'' | '"')) => self.string(quote),
            Some(c) if c.is_ascii_digit() || c == '-' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.path(vars),
            _ => Err(self.error("expected a value")),
        }
    }

    fn array(&mut self, vars: &impl Variables) -> Result<Value, ExpressionError> {
        self.bump();
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.value(vars)?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(Value::Array(items)),
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<Value, ExpressionError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => text.push(c),
                    None => break,
                },
                Some(c) if c == quote => return Ok(Value::String(text)),
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Value, ExpressionError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        self.take_while(|c| c.is_ascii_digit() || c == '.');
        let literal = &self.src[start..self.pos];
        if let Ok(v) = literal.parse::<i64>() {
            return Ok(Value::I64(v));
        }
        literal
            .parse::<f64>()
            .map(Value::F64)
            .map_err(|_| self.error("invalid number"))
    }

    fn path(&mut self, vars: &impl Variables) -> Result<Value, ExpressionError> {
        let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '-';
        let root = self.take_while(is_ident);
        let mut segments = Vec::new();
        while self.peek() == Some('.') {
            self.bump();
            let segment = self.take_while(is_ident);
            if segment.is_empty() {
                return Err(self.error("expected a property name"));
            }
            segments.push(segment);
        }

        match (root, segments.as_slice()) {
            ("true", []) => Ok(Value::Bool(true)),
            ("false", []) => Ok(Value::Bool(false)),
            _ => vars.lookup(root, &segments),
        }
    }
}
