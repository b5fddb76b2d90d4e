//! Statement parser for binding files.
//!
//! Grammar, one logical line per statement:
//!
//! ```text
//! include '<path>'
//! import <dotted.module>
//! [scope/]*<Configurable>.<parameter> = <value>
//! <parameter> = <value>
//! ```

use std::path::Path;

use super::binding::BindingKey;
use super::error::ResolveError;
use super::lexer::{Tok, Token, tokenize};
use super::value::{MAX_NESTING, Reference, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Include { path: String, line: usize },
    Import { module: String, line: usize },
    Binding {
        key: BindingKey,
        value: Value,
        line: usize,
    },
}

impl Statement {
    pub fn line(&self) -> usize {
        match self {
            Statement::Include { line, .. }
            | Statement::Import { line, .. }
            | Statement::Binding { line, .. } => *line,
        }
    }
}

/// Parse a whole source text. `file` is only used for error messages.
pub fn parse_source(text: &str, file: &Path) -> Result<Vec<Statement>, ResolveError> {
    let tokens = tokenize(text, file)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        file,
    };

    let mut statements = Vec::new();
    while !parser.at_end() {
        if parser.eat(&Tok::Newline) {
            continue;
        }
        statements.push(parser.statement()?);
    }
    Ok(statements)
}

enum Keyword {
    Include,
    Import,
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    /// Containers currently open in the value being parsed.
    depth: usize,
    file: &'a Path,
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset).map(|t| &t.tok)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|t| t.tok.clone());
        self.pos += 1;
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::MalformedBinding {
            file: self.file.to_path_buf(),
            line: self.line(),
            message: message.into(),
        }
    }

    fn unexpected(&self, wanted: &str) -> ResolveError {
        let found = self.peek().map_or("end of input".to_string(), Tok::describe);
        self.error(format!("expected {wanted}, found {found}"))
    }

    fn expect(&mut self, tok: &Tok, wanted: &str) -> Result<(), ResolveError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.unexpected(wanted))
        }
    }

    fn end_of_statement(&mut self) -> Result<(), ResolveError> {
        if self.at_end() || self.eat(&Tok::Newline) {
            Ok(())
        } else {
            Err(self.unexpected("end of line"))
        }
    }

    fn statement(&mut self) -> Result<Statement, ResolveError> {
        let line = self.line();

        let keyword = match (self.peek(), self.peek_at(1)) {
            (Some(Tok::Ident(w)), Some(Tok::Str(_))) if w == "include" => Some(Keyword::Include),
            (Some(Tok::Ident(w)), Some(Tok::Ident(_))) if w == "import" => Some(Keyword::Import),
            _ => None,
        };
        match keyword {
            Some(Keyword::Include) => {
                self.pos += 1;
                let path = self.string_literal()?;
                self.end_of_statement()?;
                return Ok(Statement::Include { path, line });
            }
            Some(Keyword::Import) => {
                self.pos += 1;
                let module = self.dotted_name()?;
                self.end_of_statement()?;
                return Ok(Statement::Import { module, line });
            }
            None => {}
        }

        let target = self.target()?;
        self.expect(&Tok::Eq, "'='")?;
        let value = self.value()?;
        self.end_of_statement()?;
        Ok(Statement::Binding {
            key: target,
            value,
            line,
        })
    }

    fn ident(&mut self) -> Result<String, ResolveError> {
        match self.next() {
            Some(Tok::Ident(s)) => Ok(s),
            _ => {
                self.pos -= 1;
                Err(self.unexpected("identifier"))
            }
        }
    }

    fn string_literal(&mut self) -> Result<String, ResolveError> {
        match self.next() {
            Some(Tok::Str(s)) => Ok(s),
            _ => {
                self.pos -= 1;
                Err(self.unexpected("string literal"))
            }
        }
    }

    fn dotted_name(&mut self) -> Result<String, ResolveError> {
        let mut name = self.ident()?;
        while self.eat(&Tok::Dot) {
            name.push('.');
            name.push_str(&self.ident()?);
        }
        Ok(name)
    }

    /// `a/b/Name.sub.attr` as written, with `/` and `.` separators kept.
    fn scoped_name(&mut self) -> Result<String, ResolveError> {
        let mut name = self.ident()?;
        loop {
            if self.eat(&Tok::Slash) {
                name.push('/');
            } else if self.eat(&Tok::Dot) {
                name.push('.');
            } else {
                return Ok(name);
            }
            name.push_str(&self.ident()?);
        }
    }

    fn target(&mut self) -> Result<BindingKey, ResolveError> {
        let name = self.scoped_name()?;
        let key = BindingKey::from_target(&name);
        if key.parameter.contains('/') {
            return Err(self.error(format!(
                "'{name}' has a scope but no configurable; expected scope/Name.parameter"
            )));
        }
        Ok(key)
    }

    fn value(&mut self) -> Result<Value, ResolveError> {
        match self.next() {
            Some(Tok::Int(magnitude)) => self.int(magnitude, false),
            Some(Tok::Float(x)) => Ok(Value::Float(x)),
            Some(Tok::Minus) => match self.next() {
                Some(Tok::Int(magnitude)) => self.int(magnitude, true),
                Some(Tok::Float(x)) => Ok(Value::Float(-x)),
                _ => {
                    self.pos -= 1;
                    Err(self.unexpected("number after '-'"))
                }
            },
            Some(Tok::Plus) => match self.next() {
                Some(Tok::Int(magnitude)) => self.int(magnitude, false),
                Some(Tok::Float(x)) => Ok(Value::Float(x)),
                _ => {
                    self.pos -= 1;
                    Err(self.unexpected("number after '+'"))
                }
            },
            Some(Tok::Str(first)) => {
                // Adjacent literals concatenate.
                let mut s = first;
                while matches!(self.peek(), Some(Tok::Str(_))) {
                    s.push_str(&self.string_literal()?);
                }
                Ok(Value::Str(s))
            }
            Some(Tok::Ident(word)) => match word.as_str() {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "None" => Ok(Value::None),
                _ => {
                    self.pos -= 1;
                    Err(self.error(format!(
                        "bare name '{word}' is not a value; write @{word}() for a reference \
                         or quote it as a string"
                    )))
                }
            },
            Some(Tok::At) => {
                let name = self.scoped_name()?;
                let evaluate = if self.eat(&Tok::Open('(')) {
                    self.expect(&Tok::Close(')'), "')' (references take no arguments)")?;
                    true
                } else {
                    false
                };
                Ok(Value::Reference(Reference::new(name, evaluate)))
            }
            Some(Tok::Percent) => Ok(Value::Macro(self.scoped_name()?)),
            Some(Tok::Open('[')) => Ok(Value::List(self.nested(|p| p.sequence(']'))?.0)),
            Some(Tok::Open('(')) => {
                let (items, trailing_comma) = self.nested(|p| p.sequence(')'))?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.into_iter().next().unwrap_or(Value::None))
                } else {
                    Ok(Value::Tuple(items))
                }
            }
            Some(Tok::Open('{')) => self.nested(Self::dict),
            _ => {
                self.pos -= 1;
                Err(self.unexpected("a value"))
            }
        }
    }

    /// Apply the sign before the range check so `-9223372036854775808` fits.
    fn int(&mut self, magnitude: u64, negative: bool) -> Result<Value, ResolveError> {
        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        value.map(Value::Int).ok_or_else(|| {
            self.pos -= 1;
            let sign = if negative { "-" } else { "" };
            self.error(format!("integer literal '{sign}{magnitude}' out of range"))
        })
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!(
                "nesting too deep (more than {MAX_NESTING} levels of brackets)"
            )));
        }
        self.depth += 1;
        let out = parse(self);
        self.depth -= 1;
        out
    }

    /// Comma-separated values up to `close`. Returns whether the last item
    /// was followed by a comma.
    fn sequence(&mut self, close: char) -> Result<(Vec<Value>, bool), ResolveError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            if self.eat(&Tok::Close(close)) {
                return Ok((items, trailing_comma));
            }
            items.push(self.value()?);
            trailing_comma = self.eat(&Tok::Comma);
            if !trailing_comma && self.peek() != Some(&Tok::Close(close)) {
                return Err(self.unexpected(&format!("',' or '{close}'")));
            }
        }
    }

    fn dict(&mut self) -> Result<Value, ResolveError> {
        let mut entries = Vec::new();
        loop {
            if self.eat(&Tok::Close('}')) {
                return Ok(Value::Dict(entries));
            }
            let key = self.value()?;
            self.expect(&Tok::Colon, "':'")?;
            let value = self.value()?;
            entries.push((key, value));
            if !self.eat(&Tok::Comma) && self.peek() != Some(&Tok::Close('}')) {
                return Err(self.unexpected("',' or '}'"));
            }
        }
    }
}
