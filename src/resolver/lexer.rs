//! Tokenizer for binding files.
//!
//! Newlines are only significant outside brackets, so a value may span
//! several physical lines while a `(`, `[` or `{` is open.

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use super::error::ResolveError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Tok {
    Ident(String),
    /// Magnitude only; a leading `-` is a separate token.
    Int(u64),
    Float(f64),
    Str(String),
    At,
    Percent,
    Eq,
    Dot,
    Slash,
    Comma,
    Colon,
    Minus,
    Plus,
    Open(char),
    Close(char),
    Newline,
}

impl Tok {
    pub(super) fn describe(&self) -> String {
        match self {
            Tok::Ident(s) => format!("'{s}'"),
            Tok::Int(i) => i.to_string(),
            Tok::Float(x) => format!("{x:?}"),
            Tok::Str(_) => "string literal".to_string(),
            Tok::At => "'@'".to_string(),
            Tok::Percent => "'%'".to_string(),
            Tok::Eq => "'='".to_string(),
            Tok::Dot => "'.'".to_string(),
            Tok::Slash => "'/'".to_string(),
            Tok::Comma => "','".to_string(),
            Tok::Colon => "':'".to_string(),
            Tok::Minus => "'-'".to_string(),
            Tok::Plus => "'+'".to_string(),
            Tok::Open(c) | Tok::Close(c) => format!("'{c}'"),
            Tok::Newline => "end of line".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Token {
    pub tok: Tok,
    pub line: usize,
}

pub(super) fn tokenize(text: &str, file: &Path) -> Result<Vec<Token>, ResolveError> {
    Lexer {
        chars: text.chars().peekable(),
        line: 1,
        open: Vec::new(),
        file,
        out: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    /// Open brackets with the line they were opened on.
    open: Vec<(char, usize)>,
    file: &'a Path,
    out: Vec<Token>,
}

impl Lexer<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> ResolveError {
        ResolveError::MalformedBinding {
            file: self.file.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn push(&mut self, tok: Tok) {
        self.out.push(Token {
            tok,
            line: self.line,
        });
    }

    fn run(mut self) -> Result<Vec<Token>, ResolveError> {
        while let Some(c) = self.chars.next() {
            match c {
                '\n' => {
                    if self.open.is_empty() {
                        self.push(Tok::Newline);
                    }
                    self.line += 1;
                }
                c if c.is_whitespace() => {}
                '#' => {
                    while self.chars.peek().is_some_and(|&c| c != '\n') {
                        self.chars.next();
                    }
                }
                '\\' => match self.chars.next() {
                    Some('\n') => self.line += 1,
                    Some('\r') if self.chars.peek() == Some(&'\n') => {
                        self.chars.next();
                        self.line += 1;
                    }
                    _ => return Err(self.error(self.line, "stray '\\' outside a string")),
                },
                '\'' | '"' => {
                    let s = self.string(c)?;
                    self.push(Tok::Str(s));
                }
                '(' | '[' | '{' => {
                    self.open.push((c, self.line));
                    self.push(Tok::Open(c));
                }
                ')' | ']' | '}' => {
                    let want = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match self.open.pop() {
                        Some((o, _)) if o == want => self.push(Tok::Close(c)),
                        Some((o, line)) => {
                            return Err(self.error(
                                self.line,
                                format!("'{c}' does not match '{o}' opened on line {line}"),
                            ));
                        }
                        None => return Err(self.error(self.line, format!("unmatched '{c}'"))),
                    }
                }
                '.' if self.chars.peek().is_some_and(char::is_ascii_digit) => {
                    let tok = self.number(c)?;
                    self.push(tok);
                }
                c if c.is_ascii_digit() => {
                    let tok = self.number(c)?;
                    self.push(tok);
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut ident = String::from(c);
                    while let Some(&n) = self.chars.peek() {
                        if n.is_ascii_alphanumeric() || n == '_' {
                            ident.push(n);
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    self.push(Tok::Ident(ident));
                }
                '@' => self.push(Tok::At),
                '%' => self.push(Tok::Percent),
                '=' => self.push(Tok::Eq),
                '.' => self.push(Tok::Dot),
                '/' => self.push(Tok::Slash),
                ',' => self.push(Tok::Comma),
                ':' => self.push(Tok::Colon),
                '-' => self.push(Tok::Minus),
                '+' => self.push(Tok::Plus),
                other => {
                    return Err(self.error(self.line, format!("unexpected character '{other}'")));
                }
            }
        }

        if let Some(&(c, line)) = self.open.last() {
            return Err(self.error(line, format!("'{c}' is never closed")));
        }
        self.push(Tok::Newline);
        Ok(self.out)
    }

    fn string(&mut self, quote: char) -> Result<String, ResolveError> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                None | Some('\n') => {
                    return Err(self.error(self.line, "unterminated string literal"));
                }
                Some(c) if c == quote => return Ok(s),
                Some('\\') => {
                    let escaped = match self.chars.next() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some(other) => {
                            return Err(self.error(
                                self.line,
                                format!("unknown escape '\\{other}' in string literal"),
                            ));
                        }
                        None => return Err(self.error(self.line, "unterminated string literal")),
                    };
                    s.push(escaped);
                }
                Some(c) => s.push(c),
            }
        }
    }

    fn number(&mut self, first: char) -> Result<Tok, ResolveError> {
        let mut text = String::from(first);
        let mut is_float = first == '.';

        self.digits(&mut text);
        if !is_float && self.chars.peek() == Some(&'.') {
            is_float = true;
            text.push('.');
            self.chars.next();
            self.digits(&mut text);
        }
        if matches!(self.chars.peek(), Some('e' | 'E')) {
            is_float = true;
            text.push('e');
            self.chars.next();
            if let Some(&sign) = self.chars.peek().filter(|c| matches!(**c, '+' | '-')) {
                text.push(sign);
                self.chars.next();
            }
            if !self.chars.peek().is_some_and(char::is_ascii_digit) {
                return Err(self.error(self.line, format!("malformed number '{text}'")));
            }
            self.digits(&mut text);
        }
        if self
            .chars
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            return Err(self.error(self.line, format!("malformed number near '{text}'")));
        }

        if is_float {
            match text.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Tok::Float(x)),
                _ => Err(self.error(self.line, format!("float literal '{text}' out of range"))),
            }
        } else {
            text.parse::<u64>().map(Tok::Int).map_err(|_| {
                self.error(self.line, format!("integer literal '{text}' out of range"))
            })
        }
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
    }
}
