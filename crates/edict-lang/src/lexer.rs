//! Lexer
//!
//! Turns source text into tokens. Literal payloads are decoded here, once:
//! string and field-reference escapes, regex delimiter escapes, and decimal
//! numbers. Any malformed literal is a fatal lex error.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::token::{keyword, Position, Token, TokenKind};
use crate::{Error, Result};

/// Tokenize a whole source text, ending with [`TokenKind::Eof`]
///
/// # Errors
///
/// Returns [`Error::Lex`] on the first malformed token.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let slash_divides = tokens
            .last()
            .is_some_and(|token: &Token| token.kind.ends_operand());
        let token = lexer.next_token(slash_divides)?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == '#' {
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self, slash_divides: bool) -> Result<Token> {
        self.skip_trivia();
        let start = self.position();
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        let kind = match ch {
            '"' => {
                self.bump();
                TokenKind::Str(self.read_escaped('"', start)?)
            }
            '{' => {
                self.bump();
                TokenKind::Field(self.read_escaped('}', start)?)
            }
            '/' if !slash_divides => {
                self.bump();
                TokenKind::Regex(self.read_regex(start)?)
            }
            c if c.is_ascii_digit() => TokenKind::Number(self.read_number(start)?),
            c if c.is_alphabetic() || c == '_' => {
                let word = self.read_word();
                keyword(&word).unwrap_or(TokenKind::Name(word))
            }
            _ => self.read_operator(start)?,
        };
        Ok(Token::new(kind, start))
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    fn read_number(&mut self, start: Position) -> Result<Decimal> {
        let mut text = String::new();
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            text.push(ch);
            self.bump();
        }
        // A dot only belongs to the number when a digit follows it;
        // otherwise it is the concatenation operator.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.bump();
            while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                text.push(ch);
                self.bump();
            }
        }
        Decimal::from_str(&text).map_err(|e| {
            Error::lex(
                start,
                format!(
                    "number literal '{text}' does not fit a decimal of {} significant digits: {e}",
                    crate::numeric::MAX_DIGITS
                ),
            )
        })
    }

    fn read_operator(&mut self, start: Position) -> Result<TokenKind> {
        let Some(ch) = self.bump() else {
            return Ok(TokenKind::Eof);
        };
        let kind = match ch {
            '=' => self.followed_by('=', TokenKind::Eq, TokenKind::Assign),
            '<' => self.followed_by('=', TokenKind::Le, TokenKind::Lt),
            '>' => self.followed_by('=', TokenKind::Ge, TokenKind::Gt),
            '!' => match self.peek() {
                Some('=') => {
                    self.bump();
                    TokenKind::Ne
                }
                Some('~') => {
                    self.bump();
                    TokenKind::NotTilde
                }
                _ => return Err(Error::lex(start, "expected '=' or '~' after '!'")),
            },
            '~' => TokenKind::Tilde,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            other => return Err(Error::lex(start, format!("unexpected character {other:?}"))),
        };
        Ok(kind)
    }

    fn followed_by(&mut self, next: char, then: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.bump();
            then
        } else {
            otherwise
        }
    }

    /// Read up to an unescaped `terminator`, decoding escapes.
    fn read_escaped(&mut self, terminator: char, start: Position) -> Result<String> {
        let mut text = String::new();
        loop {
            let escape_at = self.position();
            match self.bump() {
                None => {
                    return Err(Error::lex(
                        start,
                        format!("unterminated literal, expected {terminator:?}"),
                    ));
                }
                Some(c) if c == terminator => return Ok(text),
                Some('\\') => text.push(self.read_escape(escape_at)?),
                Some(c) => text.push(c),
            }
        }
    }

    fn read_escape(&mut self, at: Position) -> Result<char> {
        let Some(code) = self.bump() else {
            return Err(Error::lex(at, "unterminated escape sequence"));
        };
        let decoded = match code {
            '\\' => '\\',
            '"' => '"',
            '}' => '}',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            'x' => self.read_hex_escape(2, at)?,
            'u' => self.read_hex_escape(4, at)?,
            'U' => self.read_hex_escape(8, at)?,
            other => {
                return Err(Error::lex(at, format!("invalid escape sequence '\\{other}'")));
            }
        };
        Ok(decoded)
    }

    fn read_hex_escape(&mut self, digits: usize, at: Position) -> Result<char> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| {
                    Error::lex(at, format!("truncated escape, expected {digits} hex digits"))
                })?;
            self.bump();
            value = value * 16 + digit;
        }
        char::from_u32(value)
            .ok_or_else(|| Error::lex(at, format!("escape \\{value:x} is not a valid character")))
    }

    /// Read a regex body. Only `\/` is unescaped; everything else is kept as
    /// written so the regex engine sees its own escapes.
    fn read_regex(&mut self, start: Position) -> Result<String> {
        let mut body = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(Error::lex(start, "unterminated regex literal"));
                }
                Some('/') => return Ok(body),
                Some('\\') => match self.bump() {
                    Some('/') => body.push('/'),
                    Some(c) => {
                        body.push('\\');
                        body.push(c);
                    }
                    None => return Err(Error::lex(start, "unterminated regex literal")),
                },
                Some(c) => body.push(c),
            }
        }
    }
}
