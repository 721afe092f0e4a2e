//! Tokens produced by the lexer

use std::fmt;

use rust_decimal::Decimal;

/// A position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line number, starting at 1
    pub line: usize,
    /// Column number, starting at 1
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Token kinds. Literal payloads are already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `{name}` field reference
    Field(String),
    /// `"text"` string literal
    Str(String),
    /// `/body/` regex literal, body passed through to the regex engine
    Regex(String),
    /// Decimal number literal
    Number(Decimal),
    /// `true` / `false`
    Bool(bool),
    /// Function or directive name
    Name(String),

    If,
    Then,
    Elif,
    Else,
    Fi,
    And,
    Or,
    Not,

    /// `=`
    Assign,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~`
    Tilde,
    /// `!~`
    NotTilde,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `.`
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,

    Eof,
}

impl TokenKind {
    /// Whether this token can end an operand, making a following `/` a
    /// division rather than the start of a regex.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Field(_)
                | TokenKind::Str(_)
                | TokenKind::Regex(_)
                | TokenKind::Number(_)
                | TokenKind::Bool(_)
                | TokenKind::Name(_)
                | TokenKind::RParen
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Field(name) => write!(f, "field {{{name}}}"),
            TokenKind::Str(s) => write!(f, "string {s:?}"),
            TokenKind::Regex(r) => write!(f, "regex /{r}/"),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Bool(b) => write!(f, "{b}"),
            TokenKind::Name(name) => write!(f, "name '{name}'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Then => write!(f, "'then'"),
            TokenKind::Elif => write!(f, "'elif'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::Fi => write!(f, "'fi'"),
            TokenKind::And => write!(f, "'and'"),
            TokenKind::Or => write!(f, "'or'"),
            TokenKind::Not => write!(f, "'not'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::Eq => write!(f, "'=='"),
            TokenKind::Ne => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::Tilde => write!(f, "'~'"),
            TokenKind::NotTilde => write!(f, "'!~'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// Map a bare word to its keyword or literal token, if it is one
pub(crate) fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "fi" => TokenKind::Fi,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => return None,
    };
    Some(kind)
}
