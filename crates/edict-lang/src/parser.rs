//! Recursive-descent parser
//!
//! One token of lookahead, no backtracking. Precedence from loosest to
//! tightest: `or`, `and`, `not`, comparison and match (non-associative),
//! `+ - .`, `* / %`, unary `+ -`, primary.

use crate::lexer::tokenize;
use crate::syntax::{
    BinaryOp, CompareOp, Directive, ExprKind, ExprNode, RuleNode, SourceFile, StmtNode, UnaryOp,
};
use crate::token::{Position, Token, TokenKind};
use crate::{Error, Result};

/// Parse source text into a syntax tree
///
/// # Errors
///
/// Returns [`Error::Lex`] or [`Error::Parse`] for malformed input.
pub fn parse(source: &str) -> Result<SourceFile> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_file()
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

enum CompareKind {
    Value(CompareOp),
    Match { negated: bool },
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.index + offset)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn position(&self) -> Position {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map(|token| token.position)
            .unwrap_or_default()
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        kind
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{expected}")))
        }
    }

    fn unexpected(&self, wanted: &str) -> Error {
        Error::parse(
            self.position(),
            format!("expected {wanted}, found {}", self.peek()),
        )
    }

    fn parse_file(mut self) -> Result<SourceFile> {
        let mut file = SourceFile::default();

        while matches!(self.peek(), TokenKind::Name(_)) && *self.peek_at(1) == TokenKind::LParen {
            file.directives.push(self.parse_directive()?);
        }

        while *self.peek() != TokenKind::Eof {
            file.body.push(self.parse_item()?);
        }
        Ok(file)
    }

    fn parse_directive(&mut self) -> Result<Directive> {
        let position = self.position();
        let TokenKind::Name(name) = self.advance() else {
            return Err(Error::parse(position, "expected directive name"));
        };
        let args = if name == "default_field" {
            self.parse_default_field_args()?
        } else {
            self.parse_args()?
        };
        Ok(Directive {
            name,
            args,
            position,
        })
    }

    /// `default_field(a)` names the field bare; `default_field({a})` is
    /// accepted as well.
    fn parse_default_field_args(&mut self) -> Result<Vec<ExprNode>> {
        if let (TokenKind::LParen, TokenKind::Name(field), TokenKind::RParen) =
            (self.peek(), self.peek_at(1), self.peek_at(2))
        {
            let field = field.clone();
            self.advance();
            let position = self.position();
            self.advance();
            self.advance();
            return Ok(vec![ExprNode::new(ExprKind::Field(field), position)]);
        }
        self.parse_args()
    }

    /// `( [expr ("," expr)*] )`
    fn parse_args(&mut self) -> Result<Vec<ExprNode>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if *self.peek() == TokenKind::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    fn parse_item(&mut self) -> Result<StmtNode> {
        if *self.peek() == TokenKind::If {
            return self.parse_rule().map(StmtNode::Rule);
        }
        self.parse_stmt()
    }

    fn parse_stmt(&mut self) -> Result<StmtNode> {
        let expr = self.parse_expr()?;
        if *self.peek() != TokenKind::Assign {
            return Ok(StmtNode::Expr(expr));
        }
        match expr.kind {
            ExprKind::Field(field) => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(StmtNode::Assign {
                    field,
                    value,
                    position: expr.position,
                })
            }
            _ => Err(Error::parse(
                self.position(),
                "only a field reference can be assigned to",
            )),
        }
    }

    /// Statements up to (not including) `elif`, `else` or `fi`
    fn parse_block(&mut self) -> Result<Vec<StmtNode>> {
        let mut block = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Elif | TokenKind::Else | TokenKind::Fi => return Ok(block),
                TokenKind::Eof => return Err(self.unexpected("'fi'")),
                _ => block.push(self.parse_item()?),
            }
        }
    }

    fn parse_rule(&mut self) -> Result<RuleNode> {
        let position = self.position();
        self.expect(&TokenKind::If)?;

        let mut branches = Vec::new();
        loop {
            let condition = self.parse_expr()?;
            self.expect(&TokenKind::Then)?;
            let block = self.parse_block()?;
            branches.push((condition, block));
            if *self.peek() == TokenKind::Elif {
                self.advance();
            } else {
                break;
            }
        }

        let otherwise = if *self.peek() == TokenKind::Else {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        self.expect(&TokenKind::Fi)?;

        Ok(RuleNode {
            branches,
            otherwise,
            position,
        })
    }

    fn parse_expr(&mut self) -> Result<ExprNode> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<ExprNode> {
        let mut lhs = self.parse_and()?;
        while *self.peek() == TokenKind::Or {
            self.advance();
            let rhs = self.parse_and()?;
            let position = lhs.position;
            lhs = ExprNode::new(ExprKind::Or(Box::new(lhs), Box::new(rhs)), position);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<ExprNode> {
        let mut lhs = self.parse_not()?;
        while *self.peek() == TokenKind::And {
            self.advance();
            let rhs = self.parse_not()?;
            let position = lhs.position;
            lhs = ExprNode::new(ExprKind::And(Box::new(lhs), Box::new(rhs)), position);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<ExprNode> {
        if *self.peek() == TokenKind::Not {
            let position = self.position();
            self.advance();
            let operand = self.parse_not()?;
            return Ok(ExprNode::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                position,
            ));
        }
        self.parse_compare()
    }

    fn compare_kind(&self) -> Option<CompareKind> {
        let kind = match self.peek() {
            TokenKind::Eq => CompareKind::Value(CompareOp::Eq),
            TokenKind::Ne => CompareKind::Value(CompareOp::Ne),
            TokenKind::Lt => CompareKind::Value(CompareOp::Lt),
            TokenKind::Le => CompareKind::Value(CompareOp::Le),
            TokenKind::Gt => CompareKind::Value(CompareOp::Gt),
            TokenKind::Ge => CompareKind::Value(CompareOp::Ge),
            TokenKind::Tilde => CompareKind::Match { negated: false },
            TokenKind::NotTilde => CompareKind::Match { negated: true },
            _ => return None,
        };
        Some(kind)
    }

    fn parse_compare(&mut self) -> Result<ExprNode> {
        let lhs = self.parse_additive()?;
        let Some(kind) = self.compare_kind() else {
            return Ok(lhs);
        };
        self.advance();
        let rhs = self.parse_additive()?;
        if self.compare_kind().is_some() {
            return Err(Error::parse(
                self.position(),
                "comparison operators cannot be chained, use parentheses",
            ));
        }

        let position = lhs.position;
        let kind = match kind {
            CompareKind::Value(op) => ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            CompareKind::Match { negated } => ExprKind::Match {
                negated,
                subject: Box::new(lhs),
                pattern: Box::new(rhs),
            },
        };
        Ok(ExprNode::new(kind, position))
    }

    fn parse_additive(&mut self) -> Result<ExprNode> {
        let mut lhs = self.parse_mult()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                TokenKind::Dot => BinaryOp::Concat,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_mult()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_mult(&mut self) -> Result<ExprNode> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<ExprNode> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        let position = self.position();
        self.advance();
        let operand = self.parse_unary()?;
        Ok(ExprNode::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            position,
        ))
    }

    fn parse_primary(&mut self) -> Result<ExprNode> {
        let position = self.position();
        let kind = match self.peek().clone() {
            TokenKind::Str(text) => ExprKind::String(text),
            TokenKind::Number(number) => ExprKind::Number(number),
            TokenKind::Bool(value) => ExprKind::Bool(value),
            TokenKind::Regex(body) => ExprKind::Regex(body),
            TokenKind::Field(name) => ExprKind::Field(name),
            TokenKind::Name(name) => {
                self.advance();
                let args = self.parse_args()?;
                return Ok(ExprNode::new(ExprKind::Call { name, args }, position));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(ExprNode::new(kind, position))
    }
}

fn binary(op: BinaryOp, lhs: ExprNode, rhs: ExprNode) -> ExprNode {
    let position = lhs.position;
    ExprNode::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        position,
    )
}
