//! Typed program construction
//!
//! Turns a syntax tree into typed nodes. Header directives are resolved
//! first into a header that lives only for this build; the body is then
//! built with implicit casts and implicit matches applied. Imports are
//! compiled independently and spliced ahead of the importing file's body.

use std::path::{Path, PathBuf};

use edict_record::FieldSet;
use regex::RegexBuilder;
use tracing::debug;

use crate::cast::{self, fold_case};
use crate::editor::StreamEditor;
use crate::expr::Expr;
use crate::functions::function_call;
use crate::loader::{resolve_import, FileSystemLoader, SourceLoader};
use crate::parser::parse;
use crate::program::{Header, Program};
use crate::stmt::{Rule, Stmt};
use crate::syntax::{BinaryOp, Directive, ExprKind, ExprNode, RuleNode, StmtNode, UnaryOp};
use crate::token::Position;
use crate::types::{DataType, Value};
use crate::{Error, Result};

/// Compiles Edict source into [`Program`]s
pub struct Compiler {
    loader: Box<dyn SourceLoader>,
}

impl Compiler {
    /// Create a compiler that resolves imports on the file system
    pub fn new() -> Self {
        Self::with_loader(FileSystemLoader)
    }

    /// Create a compiler with a custom import loader
    pub fn with_loader(loader: impl SourceLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
        }
    }

    /// Compile source text. Relative imports resolve against the loader's
    /// base (the working directory for the file system).
    ///
    /// # Errors
    ///
    /// Returns a lex, parse, prepare or import error.
    pub fn compile_str(&self, source: &str) -> Result<Program> {
        self.compile_source(source, None, &mut Vec::new())
    }

    /// Compile the file at `path`, reading it through the loader
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`Compiler::compile_str`].
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<Program> {
        let path = path.as_ref();
        let source = self.load(path)?;
        let mut stack = vec![self.loader.canonicalize(path)];
        self.compile_source(&source, Some(path), &mut stack)
    }

    fn load(&self, path: &Path) -> Result<String> {
        self.loader.load(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn compile_source(
        &self,
        source: &str,
        origin: Option<&Path>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Program> {
        let file = parse(source)?;
        let mut builder = Builder::default();

        let mut sort_key = None;
        for directive in &file.directives {
            match directive.name.as_str() {
                "import" => {
                    let target = string_argument(directive)?;
                    let imported = self.import(&target, origin, stack).map_err(|source| {
                        Error::Import {
                            path: target.clone(),
                            source: Box::new(source),
                        }
                    })?;
                    builder.splice(imported);
                }
                "sort" => {
                    builder.claim_pre_transform(directive)?;
                    sort_key = Some(single_argument(directive)?);
                }
                _ => builder.header_directive(directive)?,
            }
        }

        if let Some(node) = sort_key {
            let key = builder.build_expr(node)?;
            let key = match key.dtype() {
                DataType::IndefiniteString => cast::as_string(key)?,
                DataType::String | DataType::Number | DataType::Boolean => key,
                other => {
                    return Err(Error::prepare(format!("cannot sort by a value of type {other}")));
                }
            };
            builder.pre_transform = Some(StreamEditor::Sort { key });
        }

        for item in &file.body {
            let statement = builder.build_stmt(item)?;
            builder.statements.push(statement);
        }
        if let Some(fields) = &builder.header.output_fields {
            builder.statements.push(Stmt::Fields(fields.clone()));
        }

        debug!(
            directives = file.directives.len(),
            statements = builder.statements.len(),
            assigned = builder.assigned.len(),
            "compiled program"
        );
        Ok(Program::new(
            Stmt::Statements(builder.statements),
            builder.header,
            builder.pre_transform,
            builder.assigned,
        ))
    }

    fn import(&self, target: &str, origin: Option<&Path>, stack: &mut Vec<PathBuf>) -> Result<Program> {
        let path = resolve_import(origin, target);
        let identity = self.loader.canonicalize(&path);
        if stack.contains(&identity) {
            let chain: Vec<String> = stack
                .iter()
                .chain(std::iter::once(&identity))
                .map(|p| p.display().to_string())
                .collect();
            return Err(Error::prepare(format!("import cycle: {}", chain.join(" -> "))));
        }

        debug!(path = %path.display(), "importing program");
        let source = self.load(&path)?;
        stack.push(identity);
        let program = self.compile_source(&source, Some(&path), stack);
        stack.pop();

        let program = program?;
        if let Some(editor) = program.pre_transform() {
            return Err(Error::prepare(format!(
                "an imported program cannot declare a stream pre-transform ({}())",
                editor.name()
            )));
        }
        Ok(program)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler").finish_non_exhaustive()
    }
}

/// A built operand. Regex literals only exist here, until they become a
/// match.
enum Operand {
    Expr(Expr),
    Regex(String),
}

/// Build-local state for one source file
#[derive(Default)]
struct Builder {
    header: Header,
    pre_transform: Option<StreamEditor>,
    pre_transform_declared: bool,
    case_insensitive_declared: bool,
    statements: Vec<Stmt>,
    assigned: FieldSet,
}

fn single_argument(directive: &Directive) -> Result<&ExprNode> {
    match directive.args.as_slice() {
        [arg] => Ok(arg),
        args => Err(Error::prepare(format!(
            "{}() at {} takes exactly one argument, got {}",
            directive.name,
            directive.position,
            args.len()
        ))),
    }
}

fn string_argument(directive: &Directive) -> Result<String> {
    match &single_argument(directive)?.kind {
        ExprKind::String(text) => Ok(text.clone()),
        _ => Err(Error::prepare(format!(
            "{}() at {} expects a string literal",
            directive.name, directive.position
        ))),
    }
}

impl Builder {
    fn header_directive(&mut self, directive: &Directive) -> Result<()> {
        let name = directive.name.as_str();
        match name {
            "default_field" => {
                let ExprKind::Field(field) = &single_argument(directive)?.kind else {
                    return Err(Error::prepare(format!(
                        "default_field() at {} expects a field reference",
                        directive.position
                    )));
                };
                if self.header.default_field.is_some() {
                    return Err(duplicate(directive));
                }
                self.header.default_field = Some(field.clone());
            }
            "case_insensitive" => {
                let ExprKind::Bool(flag) = &single_argument(directive)?.kind else {
                    return Err(Error::prepare(format!(
                        "case_insensitive() at {} expects true or false",
                        directive.position
                    )));
                };
                if self.case_insensitive_declared {
                    return Err(duplicate(directive));
                }
                self.header.case_insensitive = *flag;
                self.case_insensitive_declared = true;
            }
            "output_fields" => {
                if directive.args.is_empty() {
                    return Err(Error::prepare(format!(
                        "output_fields() at {} needs at least one field",
                        directive.position
                    )));
                }
                if self.header.output_fields.is_some() {
                    return Err(duplicate(directive));
                }
                let fields = directive
                    .args
                    .iter()
                    .map(|arg| match &arg.kind {
                        ExprKind::String(name) | ExprKind::Field(name) => Ok(name.clone()),
                        _ => Err(Error::prepare(format!(
                            "output_fields() at {} expects field names",
                            arg.position
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.header.output_fields = Some(fields);
            }
            "reverse" => {
                if !directive.args.is_empty() {
                    return Err(Error::prepare(format!(
                        "reverse() at {} takes no arguments",
                        directive.position
                    )));
                }
                self.claim_pre_transform(directive)?;
                self.pre_transform = Some(StreamEditor::Reverse);
            }
            _ => {
                return Err(Error::prepare(format!(
                    "unknown directive '{name}' at {}",
                    directive.position
                )));
            }
        }
        Ok(())
    }

    fn claim_pre_transform(&mut self, directive: &Directive) -> Result<()> {
        if self.pre_transform_declared {
            return Err(Error::prepare(format!(
                "{}() at {}: only one stream pre-transform may be declared",
                directive.name, directive.position
            )));
        }
        self.pre_transform_declared = true;
        Ok(())
    }

    fn splice(&mut self, imported: Program) {
        let (statements, assigned) = imported.into_parts();
        self.assigned.extend(assigned.iter());
        self.statements.push(statements);
    }

    fn build_stmt(&mut self, node: &StmtNode) -> Result<Stmt> {
        match node {
            StmtNode::Assign { field, value, .. } => {
                let value = cast::string_encode(self.build_expr(value)?)?;
                self.assigned.insert(field.as_str());
                Ok(Stmt::Assignment {
                    field: field.clone(),
                    value,
                })
            }
            StmtNode::Expr(expr) => Ok(Stmt::BareExpression(self.build_expr(expr)?)),
            StmtNode::Rule(rule) => self.build_rule(rule),
        }
    }

    fn build_block(&mut self, block: &[StmtNode]) -> Result<Stmt> {
        let statements = block
            .iter()
            .map(|node| self.build_stmt(node))
            .collect::<Result<Vec<_>>>()?;
        Ok(Stmt::Statements(statements))
    }

    fn build_rule(&mut self, rule: &RuleNode) -> Result<Stmt> {
        let mut branches = Vec::with_capacity(rule.branches.len());
        for (condition, block) in &rule.branches {
            let condition = self.build_condition(condition)?;
            branches.push((condition, self.build_block(block)?));
        }
        let otherwise = match &rule.otherwise {
            Some(block) => Some(self.build_block(block)?),
            None => None,
        };
        Rule::new(branches, otherwise)
            .map(Stmt::Rule)
            .map_err(|e| at(e, rule.position))
    }

    /// Build an expression that must be BOOLEAN. A bare string or regex
    /// literal becomes a match against the default field.
    fn build_condition(&mut self, node: &ExprNode) -> Result<Expr> {
        match self.build_operand(node)? {
            Operand::Regex(body) => self.implicit_match(Operand::Regex(body), node),
            Operand::Expr(expr) if expr.dtype() == DataType::String => {
                self.implicit_match(Operand::Expr(expr), node)
            }
            Operand::Expr(expr) => cast::as_boolean(expr),
        }
    }

    fn implicit_match(&self, pattern: Operand, node: &ExprNode) -> Result<Expr> {
        let Some(field) = &self.header.default_field else {
            return Err(Error::prepare(format!(
                "a bare pattern at {} needs default_field(...) to be declared",
                node.position
            )));
        };
        self.make_match(Expr::Identifier(field.clone()), pattern)
    }

    fn make_match(&self, subject: Expr, pattern: Operand) -> Result<Expr> {
        let subject = cast::as_string(subject)?;
        let case_insensitive = self.header.case_insensitive;
        match pattern {
            Operand::Regex(body) => {
                let pattern = RegexBuilder::new(&body)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| Error::prepare(format!("invalid regex /{body}/: {e}")))?;
                Ok(Expr::Match {
                    inner: Box::new(subject),
                    pattern,
                })
            }
            Operand::Expr(Expr::Literal(Value::String(needle))) => {
                if case_insensitive {
                    Ok(Expr::SubString {
                        inner: Box::new(cast::casefold(subject)),
                        needle: fold_case(&needle),
                    })
                } else {
                    Ok(Expr::SubString {
                        inner: Box::new(subject),
                        needle,
                    })
                }
            }
            Operand::Expr(other) => Err(Error::prepare(format!(
                "pattern must be a literal, got {other}"
            ))),
        }
    }

    fn build_expr(&mut self, node: &ExprNode) -> Result<Expr> {
        match self.build_operand(node)? {
            Operand::Expr(expr) => Ok(expr),
            Operand::Regex(body) => Err(Error::prepare(format!(
                "regex /{body}/ at {} can only be used as a pattern",
                node.position
            ))),
        }
    }

    fn build_operand(&mut self, node: &ExprNode) -> Result<Operand> {
        let expr = match &node.kind {
            ExprKind::String(text) => Expr::string(text.clone()),
            ExprKind::Number(number) => Expr::number(*number),
            ExprKind::Bool(flag) => Expr::boolean(*flag),
            ExprKind::Regex(body) => return Ok(Operand::Regex(body.clone())),
            ExprKind::Field(name) => Expr::Identifier(name.clone()),
            ExprKind::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.build_expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                function_call(name, args).map_err(|e| at(e, node.position))?
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not => Expr::Not(Box::new(self.build_condition(operand)?)),
                UnaryOp::Neg => Expr::Negate(Box::new(cast::as_number(self.build_expr(operand)?)?)),
                UnaryOp::Plus => cast::as_number(self.build_expr(operand)?)?,
            },
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.build_expr(lhs)?;
                let rhs = self.build_expr(rhs)?;
                let (lhs, rhs) = if *op == BinaryOp::Concat {
                    (cast::as_string(lhs)?, cast::as_string(rhs)?)
                } else {
                    (cast::as_number(lhs)?, cast::as_number(rhs)?)
                };
                Expr::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            ExprKind::Compare { op, lhs, rhs } => {
                let lhs = self.build_expr(lhs)?;
                let rhs = self.build_expr(rhs)?;
                let dtype = [lhs.dtype(), rhs.dtype()]
                    .into_iter()
                    .find(|dtype| *dtype != DataType::IndefiniteString)
                    .unwrap_or(DataType::String);
                if !matches!(dtype, DataType::String | DataType::Number) {
                    return Err(Error::prepare(format!(
                        "cannot compare values of type {dtype} at {}",
                        node.position
                    )));
                }
                let mut lhs = cast::as_type(lhs, dtype)?;
                let mut rhs = cast::as_type(rhs, dtype)?;
                if dtype == DataType::String && self.header.case_insensitive {
                    lhs = cast::casefold(lhs);
                    rhs = cast::casefold(rhs);
                }
                Expr::Compare {
                    op: *op,
                    dtype,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            ExprKind::Match {
                negated,
                subject,
                pattern,
            } => {
                let subject = self.build_expr(subject)?;
                let pattern = self.build_operand(pattern)?;
                let matched = self
                    .make_match(subject, pattern)
                    .map_err(|e| at(e, node.position))?;
                if *negated {
                    Expr::Not(Box::new(matched))
                } else {
                    matched
                }
            }
            ExprKind::And(lhs, rhs) => Expr::And(self.build_junction(lhs, rhs, true)?),
            ExprKind::Or(lhs, rhs) => Expr::Or(self.build_junction(lhs, rhs, false)?),
        };
        Ok(Operand::Expr(expr))
    }

    /// Build both sides of `and`/`or`, flattening nested chains of the same
    /// operator into one n-ary node.
    fn build_junction(&mut self, lhs: &ExprNode, rhs: &ExprNode, conjunction: bool) -> Result<Vec<Expr>> {
        let mut operands = Vec::new();
        for side in [lhs, rhs] {
            match (self.build_condition(side)?, conjunction) {
                (Expr::And(inner), true) | (Expr::Or(inner), false) => operands.extend(inner),
                (other, _) => operands.push(other),
            }
        }
        Ok(operands)
    }
}

/// Add a source position to a prepare error
fn at(error: Error, position: Position) -> Error {
    match error {
        Error::Prepare(message) => Error::Prepare(format!("{message} at {position}")),
        other => other,
    }
}

fn duplicate(directive: &Directive) -> Error {
    Error::prepare(format!(
        "{}() at {} may only be declared once",
        directive.name, directive.position
    ))
}
