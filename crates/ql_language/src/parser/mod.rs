//! Recursive-descent parser with error recovery.
//!
//! The parser turns the token stream into a [`RawTopLevel`] and a set of
//! diagnostics. It always returns a tree: when a construct cannot be
//! completed, recovery synthesizes an `Incomplete` placeholder for it and
//! resynchronizes the token cursor, so malformed input still yields
//! something tooling can walk.
//!
//! # Structure
//!
//! ```text
//! Tokens
//!   │
//!   ├── parse_top_level      func defs, value defs, call statements
//!   │       │
//!   │       ├── parse_func_def        signature + block
//!   │       ├── parse_definition      let/var [: type] = expr ;
//!   │       └── parse_call_stmt       ident(args) ;
//!   │
//!   ├── parse_block          defs, calls, assignments, return, if
//!   │
//!   └── parse_expression     precedence climbing over || && + - *
//! ```
//!
//! # Recovery
//!
//! Every failed expectation records a diagnostic and asks the
//! [`RecoveryEngine`](recovery::RecoveryEngine) for an action; see the
//! [`recovery`] module. Expressions use two dedicated rules: a non-operator
//! token where an operator could continue the expression ends the expression
//! (`ExpectedOperator` / ignore), and a token that cannot start an
//! expression is unrecoverable (`ExpectedExpression`).
//!
//! # Precedence
//!
//! Binding powers are fixed: `||` < `&&` < `+`/`-` < `*`. All binary
//! operators are left-associative. Unary `!` and `-` are parsed as part of
//! the primary. There is no parenthesized grouping in expression position.

pub mod recovery;

#[cfg(test)]
mod tests;

use ql_base::{Diagnostics, Interner, Span, Symbol};

use crate::arena_ctx::AstContext;
use crate::ast::raw::{
    Attribute, RawBlock, RawExpr, RawExprKind, RawFuncDef, RawIfArm, RawItem, RawItemKind,
    RawParam, RawStmt, RawStmtKind, RawTopLevel,
};
use crate::ast::{BinaryOp, NodeIdGen, TypeName, UnaryOp};
use crate::error::{
    ArgumentIssue, BlockIssue, IdentifierPosition, ParenPosition, ParserError, ParserErrorKind,
    TopLevelIssue, TypePosition,
};
use crate::token::{Keyword, Sym, Token, TokenKind};

use recovery::{DefaultRecovery, RecoveryAction, RecoveryEngine};

/// The parse was aborted by an `Unrecoverable` strategy.
#[derive(Debug)]
struct Halted;

type ParseOutcome<T> = Result<T, Halted>;

/// How a failed expectation was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovered {
    /// Tokens were dropped through a synchronization point; the enclosing
    /// construct should become a placeholder.
    Synced,
    /// Continue from the current position.
    Ignored,
    /// The engine synthesized the expected token.
    Added,
}

/// Result of an `expect`-style check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    Found,
    Recovered(Recovered),
}

impl Expectation {
    /// `true` when parsing of the enclosing construct may continue.
    fn may_continue(self) -> bool {
        matches!(self, Expectation::Found | Expectation::Recovered(Recovered::Added))
    }
}

pub struct Parser<'a, 's> {
    tokens: Vec<Token>,
    current: usize,
    interner: &'s mut Interner,
    ids: &'s mut NodeIdGen,
    diagnostics: &'s mut Diagnostics,
    ctx: AstContext<'a>,
    engine: Box<dyn RecoveryEngine>,
}

impl<'a, 's> Parser<'a, 's> {
    pub fn new(
        tokens: Vec<Token>,
        interner: &'s mut Interner,
        ids: &'s mut NodeIdGen,
        diagnostics: &'s mut Diagnostics,
        ctx: AstContext<'a>,
    ) -> Self {
        Self::with_engine(tokens, interner, ids, diagnostics, ctx, Box::new(DefaultRecovery))
    }

    /// Creates a parser with a custom recovery engine.
    pub fn with_engine(
        tokens: Vec<Token>,
        interner: &'s mut Interner,
        ids: &'s mut NodeIdGen,
        diagnostics: &'s mut Diagnostics,
        ctx: AstContext<'a>,
        engine: Box<dyn RecoveryEngine>,
    ) -> Self {
        Parser {
            tokens,
            current: 0,
            interner,
            ids,
            diagnostics,
            ctx,
            engine,
        }
    }

    /// Parses the whole token stream.
    ///
    /// Always returns a tree; syntax errors are reported through the
    /// diagnostics sink and damaged constructs appear as `Incomplete`
    /// placeholders. An unrecoverable error stops parsing early and returns
    /// the sections built so far.
    pub fn parse(mut self) -> RawTopLevel<'a> {
        let mut sections = Vec::new();
        while !self.is_at_end() {
            match self.parse_section() {
                Ok(item) => sections.push(item),
                Err(Halted) => break,
            }
        }
        RawTopLevel { sections }
    }

    // ------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------

    fn parse_section(&mut self) -> ParseOutcome<&'a RawItem<'a>> {
        let start = self.current_span();
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Func) => self.parse_func_item(None),
            TokenKind::Symbol(Sym::At) => self.parse_attributed_item(),
            TokenKind::Keyword(Keyword::Let) | TokenKind::Keyword(Keyword::Var) => {
                let stmt = self.parse_definition()?;
                let id = self.ids.fresh();
                let kind = if stmt.is_incomplete() {
                    RawItemKind::Incomplete
                } else {
                    RawItemKind::Def(stmt)
                };
                Ok(self.ctx.alloc_item(RawItem { id, span: stmt.span, kind }))
            }
            TokenKind::Identifier(_) => self.parse_call_item(),
            kind => {
                let issue = match kind {
                    TokenKind::Eof => TopLevelIssue::Eof,
                    TokenKind::Keyword(Keyword::If) | TokenKind::Keyword(Keyword::Else) => {
                        TopLevelIssue::NestedKeyword
                    }
                    _ => TopLevelIssue::Other,
                };
                self.recover(ParserErrorKind::ExpectedTopLevelStatement(issue), start)?;
                Ok(self.incomplete_item(start))
            }
        }
    }

    fn parse_attributed_item(&mut self) -> ParseOutcome<&'a RawItem<'a>> {
        let start = self.current_span();
        self.advance(); // '@'

        let attribute = match self.peek().kind {
            TokenKind::Identifier(sym) => {
                let attr = match self.interner.resolve(sym) {
                    "main" => Some(Attribute::Main),
                    "never" => Some(Attribute::Never),
                    _ => None,
                };
                match attr {
                    Some(attr) => {
                        self.advance();
                        attr
                    }
                    None => {
                        self.recover(ParserErrorKind::ExpectedValidAttribute, self.current_span())?;
                        return Ok(self.incomplete_item(start));
                    }
                }
            }
            _ => {
                self.recover(ParserErrorKind::ExpectedValidAttribute, self.current_span())?;
                return Ok(self.incomplete_item(start));
            }
        };

        if !self.check_keyword(Keyword::Func) {
            self.recover(
                ParserErrorKind::ExpectedTopLevelStatement(TopLevelIssue::Other),
                self.current_span(),
            )?;
            return Ok(self.incomplete_item(start));
        }

        self.parse_func_item(Some(attribute))
    }

    fn parse_func_item(&mut self, attribute: Option<Attribute>) -> ParseOutcome<&'a RawItem<'a>> {
        let start = self.current_span();
        match self.parse_func_def()? {
            Some(func) => {
                let id = self.ids.fresh();
                let span = func.span;
                let kind = match attribute {
                    Some(attribute) => RawItemKind::Attributed { attribute, func },
                    None => RawItemKind::FuncDef(func),
                };
                Ok(self.ctx.alloc_item(RawItem { id, span, kind }))
            }
            None => Ok(self.incomplete_item(start)),
        }
    }

    fn parse_call_item(&mut self) -> ParseOutcome<&'a RawItem<'a>> {
        let start = self.current_span();

        // Lookahead 2: a bare identifier at the top level must be a call.
        if !matches!(self.peek_next().kind, TokenKind::Symbol(Sym::LParen)) {
            self.recover(ParserErrorKind::ExpectedFunctionApplication, start)?;
            return Ok(self.incomplete_item(start));
        }

        let stmt = self.parse_call_stmt()?;
        let id = self.ids.fresh();
        let kind = if stmt.is_incomplete() {
            RawItemKind::Incomplete
        } else {
            RawItemKind::Call(stmt)
        };
        Ok(self.ctx.alloc_item(RawItem { id, span: stmt.span, kind }))
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    /// Parses `func name(params) -> Type { ... }`.
    ///
    /// Returns `None` when recovery abandoned the definition; the caller
    /// substitutes an incomplete item.
    fn parse_func_def(&mut self) -> ParseOutcome<Option<RawFuncDef<'a>>> {
        let start = self.current_span();
        self.advance(); // 'func'

        let name = match self.peek().kind {
            TokenKind::Identifier(sym) => {
                self.advance();
                sym
            }
            _ => {
                let outcome = self.recover(
                    ParserErrorKind::ExpectedIdentifier(IdentifierPosition::FunctionName),
                    self.current_span(),
                )?;
                if outcome == Recovered::Added {
                    Symbol::EMPTY
                } else {
                    return Ok(None);
                }
            }
        };

        if !self
            .expect_symbol(
                Sym::LParen,
                ParserErrorKind::ExpectedLeftParen(ParenPosition::FunctionDefinition),
            )?
            .may_continue()
        {
            return Ok(None);
        }

        let params = match self.parse_params()? {
            Some(params) => params,
            None => return Ok(None),
        };

        if !self
            .expect_symbol(Sym::Arrow, ParserErrorKind::ExpectedArrowInFunctionDefinition)?
            .may_continue()
        {
            return Ok(None);
        }

        let return_type = match self.parse_type(TypePosition::FunctionReturn)? {
            Some(ty) => ty,
            None => return Ok(None),
        };

        let body = match self.parse_block(crate::error::BracePosition::FunctionBody)? {
            Some(body) => body,
            None => return Ok(None),
        };

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        Ok(Some(RawFuncDef {
            id,
            span,
            name,
            params: self.ctx.alloc_params(params),
            return_type,
            body,
        }))
    }

    /// Parses the parameter list including the closing `)`.
    fn parse_params(&mut self) -> ParseOutcome<Option<Vec<RawParam>>> {
        let mut params = Vec::new();

        if self.check_symbol(Sym::RParen) {
            self.advance();
            return Ok(Some(params));
        }

        loop {
            let param_start = self.current_span();
            let name = match self.peek().kind {
                TokenKind::Identifier(sym) => {
                    self.advance();
                    sym
                }
                _ => {
                    self.recover(
                        ParserErrorKind::ExpectedIdentifier(IdentifierPosition::FunctionParameter),
                        self.current_span(),
                    )?;
                    return Ok(None);
                }
            };

            if !self.check_symbol(Sym::Colon) {
                self.recover(ParserErrorKind::ExpectedParameterType, self.current_span())?;
                return Ok(None);
            }
            self.advance(); // ':'

            let annotation = match self.parse_type(TypePosition::Parameter)? {
                Some(ty) => ty,
                None => return Ok(None),
            };

            params.push(RawParam {
                id: self.ids.fresh(),
                name,
                annotation,
                span: param_start.merge(self.previous_span()),
            });

            match self.peek().kind {
                TokenKind::Symbol(Sym::Comma) => {
                    self.advance();
                }
                TokenKind::Symbol(Sym::RParen) => {
                    self.advance();
                    return Ok(Some(params));
                }
                _ => {
                    self.recover(
                        ParserErrorKind::ExpectedRightParen(ParenPosition::FunctionDefinition),
                        self.current_span(),
                    )?;
                    return Ok(None);
                }
            }
        }
    }

    /// Parses a type name. `Void` is not reserved; it is recognized as an
    /// identifier-spelled type, usable mainly as a return type.
    fn parse_type(&mut self, position: TypePosition) -> ParseOutcome<Option<TypeName>> {
        let ty = match self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => Some(TypeName::Int),
            TokenKind::Keyword(Keyword::Bool) => Some(TypeName::Bool),
            TokenKind::Keyword(Keyword::String) => Some(TypeName::String),
            TokenKind::Identifier(sym) if self.interner.resolve(sym) == "Void" => {
                Some(TypeName::Void)
            }
            _ => None,
        };
        match ty {
            Some(ty) => {
                self.advance();
                Ok(Some(ty))
            }
            None => {
                self.recover(
                    ParserErrorKind::ExpectedTypeIdentifier(position),
                    self.current_span(),
                )?;
                Ok(None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Blocks and statements
    // ------------------------------------------------------------------

    fn parse_block(
        &mut self,
        position: crate::error::BracePosition,
    ) -> ParseOutcome<Option<&'a RawBlock<'a>>> {
        let start = self.current_span();
        if !self
            .expect_symbol(Sym::LBrace, ParserErrorKind::ExpectedLeftBrace(position))?
            .may_continue()
        {
            return Ok(None);
        }

        let mut stmts: Vec<&'a RawStmt<'a>> = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Symbol(Sym::RBrace) => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.recover(
                        ParserErrorKind::ExpectedBlockBodyPart(BlockIssue::Eof),
                        self.current_span(),
                    )?;
                    break;
                }
                TokenKind::Keyword(Keyword::Let) | TokenKind::Keyword(Keyword::Var) => {
                    let stmt = self.parse_definition()?;
                    stmts.push(stmt);
                }
                TokenKind::Keyword(Keyword::Return) => {
                    let stmt = self.parse_return()?;
                    stmts.push(stmt);
                }
                TokenKind::Keyword(Keyword::If) => {
                    let stmt = self.parse_if()?;
                    stmts.push(stmt);
                }
                TokenKind::Identifier(_) => {
                    let stmt = self.parse_call_or_assignment()?;
                    stmts.push(stmt);
                }
                _ => {
                    // Dropping to `}` closes this block.
                    let span = self.current_span();
                    self.recover(ParserErrorKind::ExpectedBlockBodyPart(BlockIssue::Other), span)?;
                    stmts.push(self.incomplete_stmt(span));
                    break;
                }
            }
        }

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        let stmts = self.ctx.alloc_stmt_list(stmts);
        Ok(Some(self.ctx.alloc_block(RawBlock { id, span, stmts })))
    }

    /// Parses `let`/`var` `name [: Type] = expr ;`.
    fn parse_definition(&mut self) -> ParseOutcome<&'a RawStmt<'a>> {
        let start = self.current_span();
        let immutable = self.check_keyword(Keyword::Let);
        self.advance(); // 'let' | 'var'

        let name = match self.peek().kind {
            TokenKind::Identifier(sym) => {
                self.advance();
                sym
            }
            _ => {
                self.recover(
                    ParserErrorKind::ExpectedIdentifier(IdentifierPosition::ValueDefinition),
                    self.current_span(),
                )?;
                return Ok(self.incomplete_stmt(start));
            }
        };

        let annotation = if self.check_symbol(Sym::Colon) {
            self.advance();
            match self.parse_type(TypePosition::Definition)? {
                Some(ty) => Some(ty),
                None => return Ok(self.incomplete_stmt(start)),
            }
        } else {
            None
        };

        if !self
            .expect_symbol(Sym::Equal, ParserErrorKind::ExpectedEqualInAssignment)?
            .may_continue()
        {
            return Ok(self.incomplete_stmt(start));
        }

        let value = self.parse_expression(&[Sym::Semicolon], 0)?;
        self.expect_semicolon(ParserErrorKind::ExpectedSemicolonToEndStatement)?;

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        let kind = if immutable {
            RawStmtKind::LetDef { name, annotation, value }
        } else {
            RawStmtKind::VarDef { name, annotation, value }
        };
        Ok(self.ctx.alloc_stmt(RawStmt { id, span, kind }))
    }

    fn parse_return(&mut self) -> ParseOutcome<&'a RawStmt<'a>> {
        let start = self.current_span();
        self.advance(); // 'return'

        let value = self.parse_expression(&[Sym::Semicolon], 0)?;
        self.expect_semicolon(ParserErrorKind::ExpectedSemicolonToEndStatement)?;

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        Ok(self.ctx.alloc_stmt(RawStmt {
            id,
            span,
            kind: RawStmtKind::Return { value },
        }))
    }

    /// Parses an `if` chain. `else if` arms are flattened into the multi-arm
    /// list form; the desugarer rebuilds the nested shape.
    fn parse_if(&mut self) -> ParseOutcome<&'a RawStmt<'a>> {
        let start = self.current_span();
        let mut arms: Vec<RawIfArm<'a>> = Vec::new();
        let mut else_branch: Option<&'a RawBlock<'a>> = None;

        loop {
            self.advance(); // 'if'

            if !self
                .expect_symbol(Sym::LParen, ParserErrorKind::ExpectedLeftParen(ParenPosition::If))?
                .may_continue()
            {
                return Ok(self.incomplete_stmt(start));
            }

            let condition = self.parse_expression(&[Sym::RParen], 0)?;

            if !self
                .expect_symbol(Sym::RParen, ParserErrorKind::ExpectedRightParen(ParenPosition::If))?
                .may_continue()
            {
                return Ok(self.incomplete_stmt(start));
            }

            let body = match self.parse_block(crate::error::BracePosition::IfBody)? {
                Some(body) => body,
                None => return Ok(self.incomplete_stmt(start)),
            };

            arms.push((condition, body));

            if !self.check_keyword(Keyword::Else) {
                break;
            }
            self.advance(); // 'else'

            if self.check_keyword(Keyword::If) {
                continue;
            }

            match self.parse_block(crate::error::BracePosition::ElseBody)? {
                Some(block) => else_branch = Some(block),
                None => return Ok(self.incomplete_stmt(start)),
            }
            break;
        }

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        let arms = self.ctx.alloc_arms(arms);
        Ok(self.ctx.alloc_stmt(RawStmt {
            id,
            span,
            kind: RawStmtKind::If { arms, else_branch },
        }))
    }

    /// Parses `name(args);` or `name = expr;` in block position.
    fn parse_call_or_assignment(&mut self) -> ParseOutcome<&'a RawStmt<'a>> {
        let start = self.current_span();

        if matches!(self.peek_next().kind, TokenKind::Symbol(Sym::LParen)) {
            return self.parse_call_stmt();
        }

        let target = match self.peek().kind {
            TokenKind::Identifier(sym) => sym,
            _ => unreachable!("caller checked for an identifier"),
        };
        self.advance();

        if !self
            .expect_symbol(Sym::Equal, ParserErrorKind::ExpectedEqualInAssignment)?
            .may_continue()
        {
            return Ok(self.incomplete_stmt(start));
        }

        let value = self.parse_expression(&[Sym::Semicolon], 0)?;
        self.expect_semicolon(ParserErrorKind::ExpectedSemicolonToEndStatement)?;

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        Ok(self.ctx.alloc_stmt(RawStmt {
            id,
            span,
            kind: RawStmtKind::Assignment { target, value },
        }))
    }

    /// Parses `name(args);` where the lookahead already confirmed `(`.
    fn parse_call_stmt(&mut self) -> ParseOutcome<&'a RawStmt<'a>> {
        let start = self.current_span();
        let expr = self.parse_func_app()?;
        self.expect_semicolon(ParserErrorKind::ExpectedSemicolonToEndFunctionCall)?;

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        let kind = if expr.is_incomplete() {
            RawStmtKind::Incomplete
        } else {
            RawStmtKind::Call { expr }
        };
        Ok(self.ctx.alloc_stmt(RawStmt { id, span, kind }))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Precedence climbing. `until` is the delimiter set that legitimately
    /// ends the expression; any other non-operator token reports
    /// `ExpectedOperator` (ignored by the default engine, ending the
    /// expression).
    fn parse_expression(
        &mut self,
        until: &[Sym],
        min_bp: u8,
    ) -> ParseOutcome<&'a RawExpr<'a>> {
        let mut lhs = self.parse_primary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Symbol(sym) if until.contains(&sym) => break,
                TokenKind::Symbol(sym) => match binary_op(sym) {
                    Some(op) => op,
                    None => {
                        self.recover(ParserErrorKind::ExpectedOperator, self.current_span())?;
                        break;
                    }
                },
                _ => {
                    self.recover(ParserErrorKind::ExpectedOperator, self.current_span())?;
                    break;
                }
            };

            let (left_bp, right_bp) = binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.advance(); // operator

            let rhs = self.parse_expression(until, right_bp)?;
            let id = self.ids.fresh();
            let span = lhs.span.merge(rhs.span);
            lhs = self.ctx.alloc_expr(RawExpr {
                id,
                span,
                kind: RawExprKind::Binary { op, lhs, rhs },
            });
        }

        Ok(lhs)
    }

    /// Primary: identifier (call with lookahead 2), number, boolean, or a
    /// unary operator applied to a primary.
    fn parse_primary(&mut self) -> ParseOutcome<&'a RawExpr<'a>> {
        let start = self.current_span();
        match self.peek().kind {
            TokenKind::Symbol(Sym::Bang) => {
                self.advance();
                let operand = self.parse_primary()?;
                let id = self.ids.fresh();
                Ok(self.ctx.alloc_expr(RawExpr {
                    id,
                    span: start.merge(operand.span),
                    kind: RawExprKind::Unary { op: UnaryOp::Not, operand },
                }))
            }
            TokenKind::Symbol(Sym::Minus) => {
                self.advance();
                let operand = self.parse_primary()?;
                let id = self.ids.fresh();
                Ok(self.ctx.alloc_expr(RawExpr {
                    id,
                    span: start.merge(operand.span),
                    kind: RawExprKind::Unary { op: UnaryOp::Neg, operand },
                }))
            }
            TokenKind::Identifier(sym) => {
                if matches!(self.peek_next().kind, TokenKind::Symbol(Sym::LParen)) {
                    return self.parse_func_app();
                }
                self.advance();
                let id = self.ids.fresh();
                Ok(self.ctx.alloc_expr(RawExpr {
                    id,
                    span: start,
                    kind: RawExprKind::Identifier(sym),
                }))
            }
            TokenKind::Number(sym) => {
                self.advance();
                // The lexer guarantees a digit run; clamp on overflow.
                let value = self.interner.resolve(sym).parse::<i64>().unwrap_or(i64::MAX);
                let id = self.ids.fresh();
                Ok(self.ctx.alloc_expr(RawExpr {
                    id,
                    span: start,
                    kind: RawExprKind::Number(value),
                }))
            }
            TokenKind::Boolean(value) => {
                self.advance();
                let id = self.ids.fresh();
                Ok(self.ctx.alloc_expr(RawExpr {
                    id,
                    span: start,
                    kind: RawExprKind::Boolean(value),
                }))
            }
            _ => {
                self.recover(ParserErrorKind::ExpectedExpression, start)?;
                Ok(self.incomplete_expr(start))
            }
        }
    }

    /// Parses `name(arg, ...)`; the caller verified the `(` lookahead.
    fn parse_func_app(&mut self) -> ParseOutcome<&'a RawExpr<'a>> {
        let start = self.current_span();
        let callee = match self.peek().kind {
            TokenKind::Identifier(sym) => sym,
            _ => unreachable!("caller checked for an identifier"),
        };
        self.advance(); // name
        self.advance(); // '('

        let mut args: Vec<&'a RawExpr<'a>> = Vec::new();

        if self.check_symbol(Sym::RParen) {
            self.advance();
        } else {
            loop {
                if !self.at_expression_start() {
                    let issue = if self.is_at_end() {
                        ArgumentIssue::Eof
                    } else {
                        ArgumentIssue::Other
                    };
                    self.recover(
                        ParserErrorKind::ExpectedFunctionArgument(issue),
                        self.current_span(),
                    )?;
                    return Ok(self.incomplete_expr(start));
                }

                let arg = self.parse_expression(&[Sym::Comma, Sym::RParen], 0)?;
                args.push(arg);

                match self.peek().kind {
                    TokenKind::Symbol(Sym::Comma) => {
                        self.advance();
                    }
                    TokenKind::Symbol(Sym::RParen) => {
                        self.advance();
                        break;
                    }
                    _ => {
                        self.recover(
                            ParserErrorKind::ExpectedRightParen(ParenPosition::FunctionCall),
                            self.current_span(),
                        )?;
                        return Ok(self.incomplete_expr(start));
                    }
                }
            }
        }

        let id = self.ids.fresh();
        let span = start.merge(self.previous_span());
        let args = self.ctx.alloc_expr_list(args);
        Ok(self.ctx.alloc_expr(RawExpr {
            id,
            span,
            kind: RawExprKind::FuncApp { callee, args },
        }))
    }

    fn at_expression_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::Boolean(_)
                | TokenKind::Symbol(Sym::Bang)
                | TokenKind::Symbol(Sym::Minus)
        )
    }

    // ------------------------------------------------------------------
    // Expectation and recovery plumbing
    // ------------------------------------------------------------------

    /// Peeks for `sym`; consumes on match. On mismatch records `error` and
    /// applies the engine's strategy.
    fn expect_symbol(&mut self, sym: Sym, error: ParserErrorKind) -> ParseOutcome<Expectation> {
        if self.check_symbol(sym) {
            self.advance();
            return Ok(Expectation::Found);
        }
        let outcome = self.recover(error, self.current_span())?;
        Ok(Expectation::Recovered(outcome))
    }

    /// Semicolon expectation: the default engine ignores a missing one, so
    /// the caller always continues.
    fn expect_semicolon(&mut self, error: ParserErrorKind) -> ParseOutcome<()> {
        if self.check_symbol(Sym::Semicolon) {
            self.advance();
        } else {
            self.recover(error, self.current_span())?;
        }
        Ok(())
    }

    /// Records the diagnostic for `kind` and applies the engine's strategy.
    fn recover(&mut self, kind: ParserErrorKind, span: Span) -> ParseOutcome<Recovered> {
        self.diagnostics.push(ParserError::new(kind.clone(), span).to_diagnostic());

        let mut action = self.engine.strategy(&kind);
        // Resolve Override chains before acting.
        loop {
            match action {
                RecoveryAction::Override(inner) => action = self.engine.strategy(&inner),
                _ => break,
            }
        }

        match action {
            RecoveryAction::DropUntil(set) => {
                self.drop_until(set);
                Ok(Recovered::Synced)
            }
            RecoveryAction::Ignore => Ok(Recovered::Ignored),
            RecoveryAction::Add(_) => Ok(Recovered::Added),
            RecoveryAction::Unrecoverable => Err(Halted),
            RecoveryAction::Override(_) => unreachable!("override resolved above"),
        }
    }

    /// Consumes tokens until one in `set` is next, consuming that token.
    /// Stops without consuming at end of input.
    fn drop_until(&mut self, set: &[Sym]) {
        while !self.is_at_end() {
            if let TokenKind::Symbol(sym) = self.peek().kind {
                if set.contains(&sym) {
                    self.advance();
                    return;
                }
            }
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Placeholders
    // ------------------------------------------------------------------

    fn incomplete_expr(&mut self, span: Span) -> &'a RawExpr<'a> {
        let id = self.ids.fresh();
        self.ctx.alloc_expr(RawExpr {
            id,
            span,
            kind: RawExprKind::Incomplete,
        })
    }

    fn incomplete_stmt(&mut self, span: Span) -> &'a RawStmt<'a> {
        let id = self.ids.fresh();
        self.ctx.alloc_stmt(RawStmt {
            id,
            span,
            kind: RawStmtKind::Incomplete,
        })
    }

    fn incomplete_item(&mut self, span: Span) -> &'a RawItem<'a> {
        let id = self.ids.fresh();
        self.ctx.alloc_item(RawItem {
            id,
            span,
            kind: RawItemKind::Incomplete,
        })
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        self.tokens
            .get(self.current + 1)
            .unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn previous_span(&self) -> Span {
        if self.current == 0 {
            self.tokens[0].span
        } else {
            self.tokens[self.current - 1].span
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    fn check_symbol(&self, sym: Sym) -> bool {
        self.peek().kind == TokenKind::Symbol(sym)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(keyword)
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }
}

/// Maps an operator symbol to its binary operator, if it is one.
fn binary_op(sym: Sym) -> Option<BinaryOp> {
    match sym {
        Sym::Plus => Some(BinaryOp::Add),
        Sym::Minus => Some(BinaryOp::Sub),
        Sym::Star => Some(BinaryOp::Mul),
        Sym::AndAnd => Some(BinaryOp::And),
        Sym::OrOr => Some(BinaryOp::Or),
        _ => None,
    }
}

/// Left and right binding powers. All operators are left-associative, so
/// the right power is one above the left.
fn binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => (1, 2),
        BinaryOp::And => (3, 4),
        BinaryOp::Add | BinaryOp::Sub => (5, 6),
        BinaryOp::Mul => (7, 8),
    }
}
