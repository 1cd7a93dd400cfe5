//! Recursive-descent parser with precedence climbing for expressions
//! (spec.md §4.2).
//!
//! Grounded on `crates/compiler/src/parser.rs` for struct shape
//! (`tokens: Vec<_>, pos: usize`, methods named `parse`/`is_at_end`) and on
//! `original_source/src/parser.cpp` for the grammar itself and the
//! cast-vs-parenthesized-expression disambiguation rule.

use crate::ast::*;
use crate::error::{ParseError, SourceLocation};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::types::{BaseType, Type};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next().map_err(|e| ParseError::new(e.loc, e.message))?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(Parser { tokens, pos: 0 })
    }

    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let mut parser = Parser::new(source)?;
        parser.parse_program()
    }

    // ---- token stream helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                self.peek().loc(),
                what,
                &self.peek().text,
            ))
        }
    }

    fn loc(&self) -> SourceLocation {
        self.peek().loc()
    }

    // ---- top level ----

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();
        while !self.is_at_end() {
            let specifier = self.parse_specifier_opt();
            if self.check(TokenKind::Struct) && self.is_struct_decl_ahead() {
                program.items.push(TopLevel::Struct(self.parse_struct_decl()?));
                continue;
            }
            if self.check(TokenKind::Fn) {
                program
                    .items
                    .push(TopLevel::Func(self.parse_func_decl(specifier)?));
                continue;
            }
            if self.is_type_start() {
                let item_loc = self.loc();
                let ty = self.parse_base_type()?;
                let name = self.expect(TokenKind::Identifier, "identifier")?.text;
                program
                    .items
                    .push(TopLevel::Var(self.parse_var_decl_tail(ty, name, specifier, item_loc)?));
                continue;
            }
            return Err(ParseError::expected(
                self.loc(),
                "a function, variable, or struct declaration",
                &self.peek().text,
            ));
        }
        Ok(program)
    }

    fn is_struct_decl_ahead(&self) -> bool {
        // `struct Name {` declares a struct; `struct Name ident` or
        // `struct Name *` uses it as a type specifier.
        self.peek_at(1).kind == TokenKind::Identifier && self.peek_at(2).kind == TokenKind::LBrace
    }

    fn parse_specifier_opt(&mut self) -> Specifier {
        if self.matches(TokenKind::Static) {
            Specifier::Static
        } else if self.matches(TokenKind::Extern) {
            Specifier::Extern
        } else {
            Specifier::None
        }
    }

    // ---- types ----

    fn is_type_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Int
                | TokenKind::Long
                | TokenKind::Unsigned
                | TokenKind::Signed
                | TokenKind::Double
                | TokenKind::Void
                | TokenKind::Char
                | TokenKind::Bool
                | TokenKind::Struct
        )
    }

    /// Parses a base type specifier plus any trailing `*` pointer
    /// indirection. Array dimensions are parsed separately by the
    /// declarator (they follow the variable name, not the type).
    fn parse_base_type(&mut self) -> Result<Type, ParseError> {
        let base = match self.peek().kind {
            TokenKind::Void => {
                self.advance();
                BaseType::Void
            }
            TokenKind::Bool => {
                self.advance();
                BaseType::Bool
            }
            TokenKind::Char => {
                self.advance();
                BaseType::Char
            }
            TokenKind::Double => {
                self.advance();
                BaseType::Double
            }
            TokenKind::Int => {
                self.advance();
                BaseType::Int
            }
            TokenKind::Long => {
                self.advance();
                self.matches(TokenKind::Int); // `long int` == `long`
                BaseType::Long
            }
            TokenKind::Signed => {
                self.advance();
                if self.matches(TokenKind::Long) {
                    self.matches(TokenKind::Int);
                    BaseType::Long
                } else {
                    self.matches(TokenKind::Int);
                    BaseType::Int
                }
            }
            TokenKind::Unsigned => {
                self.advance();
                if self.matches(TokenKind::Long) {
                    self.matches(TokenKind::Int);
                    BaseType::ULong
                } else {
                    self.matches(TokenKind::Int);
                    BaseType::UInt
                }
            }
            TokenKind::Struct => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "struct name")?.text;
                BaseType::Struct(name)
            }
            _ => {
                return Err(ParseError::expected(self.loc(), "a type", &self.peek().text));
            }
        };
        let mut ty = Type::new(base);
        while self.matches(TokenKind::Star) {
            ty = ty.pointer_to();
        }
        Ok(ty)
    }

    fn parse_array_dims(&mut self) -> Result<Vec<usize>, ParseError> {
        let mut dims = Vec::new();
        while self.matches(TokenKind::LBracket) {
            let tok = self.expect(TokenKind::IntegerLiteral, "array size")?;
            let size: usize = tok
                .text
                .trim_end_matches(['u', 'U', 'l', 'L'])
                .parse()
                .map_err(|_| ParseError::new(tok.loc(), "invalid array size"))?;
            self.expect(TokenKind::RBracket, "]")?;
            dims.push(size);
        }
        Ok(dims)
    }

    // ---- struct declarations ----

    fn parse_struct_decl(&mut self) -> Result<StructDecl, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::Struct, "struct")?;
        let name = self.expect(TokenKind::Identifier, "struct name")?.text;
        self.expect(TokenKind::LBrace, "{")?;
        let mut ty = Type::new(BaseType::Struct(name.clone()));
        while !self.check(TokenKind::RBrace) {
            let field_ty = self.parse_base_type()?;
            let field_name = self.expect(TokenKind::Identifier, "field name")?.text;
            let dims = self.parse_array_dims()?;
            let field_ty = dims.into_iter().fold(field_ty, |t, d| t.with_array_dim(d));
            self.expect(TokenKind::Semicolon, ";")?;
            ty.add_field(field_name, field_ty);
        }
        self.expect(TokenKind::RBrace, "}")?;
        self.expect(TokenKind::Semicolon, ";")?;
        Ok(StructDecl { name, ty, loc })
    }

    // ---- function declarations ----

    fn parse_func_decl(&mut self, specifier: Specifier) -> Result<FuncDecl, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::Fn, "fn")?;
        let name = self.expect(TokenKind::Identifier, "function name")?.text;
        self.expect(TokenKind::LParen, "(")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let ty = self.parse_base_type()?;
                let pname = self.expect(TokenKind::Identifier, "parameter name")?.text;
                params.push(Param {
                    name: pname,
                    resolved_name: None,
                    ty,
                });
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, ")")?;
        self.expect(TokenKind::Arrow, "->")?;
        let return_ty = self.parse_base_type()?;
        let body = self.parse_block()?;
        Ok(FuncDecl {
            name,
            params,
            return_ty,
            specifier,
            body: Some(body),
            loc,
        })
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace, "{")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace, "}")?;
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.loc();
        match self.peek().kind {
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semicolon, ";")?;
                Ok(Stmt::Return { value, loc })
            }
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semicolon, ";")?;
                Ok(Stmt::LoopControl {
                    kind: LoopKind::Break,
                    label: None,
                    loc,
                })
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(TokenKind::Semicolon, ";")?;
                Ok(Stmt::LoopControl {
                    kind: LoopKind::Continue,
                    label: None,
                    loc,
                })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ if self.is_type_start() => Ok(Stmt::VarDecl(self.parse_local_var_decl()?)),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, ";")?;
                Ok(Stmt::ExprStmt(expr))
            }
        }
    }

    fn parse_local_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let loc = self.loc();
        let specifier = self.parse_specifier_opt();
        let ty = self.parse_base_type()?;
        let name = self.expect(TokenKind::Identifier, "identifier")?.text;
        let decl = self.parse_var_decl_tail(ty, name, specifier, loc)?;
        Ok(decl)
    }

    /// Shared tail of a var-decl once `type name` has already been consumed:
    /// optional array dimensions, optional initializer, terminating `;`.
    fn parse_var_decl_tail(
        &mut self,
        base_ty: Type,
        name: String,
        specifier: Specifier,
        loc: SourceLocation,
    ) -> Result<VarDecl, ParseError> {
        let dims = self.parse_array_dims()?;
        let ty = dims.into_iter().fold(base_ty, |t, d| t.with_array_dim(d));
        let init = if self.matches(TokenKind::Assign) {
            Some(self.parse_initializer()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, ";")?;
        Ok(VarDecl {
            name,
            resolved_name: None,
            ty,
            specifier,
            init,
            loc,
        })
    }

    /// An initializer is either a compound `{ e1, e2, ... }` literal or a
    /// plain expression.
    fn parse_initializer(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        if self.check(TokenKind::LBrace) {
            self.advance();
            let mut elems = Vec::new();
            if !self.check(TokenKind::RBrace) {
                loop {
                    elems.push(self.parse_expr()?);
                    if !self.matches(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBrace, "}")?;
            Ok(Expr::new(ExprKind::CompoundInit(elems), loc))
        } else {
            self.parse_expr()
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::If, "if")?;
        self.expect(TokenKind::LParen, "(")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, ")")?;
        let then_branch = self.parse_block_or_stmt()?;
        let else_branch = if self.matches(TokenKind::Else) {
            Some(self.parse_block_or_stmt()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            loc,
        })
    }

    fn parse_block_or_stmt(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.check(TokenKind::LBrace) {
            self.parse_block()
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::While, "while")?;
        self.expect(TokenKind::LParen, "(")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, ")")?;
        let body = self.parse_block_or_stmt()?;
        Ok(Stmt::While {
            cond,
            body,
            label: None,
            loc,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.loc();
        self.expect(TokenKind::For, "for")?;
        self.expect(TokenKind::LParen, "(")?;
        let init = if self.check(TokenKind::Semicolon) {
            None
        } else if self.is_type_start() {
            Some(Box::new(Stmt::VarDecl(self.parse_local_var_decl()?)))
        } else {
            let e = self.parse_expr()?;
            self.expect(TokenKind::Semicolon, ";")?;
            Some(Box::new(Stmt::ExprStmt(e)))
        };
        if init.is_none() {
            self.expect(TokenKind::Semicolon, ";")?;
        }
        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon, ";")?;
        let post = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen, ")")?;
        let body = self.parse_block_or_stmt()?;
        Ok(Stmt::For {
            init,
            cond,
            post,
            body,
            label: None,
            loc,
        })
    }

    // ---- expressions ----
    //
    // Precedence (lowest to highest), per spec.md §4.2:
    //   assignment (right-assoc, lowest of all)
    //   ||   (5)
    //   &&   (10)
    //   == !=    (20)
    //   < > <= >=    (25)
    //   + -  (35)
    //   * / %    (40)
    //   unary prefix (- ~ ! & * ++ --)
    //   postfix (call, index, field, postfix ++/--)

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        let lhs = self.parse_logical_or()?;

        let compound_op = match self.peek().kind {
            TokenKind::Assign => None,
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            TokenKind::PercentEq => Some(BinOp::Mod),
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_assignment()?; // right-associative
        let value = match compound_op {
            None => rhs,
            Some(op) => Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs.clone()),
                    rhs: Box::new(rhs),
                },
                loc,
            ),
        };
        Ok(Expr::new(
            ExprKind::Assign {
                target: Box::new(lhs),
                value: Box::new(value),
            },
            loc,
        ))
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_logical_and()?;
        while self.check(TokenKind::OrOr) {
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_logical_and()?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.check(TokenKind::AndAnd) {
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Negate,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::Tilde => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Complement,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::Ampersand => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(ExprKind::AddrOf(Box::new(operand)), loc))
            }
            TokenKind::Star => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(ExprKind::Deref(Box::new(operand)), loc))
            }
            TokenKind::Increment => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::PreIncrement,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            TokenKind::Decrement => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::PreDecrement,
                        operand: Box::new(operand),
                    },
                    loc,
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_factor()?;
        loop {
            let loc = self.loc();
            match self.peek().kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "]")?;
                    expr = Expr::new(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        loc,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect(TokenKind::Identifier, "field name")?.text;
                    expr = Expr::new(
                        ExprKind::FieldAccess {
                            base: Box::new(expr),
                            field,
                            via_pointer: false,
                        },
                        loc,
                    );
                }
                TokenKind::Arrow => {
                    self.advance();
                    let field = self.expect(TokenKind::Identifier, "field name")?.text;
                    expr = Expr::new(
                        ExprKind::FieldAccess {
                            base: Box::new(expr),
                            field,
                            via_pointer: true,
                        },
                        loc,
                    );
                }
                TokenKind::Increment => {
                    self.advance();
                    expr = Expr::new(
                        ExprKind::Postfix {
                            op: PostfixOp::PostIncrement,
                            operand: Box::new(expr),
                        },
                        loc,
                    );
                }
                TokenKind::Decrement => {
                    self.advance();
                    expr = Expr::new(
                        ExprKind::Postfix {
                            op: PostfixOp::PostDecrement,
                            operand: Box::new(expr),
                        },
                        loc,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// The atom of the expression grammar: literals, identifiers/calls,
    /// parenthesized expressions, and casts. A `(` is parsed as a cast when
    /// followed by a type keyword, otherwise as a parenthesized expression
    /// (spec.md §4.2).
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();
        match self.peek().kind {
            TokenKind::IntegerLiteral => {
                let text = self.advance().text;
                self.parse_integer_literal(&text, loc)
            }
            TokenKind::FloatingLiteral => {
                let text = self.advance().text;
                let value: f64 = text
                    .parse()
                    .map_err(|_| ParseError::new(loc, format!("invalid floating literal '{text}'")))?;
                Ok(Expr::new(ExprKind::DoubleLiteral(value), loc))
            }
            TokenKind::CharLiteral => {
                let text = self.advance().text;
                let ch = text.chars().next().unwrap_or('\0');
                Ok(Expr::new(ExprKind::CharLiteral(ch), loc))
            }
            TokenKind::StringLiteral => {
                let text = self.advance().text;
                Ok(Expr::new(ExprKind::StringLiteral(text), loc))
            }
            TokenKind::BoolLiteral => {
                let text = self.advance().text;
                Ok(Expr::new(ExprKind::BoolLiteral(text == "true"), loc))
            }
            TokenKind::Identifier => {
                let name = self.advance().text;
                if self.matches(TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.matches(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, ")")?;
                    Ok(Expr::new(ExprKind::Call { name, args }, loc))
                } else {
                    Ok(Expr::new(
                        ExprKind::Var {
                            name,
                            resolved_name: None,
                        },
                        loc,
                    ))
                }
            }
            TokenKind::LParen => {
                self.advance();
                if self.is_type_start() {
                    let target_ty = self.parse_base_type()?;
                    self.expect(TokenKind::RParen, ")")?;
                    let expr = self.parse_unary()?;
                    Ok(Expr::new(
                        ExprKind::Cast {
                            target_ty,
                            expr: Box::new(expr),
                        },
                        loc,
                    ))
                } else {
                    let inner = self.parse_expr()?;
                    self.expect(TokenKind::RParen, ")")?;
                    Ok(inner)
                }
            }
            _ => Err(ParseError::expected(
                loc,
                "an expression",
                &self.peek().text,
            )),
        }
    }

    fn parse_integer_literal(&self, text: &str, loc: SourceLocation) -> Result<Expr, ParseError> {
        let lower = text.to_ascii_lowercase();
        let unsigned = lower.contains('u');
        let long = lower.contains('l');
        let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
        let value: u64 = digits
            .parse()
            .map_err(|_| ParseError::new(loc, format!("invalid integer literal '{text}'")))?;
        let kind = match (unsigned, long) {
            (false, false) => ExprKind::IntLiteral(value as i64),
            (false, true) => ExprKind::LongLiteral(value as i64),
            (true, false) => ExprKind::UIntLiteral(value),
            (true, true) => ExprKind::ULongLiteral(value),
        };
        Ok(Expr::new(kind, loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        Parser::parse(src).unwrap_or_else(|e| panic!("parse failed: {} ({})", e, src))
    }

    #[test]
    fn parses_simple_function() {
        let prog = parse_ok("fn main() -> int { return 2 + 3 * 4; }");
        assert_eq!(prog.items.len(), 1);
        match &prog.items[0] {
            TopLevel::Func(f) => assert_eq!(f.name, "main"),
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn precedence_climbing_respects_table() {
        // 2 + 3 * 4 should parse as 2 + (3 * 4), not (2 + 3) * 4.
        let prog = parse_ok("fn main() -> int { return 2 + 3 * 4; }");
        let TopLevel::Func(f) = &prog.items[0] else {
            unreachable!()
        };
        let Stmt::Return { value: Some(expr), .. } = &f.body.as_ref().unwrap()[0] else {
            panic!("expected return");
        };
        match &expr.kind {
            ExprKind::Binary { op: BinOp::Add, rhs, .. } => match &rhs.kind {
                ExprKind::Binary { op: BinOp::Mul, .. } => {}
                other => panic!("expected multiplication on rhs, got {:?}", other),
            },
            other => panic!("expected addition at top, got {:?}", other),
        }
    }

    #[test]
    fn parses_static_global_and_if_else() {
        let prog = parse_ok(
            "static int g = 7; fn main() -> int { int a = 5; int b = 3; if (a > b) return 1; else return 0; }",
        );
        assert_eq!(prog.items.len(), 2);
    }

    #[test]
    fn parses_for_loop_with_array() {
        parse_ok("fn main() -> int { int a[3] = {10, 20, 30}; return a[1] + a[2]; }");
    }

    #[test]
    fn cast_vs_parenthesized_expr() {
        let prog = parse_ok("fn main() -> int { double d = 1.5; return (int)(d * 2.0); }");
        let TopLevel::Func(f) = &prog.items[0] else {
            unreachable!()
        };
        let body = f.body.as_ref().unwrap();
        let Stmt::Return { value: Some(expr), .. } = &body[1] else {
            panic!("expected return");
        };
        assert!(matches!(expr.kind, ExprKind::Cast { .. }));
    }

    #[test]
    fn struct_field_access_and_pointer_types() {
        parse_ok(
            "struct Point { int x; int y; };\n\
             fn main() -> int { struct Point p; p.x = 1; struct Point *pp = &p; return pp->x; }",
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        let prog = parse_ok("fn main() -> int { int a; int b; a = b = 3; return a; }");
        let TopLevel::Func(f) = &prog.items[0] else {
            unreachable!()
        };
        let body = f.body.as_ref().unwrap();
        let Stmt::ExprStmt(expr) = &body[2] else {
            panic!("expected expr stmt");
        };
        match &expr.kind {
            ExprKind::Assign { value, .. } => {
                assert!(matches!(value.kind, ExprKind::Assign { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_program_with_located_error() {
        let err = Parser::parse("fn main( -> int { return 0; }").unwrap_err();
        assert!(err.message.contains("expected"));
    }
}
