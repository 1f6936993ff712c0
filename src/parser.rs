/*!
Parser for Grus: a recursive-descent statement layer over a table-driven
Pratt expression engine.

Grammar (EBNF, condensed)
-------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | typedDecl | statement ;
classDecl      → "class" IDENT "{" ( field | method )* "}" ;
field          → IDENT ( "=" expression )? ";" ;
method         → IDENT "(" parameters? ")" block ;
funDecl        → "fun" IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
typedDecl      → IDENT IDENT ( "=" expression )? ";" ;
statement      → exprStmt | block | ifStmt | whileStmt | forStmt
               | doWhileStmt | loopStmt | breakStmt | continueStmt
               | returnStmt ;
block          → "{" declaration* "}" ;
ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
whileStmt      → "while" "(" expression ")" statement ;
forStmt        → "for" "(" ( varDecl | exprStmt ) expression? ";"
                 expression ")" statement ;
doWhileStmt    → "do" statement "while" "(" expression ")" ";" ;
loopStmt       → "loop" statement ;
breakStmt      → "break" ";" ;
continueStmt   → "continue" ";" ;
returnStmt     → "return" expression? ";" ;
parameters     → IDENT ( "," IDENT )* ;
```

Expressions are parsed by `parse_precedence`, driven by a fixed table that
maps each token kind to a `(prefix handler, infix handler, precedence)`
triple. This is what lets the grammar express fifteen binary operator
tiers, two unary tiers, ternary, assignment, and the comma operator
without one recursive-descent function per precedence level:

* consume one token and run its prefix handler ("Expect expression." when
  the table has none);
* then, while the *next* token's table precedence is ≥ the current call's
  minimum, consume it and fold the left-hand expression through its infix
  handler.

Assignment (and the compound forms) are right-associative and recurse at
their own level; every other binary operator recurses one level higher to
force left-association. Prefix operators recurse at the unary level,
right-associative by construction. Postfix `++`/`--` sit just above the
additive tier and consume no right operand.

`for` desugars into a block wrapping a dedicated For node so the loop
keeps its own initializer scope; `do-while` and `loop` desugar to While.
On a parse error the parser reports through the host callback and
**synchronizes**, discarding tokens until a statement boundary, so one
malformed statement does not cascade into spurious downstream errors.
*/

use crate::ast::{Expr, ExprId, FieldDecl, FunctionDecl, LiteralValue, Stmt};
use crate::error::{GrusError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Operator precedence tiers, lowest to highest. The `u8` representation is
/// what `parse_precedence` compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Precedence {
    None = 0,
    Comma,      // ","
    Assignment, // "=", "+=", "-=", "*=", "/=", "%=", "^=", "&=", "|=", ">>=", "<<="
    Ternary,    // "?:"
    Or,         // "||"
    And,        // "&&"
    BitOr,      // "|"
    BitXor,     // "^"
    BitAnd,     // "&"
    Equality,   // "==", "!="
    Comparison, // "<", ">", "<=", ">="
    Shift,      // ">>", "<<"
    Term,       // "+", "-"
    Postfix,    // postfix "++", "--"
    Factor,     // "*", "/", "%"
    Unary,      // "!", "-", "~", prefix "++"/"--", "new"
    Call,       // ".", "()"
}

type PrefixFn<'a, 'e> = fn(&mut Parser<'a, 'e>, &'a Token<'a>) -> Result<Expr<'a>>;
type InfixFn<'a, 'e> = fn(&mut Parser<'a, 'e>, Expr<'a>, &'a Token<'a>) -> Result<Expr<'a>>;

/// One row of the Pratt table.
struct ParseRule<'a, 'e> {
    prefix: Option<PrefixFn<'a, 'e>>,
    infix: Option<InfixFn<'a, 'e>>,
    precedence: Precedence,
}

/// Top-level parser over an immutable slice of tokens. Parse errors are
/// forwarded to `report` as `(offending token, message)`.
pub struct Parser<'a, 'e> {
    tokens: &'a [Token<'a>],
    current: usize,
    next_id: u32,
    report: &'e mut dyn FnMut(&Token<'a>, &str),
}

impl<'a, 'e> Parser<'a, 'e> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token<'a>], report: &'e mut dyn FnMut(&Token<'a>, &str)) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: 0,
            report,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list. Malformed
    /// declarations are reported and skipped; the rest of the program still
    /// parses.
    pub fn parse(&mut self) -> Vec<Stmt<'a>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                // Already reported; recover at the next statement boundary.
                Err(_) => self.synchronize(),
            }
        }

        statements
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<Stmt<'a>> {
        debug!("Entering declaration");

        if self.matches(TokenType::CLASS) {
            return self.class_declaration();
        }

        if self.matches(TokenType::FUN) {
            let decl = self.function("function")?;

            return Ok(Stmt::Function(decl));
        }

        if self.matches(TokenType::VAR) {
            return self.var_declaration(None);
        }

        // Typed declaration: two identifiers in a row ("Int x = 1;"). The
        // annotation is kept on the node but has no runtime meaning.
        if self.check(TokenType::IDENTIFIER) && self.check_next(TokenType::IDENTIFIER) {
            let ty: &Token<'_> = self.advance();

            return self.var_declaration(Some(ty));
        }

        self.statement()
    }

    fn class_declaration(&mut self) -> Result<Stmt<'a>> {
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut fields: Vec<FieldDecl<'a>> = Vec::new();
        let mut methods: Vec<FunctionDecl<'a>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            let member: &Token<'_> =
                self.consume(TokenType::IDENTIFIER, "Expect field or method name.")?;

            if self.check(TokenType::LEFT_PAREN) {
                // Methods use the bare form, no 'fun' keyword.
                methods.push(self.finish_function(member)?);
            } else {
                let initializer: Option<Expr<'a>> = if self.matches(TokenType::EQUAL) {
                    Some(self.expression()?)
                } else {
                    None
                };

                self.consume(TokenType::SEMICOLON, "Expect ';' after field declaration.")?;

                fields.push(FieldDecl {
                    name: member,
                    initializer,
                });
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            fields,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> Result<FunctionDecl<'a>> {
        let message = format!("Expect {} name.", kind);
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, &message)?;

        self.finish_function(name)
    }

    /// Parameter list and body, shared by `fun` declarations and methods.
    fn finish_function(&mut self, name: &'a Token<'a>) -> Result<FunctionDecl<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after function name.")?;

        let mut params: Vec<&'a Token<'a>> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 255 {
                    let token: &Token<'_> = self.peek();

                    (self.report)(token, "Can't have more than 255 parameters.");
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(TokenType::LEFT_BRACE, "Expect '{' before function body.")?;

        let body: Vec<Stmt<'a>> = self.block()?;

        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self, ty: Option<&'a Token<'a>>) -> Result<Stmt<'a>> {
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr<'a>> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var {
            name,
            ty,
            initializer,
        })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt<'a>> {
        if self.matches(TokenType::LEFT_BRACE) {
            return Ok(Stmt::Block(self.block()?));
        }

        if self.matches(TokenType::IF) {
            return self.if_statement();
        }

        if self.matches(TokenType::WHILE) {
            return self.while_statement();
        }

        if self.matches(TokenType::FOR) {
            return self.for_statement();
        }

        if self.matches(TokenType::DO) {
            return self.do_while_statement();
        }

        if self.matches(TokenType::LOOP) {
            return self.loop_statement();
        }

        if self.matches(TokenType::BREAK) {
            return self.break_statement();
        }

        if self.matches(TokenType::CONTINUE) {
            return self.continue_statement();
        }

        if self.matches(TokenType::RETURN) {
            return self.return_statement();
        }

        self.expression_statement()
    }

    fn if_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        let then_branch: Box<Stmt<'a>> = Box::new(self.statement()?);

        // 'else' binds to the nearest unmatched 'if'.
        let else_branch: Option<Box<Stmt<'a>>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt<'a>> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn for_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Box<Stmt<'a>> = if self.matches(TokenType::VAR) {
            Box::new(self.var_declaration(None)?)
        } else {
            Box::new(self.expression_statement()?)
        };

        let condition: Expr<'a> = if self.check(TokenType::SEMICOLON) {
            Expr::Literal(LiteralValue::True)
        } else {
            self.expression()?
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after loop increment.")?;

        let body: Box<Stmt<'a>> = Box::new(self.statement()?);

        // The wrapping block gives the initializer its own scope, distinct
        // from the per-iteration body scope.
        Ok(Stmt::Block(vec![Stmt::For {
            initializer,
            condition,
            increment,
            body,
        }]))
    }

    fn do_while_statement(&mut self) -> Result<Stmt<'a>> {
        let body: Box<Stmt<'a>> = Box::new(self.statement()?);

        self.consume(TokenType::WHILE, "Expect 'while' after do body.")?;
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after condition.")?;

        Ok(Stmt::While { condition, body })
    }

    /// `loop stmt` is `while (true) stmt`.
    fn loop_statement(&mut self) -> Result<Stmt<'a>> {
        let body: Box<Stmt<'a>> = Box::new(self.statement()?);

        Ok(Stmt::While {
            condition: Expr::Literal(LiteralValue::True),
            body,
        })
    }

    fn break_statement(&mut self) -> Result<Stmt<'a>> {
        let keyword: &Token<'_> = self.previous();

        self.consume(TokenType::SEMICOLON, "Expect ';' after break.")?;

        Ok(Stmt::Break(keyword))
    }

    fn continue_statement(&mut self) -> Result<Stmt<'a>> {
        let keyword: &Token<'_> = self.previous();

        self.consume(TokenType::SEMICOLON, "Expect ';' after continue.")?;

        Ok(Stmt::Continue(keyword))
    }

    fn return_statement(&mut self) -> Result<Stmt<'a>> {
        let keyword: &Token<'_> = self.previous();

        let value: Option<Expr<'a>> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> Result<Vec<Stmt<'a>>> {
        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt<'a>> {
        let expr: Expr<'a> = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    // ─────────────────────── expression rules (Pratt) ─────────────

    /// The table: one `(prefix, infix, precedence)` row per token kind.
    fn rule(kind: &TokenType) -> ParseRule<'a, 'e> {
        let (prefix, infix, precedence): (
            Option<PrefixFn<'a, 'e>>,
            Option<InfixFn<'a, 'e>>,
            Precedence,
        ) = match kind {
            TokenType::LEFT_PAREN => (Some(Self::grouping), Some(Self::call), Precedence::Call),
            TokenType::DOT => (None, Some(Self::get), Precedence::Call),

            TokenType::BANG => (Some(Self::unary), None, Precedence::None),
            TokenType::TILDE => (Some(Self::unary), None, Precedence::None),
            TokenType::NEW => (Some(Self::unary), None, Precedence::None),
            TokenType::MINUS => (Some(Self::unary), Some(Self::binary), Precedence::Term),
            TokenType::PLUS => (None, Some(Self::binary), Precedence::Term),
            TokenType::PLUS_PLUS => (Some(Self::unary), Some(Self::postfix), Precedence::Postfix),
            TokenType::MINUS_MINUS => (Some(Self::unary), Some(Self::postfix), Precedence::Postfix),

            TokenType::STAR => (None, Some(Self::binary), Precedence::Factor),
            TokenType::SLASH => (None, Some(Self::binary), Precedence::Factor),
            TokenType::PERCENT => (None, Some(Self::binary), Precedence::Factor),

            TokenType::LESS_LESS => (None, Some(Self::binary), Precedence::Shift),
            TokenType::GREATER_GREATER => (None, Some(Self::binary), Precedence::Shift),

            TokenType::GREATER => (None, Some(Self::binary), Precedence::Comparison),
            TokenType::GREATER_EQUAL => (None, Some(Self::binary), Precedence::Comparison),
            TokenType::LESS => (None, Some(Self::binary), Precedence::Comparison),
            TokenType::LESS_EQUAL => (None, Some(Self::binary), Precedence::Comparison),

            TokenType::EQUAL_EQUAL => (None, Some(Self::binary), Precedence::Equality),
            TokenType::BANG_EQUAL => (None, Some(Self::binary), Precedence::Equality),

            TokenType::AMP => (None, Some(Self::binary), Precedence::BitAnd),
            TokenType::CARET => (None, Some(Self::binary), Precedence::BitXor),
            TokenType::PIPE => (None, Some(Self::binary), Precedence::BitOr),

            TokenType::AMP_AMP => (None, Some(Self::logical), Precedence::And),
            TokenType::PIPE_PIPE => (None, Some(Self::logical), Precedence::Or),

            TokenType::QUESTION => (None, Some(Self::ternary), Precedence::Ternary),

            TokenType::EQUAL
            | TokenType::PLUS_EQUAL
            | TokenType::MINUS_EQUAL
            | TokenType::STAR_EQUAL
            | TokenType::SLASH_EQUAL
            | TokenType::PERCENT_EQUAL
            | TokenType::CARET_EQUAL
            | TokenType::AMP_EQUAL
            | TokenType::PIPE_EQUAL
            | TokenType::GREATER_GREATER_EQUAL
            | TokenType::LESS_LESS_EQUAL => {
                (None, Some(Self::assign), Precedence::Assignment)
            }

            TokenType::COMMA => (None, Some(Self::binary), Precedence::Comma),

            TokenType::TRUE
            | TokenType::FALSE
            | TokenType::NULL
            | TokenType::NUMBER(_)
            | TokenType::STRING(_) => (Some(Self::literal), None, Precedence::None),

            TokenType::IDENTIFIER => (Some(Self::variable), None, Precedence::None),
            TokenType::THIS => (Some(Self::this_expr), None, Precedence::None),

            // Everything else (statement keywords, closers, 'super', EOF)
            // can neither start nor extend an expression.
            _ => (None, None, Precedence::None),
        };

        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }

    pub(crate) fn expression(&mut self) -> Result<Expr<'a>> {
        self.parse_precedence(Precedence::Comma as u8)
    }

    /// The Pratt core loop.
    fn parse_precedence(&mut self, min: u8) -> Result<Expr<'a>> {
        let token: &'a Token<'a> = self.advance();

        let prefix: PrefixFn<'a, 'e> = match Self::rule(&token.token_type).prefix {
            Some(handler) => handler,
            None => return Err(self.error(token, "Expect expression.")),
        };

        let mut expr: Expr<'a> = prefix(self, token)?;

        while min <= Self::rule(&self.peek().token_type).precedence as u8 {
            let operator: &'a Token<'a> = self.advance();

            let infix: InfixFn<'a, 'e> = match Self::rule(&operator.token_type).infix {
                Some(handler) => handler,
                None => return Err(self.error(operator, "Expect expression.")),
            };

            expr = infix(self, expr, operator)?;
        }

        Ok(expr)
    }

    // ── prefix handlers ───────────────────────────────────────────

    fn grouping(&mut self, _token: &'a Token<'a>) -> Result<Expr<'a>> {
        let expr: Expr<'a> = self.expression()?;

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

        Ok(Expr::Grouping(Box::new(expr)))
    }

    fn unary(&mut self, operator: &'a Token<'a>) -> Result<Expr<'a>> {
        let right: Expr<'a> = self.parse_precedence(Precedence::Unary as u8)?;

        Ok(Expr::Unary {
            operator,
            right: Box::new(right),
        })
    }

    fn literal(&mut self, token: &'a Token<'a>) -> Result<Expr<'a>> {
        let value: LiteralValue = match &token.token_type {
            TokenType::NUMBER(n) => LiteralValue::Number(*n),
            TokenType::STRING(s) => LiteralValue::Str(s.clone()),
            TokenType::TRUE => LiteralValue::True,
            TokenType::FALSE => LiteralValue::False,
            TokenType::NULL => LiteralValue::Null,
            _ => return Err(self.error(token, "Expect expression.")),
        };

        Ok(Expr::Literal(value))
    }

    fn variable(&mut self, name: &'a Token<'a>) -> Result<Expr<'a>> {
        Ok(Expr::Variable {
            id: self.next_expr_id(),
            name,
        })
    }

    fn this_expr(&mut self, keyword: &'a Token<'a>) -> Result<Expr<'a>> {
        Ok(Expr::This {
            id: self.next_expr_id(),
            keyword,
        })
    }

    // ── infix handlers ────────────────────────────────────────────

    fn binary(&mut self, left: Expr<'a>, operator: &'a Token<'a>) -> Result<Expr<'a>> {
        let precedence: Precedence = Self::rule(&operator.token_type).precedence;

        // One level higher forces left-association.
        let right: Expr<'a> = self.parse_precedence(precedence as u8 + 1)?;

        Ok(Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn logical(&mut self, left: Expr<'a>, operator: &'a Token<'a>) -> Result<Expr<'a>> {
        let precedence: Precedence = Self::rule(&operator.token_type).precedence;

        let right: Expr<'a> = self.parse_precedence(precedence as u8 + 1)?;

        Ok(Expr::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn assign(&mut self, left: Expr<'a>, operator: &'a Token<'a>) -> Result<Expr<'a>> {
        match left {
            // Same level: assignment chains right-associatively.
            Expr::Variable { name, .. } => {
                let value: Expr<'a> = self.parse_precedence(Precedence::Assignment as u8)?;

                Ok(Expr::Assign {
                    id: self.next_expr_id(),
                    name,
                    value: Box::new(value),
                })
            }

            Expr::Get { object, name } if operator.token_type == TokenType::EQUAL => {
                let value: Expr<'a> = self.parse_precedence(Precedence::Assignment as u8)?;

                Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                })
            }

            _ => {
                (self.report)(operator, "Invalid assignment target.");

                // Best effort: keep parsing and fold into a plain binary
                // node so one mistake yields one diagnostic.
                let right: Expr<'a> = self.parse_precedence(Precedence::Assignment as u8 + 1)?;

                Ok(Expr::Binary {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                })
            }
        }
    }

    fn ternary(&mut self, condition: Expr<'a>, _operator: &'a Token<'a>) -> Result<Expr<'a>> {
        let then_expr: Expr<'a> = self.parse_precedence(Precedence::Assignment as u8)?;

        self.consume(TokenType::COLON, "Expect ':' after '?'.")?;

        let else_expr: Expr<'a> = self.parse_precedence(Precedence::Assignment as u8)?;

        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        })
    }

    fn call(&mut self, callee: Expr<'a>, _operator: &'a Token<'a>) -> Result<Expr<'a>> {
        let mut arguments: Vec<Expr<'a>> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let token: &Token<'_> = self.peek();

                    (self.report)(token, "Can't have more than 255 arguments.");
                }

                // Assignment precedence, so ',' separates arguments instead
                // of folding them into a comma expression.
                arguments.push(self.parse_precedence(Precedence::Assignment as u8)?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: &Token<'_> = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn get(&mut self, object: Expr<'a>, _operator: &'a Token<'a>) -> Result<Expr<'a>> {
        let name: &Token<'_> =
            self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

        Ok(Expr::Get {
            object: Box::new(object),
            name,
        })
    }

    fn postfix(&mut self, operand: Expr<'a>, operator: &'a Token<'a>) -> Result<Expr<'a>> {
        if !matches!(operand, Expr::Variable { .. }) {
            (self.report)(
                operator,
                "Postfix increment/decrement can only be applied to variables.",
            );
        }

        Ok(Expr::Postfix {
            operand: Box::new(operand),
            operator,
        })
    }

    // ────────────────────── utility helpers ───────────────────────

    fn next_expr_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Report a parse error and build the unwinding error value.
    fn error(&mut self, token: &'a Token<'a>, message: &str) -> GrusError {
        debug!("Parse error at {:?}: {}", token.token_type, message);

        (self.report)(token, message);

        GrusError::parse(token.line, token.column, message)
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        let token: &'a Token<'a> = self.peek();

        Err(self.error(token, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(token) => token.token_type == ttype,
            None => false,
        }
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
