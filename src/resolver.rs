//! Static resolver pass for the **Grus** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str, bool>` tracking
//!    declared/defined).
//! 2. Report static errors (redeclaration, forward-read in an initializer,
//!    `break`/`continue` outside a loop, `return` outside a function).
//! 3. Record, for *each* variable occurrence, its binding distance (the
//!    number of environment hops from use-site to declaring scope) into a
//!    side-table keyed by expression id. Occurrences found in no scope are
//!    left out of the table and resolve dynamically against the globals.
//!
//! Errors go to the host callback and never stop the walk; the rest of the
//! program still resolves, matching the parser's recovery philosophy.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;
use std::mem;

/// Are we inside a user function? Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances into the side-table handed to the interpreter.
pub struct Resolver<'a, 'e> {
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    locals: HashMap<ExprId, usize>,
    loop_depth: usize,
    current_function: FunctionType,
    report: &'e mut dyn FnMut(&Token<'a>, &str),
}

impl<'a, 'e> Resolver<'a, 'e> {
    /// Create a new resolver reporting errors through `report`.
    pub fn new(report: &'e mut dyn FnMut(&Token<'a>, &str)) -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            locals: HashMap::new(),
            loop_depth: 0,
            current_function: FunctionType::None,
            report,
        }
    }

    /// Walk all top-level statements and return the distance side-table.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> HashMap<ExprId, usize> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        // The global frame is a scope like any other, so top-level
        // redeclaration and self-initializer misuse are caught too. Native
        // names are never declared here and stay dynamic.
        self.begin_scope();
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.locals
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Expression(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::Var {
                name, initializer, ..
            } => {
                // declare → resolve initializer → define. The split is what
                // lets `var a = a;` fail instead of silently binding null.
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // The name is visible *inside* its own body (self-recursion).
                self.declare(decl.name);
                self.define(decl.name);
                self.resolve_function(decl);
            }

            Stmt::Class {
                name,
                fields,
                methods,
            } => {
                self.declare(name);
                self.define(name);

                // Field initializers run in the class's defining environment,
                // outside the method scope that carries 'this'.
                for field in fields {
                    if let Some(expr) = &field.initializer {
                        self.resolve_expr(expr);
                    }
                }

                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this", true);
                }
                for method in methods {
                    self.resolve_function(method);
                }
                self.end_scope();
            }

            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);

                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // The parser's block wrapper supplies the initializer scope.
                self.resolve_stmt(initializer);
                self.resolve_expr(condition);
                self.resolve_expr(increment);

                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::Break(keyword) => {
                if self.loop_depth == 0 {
                    (self.report)(keyword, "Unexpected 'break'.");
                }
            }

            Stmt::Continue(keyword) => {
                if self.loop_depth == 0 {
                    (self.report)(keyword, "Unexpected 'continue'.");
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    (self.report)(keyword, "'return' used outside of function.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Postfix { operand, .. } => {
                self.resolve_expr(operand);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_expr);
                self.resolve_expr(else_expr);
            }

            Expr::Variable { id, name } => {
                // Cannot read in own initializer.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme) == Some(&false) {
                        (self.report)(name, "Cannot read local variable in its own initializer.");
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS.
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body. Loop depth
    /// resets: a `break` inside the body must find a loop inside the body.
    fn resolve_function(&mut self, decl: &FunctionDecl<'a>) {
        let enclosing = self.current_function;
        self.current_function = FunctionType::Function;
        let enclosing_loops = mem::replace(&mut self.loop_depth, 0);

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.loop_depth = enclosing_loops;
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token<'a>) {
        let duplicate = match self.scopes.last() {
            Some(scope) => scope.contains_key(name.lexeme),
            None => return,
        };

        if duplicate {
            (self.report)(name, "Variable with this name already declared in this scope.");
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, false);
        }
    }

    fn define(&mut self, name: &Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it for
    /// dynamic global lookup when no scope knows the name.
    fn resolve_local(&mut self, id: ExprId, name: &Token<'a>) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
