//! Debug printer: renders the syntax tree as parenthesized prefix text.
//! Used by the `Parse` subcommand and the parser tests.

use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};

pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(&self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(expr {})", self.print_expr(expr)),

            Stmt::Var {
                name,
                ty,
                initializer,
            } => {
                let mut out = String::from("(var ");

                if let Some(ty) = ty {
                    out.push_str(ty.lexeme);
                    out.push(' ');
                }

                out.push_str(name.lexeme);

                if let Some(init) = initializer {
                    out.push_str(" = ");
                    out.push_str(&self.print_expr(init));
                }

                out.push(')');
                out
            }

            Stmt::Function(decl) => self.print_function("fun", decl),

            Stmt::Class {
                name,
                fields,
                methods,
            } => {
                let mut out = format!("(class {}", name.lexeme);

                for field in fields {
                    match &field.initializer {
                        Some(init) => out.push_str(&format!(
                            " (field {} = {})",
                            field.name.lexeme,
                            self.print_expr(init)
                        )),
                        None => out.push_str(&format!(" (field {})", field.name.lexeme)),
                    }
                }

                for method in methods {
                    out.push(' ');
                    out.push_str(&self.print_function("method", method));
                }

                out.push(')');
                out
            }

            Stmt::Block(statements) => {
                let mut out = String::from("(block");

                for s in statements {
                    out.push(' ');
                    out.push_str(&self.print_stmt(s));
                }

                out.push(')');
                out
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(eb) => format!(
                    "(if {} {} {})",
                    self.print_expr(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(eb)
                ),
                None => format!(
                    "(if {} {})",
                    self.print_expr(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                self.print_expr(condition),
                self.print_stmt(body)
            ),

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => format!(
                "(for {} {} {} {})",
                self.print_stmt(initializer),
                self.print_expr(condition),
                self.print_expr(increment),
                self.print_stmt(body)
            ),

            Stmt::Break(_) => String::from("(break)"),

            Stmt::Continue(_) => String::from("(continue)"),

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", self.print_expr(expr)),
                None => String::from("(return)"),
            },
        }
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(value) => match value {
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
                LiteralValue::Str(s) => s.clone(),
                LiteralValue::True => String::from("true"),
                LiteralValue::False => String::from("false"),
                LiteralValue::Null => String::from("null"),
            },

            Expr::Grouping(inner) => format!("(group {})", self.print_expr(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print_expr(right))
            }

            Expr::Postfix { operand, operator } => {
                format!("(postfix {} {})", operator.lexeme, self.print_expr(operand))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print_expr(left),
                self.print_expr(right)
            ),

            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
            } => format!(
                "(?: {} {} {})",
                self.print_expr(condition),
                self.print_expr(then_expr),
                self.print_expr(else_expr)
            ),

            Expr::Variable { name, .. } => name.lexeme.to_string(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, self.print_expr(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print_expr(callee));

                for arg in arguments {
                    out.push(' ');
                    out.push_str(&self.print_expr(arg));
                }

                out.push(')');
                out
            }

            Expr::Get { object, name } => {
                format!("(get {} {})", self.print_expr(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                self.print_expr(object),
                name.lexeme,
                self.print_expr(value)
            ),

            Expr::This { .. } => String::from("this"),
        }
    }

    fn print_function(&self, kind: &str, decl: &FunctionDecl) -> String {
        let mut out = format!("({} {} (", kind, decl.name.lexeme);

        for (i, param) in decl.params.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(param.lexeme);
        }

        out.push(')');

        for stmt in &decl.body {
            out.push(' ');
            out.push_str(&self.print_stmt(stmt));
        }

        out.push(')');
        out
    }
}
