//! Tree-walking evaluator for Grus.
//!
//! Execution state is the current [`Environment`] frame plus the resolver's
//! distance side-table. Non-local control transfer rides the error channel
//! as an [`Interrupt`]: `Return` unwinds to the nearest enclosing function
//! call, `Break`/`Continue` to the nearest enclosing loop, and `Fault`, the
//! only fatal kind, all the way out of [`Interpreter::interpret`], where it
//! is delivered once to the host's runtime-error callback. Flag polling
//! would short-circuit every enclosing statement instead of just the loop
//! body, so the signals are real unwinds.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::environment::Environment;
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, Value};

/// A fatal runtime error, delivered to the host with its source position.
#[derive(Debug, Clone, Error)]
#[error("at line {line}, column {column}: {message}")]
pub struct RuntimeFault {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl RuntimeFault {
    pub fn new<S: Into<String>>(token: &Token<'_>, message: S) -> Self {
        RuntimeFault {
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }
}

/// Non-local transfers used by the evaluator.
#[derive(Debug, Error)]
pub enum Interrupt<'a> {
    #[error("{0}")]
    Fault(#[from] RuntimeFault),

    #[error("return signal with value: {0}")]
    Return(Value<'a>),

    #[error("break signal")]
    Break,

    #[error("continue signal")]
    Continue,
}

/// Convenient alias for evaluator results.
pub type Exec<'a, T> = Result<T, Interrupt<'a>>;

pub struct Interpreter<'a> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

// ───────────────────────── native functions ─────────────────────────

/// Wall-clock time in milliseconds.
fn native_clock<'a>(
    _interp: &mut Interpreter<'a>,
    _args: &[Value<'a>],
) -> Result<Value<'a>, String> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64))
}

/// Variadic print: stringify every argument, join with spaces, emit one line.
fn native_print<'a>(
    interp: &mut Interpreter<'a>,
    args: &[Value<'a>],
) -> Result<Value<'a>, String> {
    let line: String = args
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(" ");

    interp
        .write_line(&line)
        .map_err(|e| format!("print failed: {}", e))?;

    Ok(Value::Null)
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter writing program output to stdout.
    pub fn new(locals: HashMap<ExprId, usize>) -> Self {
        Self::with_output(locals, Box::new(io::stdout()))
    }

    /// Create an interpreter with an explicit output sink and define the
    /// native functions (`clock`, `print`) in the global environment.
    pub fn with_output(locals: HashMap<ExprId, usize>, out: Box<dyn Write>) -> Self {
        info!("Initializing interpreter with {} resolved local(s)", locals.len());

        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: Some(0),
                func: native_clock,
            },
        );

        globals.borrow_mut().define(
            "print",
            Value::NativeFunction {
                name: "print",
                arity: None,
                func: native_print,
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals,
            out,
        }
    }

    pub(crate) fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)
    }

    // ───────────────────────── program entry ─────────────────────────

    /// Execute every top-level statement, then invoke the required global
    /// `main` with no arguments. The first runtime fault is delivered once
    /// to `on_error` and ends the run.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>], on_error: &mut dyn FnMut(&RuntimeFault)) {
        debug!("Interpreting {} top-level statement(s)", statements.len());

        match self.run_program(statements) {
            Ok(()) => info!("Program executed successfully"),

            Err(Interrupt::Fault(fault)) => on_error(&fault),

            // The resolver rejects top-level return/break/continue, so no
            // other signal can reach this frame.
            Err(signal) => on_error(&RuntimeFault {
                line: 0,
                column: 0,
                message: format!("Stray control-flow signal: {}", signal),
            }),
        }
    }

    fn run_program(&mut self, statements: &'a [Stmt<'a>]) -> Exec<'a, ()> {
        for stmt in statements {
            self.execute(stmt)?;
        }

        let main = self.globals.borrow().get("main");

        match main {
            Some(callable) => {
                debug!("Invoking main()");

                self.invoke_callable(&callable, 0, 0, Vec::new())?;

                Ok(())
            }

            None => Err(Interrupt::Fault(RuntimeFault {
                line: 0,
                column: 0,
                message: "Undefined variable 'main'.".to_string(),
            })),
        }
    }

    // ───────────────────────── statements ─────────────────────────

    pub fn execute(&mut self, stmt: &'a Stmt<'a>) -> Exec<'a, ()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Var {
                name, initializer, ..
            } => {
                let value: Value<'a> = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };

                debug!("Defining variable '{}'", name.lexeme);

                self.environment.borrow_mut().define(name.lexeme, value);

                Ok(())
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                // Capture the current environment as the closure.
                let function = Value::Function(Rc::new(Function {
                    decl,
                    closure: Rc::clone(&self.environment),
                }));

                self.environment
                    .borrow_mut()
                    .define(decl.name.lexeme, function);

                Ok(())
            }

            Stmt::Class {
                name,
                fields,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                let mut method_map: HashMap<&'a str, Rc<Function<'a>>> = HashMap::new();

                for method in methods {
                    method_map.insert(
                        method.name.lexeme,
                        Rc::new(Function {
                            decl: method,
                            closure: Rc::clone(&self.environment),
                        }),
                    );
                }

                let class = Value::Class(Rc::new(Class {
                    name: name.lexeme.to_string(),
                    fields: fields.as_slice(),
                    methods: method_map,
                    env: Rc::clone(&self.environment),
                }));

                self.environment.borrow_mut().define(name.lexeme, class);

                Ok(())
            }

            Stmt::Block(statements) => {
                let child = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, child)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body) {
                        // Break/Continue unwind exactly to this loop.
                        Err(Interrupt::Break) => break,
                        Err(Interrupt::Continue) => continue,
                        other => other?,
                    }
                }

                Ok(())
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                debug!("Entering for loop");

                self.execute(initializer)?;

                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body) {
                        Err(Interrupt::Break) => break,
                        // continue still runs the increment
                        Err(Interrupt::Continue) => {}
                        other => other?,
                    }

                    self.evaluate(increment)?;
                }

                Ok(())
            }

            Stmt::Break(_) => Err(Interrupt::Break),

            Stmt::Continue(_) => Err(Interrupt::Continue),

            Stmt::Return { value, .. } => {
                let value: Value<'a> = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };

                Err(Interrupt::Return(value))
            }
        }
    }

    /// Run `statements` in `environment`, restoring the previous frame on
    /// every exit path so an in-flight Return/Break/Continue still leaves
    /// the chain intact.
    pub fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: Environment<'a>,
    ) -> Exec<'a, ()> {
        let previous = Rc::clone(&self.environment);
        self.environment = Rc::new(RefCell::new(environment));

        let mut result: Exec<'a, ()> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    // ───────────────────────── expressions ─────────────────────────

    pub fn evaluate(&mut self, expr: &'a Expr<'a>) -> Exec<'a, Value<'a>> {
        match expr {
            Expr::Literal(value) => Ok(literal_value(value)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Postfix { operand, operator } => self.increment(operator, operand, false),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let lhs = self.evaluate(left)?;

                // Short-circuit: the right operand is never evaluated when
                // the left already decides the result.
                match operator.token_type {
                    TokenType::PIPE_PIPE if is_truthy(&lhs) => Ok(lhs),
                    TokenType::AMP_AMP if !is_truthy(&lhs) => Ok(lhs),
                    _ => self.evaluate(right),
                }
            }

            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(then_expr)
                } else {
                    self.evaluate(else_expr)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                self.assign_variable(*id, name, value.clone())?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut args: Vec<Value<'a>> = Vec::with_capacity(arguments.len());

                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee_val, paren.line, paren.column, args)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => self.get_property(&instance, name),
                    _ => Err(Interrupt::Fault(RuntimeFault::new(
                        name,
                        "Can only get properties from objects.",
                    ))),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let target = self.evaluate(object)?;

                let Value::Instance(instance) = target else {
                    return Err(Interrupt::Fault(RuntimeFault::new(
                        name,
                        "Can only set properties on objects.",
                    )));
                };

                let value = self.evaluate(value)?;

                instance
                    .borrow_mut()
                    .fields
                    .insert(name.lexeme.to_string(), value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),
        }
    }

    // ───────────────────────── variable access ─────────────────────────

    /// A recorded distance means "hop exactly that many frames"; an absent
    /// entry means dynamic lookup in the globals.
    fn look_up_variable(&self, id: ExprId, name: &Token<'a>) -> Exec<'a, Value<'a>> {
        let found: Option<Value<'a>> = match self.locals.get(&id) {
            Some(&distance) => self.environment.borrow().get_at(distance, name.lexeme),
            None => self.globals.borrow().get(name.lexeme),
        };

        found.ok_or_else(|| {
            Interrupt::Fault(RuntimeFault::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        })
    }

    fn assign_variable(&mut self, id: ExprId, name: &Token<'a>, value: Value<'a>) -> Exec<'a, ()> {
        let assigned: bool = match self.locals.get(&id) {
            Some(&distance) => self
                .environment
                .borrow_mut()
                .assign_at(distance, name.lexeme, value),
            None => self.globals.borrow_mut().assign(name.lexeme, value),
        };

        if assigned {
            Ok(())
        } else {
            Err(Interrupt::Fault(RuntimeFault::new(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            )))
        }
    }

    // ───────────────────────── operators ─────────────────────────

    fn evaluate_unary(&mut self, operator: &'a Token<'a>, right: &'a Expr<'a>) -> Exec<'a, Value<'a>> {
        // ++ / -- mutate their operand and need it as a variable, not a value.
        if matches!(
            operator.token_type,
            TokenType::PLUS_PLUS | TokenType::MINUS_MINUS
        ) {
            return self.increment(operator, right, true);
        }

        let value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => {
                if let Value::Number(n) = &value {
                    return Ok(Value::Number(-*n));
                }
            }

            TokenType::TILDE => {
                if let Value::Number(n) = &value {
                    return Ok(Value::Number(!(*n as i64) as f64));
                }
            }

            TokenType::BANG => return Ok(Value::Bool(!is_truthy(&value))),

            // 'new' is inert: the construction happens in the call itself.
            TokenType::NEW => return Ok(value),

            _ => {}
        }

        Err(Interrupt::Fault(RuntimeFault::new(
            operator,
            format!(
                "Unary operator '{}' cannot be applied to {}",
                operator.lexeme,
                value.type_name()
            ),
        )))
    }

    /// Shared by prefix and postfix `++`/`--`: the operand must be a
    /// variable currently bound to a number. Prefix yields the mutated
    /// value, postfix the prior one.
    fn increment(
        &mut self,
        operator: &'a Token<'a>,
        operand: &'a Expr<'a>,
        prefix: bool,
    ) -> Exec<'a, Value<'a>> {
        let kind: &str = if prefix { "Unary" } else { "Postfix" };

        let (id, name) = match operand {
            Expr::Variable { id, name } => (*id, *name),
            _ => {
                return Err(Interrupt::Fault(RuntimeFault::new(
                    operator,
                    format!(
                        "{} operator '{}' can only be applied to variables",
                        kind, operator.lexeme
                    ),
                )))
            }
        };

        let old: f64 = match self.look_up_variable(id, name)? {
            Value::Number(n) => n,
            other => {
                return Err(Interrupt::Fault(RuntimeFault::new(
                    operator,
                    format!(
                        "{} operator '{}' cannot be applied to {}",
                        kind,
                        operator.lexeme,
                        other.type_name()
                    ),
                )))
            }
        };

        let new: f64 = if operator.token_type == TokenType::PLUS_PLUS {
            old + 1.0
        } else {
            old - 1.0
        };

        self.assign_variable(id, name, Value::Number(new))?;

        Ok(Value::Number(if prefix { new } else { old }))
    }

    fn evaluate_binary(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Exec<'a, Value<'a>> {
        let lhs = self.evaluate(left)?;
        let rhs = self.evaluate(right)?;

        if let (Value::Number(a), Value::Number(b)) = (&lhs, &rhs) {
            let (a, b) = (*a, *b);

            match operator.token_type {
                TokenType::PLUS => return Ok(Value::Number(a + b)),
                TokenType::MINUS => return Ok(Value::Number(a - b)),
                TokenType::STAR => return Ok(Value::Number(a * b)),
                TokenType::SLASH => return Ok(Value::Number(a / b)),
                TokenType::PERCENT => return Ok(Value::Number(a % b)),

                TokenType::GREATER => return Ok(Value::Bool(a > b)),
                TokenType::GREATER_EQUAL => return Ok(Value::Bool(a >= b)),
                TokenType::LESS => return Ok(Value::Bool(a < b)),
                TokenType::LESS_EQUAL => return Ok(Value::Bool(a <= b)),

                // Bitwise tier works on the integer part; shift counts are
                // masked to keep the operation defined.
                TokenType::AMP => return Ok(Value::Number(((a as i64) & (b as i64)) as f64)),
                TokenType::PIPE => return Ok(Value::Number(((a as i64) | (b as i64)) as f64)),
                TokenType::CARET => return Ok(Value::Number(((a as i64) ^ (b as i64)) as f64)),
                TokenType::LESS_LESS => {
                    return Ok(Value::Number(((a as i64) << ((b as i64) & 63)) as f64))
                }
                TokenType::GREATER_GREATER => {
                    return Ok(Value::Number(((a as i64) >> ((b as i64) & 63)) as f64))
                }

                _ => {}
            }
        }

        if let (Value::Str(a), Value::Str(b)) = (&lhs, &rhs) {
            if operator.token_type == TokenType::PLUS {
                return Ok(Value::Str(format!("{}{}", a, b)));
            }
        }

        match operator.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(is_equal(&lhs, &rhs))),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(!is_equal(&lhs, &rhs))),

            // The comma operator evaluates both sides and yields the right.
            TokenType::COMMA => return Ok(rhs),

            _ => {}
        }

        Err(Interrupt::Fault(RuntimeFault::new(
            operator,
            format!(
                "Binary operator '{}' cannot be applied to {} and {}",
                operator.lexeme,
                lhs.type_name(),
                rhs.type_name()
            ),
        )))
    }

    // ───────────────────────── calls and objects ─────────────────────────

    fn invoke_callable(
        &mut self,
        callee: &Value<'a>,
        line: usize,
        column: usize,
        args: Vec<Value<'a>>,
    ) -> Exec<'a, Value<'a>> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                if let Some(expected) = arity {
                    if args.len() != *expected {
                        return Err(arity_fault(*expected, args.len(), line, column));
                    }
                }

                (*func)(self, &args)
                    .map_err(|message| Interrupt::Fault(RuntimeFault { line, column, message }))
            }

            Value::Function(function) => {
                debug!("Calling function '{}'", function.name());

                if args.len() != function.arity() {
                    return Err(arity_fault(function.arity(), args.len(), line, column));
                }

                self.call_function(function, args)
            }

            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);

                if args.len() != class.arity() {
                    return Err(arity_fault(class.arity(), args.len(), line, column));
                }

                self.construct(class, args)
            }

            _ => Err(Interrupt::Fault(RuntimeFault {
                line,
                column,
                message: "Can only call functions and classes.".to_string(),
            })),
        }
    }

    /// Chain the frame to the function's closure, not to the caller's
    /// environment; this is what keeps scoping lexical.
    fn call_function(
        &mut self,
        function: &Rc<Function<'a>>,
        args: Vec<Value<'a>>,
    ) -> Exec<'a, Value<'a>> {
        let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, value) in function.decl.params.iter().zip(args) {
            frame.define(param.lexeme, value);
        }

        match self.execute_block(&function.decl.body, frame) {
            Ok(()) => Ok(Value::Null),

            // Return unwinds exactly to the nearest function call.
            Err(Interrupt::Return(value)) => Ok(value),

            Err(other) => Err(other),
        }
    }

    fn construct(&mut self, class: &Rc<Class<'a>>, args: Vec<Value<'a>>) -> Exec<'a, Value<'a>> {
        // Field initializers run in the environment the class declaration
        // was executed in, once per instantiation. They cannot observe
        // constructor arguments; values that must are funneled through init.
        let previous = Rc::clone(&self.environment);
        self.environment = Rc::clone(&class.env);

        let mut fields: HashMap<String, Value<'a>> = HashMap::new();
        let mut failed: Option<Interrupt<'a>> = None;

        for field in class.fields {
            let value: Value<'a> = match &field.initializer {
                Some(expr) => match self.evaluate(expr) {
                    Ok(value) => value,
                    Err(interrupt) => {
                        failed = Some(interrupt);
                        break;
                    }
                },
                None => Value::Null,
            };

            fields.insert(field.name.lexeme.to_string(), value);
        }

        self.environment = previous;

        if let Some(interrupt) = failed {
            return Err(interrupt);
        }

        let instance = Rc::new(RefCell::new(Instance {
            class: Rc::clone(class),
            fields,
        }));

        if let Some(init) = class.find_method("init") {
            let bound = Rc::new(init.bind(Rc::clone(&instance)));
            let result = self.call_function(&bound, args)?;

            // A non-null init result replaces the instance.
            if !matches!(result, Value::Null) {
                return Ok(result);
            }
        }

        Ok(Value::Instance(instance))
    }

    /// Fields shadow methods; methods come back bound to the instance.
    fn get_property(
        &self,
        instance: &Rc<RefCell<Instance<'a>>>,
        name: &Token<'a>,
    ) -> Exec<'a, Value<'a>> {
        if let Some(value) = instance.borrow().fields.get(name.lexeme) {
            return Ok(value.clone());
        }

        let method = instance.borrow().class.find_method(name.lexeme);

        if let Some(method) = method {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
        }

        Err(Interrupt::Fault(RuntimeFault::new(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        )))
    }
}

// ───────────────────────── helpers ─────────────────────────

fn arity_fault<'a>(expected: usize, got: usize, line: usize, column: usize) -> Interrupt<'a> {
    Interrupt::Fault(RuntimeFault {
        line,
        column,
        message: format!("Expected {} arguments but got {}.", expected, got),
    })
}

fn literal_value<'a>(literal: &LiteralValue) -> Value<'a> {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::Str(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Null => Value::Null,
    }
}

/// Only `null` and `false` are falsy; everything else (including `0` and
/// `""`) is truthy.
fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Uniform equality, no coercion. Callables and instances compare by
/// identity.
fn is_equal<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        (Value::NativeFunction { name: a, .. }, Value::NativeFunction { name: b, .. }) => a == b,
        _ => false,
    }
}
