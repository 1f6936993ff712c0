use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use grus::interpreter::Interpreter;
use grus::parser::Parser;
use grus::resolver::Resolver;
use grus::scanner::Scanner;
use grus::token::Token;

/// Output sink shared between the interpreter and the test.
#[derive(Clone)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run a program through the whole pipeline, panicking on any static
/// diagnostic. Returns the printed lines and the runtime fault, if any.
fn run(source: &str) -> (Vec<String>, Option<String>) {
    let mut static_errors: Vec<String> = Vec::new();

    let mut report_lex = |line: usize, column: usize, message: &str| {
        static_errors.push(format!("[{}:{}] {}", line, column, message));
    };

    let tokens = Scanner::new(source.as_bytes(), &mut report_lex).scan_tokens();

    let mut report_parse = |token: &Token, message: &str| {
        static_errors.push(format!("parse at '{}': {}", token.lexeme, message));
    };

    let program = Parser::new(&tokens, &mut report_parse).parse();

    let mut report_resolve = |token: &Token, message: &str| {
        static_errors.push(format!("resolve at '{}': {}", token.lexeme, message));
    };

    let locals = Resolver::new(&mut report_resolve).resolve(&program);

    assert!(
        static_errors.is_empty(),
        "static diagnostics: {:?}",
        static_errors
    );

    let buffer: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

    let mut interpreter =
        Interpreter::with_output(locals, Box::new(SharedBuf(Rc::clone(&buffer))));

    let fault: RefCell<Option<String>> = RefCell::new(None);

    interpreter.interpret(&program, &mut |f| {
        *fault.borrow_mut() = Some(f.message.clone());
    });

    let output = String::from_utf8(buffer.borrow().clone()).expect("output is UTF-8");
    let lines = output.lines().map(str::to_string).collect();

    (lines, fault.into_inner())
}

fn run_ok(source: &str) -> Vec<String> {
    let (lines, fault) = run(source);

    assert!(fault.is_none(), "unexpected runtime fault: {:?}", fault);

    lines
}

fn run_fault(source: &str) -> (Vec<String>, String) {
    let (lines, fault) = run(source);

    (lines, fault.expect("expected a runtime fault"))
}

// ───────────────────────── arithmetic and precedence ─────────────────────────

#[test]
fn end_to_end_main_prints_six() {
    assert_eq!(run_ok("fun main(){ var a=5; print(a+1); }"), vec!["6"]);
}

#[test]
fn operator_precedence_is_observable() {
    let lines = run_ok(
        "fun main() {
            print(1 + 2 * 3);
            print((1 + 2) * 3);
            print(2 + 3 << 1);
        }",
    );

    assert_eq!(lines, vec!["7", "9", "10"]);
}

#[test]
fn bitwise_shift_and_modulo() {
    let lines = run_ok(
        "fun main() {
            print(5 & 3);
            print(5 | 3);
            print(5 ^ 3);
            print(1 << 4);
            print(~0);
            print(10 % 3);
        }",
    );

    assert_eq!(lines, vec!["1", "7", "6", "16", "-1", "1"]);
}

#[test]
fn string_concatenation_and_fractions() {
    let lines = run_ok(
        "fun main() {
            print(\"con\" + \"cat\");
            print(1.5 + 2.25);
        }",
    );

    assert_eq!(lines, vec!["concat", "3.75"]);
}

#[test]
fn equality_has_no_coercion() {
    let lines = run_ok(
        "fun main() {
            print(1 == 1);
            print(\"a\" == \"b\");
            print(null == null);
            print(0 == false);
            print(\"\" == null);
            print(1 != 2);
        }",
    );

    assert_eq!(lines, vec!["true", "false", "true", "false", "false", "true"]);
}

// ───────────────────────── assignment and expressions ─────────────────────────

#[test]
fn assignment_is_right_associative() {
    let lines = run_ok(
        "fun main() {
            var a = 0;
            var b = 0;
            a = b = 5;
            print(a);
            print(b);
        }",
    );

    assert_eq!(lines, vec!["5", "5"]);
}

#[test]
fn short_circuit_skips_right_operand() {
    let lines = run_ok(
        "fun main() {
            var a = 0;
            false && (a = 1);
            true || (a = 2);
            print(a);
        }",
    );

    assert_eq!(lines, vec!["0"]);
}

#[test]
fn logical_operators_yield_deciding_value() {
    let lines = run_ok(
        "fun main() {
            print(null || \"fallback\");
            print(1 && 2);
            print(false && 9);
        }",
    );

    assert_eq!(lines, vec!["fallback", "2", "false"]);
}

#[test]
fn ternary_and_comma_operators() {
    let lines = run_ok(
        "fun main() {
            print(true ? 1 : 2);
            print(false ? 1 : 2);
            var x = (1, 2);
            print(x);
        }",
    );

    assert_eq!(lines, vec!["1", "2", "2"]);
}

#[test]
fn increment_and_decrement_operators() {
    let lines = run_ok(
        "fun main() {
            var i = 5;
            print(i++);
            print(i);
            print(++i);
            print(i--);
            print(i);
        }",
    );

    assert_eq!(lines, vec!["5", "6", "7", "7", "6"]);
}

#[test]
fn truthiness_only_null_and_false_are_falsy() {
    let lines = run_ok(
        "fun main() {
            if (0) { print(\"zero\"); }
            if (\"\") { print(\"empty\"); }
            if (null) { print(\"null\"); } else { print(\"no null\"); }
            if (false) { print(\"false\"); } else { print(\"no false\"); }
        }",
    );

    assert_eq!(lines, vec!["zero", "empty", "no null", "no false"]);
}

// ───────────────────────── control flow ─────────────────────────

#[test]
fn while_loop_with_break() {
    let lines = run_ok(
        "fun main() {
            var i = 0;
            while (i < 5) {
                if (i == 3) { break; }
                print(i);
                i = i + 1;
            }
            print(\"done\");
        }",
    );

    assert_eq!(lines, vec!["0", "1", "2", "done"]);
}

#[test]
fn continue_skips_to_next_iteration_and_still_increments() {
    let lines = run_ok(
        "fun main() {
            for (var i = 0; i < 5; i = i + 1) {
                if (i % 2 == 0) { continue; }
                print(i);
            }
        }",
    );

    assert_eq!(lines, vec!["1", "3"]);
}

#[test]
fn break_only_exits_the_innermost_loop() {
    let lines = run_ok(
        "fun main() {
            var i = 0;
            while (i < 3) {
                var j = 0;
                while (j < 3) {
                    if (j == 1) { break; }
                    print(i * 10 + j);
                    j = j + 1;
                }
                i = i + 1;
            }
        }",
    );

    assert_eq!(lines, vec!["0", "10", "20"]);
}

#[test]
fn break_unwinds_through_nested_blocks() {
    let lines = run_ok(
        "fun main() {
            var i = 0;
            while (true) {
                {
                    {
                        if (i == 2) { break; }
                    }
                }
                print(i);
                i = i + 1;
            }
            print(\"out\");
        }",
    );

    assert_eq!(lines, vec!["0", "1", "out"]);
}

#[test]
fn loop_statement_runs_until_break() {
    let lines = run_ok(
        "fun main() {
            var n = 0;
            loop {
                n = n + 1;
                if (n == 3) { break; }
            }
            print(n);
        }",
    );

    assert_eq!(lines, vec!["3"]);
}

#[test]
fn return_unwinds_to_the_nearest_call() {
    let lines = run_ok(
        "fun find(limit) {
            for (var i = 0; i < 100; i = i + 1) {
                if (i == limit) { return i; }
            }
            return -1;
        }
        fun main() {
            print(find(4));
        }",
    );

    assert_eq!(lines, vec!["4"]);
}

// ───────────────────────── functions and closures ─────────────────────────

#[test]
fn closures_capture_by_reference() {
    let lines = run_ok(
        "fun makeCounter() {
            var count = 0;
            fun increment() {
                count = count + 1;
                return count;
            }
            return increment;
        }
        fun main() {
            var c1 = makeCounter();
            var c2 = makeCounter();
            print(c1());
            print(c1());
            print(c1());
            print(c2());
            print(c2());
        }",
    );

    assert_eq!(lines, vec!["1", "2", "3", "1", "2"]);
}

#[test]
fn closures_from_one_factory_call_share_state() {
    let lines = run_ok(
        "fun makePair() {
            var n = 0;
            fun bump() { n = n + 1; }
            fun read() { return n; }
            bump();
            bump();
            print(read());
            return read;
        }
        fun main() {
            var r = makePair();
            print(r());
        }",
    );

    assert_eq!(lines, vec!["2", "2"]);
}

#[test]
fn closure_mutation_is_visible_to_the_enclosing_scope() {
    let lines = run_ok(
        "fun main() {
            var a = 1;
            fun set() { a = 9; }
            set();
            print(a);
        }",
    );

    assert_eq!(lines, vec!["9"]);
}

#[test]
fn recursion_works() {
    let lines = run_ok(
        "fun fib(n) {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        fun main() { print(fib(10)); }",
    );

    assert_eq!(lines, vec!["55"]);
}

#[test]
fn for_loop_variable_does_not_leak_over_a_global() {
    let lines = run_ok(
        "var i = 100;
        fun main() {
            for (var i = 0; i < 3; i = i + 1) {
                print(i);
            }
            print(i);
        }",
    );

    assert_eq!(lines, vec!["0", "1", "2", "100"]);
}

#[test]
fn functions_without_return_yield_null() {
    let lines = run_ok(
        "fun quiet() { }
        fun main() { print(quiet()); }",
    );

    assert_eq!(lines, vec!["null"]);
}

#[test]
fn print_is_variadic() {
    let lines = run_ok(
        "fun main() {
            print(1, \"a\", true, null);
            print();
        }",
    );

    assert_eq!(lines, vec!["1 a true null", ""]);
}

#[test]
fn clock_returns_a_number() {
    let lines = run_ok("fun main() { print(clock() > 0); }");

    assert_eq!(lines, vec!["true"]);
}

// ───────────────────────── classes and instances ─────────────────────────

#[test]
fn fieldless_class_exposes_only_methods() {
    let lines = run_ok(
        "class Answer {
            get() { return 42; }
        }
        fun main() {
            var a = Answer();
            print(a.get());
            print(a);
        }",
    );

    assert_eq!(lines, vec!["42", "<Answer instance>"]);
}

#[test]
fn init_receives_constructor_arguments_through_this() {
    let lines = run_ok(
        "class Point {
            x = 0;
            y = 0;
            init(x, y) {
                this.x = x;
                this.y = y;
            }
            sum() { return this.x + this.y; }
        }
        fun main() {
            var p = Point(3, 4);
            print(p.sum());
        }",
    );

    assert_eq!(lines, vec!["7"]);
}

#[test]
fn init_returning_non_null_replaces_the_instance() {
    let lines = run_ok(
        "class Odd {
            init() { return 5; }
        }
        fun main() {
            print(Odd());
        }",
    );

    assert_eq!(lines, vec!["5"]);
}

#[test]
fn field_initializers_run_in_the_class_definition_environment() {
    let lines = run_ok(
        "var base = 10;
        class C {
            v = base + 1;
        }
        fun main() {
            var c = C();
            print(c.v);
            base = 100;
            print(C().v);
        }",
    );

    // Once per instantiation, against the defining environment.
    assert_eq!(lines, vec!["11", "101"]);
}

#[test]
fn set_expression_stores_into_fields() {
    let lines = run_ok(
        "class Box { v = 0; }
        fun main() {
            var b = Box();
            b.v = 9;
            print(b.v);
        }",
    );

    assert_eq!(lines, vec!["9"]);
}

#[test]
fn instances_alias_and_share_mutations() {
    let lines = run_ok(
        "class Box { v = 1; }
        fun main() {
            var a = Box();
            var b = a;
            b.v = 7;
            print(a.v);
            print(a == b);
            print(a == Box());
        }",
    );

    assert_eq!(lines, vec!["7", "true", "false"]);
}

#[test]
fn bound_methods_remember_their_instance() {
    let lines = run_ok(
        "class Greeter {
            name = \"world\";
            greet() { return \"hello \" + this.name; }
        }
        fun main() {
            var g = Greeter();
            var m = g.greet;
            print(m());
        }",
    );

    assert_eq!(lines, vec!["hello world"]);
}

#[test]
fn new_is_inert_before_construction() {
    let lines = run_ok(
        "class Empty { }
        fun main() {
            var e = new Empty();
            print(e);
        }",
    );

    assert_eq!(lines, vec!["<Empty instance>"]);
}

// ───────────────────────── runtime faults ─────────────────────────

#[test]
fn arity_mismatch_names_both_counts() {
    let (lines, fault) = run_fault(
        "fun add(a, b) { return a + b; }
        fun main() {
            add(1);
            print(\"unreached\");
        }",
    );

    assert!(lines.is_empty());
    assert_eq!(fault, "Expected 2 arguments but got 1.");
}

#[test]
fn calling_a_non_callable_is_a_fault() {
    let (_, fault) = run_fault("fun main() { var x = 5; x(); }");

    assert_eq!(fault, "Can only call functions and classes.");
}

#[test]
fn undefined_variable_is_a_fault() {
    let (_, fault) = run_fault("fun main() { print(q); }");

    assert_eq!(fault, "Undefined variable 'q'.");
}

#[test]
fn undefined_property_is_a_fault() {
    let (_, fault) = run_fault(
        "class C { }
        fun main() { C().missing; }",
    );

    assert_eq!(fault, "Undefined property 'missing'.");
}

#[test]
fn property_access_on_non_instance_is_a_fault() {
    let (_, fault) = run_fault("fun main() { var n = 1; n.x; }");

    assert_eq!(fault, "Can only get properties from objects.");
}

#[test]
fn type_error_names_operator_and_operand_types() {
    let (_, fault) = run_fault("fun main() { 1 + \"a\"; }");

    assert_eq!(
        fault,
        "Binary operator '+' cannot be applied to number and string"
    );
}

#[test]
fn missing_main_is_a_fault() {
    let (lines, fault) = run_fault("var a = 1;");

    assert!(lines.is_empty());
    assert_eq!(fault, "Undefined variable 'main'.");
}

#[test]
fn fault_in_top_level_code_prevents_main() {
    let (lines, fault) = run_fault(
        "var a = 1 + true;
        fun main() { print(\"unreached\"); }",
    );

    assert!(lines.is_empty());
    assert_eq!(
        fault,
        "Binary operator '+' cannot be applied to number and boolean"
    );
}

#[test]
fn increment_requires_a_numeric_variable() {
    let (_, fault) = run_fault("fun main() { var s = \"x\"; s++; }");

    assert_eq!(fault, "Postfix operator '++' cannot be applied to string");
}
