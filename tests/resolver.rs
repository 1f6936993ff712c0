use grus::parser::Parser;
use grus::resolver::Resolver;
use grus::scanner::Scanner;
use grus::token::Token;

/// Scan + parse (panicking on any diagnostic there), then resolve and
/// return the resolver's error messages.
fn resolve_errors(source: &str) -> Vec<String> {
    let mut lex_errors: Vec<String> = Vec::new();

    let mut report_lex = |line: usize, column: usize, message: &str| {
        lex_errors.push(format!("[{}:{}] {}", line, column, message));
    };

    let tokens = Scanner::new(source.as_bytes(), &mut report_lex).scan_tokens();

    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

    let mut parse_errors: Vec<String> = Vec::new();

    let mut report_parse = |token: &Token, message: &str| {
        parse_errors.push(format!("at '{}': {}", token.lexeme, message));
    };

    let program = Parser::new(&tokens, &mut report_parse).parse();

    assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);

    let mut errors: Vec<String> = Vec::new();

    let mut report = |_token: &Token, message: &str| {
        errors.push(message.to_string());
    };

    let _locals = Resolver::new(&mut report).resolve(&program);

    errors
}

#[test]
fn self_reference_in_initializer_is_rejected_at_top_scope() {
    assert_eq!(
        resolve_errors("var a = a;"),
        vec!["Cannot read local variable in its own initializer."]
    );
}

#[test]
fn self_reference_in_nested_scope_is_rejected() {
    assert_eq!(
        resolve_errors("fun main() { var a = 1; { var a = a; } }"),
        vec!["Cannot read local variable in its own initializer."]
    );
}

#[test]
fn shadowing_without_self_reference_is_allowed() {
    assert!(resolve_errors("fun main() { var a = 1; { var a = 2; print(a); } }").is_empty());
}

#[test]
fn duplicate_declaration_in_same_scope_is_rejected() {
    assert_eq!(
        resolve_errors("fun main() { var a = 1; var a = 2; }"),
        vec!["Variable with this name already declared in this scope."]
    );
}

#[test]
fn duplicate_declaration_at_top_scope_is_rejected() {
    assert_eq!(
        resolve_errors("var a = 1; var a = 2;"),
        vec!["Variable with this name already declared in this scope."]
    );
}

#[test]
fn break_outside_loop_is_rejected() {
    assert_eq!(
        resolve_errors("fun main() { break; }"),
        vec!["Unexpected 'break'."]
    );
}

#[test]
fn continue_outside_loop_is_rejected() {
    assert_eq!(
        resolve_errors("fun main() { continue; }"),
        vec!["Unexpected 'continue'."]
    );
}

#[test]
fn break_inside_loop_is_allowed() {
    assert!(resolve_errors("fun main() { while (true) { break; } }").is_empty());
    assert!(
        resolve_errors("fun main() { for (var i = 0; i < 3; i = i + 1) { continue; } }")
            .is_empty()
    );
}

#[test]
fn break_inside_nested_function_does_not_see_outer_loop() {
    assert_eq!(
        resolve_errors("fun main() { while (true) { fun f() { break; } break; } }"),
        vec!["Unexpected 'break'."]
    );
}

#[test]
fn return_outside_function_is_rejected() {
    assert_eq!(
        resolve_errors("return 1;"),
        vec!["'return' used outside of function."]
    );
}

#[test]
fn return_inside_method_is_allowed() {
    assert!(resolve_errors("class C { get() { return 1; } } fun main() {}").is_empty());
}

#[test]
fn function_may_recurse_by_name() {
    assert!(resolve_errors("fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fun main() {}").is_empty());
}

#[test]
fn resolution_errors_do_not_halt_the_pass() {
    // Both problems are reported in one walk.
    let errors = resolve_errors("var a = a; fun main() { break; }");

    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("own initializer"));
    assert!(errors[1].contains("Unexpected 'break'"));
}
