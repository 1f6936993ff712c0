use grus::ast_printer::AstPrinter;
use grus::parser::Parser;
use grus::scanner::Scanner;
use grus::token::Token;

/// Parse a snippet and return its printed form plus reported parse errors.
fn parse_to_string(source: &str) -> (String, Vec<String>) {
    let mut lex_errors: Vec<String> = Vec::new();

    let mut report_lex = |line: usize, column: usize, message: &str| {
        lex_errors.push(format!("[{}:{}] {}", line, column, message));
    };

    let tokens = Scanner::new(source.as_bytes(), &mut report_lex).scan_tokens();

    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

    let mut errors: Vec<String> = Vec::new();

    let mut report = |token: &Token, message: &str| {
        errors.push(format!("at '{}': {}", token.lexeme, message));
    };

    let program = Parser::new(&tokens, &mut report).parse();

    (AstPrinter.print_program(&program), errors)
}

fn parse_ok(source: &str) -> String {
    let (printed, errors) = parse_to_string(source);

    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

    printed
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(parse_ok("1 + 2 * 3;"), "(expr (+ 1.0 (* 2.0 3.0)))");
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(parse_ok("(1 + 2) * 3;"), "(expr (* (group (+ 1.0 2.0)) 3.0))");
}

#[test]
fn addition_binds_tighter_than_shift() {
    assert_eq!(parse_ok("2 + 3 << 1;"), "(expr (<< (+ 2.0 3.0) 1.0))");
}

#[test]
fn binary_operators_associate_left() {
    assert_eq!(parse_ok("1 - 2 - 3;"), "(expr (- (- 1.0 2.0) 3.0))");
}

#[test]
fn assignment_associates_right() {
    assert_eq!(parse_ok("a = b = 5;"), "(expr (= a (= b 5.0)))");
}

#[test]
fn compound_assignment_assigns_right_hand_side() {
    assert_eq!(parse_ok("a += 1;"), "(expr (= a 1.0))");
}

#[test]
fn bitwise_tiers_nest_or_xor_and() {
    assert_eq!(
        parse_ok("1 | 2 ^ 3 & 4;"),
        "(expr (| 1.0 (^ 2.0 (& 3.0 4.0))))"
    );
}

#[test]
fn logical_and_binds_tighter_than_or() {
    assert_eq!(parse_ok("a && b || c;"), "(expr (|| (&& a b) c))");
}

#[test]
fn ternary_nests_right() {
    assert_eq!(parse_ok("a ? 1 : 2;"), "(expr (?: a 1.0 2.0))");
    assert_eq!(
        parse_ok("a ? 1 : b ? 2 : 3;"),
        "(expr (?: a 1.0 (?: b 2.0 3.0)))"
    );
}

#[test]
fn comma_operator_folds_lowest() {
    assert_eq!(parse_ok("1, 2;"), "(expr (, 1.0 2.0))");
}

#[test]
fn call_arguments_are_not_comma_expressions() {
    assert_eq!(parse_ok("f(1, 2);"), "(expr (call f 1.0 2.0))");
}

#[test]
fn prefix_and_postfix_increment() {
    assert_eq!(parse_ok("++i;"), "(expr (++ i))");
    assert_eq!(parse_ok("i++;"), "(expr (postfix ++ i))");
    assert_eq!(parse_ok("i++ + 2;"), "(expr (+ (postfix ++ i) 2.0))");
}

#[test]
fn property_access_chains_and_assigns() {
    assert_eq!(parse_ok("a.b.c;"), "(expr (get (get a b) c))");
    assert_eq!(parse_ok("a.b = 3;"), "(expr (set a b 3.0))");
}

#[test]
fn new_applies_to_the_whole_call() {
    assert_eq!(parse_ok("new Point();"), "(expr (new (call Point)))");
}

#[test]
fn invalid_assignment_target_is_reported_not_fatal() {
    let (printed, errors) = parse_to_string("1 = 2;");

    assert_eq!(errors, vec!["at '=': Invalid assignment target."]);

    // Best-effort node: parsing still produced a statement.
    assert_eq!(printed, "(expr (= 1.0 2.0))");
}

#[test]
fn parser_synchronizes_after_error() {
    let (printed, errors) = parse_to_string("var = 1; var x = 2;");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Expect variable name."));

    // The declaration after the bad one still parses.
    assert_eq!(printed, "(var x = 2.0)");
}

#[test]
fn missing_expression_is_reported() {
    let (_, errors) = parse_to_string("1 + ;");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Expect expression."));
}

#[test]
fn for_desugars_into_scoped_block() {
    assert_eq!(
        parse_ok("for (var i = 0; i < 3; i = i + 1) print(i);"),
        "(block (for (var i = 0.0) (< i 3.0) (= i (+ i 1.0)) (expr (call print i))))"
    );
}

#[test]
fn for_condition_defaults_to_true() {
    assert_eq!(
        parse_ok("for (var i = 0; ; i = i + 1) break;"),
        "(block (for (var i = 0.0) true (= i (+ i 1.0)) (break)))"
    );
}

#[test]
fn loop_desugars_to_while_true() {
    assert_eq!(parse_ok("loop { break; }"), "(while true (block (break)))");
}

#[test]
fn do_while_desugars_to_while() {
    assert_eq!(
        parse_ok("do { x = 1; } while (y);"),
        "(while y (block (expr (= x 1.0))))"
    );
}

#[test]
fn else_binds_to_nearest_if() {
    assert_eq!(
        parse_ok("if (a) if (b) c; else d;"),
        "(if a (if b (expr c) (expr d)))"
    );
}

#[test]
fn function_declaration_parses() {
    assert_eq!(
        parse_ok("fun add(a, b) { return a + b; }"),
        "(fun add (a b) (return (+ a b)))"
    );
}

#[test]
fn class_body_holds_fields_and_methods() {
    assert_eq!(
        parse_ok("class P { x = 1; y; area() { return this.x; } }"),
        "(class P (field x = 1.0) (field y) (method area () (return (get this x))))"
    );
}

#[test]
fn typed_declaration_records_annotation() {
    assert_eq!(parse_ok("Int a = 1;"), "(var Int a = 1.0)");
}

#[test]
fn string_and_null_literals() {
    assert_eq!(parse_ok("\"hi\" + \"!\";"), "(expr (+ hi !))");
    assert_eq!(parse_ok("null;"), "(expr null)");
}
