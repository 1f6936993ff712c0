use grus::scanner::Scanner;
use grus::token::{Token, TokenType};

/// Scan a source snippet, collecting tokens and reported lexical errors.
fn scan(source: &str) -> (Vec<Token<'_>>, Vec<(usize, usize, String)>) {
    let mut errors: Vec<(usize, usize, String)> = Vec::new();

    let mut report = |line: usize, column: usize, message: &str| {
        errors.push((line, column, message.to_string()));
    };

    let tokens = Scanner::new(source.as_bytes(), &mut report).scan_tokens();

    (tokens, errors)
}

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let (tokens, errors) = scan(source);

    assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
    assert_eq!(tokens.len(), expected.len(), "token count for {:?}", source);

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn test_scanner_symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_two_character_operators() {
    assert_token_sequence(
        "== != <= >= && || ++ -- << >>",
        &[
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::AMP_AMP, "&&"),
            (TokenType::PIPE_PIPE, "||"),
            (TokenType::PLUS_PLUS, "++"),
            (TokenType::MINUS_MINUS, "--"),
            (TokenType::LESS_LESS, "<<"),
            (TokenType::GREATER_GREATER, ">>"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_compound_assignment_operators() {
    assert_token_sequence(
        "+= -= *= /= %= ^= &= |= <<= >>=",
        &[
            (TokenType::PLUS_EQUAL, "+="),
            (TokenType::MINUS_EQUAL, "-="),
            (TokenType::STAR_EQUAL, "*="),
            (TokenType::SLASH_EQUAL, "/="),
            (TokenType::PERCENT_EQUAL, "%="),
            (TokenType::CARET_EQUAL, "^="),
            (TokenType::AMP_EQUAL, "&="),
            (TokenType::PIPE_EQUAL, "|="),
            (TokenType::LESS_LESS_EQUAL, "<<="),
            (TokenType::GREATER_GREATER_EQUAL, ">>="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_keywords_and_identifiers() {
    assert_token_sequence(
        "var x = null; loop breakx continue new",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "x"),
            (TokenType::EQUAL, "="),
            (TokenType::NULL, "null"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::LOOP, "loop"),
            (TokenType::IDENTIFIER, "breakx"),
            (TokenType::CONTINUE, "continue"),
            (TokenType::NEW, "new"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_number_literals() {
    let (tokens, errors) = scan("12 3.5 7.25 1.");

    assert!(errors.is_empty());

    let expected: &[(TokenType, &str)] = &[
        (TokenType::NUMBER(12.0), "12"),
        (TokenType::NUMBER(3.5), "3.5"),
        (TokenType::NUMBER(7.25), "7.25"),
        // A trailing dot is not part of the number.
        (TokenType::NUMBER(1.0), "1"),
        (TokenType::DOT, "."),
        (TokenType::EOF, ""),
    ];

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);

        if let (TokenType::NUMBER(a), TokenType::NUMBER(b)) =
            (&actual.token_type, expected_type)
        {
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_string_literal_payload_excludes_quotes() {
    let (tokens, errors) = scan("\"hi there\"");

    assert!(errors.is_empty());
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].lexeme, "\"hi there\"");

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hi there"),
        other => panic!("expected STRING, got {:?}", other),
    }
}

#[test]
fn test_multiline_string_tracks_lines() {
    let (tokens, errors) = scan("\"a\nb\" x");

    assert!(errors.is_empty());

    // String token ends on line 2; so does the identifier after it.
    assert_eq!(tokens[0].line, 2);
    assert_eq!(tokens[1].lexeme, "x");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn test_line_and_column_positions() {
    let (tokens, errors) = scan("a\n  b");

    assert!(errors.is_empty());
    assert_eq!(tokens.len(), 3);

    assert_eq!(tokens[0].lexeme, "a");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[0].column, 1);

    assert_eq!(tokens[1].lexeme, "b");
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[1].column, 3);
}

#[test]
fn test_comments_are_skipped() {
    assert_token_sequence(
        "// leading\n1 /* multi\nline */ 2",
        &[
            (TokenType::NUMBER(1.0), "1"),
            (TokenType::NUMBER(2.0), "2"),
            (TokenType::EOF, ""),
        ],
    );

    let (tokens, errors) = scan("1 /* multi\nline */ 2");

    assert!(errors.is_empty());
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn test_unexpected_characters_are_reported_and_skipped() {
    let (tokens, errors) = scan(",.$(#");

    // Scanning continues past both bad bytes.
    let kinds: Vec<&str> = tokens.iter().map(|t| t.token_type.name()).collect();
    assert_eq!(kinds, vec!["COMMA", "DOT", "LEFT_PAREN", "EOF"]);

    assert_eq!(errors.len(), 2);

    for (_, _, message) in &errors {
        assert!(
            message.contains("Unexpected character"),
            "error message should name the unexpected character, got: {}",
            message
        );
    }
}

#[test]
fn test_unterminated_string_reports_without_token() {
    let (tokens, errors) = scan("\"abc");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token_type, TokenType::EOF);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].2, "Unterminated string.");
}
