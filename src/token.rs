use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The lexical categories recognized by the Grus scanner.
///
/// Variants without data represent punctuators, operators, or keywords.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for user-defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// ';'
    SEMICOLON,

    /// ':'
    COLON,

    /// '?'
    QUESTION,

    /// '~'
    TILDE,

    /// '-'
    MINUS,

    /// '--'
    MINUS_MINUS,

    /// '-='
    MINUS_EQUAL,

    /// '+'
    PLUS,

    /// '++'
    PLUS_PLUS,

    /// '+='
    PLUS_EQUAL,

    /// '/'
    SLASH,

    /// '/='
    SLASH_EQUAL,

    /// '*'
    STAR,

    /// '*='
    STAR_EQUAL,

    /// '%'
    PERCENT,

    /// '%='
    PERCENT_EQUAL,

    /// '^'
    CARET,

    /// '^='
    CARET_EQUAL,

    /// '&'
    AMP,

    /// '&&'
    AMP_AMP,

    /// '&='
    AMP_EQUAL,

    /// '|'
    PIPE,

    /// '||'
    PIPE_PIPE,

    /// '|='
    PIPE_EQUAL,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '>>'
    GREATER_GREATER,

    /// '>>='
    GREATER_GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// '<<'
    LESS_LESS,

    /// '<<='
    LESS_LESS_EQUAL,

    /// A user-defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING(String),

    /// A numeric literal
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    /// 'break'
    BREAK,

    /// 'class'
    CLASS,

    /// 'continue'
    CONTINUE,

    /// 'do'
    DO,

    /// 'else'
    ELSE,

    /// 'false'
    FALSE,

    /// 'fun'
    FUN,

    /// 'for'
    FOR,

    /// 'if'
    IF,

    /// 'loop'
    LOOP,

    /// 'new'
    NEW,

    /// 'null'
    NULL,

    /// 'return'
    RETURN,

    /// 'super' (reserved)
    SUPER,

    /// 'this'
    THIS,

    /// 'true'
    TRUE,

    /// 'var'
    VAR,

    /// 'while'
    WHILE,

    /// End-of-file marker
    EOF,
}

impl TokenType {
    /// The variant name without payloads, for display and logging.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::COLON => "COLON",
            TokenType::QUESTION => "QUESTION",
            TokenType::TILDE => "TILDE",
            TokenType::MINUS => "MINUS",
            TokenType::MINUS_MINUS => "MINUS_MINUS",
            TokenType::MINUS_EQUAL => "MINUS_EQUAL",
            TokenType::PLUS => "PLUS",
            TokenType::PLUS_PLUS => "PLUS_PLUS",
            TokenType::PLUS_EQUAL => "PLUS_EQUAL",
            TokenType::SLASH => "SLASH",
            TokenType::SLASH_EQUAL => "SLASH_EQUAL",
            TokenType::STAR => "STAR",
            TokenType::STAR_EQUAL => "STAR_EQUAL",
            TokenType::PERCENT => "PERCENT",
            TokenType::PERCENT_EQUAL => "PERCENT_EQUAL",
            TokenType::CARET => "CARET",
            TokenType::CARET_EQUAL => "CARET_EQUAL",
            TokenType::AMP => "AMP",
            TokenType::AMP_AMP => "AMP_AMP",
            TokenType::AMP_EQUAL => "AMP_EQUAL",
            TokenType::PIPE => "PIPE",
            TokenType::PIPE_PIPE => "PIPE_PIPE",
            TokenType::PIPE_EQUAL => "PIPE_EQUAL",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::GREATER_GREATER => "GREATER_GREATER",
            TokenType::GREATER_GREATER_EQUAL => "GREATER_GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::LESS_LESS => "LESS_LESS",
            TokenType::LESS_LESS_EQUAL => "LESS_LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::BREAK => "BREAK",
            TokenType::CLASS => "CLASS",
            TokenType::CONTINUE => "CONTINUE",
            TokenType::DO => "DO",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::LOOP => "LOOP",
            TokenType::NEW => "NEW",
            TokenType::NULL => "NULL",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token: its type, the original lexeme, and the 1-based line
/// plus byte column where its last character was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: &'a str,

    /// 1-based line number in the source.
    pub line: usize,

    /// Column of the token's last byte; resets to 0 at each newline.
    pub column: usize,
}

impl<'a> Token<'a> {
    /// Create a new Token with the given type, lexeme, and position.
    pub fn new(token_type: TokenType, lexeme: &'a str, line: usize, column: usize) -> Self {
        debug!(
            "Creating token: type={:?}, lexeme={}, line={}, column={}",
            token_type, lexeme, line, column
        );

        Self {
            token_type,
            lexeme,
            line,
            column,
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Literal payload last; numbers normalize "3" -> "3.0".
        match &self.token_type {
            TokenType::STRING(s) => {
                write!(f, "{} {} {}", self.token_type.name(), self.lexeme, s)
            }

            TokenType::NUMBER(n) => {
                if n.fract() == 0.0 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();

                    write!(
                        f,
                        "{} {} {}.0",
                        self.token_type.name(),
                        self.lexeme,
                        buf.format(*n as i64)
                    )
                } else {
                    write!(f, "{} {} {}", self.token_type.name(), self.lexeme, n)
                }
            }

            _ => write!(f, "{} {} null", self.token_type.name(), self.lexeme),
        }
    }
}
