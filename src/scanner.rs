//! Module `scanner` implements a one-pass, streaming UTF-8 lexer for the Grus language.
//!
//! It transforms a byte slice (`&[u8]`) into a vector of `Token<'a>`s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Lexical errors go to a
//! host-supplied callback and never abort the scan.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a [u8], report) -> Scanner<'a, '_>`
//!   Create a new lexer over the input buffer. `report` receives
//!   `(line, column, message)` for every lexical error.
//!
//! - `Scanner::scan_tokens(self) -> Vec<Token<'a>>`
//!   Scans the whole buffer. Tokens accumulate in an internal buffer and are
//!   returned in full; no token is ever retracted.
//!
//! # Core Phases
//!
//! 1. **Primitive helpers**
//!    - `advance()`, `peek()`, `peek_next()`, and `match_byte()` provide fast, inlined
//!      access to the byte stream; `advance` maintains the column counter.
//!
//! 2. **Token recognition** (`scan_token`)
//!    - Punctuators and one-byte operators.
//!    - Two-byte operators by one-byte lookahead (`!=`, `==`, `&&`, `++`, `<<`, `+=`, ...)
//!      plus the three-byte `<<=` / `>>=`.
//!    - `//` comments to end of line (bulk-skipped via `memchr`) and `/* ... */`
//!      comments tracking embedded newlines.
//!    - String literals: raw text between quotes, no escape processing; an
//!      unterminated string is reported and produces no token.
//!    - Numeric literals: integer part with optional single fraction.
//!    - Identifiers/keywords: alphanumeric/_ sequences, resolved via a
//!      perfect-hash `KEYWORDS` map.
//!    - Any other byte is reported through the callback and skipped.
//!
//! 3. **Position tracking**
//!    - `line` is 1-based and bumps at every newline; `column` counts consumed
//!      bytes since the last newline and resets to 0 there. A newline consumed
//!      inside a string literal is not counted toward the column.

use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile-time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"break"    => TokenType::BREAK,
    b"class"    => TokenType::CLASS,
    b"continue" => TokenType::CONTINUE,
    b"do"       => TokenType::DO,
    b"else"     => TokenType::ELSE,
    b"false"    => TokenType::FALSE,
    b"fun"      => TokenType::FUN,
    b"for"      => TokenType::FOR,
    b"if"       => TokenType::IF,
    b"loop"     => TokenType::LOOP,
    b"new"      => TokenType::NEW,
    b"null"     => TokenType::NULL,
    b"return"   => TokenType::RETURN,
    b"super"    => TokenType::SUPER,
    b"this"     => TokenType::THIS,
    b"true"     => TokenType::TRUE,
    b"var"      => TokenType::VAR,
    b"while"    => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts raw UTF-8 bytes into a
/// sequence of [`Token`]s. The lifetime `'a` ties every emitted token's
/// `lexeme` slice back to the original source buffer.
pub struct Scanner<'a, 'e> {
    src: &'a [u8],              // entire source file (memory-mapped by the driver)
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1-based line counter (\n increments)
    column: usize,              // bytes consumed since the last newline
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
    tokens: Vec<Token<'a>>,
    report: &'e mut dyn FnMut(usize, usize, &str),
}

impl<'a, 'e> Scanner<'a, 'e> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a [u8], report: &'e mut dyn FnMut(usize, usize, &str)) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            column: 0,
            pending: None,
            tokens: Vec::new(),
            report,
        }
    }

    /// Scan the whole buffer and return every token, ending with EOF.
    pub fn scan_tokens(mut self) -> Vec<Token<'a>> {
        while !self.is_at_end() {
            self.start = self.curr;
            self.pending = None;

            self.scan_token();

            if let Some(tt) = self.pending.take() {
                let slice: &[u8] = &self.src[self.start..self.curr];

                // SAFETY: the driver validated the buffer as UTF-8, and every
                // recognised lexeme starts and ends on an ASCII byte.
                let lex: &str = unsafe { std::str::from_utf8_unchecked(slice) };

                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                self.tokens.push(Token::new(tt, lex, self.line, self.column));
            }
        }

        self.tokens
            .push(Token::new(TokenType::EOF, "", self.line, self.column));

        info!("Scan finished: {} token(s)", self.tokens.len());

        self.tokens
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input slice.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it. *Panics* if called at EOF – higher-level
    /// code always guards with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        self.column += 1;
        b
    }

    /// Peek at the current byte without consuming it. Returns `0` if past EOF
    /// to avoid branching at call-site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`]. Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    /// Returns `true` on success so callers can branch inline without an else.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`. If the lexeme produces an
    /// actual token the kind is stored in `self.pending`. Whitespace and
    /// comments are skipped by returning with `pending = None`.
    fn scan_token(&mut self) {
        let b = self.advance();

        match b {
            // ── single-byte punctuators ───────────────────────────────────
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b':' => self.pending = Some(TokenType::COLON),
            b'?' => self.pending = Some(TokenType::QUESTION),
            b'~' => self.pending = Some(TokenType::TILDE),

            // ── operators with '-'-, '+'-, '='-style continuations ────────
            b'-' => {
                let tt = if self.match_byte(b'-') {
                    TokenType::MINUS_MINUS
                } else if self.match_byte(b'=') {
                    TokenType::MINUS_EQUAL
                } else {
                    TokenType::MINUS
                };

                self.pending = Some(tt);
            }

            b'+' => {
                let tt = if self.match_byte(b'+') {
                    TokenType::PLUS_PLUS
                } else if self.match_byte(b'=') {
                    TokenType::PLUS_EQUAL
                } else {
                    TokenType::PLUS
                };

                self.pending = Some(tt);
            }

            b'*' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::STAR_EQUAL
                } else {
                    TokenType::STAR
                };

                self.pending = Some(tt);
            }

            b'%' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::PERCENT_EQUAL
                } else {
                    TokenType::PERCENT
                };

                self.pending = Some(tt);
            }

            b'^' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::CARET_EQUAL
                } else {
                    TokenType::CARET
                };

                self.pending = Some(tt);
            }

            b'&' => {
                let tt = if self.match_byte(b'&') {
                    TokenType::AMP_AMP
                } else if self.match_byte(b'=') {
                    TokenType::AMP_EQUAL
                } else {
                    TokenType::AMP
                };

                self.pending = Some(tt);
            }

            b'|' => {
                let tt = if self.match_byte(b'|') {
                    TokenType::PIPE_PIPE
                } else if self.match_byte(b'=') {
                    TokenType::PIPE_EQUAL
                } else {
                    TokenType::PIPE
                };

                self.pending = Some(tt);
            }

            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.pending = Some(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.pending = Some(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else if self.match_byte(b'<') {
                    if self.match_byte(b'=') {
                        TokenType::LESS_LESS_EQUAL
                    } else {
                        TokenType::LESS_LESS
                    }
                } else {
                    TokenType::LESS
                };

                self.pending = Some(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else if self.match_byte(b'>') {
                    if self.match_byte(b'=') {
                        TokenType::GREATER_GREATER_EQUAL
                    } else {
                        TokenType::GREATER_GREATER
                    }
                } else {
                    TokenType::GREATER
                };

                self.pending = Some(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {}

            b'\n' => {
                self.line += 1;
                self.column = 0;
            }

            // ── comments and '/' ─────────────────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast-forward to the next newline using `memchr`.
                    // If none found, skip to EOF.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                        self.column += pos;
                    } else {
                        self.column += self.len() - self.curr;
                        self.curr = self.len();
                    }
                } else if self.match_byte(b'*') {
                    self.block_comment();
                } else if self.match_byte(b'=') {
                    self.pending = Some(TokenType::SLASH_EQUAL);
                } else {
                    self.pending = Some(TokenType::SLASH);
                }
            }

            // ── string literal " … " ─────────────────────────────────────
            b'"' => {
                self.parse_string();
            }

            // ── number literal (digit-leading) ───────────────────────────
            b'0'..=b'9' => {
                self.parse_number();
            }

            // ── identifiers / keywords (alpha or underscore-leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected byte: report and keep scanning ────────────────
            _ => {
                let message = format!("Unexpected character: {}", b as char);

                (self.report)(self.line, self.column, &message);
            }
        }
    }

    /// Skip a `/* ... */` comment, tracking embedded newlines.
    fn block_comment(&mut self) {
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance();
                self.advance();
                return;
            }

            if self.advance() == b'\n' {
                self.line += 1;
                self.column = 0;
            }
        }
    }

    /// Parse a double-quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * When we return, `self.curr` points **past** the closing `"`.
    fn parse_string(&mut self) {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                // Multi-line strings are allowed; the consumed newline must
                // not count toward the column.
                self.line += 1;
                self.column = 0;
            }
        }

        if self.is_at_end() {
            (self.report)(self.line, self.column, "Unterminated string.");
            return;
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let slice: &[u8] = &self.src[self.start + 1..self.curr - 1];

        // SAFETY: the driver validated the buffer as UTF-8 and the bounds
        // sit on the ASCII quote bytes.
        let s: &str = unsafe { std::str::from_utf8_unchecked(slice) };

        self.pending = Some(TokenType::STRING(s.to_owned()));
    }

    /// Parse a numeric literal (`123`, `3.14`). Fractions are optional.
    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Optional fractional part.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let slice: &[u8] = &self.src[self.start..self.curr];
        let s: &str = unsafe { std::str::from_utf8_unchecked(slice) };
        let n: f64 = s.parse::<f64>().unwrap_or(0.0); // parse never fails (checked digits)
        self.pending = Some(TokenType::NUMBER(n));
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}
