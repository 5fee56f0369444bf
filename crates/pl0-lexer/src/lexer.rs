use std::iter::Peekable;
use std::str::Chars;

use crate::token::{Location, Token, TokenKind};
use crate::trie::lookup_keyword;

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Stateful cursor over a character stream producing one token of lookahead.
///
/// `Eos` and `Illegal` are sticky: once either is current, further calls to
/// [`Lexer::advance`] leave it in place rather than reading past the end of
/// the stream or resynchronizing past a bad character.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    current: Token,
    /// Whether [`Self::advance`] has scanned at least once. Guards against
    /// the sticky-`Eos`/`Illegal` check in `advance` firing on the
    /// placeholder token `current` is seeded with before the first real scan.
    started: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            current: Token::new(TokenKind::Eos, Location::start()),
            started: false,
        };
        lexer.advance();
        lexer
    }

    /// The current token of lookahead.
    pub fn peek(&self) -> &Token {
        &self.current
    }

    /// Whether the current token has the given kind, without consuming it.
    pub fn peek_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume and return the current token, advancing to the next one.
    pub fn next(&mut self) -> Token {
        let token = self.current.clone();
        self.advance();
        token
    }

    /// Consume the current token iff it has the given kind.
    pub fn matches(&mut self, kind: TokenKind) -> bool {
        if self.current.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The source text of the current identifier or number, if any.
    pub fn literal(&self) -> Option<&str> {
        self.current.literal.as_deref()
    }

    /// The location the current token started at.
    pub fn location(&self) -> Location {
        self.current.location
    }

    fn getc(&mut self) -> Option<char> {
        let ch = self.chars.next();
        match ch {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        ch
    }

    fn peekc(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) {
        if self.started && matches!(self.current.kind, TokenKind::Eos | TokenKind::Illegal) {
            return;
        }
        self.started = true;

        while matches!(self.peekc(), Some(c) if c.is_whitespace()) {
            self.getc();
        }

        let start = Location {
            line: self.line,
            column: self.column,
        };

        let Some(ch) = self.peekc() else {
            self.current = Token::new(TokenKind::Eos, start);
            return;
        };

        if is_identifier_start(ch) {
            let mut buf = String::new();
            while matches!(self.peekc(), Some(c) if is_identifier_part(c)) {
                buf.push(self.getc().unwrap());
            }
            self.current = match lookup_keyword(&buf) {
                Some(kind) => Token::new(kind, start),
                None => Token::with_literal(TokenKind::Identifier, buf, start),
            };
            return;
        }

        if ch.is_ascii_digit() {
            let mut buf = String::new();
            while matches!(self.peekc(), Some(c) if c.is_ascii_digit()) {
                buf.push(self.getc().unwrap());
            }
            self.current = Token::with_literal(TokenKind::Number, buf, start);
            return;
        }

        self.getc();
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Period,
            ',' => TokenKind::Comma,
            '=' => TokenKind::Eq,
            '#' => TokenKind::Neq,
            ':' => {
                if matches!(self.peekc(), Some('=')) {
                    self.getc();
                    TokenKind::Assign
                } else {
                    TokenKind::Illegal
                }
            }
            '<' => {
                if matches!(self.peekc(), Some('=')) {
                    self.getc();
                    TokenKind::Leq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if matches!(self.peekc(), Some('=')) {
                    self.getc();
                    TokenKind::Geq
                } else {
                    TokenKind::Gt
                }
            }
            _ => TokenKind::Illegal,
        };
        self.current = Token::new(kind, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = vec![];
        loop {
            let tok = lexer.next();
            let done = matches!(tok.kind, TokenKind::Eos | TokenKind::Illegal);
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_a_small_block() {
        let got = kinds("var x; begin x := 2 + 3 end.");
        assert_eq!(
            got,
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Begin,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::End,
                TokenKind::Period,
                TokenKind::Eos,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(kinds(":="), vec![TokenKind::Assign, TokenKind::Eos]);
        assert_eq!(kinds("<="), vec![TokenKind::Leq, TokenKind::Eos]);
        assert_eq!(kinds(">="), vec![TokenKind::Geq, TokenKind::Eos]);
        assert_eq!(kinds("<"), vec![TokenKind::Lt, TokenKind::Eos]);
        assert_eq!(kinds(">"), vec![TokenKind::Gt, TokenKind::Eos]);
    }

    #[test]
    fn lone_colon_is_illegal_and_sticky() {
        let mut lexer = Lexer::new(": x");
        assert_eq!(lexer.peek().kind, TokenKind::Illegal);
        lexer.next();
        assert_eq!(lexer.peek().kind, TokenKind::Illegal);
    }

    #[test]
    fn unknown_character_is_illegal() {
        assert_eq!(kinds("@"), vec![TokenKind::Illegal]);
    }

    #[test]
    fn keyword_vs_identifier() {
        assert_eq!(kinds("while whiley"), vec![
            TokenKind::While,
            TokenKind::Identifier,
            TokenKind::Eos
        ]);
    }

    #[test]
    fn tracks_line_and_column() {
        let mut lexer = Lexer::new("var\nx");
        assert_eq!(lexer.location(), Location { line: 1, column: 1 });
        lexer.next();
        assert_eq!(lexer.location(), Location { line: 2, column: 1 });
    }

    #[test]
    fn number_and_identifier_literals() {
        let mut lexer = Lexer::new("foo 42");
        assert_eq!(lexer.literal(), Some("foo"));
        lexer.next();
        assert_eq!(lexer.literal(), Some("42"));
    }
}
