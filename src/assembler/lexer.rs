//! This lexer tokenizes AVR assembly source text.
//!
//! Newlines are significant: they terminate statements, so they are
//! emitted as ordinary tokens instead of being skipped as whitespace.
//! All other whitespace merely separates tokens. A semicolon starts a
//! comment running to the end of the line.

use std::io::{self, Read};

use super::error::Error;
use super::token::{Kind, Position, Token};

/// Scans the whole input, accumulating every token and every lexical
/// error instead of stopping at the first failure. Tooling that wants
/// all diagnostics in one run uses this; the parser performs its own
/// fail-fast scan instead.
pub fn tokenize<R: Read>(reader: R) -> io::Result<(Vec<Token>, Vec<Error>)> {
    let mut lexer = Lexer::new(reader)?;
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    loop {
        match lexer.scan() {
            Ok(token) => {
                let done = token.kind == Kind::EndOfInput;
                tokens.push(token);
                if done {
                    break;
                }
            }
            Err(error) => errors.push(error),
        }
    }

    Ok((tokens, errors))
}

pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Returns a new [Lexer] reading the entire source from `reader`.
    pub fn new<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;

        Ok(Lexer {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        })
    }

    /// Reads and returns the next token, or fails on an illegal
    /// character. Once the input is exhausted every further call
    /// returns an `EndOfInput` token.
    pub fn scan(&mut self) -> Result<Token, Error> {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.bump();
            } else {
                break;
            }
        }

        let pos = self.position();
        match self.bump() {
            None => Ok(Token {
                kind: Kind::EndOfInput,
                lexeme: String::new(),
                pos,
            }),
            Some(',') => Ok(Token {
                kind: Kind::Comma,
                lexeme: ",".to_owned(),
                pos,
            }),
            Some('.') => Ok(Token {
                kind: Kind::Dot,
                lexeme: ".".to_owned(),
                pos,
            }),
            Some('\n') => Ok(Token {
                kind: Kind::Newline,
                lexeme: "\n".to_owned(),
                pos,
            }),
            Some(';') => {
                // Discard up to, but not including, the newline that
                // terminates the commented statement.
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
                self.scan()
            }
            Some(c) if c.is_ascii_digit() => Ok(self.scan_int(c, pos)),
            Some(c) if is_letter(c) || c == '_' => Ok(self.scan_ident(c, pos)),
            Some(c) => Err(Error::Lexical {
                msg: format!("illegal character `{}`", c),
                pos,
            }),
        }
    }

    fn scan_int(&mut self, first: char, pos: Position) -> Token {
        let mut lexeme = first.to_string();

        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            lexeme.push(c);
            self.bump();
        }

        Token {
            kind: Kind::Integer,
            lexeme,
            pos,
        }
    }

    fn scan_ident(&mut self, first: char, pos: Position) -> Token {
        let mut lexeme = first.to_string();

        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() && !is_letter(c) {
                break;
            }
            lexeme.push(c);
            self.bump();
        }

        Token {
            kind: Kind::Ident,
            lexeme,
            pos,
        }
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}
