//! The Parser module takes the token stream produced by the lexer and
//! converts it into an AST.
//!
//! Parsing is a single forward pass with one token of lookahead over a
//! pre-materialized token buffer, and there is no error recovery: the
//! first structural error aborts the whole run.

use std::io::Read;

use super::ast;
use super::error::Error;
use super::lexer::Lexer;
use super::token::{Kind, Token};

/// Reads, tokenizes and parses a whole source file.
///
/// Lexing here is fail-fast: the first lexical error aborts the run.
/// Use [super::lexer::tokenize] to collect every lexical diagnostic in
/// one pass instead.
pub fn parse_file<R: Read>(filename: &str, reader: R) -> Result<ast::File, Error> {
    let mut lexer = Lexer::new(reader)?;

    let mut tokens = Vec::new();
    loop {
        let token = lexer.scan()?;
        let done = token.kind == Kind::EndOfInput;
        tokens.push(token);
        if done {
            break;
        }
    }

    let mut parser = Parser::new(tokens);
    let mut statements = Vec::new();
    while !parser.done() {
        // A line with no tokens of its own (blank, or comment only)
        // contributes no statement.
        if parser.accept(&[Kind::Newline]).is_some() {
            continue;
        }
        statements.push(parser.parse_statement()?);
    }

    debug!("parsed {} statement(s) from `{}`", statements.len(), filename);

    Ok(ast::File {
        filename: filename.to_owned(),
        statements,
    })
}

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    /// The token buffer must be terminated by an `EndOfInput` token;
    /// [Lexer::scan] always produces one.
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, index: 0 }
    }

    /// True once the lookahead has reached the end of the stream.
    pub fn done(&self) -> bool {
        self.lookahead().kind == Kind::EndOfInput
    }

    /// Parses one statement and its terminating newline.
    pub fn parse_statement(&mut self) -> Result<ast::Statement, Error> {
        let statement = if self.test(&[Kind::Dot]) {
            ast::Statement::Storage(self.parse_storage()?)
        } else {
            ast::Statement::Instruction(self.parse_instruction()?)
        };

        self.expect(&[Kind::Newline])?;
        Ok(statement)
    }

    fn parse_storage(&mut self) -> Result<ast::Storage, Error> {
        self.expect(&[Kind::Dot])?;
        let directive = self.expect(&[Kind::Ident])?;
        let operands = self.parse_operands()?;

        Ok(ast::Storage {
            directive,
            operands,
        })
    }

    fn parse_instruction(&mut self) -> Result<ast::Instruction, Error> {
        let mnemonic = self.expect(&[Kind::Ident])?;
        let operands = self.parse_operands()?;

        Ok(ast::Instruction { mnemonic, operands })
    }

    /// An operand list may be empty; otherwise operands are separated
    /// by commas, and a comma with no operand after it is an error.
    fn parse_operands(&mut self) -> Result<Vec<ast::Operand>, Error> {
        let mut operands = Vec::new();

        match self.accept(&[Kind::Ident, Kind::Integer]) {
            Some(token) => operands.push(ast::Operand { token }),
            None => return Ok(operands),
        }

        while self.accept(&[Kind::Comma]).is_some() {
            let token = self.expect(&[Kind::Ident, Kind::Integer])?;
            operands.push(ast::Operand { token });
        }

        Ok(operands)
    }

    fn lookahead(&self) -> &Token {
        let index = self.index.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn test(&self, kinds: &[Kind]) -> bool {
        kinds.contains(&self.lookahead().kind)
    }

    /// Consumes and returns the lookahead if it is one of `kinds`.
    fn accept(&mut self, kinds: &[Kind]) -> Option<Token> {
        if self.test(kinds) {
            let token = self.lookahead().clone();
            self.index += 1;
            Some(token)
        } else {
            None
        }
    }

    fn expect(&mut self, kinds: &[Kind]) -> Result<Token, Error> {
        match self.accept(kinds) {
            Some(token) => Ok(token),
            None => {
                let token = self.lookahead();
                Err(Error::Syntax {
                    expected: kinds.to_vec(),
                    received: token.kind,
                    pos: token.pos,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<ast::File, Error> {
        parse_file("<test>", source.as_bytes())
    }

    fn operand_lexemes(operands: &[ast::Operand]) -> Vec<&str> {
        operands
            .iter()
            .map(|operand| operand.token.lexeme.as_str())
            .collect()
    }

    #[test]
    fn test_parse_instruction() {
        let file = parse("mov r5, r3\n").unwrap();
        assert_eq!(file.statements.len(), 1);

        match &file.statements[0] {
            ast::Statement::Instruction(instruction) => {
                assert_eq!(instruction.mnemonic.lexeme, "mov");
                assert_eq!(operand_lexemes(&instruction.operands), vec!["r5", "r3"]);
            }
            ast::Statement::Storage(_) => panic!("expected an instruction"),
        }
    }

    #[test]
    fn test_parse_storage() {
        let file = parse(".byte 1, 2, 255\n").unwrap();
        assert_eq!(file.statements.len(), 1);

        match &file.statements[0] {
            ast::Statement::Storage(storage) => {
                assert_eq!(storage.directive.lexeme, "byte");
                assert_eq!(operand_lexemes(&storage.operands), vec!["1", "2", "255"]);
            }
            ast::Statement::Instruction(_) => panic!("expected a storage directive"),
        }
    }

    #[test]
    fn test_parse_empty_operand_lists() {
        let file = parse("nop\nret\n").unwrap();
        assert_eq!(file.statements.len(), 2);

        for statement in &file.statements {
            match statement {
                ast::Statement::Instruction(instruction) => {
                    assert!(instruction.operands.is_empty());
                }
                ast::Statement::Storage(_) => panic!("expected an instruction"),
            }
        }
    }

    #[test]
    fn test_statement_order_is_preserved() {
        let file = parse("nop\n.byte 7\nmov r1, r2\n").unwrap();
        let rendered: Vec<String> = file
            .statements
            .iter()
            .map(|statement| statement.to_string())
            .collect();
        assert_eq!(rendered, vec!["nop", ".byte 7", "mov r1, r2"]);
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let file = parse("\n\n; header comment\nnop\n\n").unwrap();
        assert_eq!(file.statements.len(), 1);

        let file = parse("; nothing here\n").unwrap();
        assert!(file.statements.is_empty());

        let file = parse("").unwrap();
        assert!(file.statements.is_empty());
    }

    #[test]
    fn test_dangling_comma() {
        let error = parse("mov r1,\n").unwrap_err();
        assert_eq!(
            error.to_string(),
            "@1:8: expected token of type `Ident, Integer`, received `\\n`"
        );
    }

    #[test]
    fn test_missing_newline_terminator() {
        let error = parse("mov r1, r2").unwrap_err();
        assert_eq!(
            error.to_string(),
            "@1:11: expected token of type `\\n`, received `EOF`"
        );
    }

    #[test]
    fn test_unexpected_leading_token() {
        assert!(parse(", nop\n").is_err());
        assert!(parse("42 nop\n").is_err());
    }

    #[test]
    fn test_storage_missing_directive_name() {
        let error = parse(". 1, 2\n").unwrap_err();
        match error {
            Error::Syntax { expected, received, .. } => {
                assert_eq!(expected, vec![Kind::Ident]);
                assert_eq!(received, Kind::Integer);
            }
            other => panic!("expected a syntax error, got {}", other),
        }
    }

    #[test]
    fn test_lexical_error_aborts_parse() {
        let error = parse("nop\nmov $r1, r2\n").unwrap_err();
        assert_eq!(error.to_string(), "@2:5: illegal character `$`");
    }

    #[test]
    fn test_error_positions_track_lines() {
        let error = parse("nop\nmov r1,\n").unwrap_err();
        assert_eq!(
            error.to_string(),
            "@2:8: expected token of type `Ident, Integer`, received `\\n`"
        );
    }
}
