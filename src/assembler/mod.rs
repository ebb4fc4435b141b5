//! The Assembler module is in charge of taking an AVR assembly
//! source file and producing a flat binary image from it.
//!
//! It does this with a three stage pipeline: a character level lexer,
//! a single lookahead recursive descent parser, and a table driven
//! binary encoder. Every stage fails fast on its first error, and no
//! state is shared between statements.

pub mod arch;
pub mod ast;
pub mod encoding;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

#[cfg(test)]
mod tests {
    use super::{ast, encoding, error, parser};

    fn assemble(source: &str) -> Result<Vec<u8>, error::Error> {
        let file = parser::parse_file("<test>", source.as_bytes())?;
        let mut image = Vec::new();
        for statement in &file.statements {
            encoding::encode(statement, &mut image)?;
        }
        Ok(image)
    }

    #[test]
    fn test_assemble_program() {
        let source = "\
; zero the accumulator, then count up by one
eor r0, r0
ldi r16, 1
add r0, r16
.byte 222, 173
ret
";
        assert_eq!(
            assemble(source).unwrap(),
            vec![0x00, 0x24, 0x01, 0xE0, 0x00, 0x0E, 0xDE, 0xAD, 0x08, 0x95]
        );
    }

    #[test]
    fn test_assemble_nothing() {
        assert_eq!(assemble("").unwrap(), Vec::<u8>::new());
        assert_eq!(assemble("; comments only\n\n").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_bytes_precede_failure() {
        // Encoding streams into the sink statement by statement, so
        // bytes written before the failing statement remain.
        let file = parser::parse_file("<test>", "nop\nfoo\n".as_bytes()).unwrap();

        let mut image = Vec::new();
        let mut failure = None;
        for statement in &file.statements {
            if let Err(error) = encoding::encode(statement, &mut image) {
                failure = Some(error);
                break;
            }
        }

        assert!(failure.is_some());
        assert_eq!(image, vec![0x00, 0x00]);
    }

    #[test]
    fn test_statement_display_matches_source_form() {
        let file = parser::parse_file("<test>", "mov r5, r3\n.byte 1, 2\n".as_bytes()).unwrap();
        match &file.statements[0] {
            ast::Statement::Instruction(_) => {}
            ast::Statement::Storage(_) => panic!("expected an instruction"),
        }
        assert_eq!(file.statements[0].to_string(), "mov r5, r3");
        assert_eq!(file.statements[1].to_string(), ".byte 1, 2");
    }
}
