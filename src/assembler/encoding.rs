//! The encoding engine turns parsed statements into machine code.
//!
//! Each instruction is described by a 16 character bit template,
//! written in nibble groups for readability. A literal `0` or `1` is
//! copied into the output word as-is; a letter stands for one bit of a
//! named operand. Operand bits are scattered right to left: the
//! rightmost occurrence of a letter receives the operand's least
//! significant bit, the next occurrence to the left the following bit,
//! and so on.
//!
//! The template table is process-wide, read-only configuration. No
//! state is carried between statements: each one encodes independently.

use std::collections::HashMap;
use std::io::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use super::arch::{self, Word};
use super::ast;
use super::error::Error;
use super::token::Kind;

/// Raw numeric value of an operand, before it is scattered into the
/// bit template.
type Value = i64;

/// Turns an operand token into its numeric value.
type TypeMapper = fn(&ast::Operand) -> Result<Value, Error>;

/// Validates, and possibly adjusts, a mapped value. The error message
/// is positioned at the operand's token by the caller.
type ConstraintMapper = fn(Value) -> Result<Value, String>;

struct OperandSpec {
    symbol: char,
    kind: TypeMapper,
    constraints: Vec<ConstraintMapper>,
}

impl OperandSpec {
    fn encode(&self, node: &ast::Operand) -> Result<Value, Error> {
        let mut value = (self.kind)(node)?;

        for constraint in &self.constraints {
            value = constraint(value).map_err(|msg| Error::Encoding {
                msg,
                pos: node.token.pos,
            })?;
        }

        Ok(value)
    }
}

struct InstructionSpec {
    template: &'static str,
    operands: Vec<OperandSpec>,
}

static ENCODINGS: Lazy<HashMap<&'static str, InstructionSpec>> = Lazy::new(|| {
    let dual_register = |template: &'static str| InstructionSpec {
        template,
        operands: vec![
            OperandSpec {
                symbol: 'd',
                kind: register,
                constraints: vec![],
            },
            OperandSpec {
                symbol: 'r',
                kind: register,
                constraints: vec![],
            },
        ],
    };

    let register_immediate = |template: &'static str| InstructionSpec {
        template,
        operands: vec![
            OperandSpec {
                symbol: 'd',
                kind: register,
                constraints: vec![is_high_register],
            },
            OperandSpec {
                symbol: 'K',
                kind: integer,
                constraints: vec![is_byte],
            },
        ],
    };

    let single_register = |template: &'static str| InstructionSpec {
        template,
        operands: vec![OperandSpec {
            symbol: 'd',
            kind: register,
            constraints: vec![],
        }],
    };

    let implied = |template: &'static str| InstructionSpec {
        template,
        operands: Vec::new(),
    };

    let mut table = HashMap::new();

    table.insert("nop", implied("0000 0000 0000 0000"));
    table.insert("ret", implied("1001 0101 0000 1000"));

    table.insert("mov", dual_register("0010 11rd dddd rrrr"));
    table.insert("add", dual_register("0000 11rd dddd rrrr"));
    table.insert("adc", dual_register("0001 11rd dddd rrrr"));
    table.insert("sub", dual_register("0001 10rd dddd rrrr"));
    table.insert("sbc", dual_register("0000 10rd dddd rrrr"));
    table.insert("and", dual_register("0010 00rd dddd rrrr"));
    table.insert("or", dual_register("0010 10rd dddd rrrr"));
    table.insert("eor", dual_register("0010 01rd dddd rrrr"));
    table.insert("cp", dual_register("0001 01rd dddd rrrr"));
    table.insert("cpc", dual_register("0000 01rd dddd rrrr"));

    table.insert("ldi", register_immediate("1110 KKKK dddd KKKK"));
    table.insert("subi", register_immediate("0101 KKKK dddd KKKK"));
    table.insert("andi", register_immediate("0111 KKKK dddd KKKK"));
    table.insert("ori", register_immediate("0110 KKKK dddd KKKK"));

    table.insert("com", single_register("1001 010d dddd 0000"));
    table.insert("neg", single_register("1001 010d dddd 0001"));
    table.insert("inc", single_register("1001 010d dddd 0011"));
    table.insert("dec", single_register("1001 010d dddd 1010"));

    table
});

static REGISTER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^r([0-9]+)$").unwrap());

/// Maps an integer literal operand to its value.
fn integer(node: &ast::Operand) -> Result<Value, Error> {
    let token = &node.token;

    if token.kind != Kind::Integer {
        return Err(Error::Encoding {
            msg: "expected an integer operand".to_owned(),
            pos: token.pos,
        });
    }

    token.lexeme.parse().map_err(|_| Error::Encoding {
        msg: format!("invalid integer literal `{}`", token.lexeme),
        pos: token.pos,
    })
}

/// Maps a register name operand, `r0` through `r31`, to its index.
fn register(node: &ast::Operand) -> Result<Value, Error> {
    let token = &node.token;

    if token.kind != Kind::Ident || !token.lexeme.starts_with('r') {
        return Err(Error::Encoding {
            msg: "expected a register operand".to_owned(),
            pos: token.pos,
        });
    }

    let number = REGISTER_NAME
        .captures(&token.lexeme)
        .and_then(|captures| captures[1].parse::<Value>().ok())
        .filter(|number| *number < Value::from(arch::REGISTER_COUNT));

    match number {
        Some(number) => Ok(number),
        None => Err(Error::Encoding {
            msg: format!("invalid register format `{}`", token.lexeme),
            pos: token.pos,
        }),
    }
}

/// Accepts values representable as one unsigned byte.
fn is_byte(value: Value) -> Result<Value, String> {
    if value < 0 || value > 0xff {
        return Err(format!("value {} cannot be represented as a byte", value));
    }
    Ok(value)
}

/// Accepts only the upper register file, `r16` through `r31`, and
/// rebases the index into the 4 bit field used by the immediate
/// instruction forms.
fn is_high_register(value: Value) -> Result<Value, String> {
    if value < 16 || value >= Value::from(arch::REGISTER_COUNT) {
        return Err(format!(
            "register r{} cannot be used here, expected r16-r31",
            value
        ));
    }
    Ok(value - 16)
}

/// Encodes one statement, appending its bytes to `writer`. Instruction
/// words are written as two bytes, least significant first; storage
/// directives emit one raw byte per operand.
pub fn encode<W: Write>(statement: &ast::Statement, writer: &mut W) -> Result<(), Error> {
    match statement {
        ast::Statement::Storage(storage) => encode_storage(storage, writer),
        ast::Statement::Instruction(instruction) => {
            let word = encode_instruction(instruction)?;
            writer.write_all(&word.to_le_bytes())?;
            Ok(())
        }
    }
}

/// Encodes a storage directive. Only `.byte` is recognized; each
/// operand must fit in one unsigned byte and is emitted verbatim, in
/// operand order, with no padding.
pub fn encode_storage<W: Write>(storage: &ast::Storage, writer: &mut W) -> Result<(), Error> {
    if storage.directive.lexeme != "byte" {
        return Err(Error::Encoding {
            msg: format!("invalid storage directive `{}`", storage.directive.lexeme),
            pos: storage.directive.pos,
        });
    }

    let spec = OperandSpec {
        symbol: 'b',
        kind: integer,
        constraints: vec![is_byte],
    };

    for operand in &storage.operands {
        let value = spec.encode(operand)?;
        writer.write_all(&[value as arch::Byte])?;
    }

    Ok(())
}

/// Encodes a single instruction into its machine word.
pub fn encode_instruction(instruction: &ast::Instruction) -> Result<Word, Error> {
    let mnemonic = instruction.mnemonic.lexeme.to_lowercase();
    let spec = match ENCODINGS.get(mnemonic.as_str()) {
        Some(spec) => spec,
        None => {
            return Err(Error::Encoding {
                msg: format!("invalid mnemonic `{}`", instruction.mnemonic.lexeme),
                pos: instruction.mnemonic.pos,
            })
        }
    };

    if instruction.operands.len() != spec.operands.len() {
        return Err(Error::Encoding {
            msg: format!(
                "expected {} operands, received {}",
                spec.operands.len(),
                instruction.operands.len()
            ),
            pos: instruction.mnemonic.pos,
        });
    }

    let mut bits: Vec<u8> = spec
        .template
        .bytes()
        .filter(|byte| *byte != b' ')
        .collect();

    for (descriptor, operand) in spec.operands.iter().zip(&instruction.operands) {
        let mut value = descriptor.encode(operand)?;

        // Scatter the value's bits from its least significant bit into
        // the rightmost matching placeholder, moving leftward. Repeated
        // placeholder letters rely on this scan order.
        for index in (0..bits.len()).rev() {
            if bits[index] == descriptor.symbol as u8 {
                bits[index] = b'0' + (value & 1) as u8;
                value >>= 1;
            }
        }
    }

    let bits: String = bits.iter().map(|byte| *byte as char).collect();
    Word::from_str_radix(&bits, 2).map_err(|_| Error::Encoding {
        msg: format!("template for `{}` did not resolve to a binary word", mnemonic),
        pos: instruction.mnemonic.pos,
    })
}
