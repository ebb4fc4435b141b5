//! The error taxonomy shared by every stage of the pipeline.
//!
//! Each stage fails fast: the first error aborts the run and is
//! reported with its source position.

use std::fmt;
use std::io;

use super::token::{Kind, Position};

#[derive(Debug)]
pub enum Error {
    /// An illegal character in the source text.
    Lexical { msg: String, pos: Position },
    /// A missing or wrong-kind token at a required grammar position.
    Syntax {
        expected: Vec<Kind>,
        received: Kind,
        pos: Position,
    },
    /// A statement that cannot be mapped to its binary form.
    Encoding { msg: String, pos: Position },
    /// A failure reading the source or writing the output sink.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lexical { msg, pos } => write!(f, "@{}: {}", pos, msg),
            Error::Syntax {
                expected,
                received,
                pos,
            } => {
                let expected = expected
                    .iter()
                    .map(|kind| kind.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "@{}: expected token of type `{}`, received `{}`",
                    pos, expected, received
                )
            }
            Error::Encoding { msg, pos } => write!(f, "@{}: {}", pos, msg),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
