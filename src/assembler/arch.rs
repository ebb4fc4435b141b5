//! Fixed properties of the target machine.

/// A raw data byte, as emitted by storage directives.
pub type Byte = u8;

/// A single machine instruction word. Words are stored little-endian.
pub type Word = u16;

/// Number of general purpose registers, `r0` through `r31`.
pub const REGISTER_COUNT: u8 = 32;
