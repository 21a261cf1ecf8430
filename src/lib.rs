//! An assembler for osci, a minimalistic one instruction set computer.
//!
//! Every osci instruction is four 32-bit words: two operand addresses, a
//! target address and a jump address. The assembler adds labels, constant
//! expressions and a few data directives on top of that.
//!
//! ```
//! let image = osciasm::assembler::assemble("start: 1 2 3 start", "demo.osci").unwrap();
//! assert_eq!(image.len(), 16);
//! ```
#[macro_use]
extern crate log;

pub mod assembler;
