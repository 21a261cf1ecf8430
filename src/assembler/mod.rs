//! The Assembler module is in charge of taking an osci assembly
//! file and producing a flat little-endian binary image.
//!
//! It does this in stages: a recursive descent parser builds an
//! instruction list, each operand expression is compiled to postfix form,
//! and a two-pass resolver binds labels and emits bytes.

pub mod ast;
pub mod compiler;
pub mod encoder;
pub mod error;
pub mod eval;
pub mod parser;
pub mod resolver;
pub mod source;
pub mod symbols;

use self::ast::Instruction;
use self::compiler::Postfix;
use self::error::AsmError;
use self::parser::Parser;
use self::resolver::Assembler;

/// Parses `text` into instructions. `name` is only used in positions.
pub fn parse(text: &str, name: &str) -> Result<Vec<Instruction>, AsmError> {
    Parser::new(text, name).run()
}

/// Compiles every operand to postfix form.
pub fn compile(program: Vec<Instruction>) -> Vec<Instruction<Postfix>> {
    compiler::compile_program(program)
}

/// Parses and assembles `text` with a fresh symbol table.
pub fn assemble(text: &str, name: &str) -> Result<Vec<u8>, AsmError> {
    let program = compile(parse(text, name)?);
    Assembler::new().assemble(&program)
}

#[cfg(test)]
mod tests {
    use super::error::ErrorKind;
    use super::*;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect()
    }

    #[test]
    fn test_assemble() {
        let image = assemble("1 2 3 4\n1 2 3 4", "").unwrap();
        assert_eq!(image.len(), 32);
        assert_eq!(image, words(&[1, 2, 3, 4, 1, 2, 3, 4]));

        assert_eq!(
            assemble(".addr 0x80\nhere: 1 2 3 here", ""),
            Ok(words(&[1, 2, 3, 128]))
        );

        let mut expected = vec![1, 2];
        expected.extend(words(&[1, 2]));
        assert_eq!(assemble(".db 1 2\n.dw 1 2", ""), Ok(expected));
    }

    #[test]
    fn test_program() {
        let source = "
        ; count register0 down from 3
        start:
            register0 register0 register0 $+instruction_size   ; clear
            minus_three register0 register0 $+instruction_size
        loop:
            one register0 register0 done   ; subtract and branch
            0 0 0 loop
        done:
            0 0 0 done
        minus_three: .dw -3
        one:         .dw 1
        ";
        let image = assemble(source, "count.osci").unwrap();
        assert_eq!(image.len(), 5 * 16 + 2 * 4);
        assert_eq!(&image[12..16], &[16, 0, 0, 0]);
        // The branch at `loop` targets `done` at 64; `minus_three` sits at 80.
        assert_eq!(&image[44..48], &[64, 0, 0, 0]);
        assert_eq!(&image[16..20], &[80, 0, 0, 0]);
        assert_eq!(&image[80..84], &[0xFD, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_errors() {
        let err = assemble("lol", "").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Syntax(_) | ErrorKind::UnresolvedSymbol(_)));

        let err = assemble("lol 0 0 0", "").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedSymbol("lol".to_string()));

        let err = assemble("1 2 3", "prog.s").unwrap_err();
        assert_eq!(err.position.name, "prog.s");
        assert_eq!(err.to_string(), "prog.s:1:6: syntax error: missing operand at end of input");

        let err = assemble("\n\n.bogus 1", "x.s").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownDirective("bogus".to_string()));
        assert_eq!(err.to_string(), "x.s:3:1: unknown directive `.bogus`");
    }
}
