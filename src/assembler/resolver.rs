//! Two-pass symbol resolution and code generation.
//!
//! Pass 1 walks the program computing the address of every instruction and
//! binds labels. Pass 2 walks it again, evaluating operands against the now
//! complete symbol table and emitting bytes. Both passes keep `$` equal to
//! the address of the instruction being processed.
//!
//! `.addr` targets are evaluated once, in pass 1, and replayed in pass 2. A
//! label redefined after an `.addr` that uses it therefore cannot move the
//! code that pass 1 already placed.
use super::ast::{Directive, DirectiveKind, Instruction};
use super::compiler::Postfix;
use super::encoder::{encode_byte, encode_word, link, Fragment};
use super::error::{AsmError, ErrorKind};
use super::eval::evaluate;
use super::source::Position;
use super::symbols::{SymbolTable, INSTRUCTION_SIZE, WORD_SIZE};

/// Owns the symbol table for one assembly run.
pub struct Assembler {
    symbols: SymbolTable,
    origin: i64,
    /// `.addr` targets in program order, recorded by pass 1.
    relocations: Vec<i64>,
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::with_symbols(SymbolTable::new())
    }

    /// Starts from a custom table. Its `$` is where both passes begin.
    pub fn with_symbols(symbols: SymbolTable) -> Self {
        let origin = symbols.current_address();
        Assembler { symbols, origin, relocations: Vec::new() }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Assembles `program` into a flat image.
    pub fn assemble(&mut self, program: &[Instruction<Postfix>]) -> Result<Vec<u8>, AsmError> {
        Ok(link(&self.listing(program)?))
    }

    /// Runs both passes and returns what each instruction emitted.
    pub fn listing(&mut self, program: &[Instruction<Postfix>]) -> Result<Vec<Fragment>, AsmError> {
        self.locate(program)?;
        self.emit(program)
    }

    /// Pass 1: binds every label to its address.
    pub fn locate(&mut self, program: &[Instruction<Postfix>]) -> Result<(), AsmError> {
        debug!("pass 1: locating {} instruction(s) from {:#x}", program.len(), self.origin);
        let mut address = self.origin;
        self.relocations.clear();
        for ins in program {
            self.symbols.set_current_address(address);
            match ins {
                Instruction::Label(label) => {
                    trace!("{} = {:#x}", label.name, address);
                    if let Some(previous) = self.symbols.define(&label.name, address) {
                        warn!(
                            "{}: label `{}` redefined (was {:#x}, now {:#x})",
                            label.position, label.name, previous, address
                        );
                    }
                }
                Instruction::Directive(directive) => match directive.kind {
                    DirectiveKind::Addr => {
                        address = self.relocate(directive)?;
                        self.relocations.push(address);
                    }
                    DirectiveKind::Db | DirectiveKind::Dw => {
                        if directive.operands.is_empty() {
                            warn!("{}: `.{}` without operands emits nothing", directive.position, directive.kind);
                        }
                        address += data_size(directive);
                    }
                },
                Instruction::Cpu(_) => address += INSTRUCTION_SIZE,
            }
        }
        debug!("pass 1: final address {:#x}", address);
        Ok(())
    }

    /// Pass 2: evaluates operands and emits bytes. Must follow
    /// [`Assembler::locate`] on the same program.
    pub fn emit(&mut self, program: &[Instruction<Postfix>]) -> Result<Vec<Fragment>, AsmError> {
        debug!("pass 2: emitting from {:#x}", self.origin);
        self.symbols.set_current_address(self.origin);
        let mut fragments = Vec::with_capacity(program.len());
        let mut relocations = std::mem::take(&mut self.relocations).into_iter();

        for ins in program {
            let address = self.symbols.current_address();
            let bytes = match ins {
                Instruction::Label(_) => continue,
                Instruction::Directive(directive) => match directive.kind {
                    DirectiveKind::Addr => {
                        let target = match relocations.next() {
                            Some(target) => target,
                            None => self.relocate(directive)?,
                        };
                        fragments.push(Fragment {
                            address,
                            position: directive.position.clone(),
                            bytes: vec![],
                        });
                        self.symbols.set_current_address(target);
                        continue;
                    }
                    DirectiveKind::Db => self.emit_bytes(directive)?,
                    DirectiveKind::Dw => self.emit_words(directive)?,
                },
                Instruction::Cpu(cpu) => {
                    let mut bytes = Vec::with_capacity(INSTRUCTION_SIZE as usize);
                    for operand in cpu.operands().iter() {
                        let value = self.value(operand, &cpu.position)?;
                        bytes.extend_from_slice(&encode_word(value));
                    }
                    bytes
                }
            };

            self.symbols.set_current_address(address + bytes.len() as i64);
            fragments.push(Fragment { address, position: ins.position().clone(), bytes });
        }

        debug!(
            "pass 2: emitted {} byte(s)",
            fragments.iter().map(|f| f.bytes.len()).sum::<usize>()
        );
        Ok(fragments)
    }

    /// Evaluates the single operand of `.addr`. Only symbols bound so far
    /// are visible, so a forward reference is an unresolved symbol.
    fn relocate(&self, directive: &Directive<Postfix>) -> Result<i64, AsmError> {
        let operand = match directive.operands.as_slice() {
            [operand] => operand,
            operands => {
                return Err(AsmError::new(
                    ErrorKind::Arity {
                        directive: directive.kind.name().to_string(),
                        expected: 1,
                        found: operands.len(),
                    },
                    directive.position.clone(),
                ))
            }
        };
        let target = i64::from(self.value(operand, &directive.position)? as u32);
        trace!("{}: .addr {:#x}", directive.position, target);
        Ok(target)
    }

    fn emit_bytes(&self, directive: &Directive<Postfix>) -> Result<Vec<u8>, AsmError> {
        let mut bytes = Vec::with_capacity(directive.operands.len());
        for operand in &directive.operands {
            match operand.as_str_literal() {
                Some(text) => bytes.extend_from_slice(text.as_bytes()),
                None => bytes.push(encode_byte(self.value(operand, &directive.position)?)),
            }
        }
        Ok(bytes)
    }

    fn emit_words(&self, directive: &Directive<Postfix>) -> Result<Vec<u8>, AsmError> {
        let mut bytes = Vec::with_capacity(directive.operands.len() * WORD_SIZE as usize);
        for operand in &directive.operands {
            match operand.as_str_literal() {
                Some(text) => {
                    for c in text.chars() {
                        bytes.extend_from_slice(&encode_word(i64::from(u32::from(c))));
                    }
                }
                None => bytes.extend_from_slice(&encode_word(self.value(operand, &directive.position)?)),
            }
        }
        Ok(bytes)
    }

    fn value(&self, operand: &Postfix, position: &Position) -> Result<i64, AsmError> {
        evaluate(operand.tokens(), &self.symbols).map_err(|kind| AsmError::new(kind, position.clone()))
    }
}

/// Bytes occupied by a `.db` or `.dw` directive. A bare string literal
/// operand takes one unit per byte (`.db`) or per character (`.dw`).
fn data_size(directive: &Directive<Postfix>) -> i64 {
    let units: usize = directive
        .operands
        .iter()
        .map(|operand| match (directive.kind, operand.as_str_literal()) {
            (DirectiveKind::Db, Some(text)) => text.len(),
            (DirectiveKind::Dw, Some(text)) => text.chars().count(),
            _ => 1,
        })
        .sum();
    match directive.kind {
        DirectiveKind::Dw => units as i64 * WORD_SIZE,
        DirectiveKind::Db => units as i64,
        DirectiveKind::Addr => 0,
    }
}
