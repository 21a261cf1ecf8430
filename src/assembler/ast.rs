//! This AST describes a parsed osci assembly file.
//!
//! Every line holds at most one instruction, optionally preceded by a label.
//! Comments are prefixed with semicolons (;) and are single-line only.
//!
//! An osci CPU instruction is four whitespace-separated expressions:
//!
//! ```text
//! operand_a operand_b target jump
//! ```
//!
//! Assembler directives start with a dot:
//!
//! ```text
//! .addr 0x80         ; continue at address 0x80, emits nothing
//! .db 1 2 "text"     ; bytes
//! .dw 0xFFAA0033 $   ; little-endian 32-bit words
//! ```
//!
//! Example source file:
//!
//! ```text
//! start:
//!     register0 register0 register0 $+instruction_size   ; clear r0
//! loop: 1 2 3 loop
//! .db -1 0777 0b101
//! ```
//!
//! Unary minus applies to the whole multiplicative term after it, so
//! `-7 / 2` is `-(7 / 2)` = -3. Write `(-7) / 2` to get -4.
//!
//! Instructions are generic over their operand representation: the parser
//! produces [`Expr`] trees and the expression compiler turns them into
//! postfix token sequences.
use std::fmt;
use std::str::FromStr;

use super::source::Position;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instruction<E = Expr> {
    Label(Label),
    Cpu(CpuInstruction<E>),
    Directive(Directive<E>),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label {
    pub name: String,
    pub position: Position,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CpuInstruction<E = Expr> {
    pub operand_a: E,
    pub operand_b: E,
    pub target: E,
    pub jump: E,
    pub position: Position,
}

impl<E> CpuInstruction<E> {
    /// The operands in encoding order.
    pub fn operands(&self) -> [&E; 4] {
        [&self.operand_a, &self.operand_b, &self.target, &self.jump]
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Directive<E = Expr> {
    pub kind: DirectiveKind,
    pub operands: Vec<E>,
    pub position: Position,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DirectiveKind {
    Addr,
    Db,
    Dw,
}

impl DirectiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::Addr => "addr",
            DirectiveKind::Db => "db",
            DirectiveKind::Dw => "dw",
        }
    }
}

impl FromStr for DirectiveKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addr" => Ok(DirectiveKind::Addr),
            "db" => Ok(DirectiveKind::Db),
            "dw" => Ok(DirectiveKind::Dw),
            _ => Err(()),
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl<E> Instruction<E> {
    pub fn position(&self) -> &Position {
        match self {
            Instruction::Label(label) => &label.position,
            Instruction::Cpu(cpu) => &cpu.position,
            Instruction::Directive(directive) => &directive.position,
        }
    }

    /// Rebuilds the instruction with every operand passed through `f`.
    pub fn map_operands<F, T>(self, mut f: F) -> Instruction<T>
    where
        F: FnMut(E) -> T,
    {
        match self {
            Instruction::Label(label) => Instruction::Label(label),
            Instruction::Cpu(cpu) => Instruction::Cpu(CpuInstruction {
                operand_a: f(cpu.operand_a),
                operand_b: f(cpu.operand_b),
                target: f(cpu.target),
                jump: f(cpu.jump),
                position: cpu.position,
            }),
            Instruction::Directive(directive) => Instruction::Directive(Directive {
                kind: directive.kind,
                operands: directive.operands.into_iter().map(f).collect(),
                position: directive.position,
            }),
        }
    }
}

impl<E: fmt::Display> fmt::Display for Instruction<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Label(label) => write!(f, "{}:", label.name),
            Instruction::Cpu(cpu) => {
                write!(f, "{} {} {} {}", cpu.operand_a, cpu.operand_b, cpu.target, cpu.jump)
            }
            Instruction::Directive(directive) => {
                write!(f, ".{}", directive.kind)?;
                for operand in &directive.operands {
                    write!(f, " {}", operand)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// An expression tree as written in the source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Negate(Box<Expr>),
    /// Raw literal text; the radix is decided on evaluation.
    Number(String),
    /// Decoded string contents.
    Str(String),
    /// A symbol name, or `$` for the current address.
    Symbol(String),
    Group(Box<Expr>),
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn number<S: Into<String>>(text: S) -> Self {
        Expr::Number(text.into())
    }

    pub fn symbol<S: Into<String>>(name: S) -> Self {
        Expr::Symbol(name.into())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Binary { op, lhs, rhs } => write!(f, "{}{}{}", lhs, op.symbol(), rhs),
            Expr::Negate(inner) => write!(f, "-{}", inner),
            Expr::Number(text) | Expr::Symbol(text) => write!(f, "{}", text),
            Expr::Str(text) => write_quoted(f, text),
            Expr::Group(inner) => write!(f, "({})", inner),
        }
    }
}

/// Writes `text` as a string literal the parser would read back.
pub(crate) fn write_quoted(f: &mut fmt::Formatter, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in text.chars() {
        if c == '"' || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_kind_from_str() {
        assert_eq!("addr".parse::<DirectiveKind>(), Ok(DirectiveKind::Addr));
        assert_eq!("db".parse::<DirectiveKind>(), Ok(DirectiveKind::Db));
        assert_eq!("dw".parse::<DirectiveKind>(), Ok(DirectiveKind::Dw));
        assert!("DB".parse::<DirectiveKind>().is_err());
        assert!("org".parse::<DirectiveKind>().is_err());
    }

    #[test]
    fn test_display() {
        let expr = Expr::binary(
            BinaryOp::Mul,
            Expr::number("2"),
            Expr::Group(Box::new(Expr::binary(BinaryOp::Add, Expr::symbol("$"), Expr::number("1")))),
        );
        assert_eq!(expr.to_string(), "2*($+1)");
        assert_eq!(Expr::Negate(Box::new(Expr::number("0x10"))).to_string(), "-0x10");
        assert_eq!(Expr::Str("say \"hi\"".to_string()).to_string(), r#""say \"hi\"""#);

        let ins: Instruction = Instruction::Directive(Directive {
            kind: DirectiveKind::Db,
            operands: vec![Expr::number("1"), Expr::symbol("here")],
            position: Position::default(),
        });
        assert_eq!(ins.to_string(), ".db 1 here");
    }

    #[test]
    fn test_map_operands() {
        let ins: Instruction = Instruction::Cpu(CpuInstruction {
            operand_a: Expr::number("1"),
            operand_b: Expr::number("2"),
            target: Expr::number("3"),
            jump: Expr::symbol("end"),
            position: Position::default(),
        });
        let mapped = ins.map_operands(|e| e.to_string().len());
        match mapped {
            Instruction::Cpu(cpu) => assert_eq!(cpu.operands(), [&1, &1, &1, &3]),
            _ => panic!("expected a cpu instruction"),
        }
    }
}
