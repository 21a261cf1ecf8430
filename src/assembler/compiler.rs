//! Turns expression trees into postfix token sequences.
//!
//! Compilation happens in two steps. [`flatten`] linearizes a tree into an
//! infix token stream where every binary operation is wrapped in explicit
//! parentheses, and [`to_postfix`] runs the shunting-yard algorithm over that
//! stream. Neither step looks at symbol values.
use std::fmt;

use super::ast::{write_quoted, BinaryOp, Expr, Instruction};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    /// Unary minus.
    Negate,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 0,
            Operator::Mul | Operator::Div => 1,
            Operator::Negate => 2,
        }
    }
}

impl From<BinaryOp> for Operator {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => Operator::Add,
            BinaryOp::Sub => Operator::Sub,
            BinaryOp::Mul => Operator::Mul,
            BinaryOp::Div => Operator::Div,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Negate => "neg",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Operator(Operator),
    Number(String),
    Symbol(String),
    Str(String),
    /// Grouping markers. They only exist between `flatten` and `to_postfix`.
    Open,
    Close,
}

impl Token {
    pub fn number<S: Into<String>>(text: S) -> Self {
        Token::Number(text.into())
    }

    pub fn symbol<S: Into<String>>(name: S) -> Self {
        Token::Symbol(name.into())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Operator(op) => write!(f, "{}", op),
            Token::Number(text) | Token::Symbol(text) => write!(f, "{}", text),
            Token::Str(text) => write_quoted(f, text),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
        }
    }
}

/// A compiled expression in reverse Polish order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Postfix(pub Vec<Token>);

impl Postfix {
    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    /// The string contents if the expression is nothing but a string literal.
    pub fn as_str_literal(&self) -> Option<&str> {
        match self.0.as_slice() {
            [Token::Str(text)] => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Postfix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (idx, token) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", token)?;
        }
        write!(f, "]")
    }
}

/// Linearizes `expr` into infix order with `(`/`)` around every binary
/// operation. Source-level groups add no markers of their own; unary minus
/// is emitted as a prefix operator followed by its parenthesized operand.
pub fn flatten(expr: &Expr) -> Vec<Token> {
    let mut tokens = Vec::new();
    flatten_into(expr, &mut tokens);
    tokens
}

fn flatten_into(expr: &Expr, tokens: &mut Vec<Token>) {
    match expr {
        Expr::Binary { op, lhs, rhs } => {
            tokens.push(Token::Open);
            flatten_into(lhs, tokens);
            tokens.push(Token::Operator((*op).into()));
            flatten_into(rhs, tokens);
            tokens.push(Token::Close);
        }
        Expr::Negate(inner) => {
            tokens.push(Token::Operator(Operator::Negate));
            tokens.push(Token::Open);
            flatten_into(inner, tokens);
            tokens.push(Token::Close);
        }
        Expr::Group(inner) => flatten_into(inner, tokens),
        Expr::Number(text) => tokens.push(Token::Number(text.clone())),
        Expr::Str(text) => tokens.push(Token::Str(text.clone())),
        Expr::Symbol(name) => tokens.push(Token::Symbol(name.clone())),
    }
}

/// Shunting-yard conversion of an infix token stream to postfix order.
///
/// Binary operators pop every stacked operator of greater or equal
/// precedence first, which makes chains of the same precedence
/// left-associative. Unary minus is a prefix operator and is pushed without
/// popping anything.
pub fn to_postfix(tokens: Vec<Token>) -> Postfix {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Open => stack.push(token),
            Token::Close => {
                while let Some(top) = stack.pop() {
                    if top == Token::Open {
                        break;
                    }
                    output.push(top);
                }
            }
            Token::Operator(Operator::Negate) => stack.push(token),
            Token::Operator(op) => {
                while let Some(Token::Operator(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.extend(stack.pop());
                }
                stack.push(token);
            }
            Token::Number(_) | Token::Symbol(_) | Token::Str(_) => output.push(token),
        }
    }

    while let Some(top) = stack.pop() {
        if top != Token::Open {
            output.push(top);
        }
    }
    Postfix(output)
}

pub fn compile(expr: &Expr) -> Postfix {
    to_postfix(flatten(expr))
}

/// Compiles every operand of every instruction.
pub fn compile_program(program: Vec<Instruction>) -> Vec<Instruction<Postfix>> {
    program
        .into_iter()
        .map(|ins| ins.map_operands(|expr| compile(&expr)))
        .collect()
}
