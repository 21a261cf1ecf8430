//! Postfix expression evaluation.
use once_cell::sync::Lazy;
use regex::Regex;

use super::compiler::{Operator, Token};
use super::error::ErrorKind;
use super::symbols::SymbolTable;

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:0[xX](?P<hex>[0-9A-Fa-f]+)|0[bB](?P<bin>[01]+)|0(?P<oct>[0-7]+)|(?P<dec>[1-9][0-9]*|0))$")
        .expect("number literal pattern is valid")
});

/// Decodes a number literal: `0x` hexadecimal, `0b` binary, a leading `0`
/// octal, anything else decimal. `0` on its own is decimal zero.
pub fn parse_number(text: &str) -> Result<i64, ErrorKind> {
    let invalid = || ErrorKind::InvalidNumber(text.to_string());
    let caps = NUMBER.captures(text).ok_or_else(invalid)?;

    let (digits, radix) = [("hex", 16), ("bin", 2), ("oct", 8), ("dec", 10)]
        .iter()
        .find_map(|(group, radix)| caps.name(group).map(|m| (m.as_str(), *radix)))
        .ok_or_else(invalid)?;
    i64::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// Division rounding toward negative infinity.
pub fn floor_div(lhs: i64, rhs: i64) -> Result<i64, ErrorKind> {
    if rhs == 0 {
        return Err(ErrorKind::DivisionByZero);
    }
    let quotient = lhs.wrapping_div(rhs);
    if lhs.wrapping_rem(rhs) != 0 && ((lhs < 0) != (rhs < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

fn apply(op: Operator, lhs: i64, rhs: i64) -> Result<i64, ErrorKind> {
    match op {
        Operator::Add => Ok(lhs.wrapping_add(rhs)),
        Operator::Sub => Ok(lhs.wrapping_sub(rhs)),
        Operator::Mul => Ok(lhs.wrapping_mul(rhs)),
        Operator::Div => floor_div(lhs, rhs),
        Operator::Negate => Ok(rhs.wrapping_neg()),
    }
}

/// A one-character string stands for its code point.
fn char_value(text: &str) -> Result<i64, ErrorKind> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(i64::from(u32::from(c))),
        _ => Err(ErrorKind::StringOperand(text.to_string())),
    }
}

/// Evaluates a postfix token sequence against `symbols`.
///
/// Binary operators pop their right operand first, then their left one, so
/// `a b -` computes `a - b`.
pub fn evaluate(tokens: &[Token], symbols: &SymbolTable) -> Result<i64, ErrorKind> {
    let mut stack: Vec<i64> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let value = match token {
            Token::Number(text) => parse_number(text)?,
            Token::Symbol(name) => symbols
                .get(name)
                .ok_or_else(|| ErrorKind::UnresolvedSymbol(name.clone()))?,
            Token::Str(text) => char_value(text)?,
            Token::Operator(Operator::Negate) => {
                let operand = stack.pop().ok_or(ErrorKind::MalformedExpression)?;
                apply(Operator::Negate, 0, operand)?
            }
            Token::Operator(op) => {
                let rhs = stack.pop().ok_or(ErrorKind::MalformedExpression)?;
                let lhs = stack.pop().ok_or(ErrorKind::MalformedExpression)?;
                apply(*op, lhs, rhs)?
            }
            Token::Open | Token::Close => return Err(ErrorKind::MalformedExpression),
        };
        stack.push(value);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => Err(ErrorKind::MalformedExpression),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::compiler::compile;
    use crate::assembler::parser::Parser;

    fn op(op: Operator) -> Token {
        Token::Operator(op)
    }

    fn eval_str(expr: &str, symbols: &SymbolTable) -> Result<i64, ErrorKind> {
        let mut parser = Parser::new(expr, "");
        let tree = parser.expression().unwrap();
        evaluate(compile(&tree).tokens(), symbols)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0xFF"), Ok(255));
        assert_eq!(parse_number("0XfF"), Ok(255));
        assert_eq!(parse_number("0777"), Ok(511));
        assert_eq!(parse_number("0b111"), Ok(7));
        assert_eq!(parse_number("0B101"), Ok(5));
        assert_eq!(parse_number("10"), Ok(10));
        assert_eq!(parse_number("0"), Ok(0));
        assert_eq!(parse_number("00"), Ok(0));
        assert_eq!(parse_number("0xFFFFFFFF"), Ok(0xFFFF_FFFF));

        assert_eq!(parse_number("089"), Err(ErrorKind::InvalidNumber("089".to_string())));
        assert!(parse_number("0b12").is_err());
        assert!(parse_number("12AB").is_err());
        assert!(parse_number("0x").is_err());
        assert!(parse_number("0xFFFFFFFFFFFFFFFFFF").is_err());
    }

    #[test]
    fn test_floor_div() {
        assert_eq!(floor_div(7, 2), Ok(3));
        assert_eq!(floor_div(-7, 2), Ok(-4));
        assert_eq!(floor_div(7, -2), Ok(-4));
        assert_eq!(floor_div(-7, -2), Ok(3));
        assert_eq!(floor_div(-8, 2), Ok(-4));
        assert_eq!(floor_div(1, 0), Err(ErrorKind::DivisionByZero));
    }

    #[test]
    fn test_numbers() {
        let tokens = vec![
            Token::number("0xf"),
            Token::number("010"),
            Token::number("0b101"),
            Token::number("10"),
            op(Operator::Mul),
            op(Operator::Add),
            op(Operator::Add),
        ];
        assert_eq!(evaluate(&tokens, &SymbolTable::empty()), Ok(73));
    }

    #[test]
    fn test_symbols() {
        let mut symbols = SymbolTable::empty();
        symbols.define("lol", 4);
        let tokens = vec![
            Token::number("2"),
            Token::number("3"),
            Token::symbol("lol"),
            op(Operator::Mul),
            op(Operator::Add),
        ];
        assert_eq!(evaluate(&tokens, &symbols), Ok(14));

        assert_eq!(
            evaluate(&[Token::symbol("nope")], &symbols),
            Err(ErrorKind::UnresolvedSymbol("nope".to_string()))
        );
    }

    #[test]
    fn test_operand_order() {
        let symbols = SymbolTable::empty();
        assert_eq!(eval_str("10 - 3", &symbols), Ok(7));
        assert_eq!(eval_str("12 / 4", &symbols), Ok(3));
        assert_eq!(eval_str("10 - 3 - 2", &symbols), Ok(5));
        assert_eq!(eval_str("64 / 4 / 2", &symbols), Ok(8));
        assert_eq!(eval_str("1 - (2 - 3)", &symbols), Ok(2));
        assert_eq!(eval_str("(-7) / 2", &symbols), Ok(-4));
        // Unary minus takes the whole multiplicative operand.
        assert_eq!(eval_str("-7 / 2", &symbols), Ok(-3));
        assert_eq!(eval_str("2 * -3 + 10", &symbols), Ok(4));
        assert_eq!(eval_str("3 / (1 - 1)", &symbols), Err(ErrorKind::DivisionByZero));
    }

    #[test]
    fn test_strings() {
        let symbols = SymbolTable::empty();
        assert_eq!(eval_str("\"A\" + 1", &symbols), Ok(66));
        assert_eq!(
            eval_str("\"AB\"", &symbols),
            Err(ErrorKind::StringOperand("AB".to_string()))
        );
    }

    #[test]
    fn test_malformed() {
        let symbols = SymbolTable::empty();
        assert_eq!(evaluate(&[], &symbols), Err(ErrorKind::MalformedExpression));
        assert_eq!(
            evaluate(&[Token::number("1"), op(Operator::Add)], &symbols),
            Err(ErrorKind::MalformedExpression)
        );
        assert_eq!(
            evaluate(&[Token::number("1"), Token::number("2")], &symbols),
            Err(ErrorKind::MalformedExpression)
        );
        assert_eq!(
            evaluate(&[Token::Open, Token::number("1")], &symbols),
            Err(ErrorKind::MalformedExpression)
        );
    }
}
