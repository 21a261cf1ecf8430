//! The Parser module reads characters from a [`CharSource`] and converts
//! them into a list of instructions.
//!
//! It is a hand-written recursive descent parser. The only lookahead beyond
//! a single character is the label check: an identifier is read, and if no
//! `:` follows it is pushed back onto the source to be read again as the
//! start of an expression.
use super::ast::*;
use super::error::{AsmError, ErrorKind};
use super::source::{CharSource, Position};

// Newlines end instructions, so they are not whitespace here.
const WHITESPACE: [char; 3] = [' ', '\t', '\r'];

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_hexdigit() || c == 'x' || c == 'X'
}

pub struct Parser {
    source: CharSource,
}

impl Parser {
    pub fn new(text: &str, name: &str) -> Self {
        Parser::from_source(CharSource::named(text, name))
    }

    pub fn from_source(source: CharSource) -> Self {
        Parser { source }
    }

    /// Run the parser, consuming itself and returning a list of instructions.
    /// Stops at the first error.
    pub fn run(mut self) -> Result<Vec<Instruction>, AsmError> {
        let mut ast = Vec::new();
        while let Some(ins) = self.instruction()? {
            trace!("parsed `{}` at {}", ins, ins.position());
            ast.push(ins);
        }
        debug!("parsed {} instruction(s)", ast.len());
        Ok(ast)
    }

    /// Parses the next label, CPU instruction or directive, skipping blank
    /// lines and comments. Returns `None` at the end of the source.
    pub fn instruction(&mut self) -> Result<Option<Instruction>, AsmError> {
        loop {
            self.skip_whitespace()?;
            let position = self.source.position();
            let name = self.identifier()?;
            if self.source.peek()? == Some(':') {
                self.source.consume()?;
                if name.is_empty() {
                    return Err(AsmError::syntax("label without a name", position));
                }
                return Ok(Some(Instruction::Label(Label { name, position })));
            }
            self.source.prepend(&name, position.clone());

            match self.source.peek()? {
                None => return Ok(None),
                Some(';') => self.comment()?,
                Some('\n') => {
                    self.source.consume()?;
                }
                Some('.') => return self.directive().map(Some),
                Some(_) => return self.cpu_instruction(position).map(Some),
            }
        }
    }

    fn cpu_instruction(&mut self, position: Position) -> Result<Instruction, AsmError> {
        Ok(Instruction::Cpu(CpuInstruction {
            operand_a: self.expression()?,
            operand_b: self.expression()?,
            target: self.expression()?,
            jump: self.expression()?,
            position,
        }))
    }

    fn directive(&mut self) -> Result<Instruction, AsmError> {
        let position = self.source.position();
        self.expect('.')?;
        let name = self.identifier()?;
        let kind = name
            .parse::<DirectiveKind>()
            .map_err(|_| AsmError::new(ErrorKind::UnknownDirective(name.clone()), position.clone()))?;

        let mut operands = Vec::new();
        loop {
            self.skip_whitespace()?;
            match self.source.peek()? {
                None | Some('\n') | Some(';') => break,
                Some(_) => operands.push(self.expression()?),
            }
        }
        Ok(Instruction::Directive(Directive { kind, operands, position }))
    }

    /// expression := term (('+' | '-') term)*
    pub fn expression(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.term()?;
        loop {
            self.skip_whitespace()?;
            let op = match self.source.peek()? {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.source.consume()?;
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    /// term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.factor()?;
        loop {
            self.skip_whitespace()?;
            let op = match self.source.peek()? {
                Some('*') => BinaryOp::Mul,
                Some('/') => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.source.consume()?;
            let rhs = self.factor()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    /// factor := '(' expression ')' | '-' term | '$' | string | number | symbol
    fn factor(&mut self) -> Result<Expr, AsmError> {
        self.skip_whitespace()?;
        let position = self.source.position();
        match self.source.peek()? {
            None => Err(AsmError::syntax("missing operand at end of input", position)),
            Some('(') => {
                self.source.consume()?;
                let inner = self.expression()?;
                self.skip_whitespace()?;
                match self.source.consume()? {
                    Some(')') => Ok(Expr::Group(Box::new(inner))),
                    Some(c) => Err(AsmError::syntax(
                        format!("expected `)`, found {:?}", c),
                        self.source.position(),
                    )),
                    None => Err(AsmError::new(ErrorKind::UnexpectedEndOfInput, self.source.position())),
                }
            }
            Some('-') => {
                self.source.consume()?;
                Ok(Expr::Negate(Box::new(self.term()?)))
            }
            Some('$') => {
                self.source.consume()?;
                Ok(Expr::symbol("$"))
            }
            Some('"') => self.string_literal(),
            Some(c) if c.is_ascii_digit() => Ok(Expr::Number(self.take_while(is_number_char)?)),
            Some(c) if c.is_ascii_alphabetic() => Ok(Expr::Symbol(self.identifier()?)),
            Some('\n') => Err(AsmError::syntax("missing operand before end of line", position)),
            Some(c) => Err(AsmError::syntax(format!("unexpected character {:?}", c), position)),
        }
    }

    /// Reads a quoted string. A backslash takes the next character verbatim.
    fn string_literal(&mut self) -> Result<Expr, AsmError> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            let c = match self.source.consume()? {
                Some('"') => return Ok(Expr::Str(value)),
                Some('\\') => self.source.consume()?,
                other => other,
            };
            match c {
                Some(c) => value.push(c),
                None => {
                    return Err(AsmError::new(ErrorKind::UnexpectedEndOfInput, self.source.position()))
                }
            }
        }
    }

    /// Skips a `;` comment up to and including the newline that ends it.
    fn comment(&mut self) -> Result<(), AsmError> {
        self.expect(';')?;
        while let Some(c) = self.source.peek()? {
            self.source.consume()?;
            if c == '\n' {
                break;
            }
        }
        Ok(())
    }

    /// Reads a possibly empty run of identifier characters.
    fn identifier(&mut self) -> Result<String, AsmError> {
        self.take_while(is_identifier_char)
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, accept: F) -> Result<String, AsmError> {
        let mut value = String::new();
        while let Some(c) = self.source.peek()? {
            if !accept(c) {
                break;
            }
            value.push(c);
            self.source.consume()?;
        }
        Ok(value)
    }

    fn skip_whitespace(&mut self) -> Result<(), AsmError> {
        while let Some(c) = self.source.peek()? {
            if !WHITESPACE.contains(&c) {
                break;
            }
            self.source.consume()?;
        }
        Ok(())
    }

    fn expect(&mut self, expected: char) -> Result<(), AsmError> {
        let position = self.source.position();
        match self.source.consume()? {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(AsmError::syntax(format!("expected {:?}, found {:?}", expected, c), position)),
            None => Err(AsmError::new(ErrorKind::UnexpectedEndOfInput, position)),
        }
    }
}
