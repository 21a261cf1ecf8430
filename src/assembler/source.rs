//! Character sources feeding the parser.
//!
//! A source hands out one character at a time with a single character of
//! lookahead. Once the end of the stream has been consumed, any further
//! `peek` or `consume` is an error.
//!
//! The parser needs to read an identifier before it knows whether it is a
//! label. When it is not, the identifier is put back with
//! [`CharSource::prepend`], which turns the source into a composite whose
//! first child replays the identifier from its original position.
use std::collections::VecDeque;
use std::fmt;

use super::error::{AsmError, ErrorKind};

/// A 0-based line/column location inside a named source.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub name: String,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Position { name: name.into(), line: 0, column: 0 }
    }

    fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = if self.name.is_empty() { "<input>" } else { self.name.as_str() };
        write!(f, "{}:{}:{}", name, self.line + 1, self.column + 1)
    }
}

/// Owns its characters and a cursor position.
#[derive(Clone, Debug)]
pub struct BufferSource {
    chars: VecDeque<char>,
    position: Position,
    exhausted: bool,
}

impl BufferSource {
    pub fn new(text: &str) -> Self {
        BufferSource::at(text, Position::default())
    }

    /// A buffer whose first character sits at `position`.
    pub fn at(text: &str, position: Position) -> Self {
        BufferSource { chars: text.chars().collect(), position, exhausted: false }
    }

    pub fn peek(&self) -> Result<Option<char>, AsmError> {
        if self.exhausted {
            return Err(self.past_end());
        }
        Ok(self.chars.front().copied())
    }

    pub fn consume(&mut self) -> Result<Option<char>, AsmError> {
        if self.exhausted {
            return Err(self.past_end());
        }
        match self.chars.pop_front() {
            Some(c) => {
                self.position.advance(c);
                Ok(Some(c))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    pub fn position(&self) -> Position {
        self.position.clone()
    }

    fn is_drained(&self) -> bool {
        self.chars.is_empty()
    }

    fn past_end(&self) -> AsmError {
        AsmError::new(ErrorKind::UnexpectedEndOfInput, self.position())
    }
}

/// Reads its children in order. Drained children are dropped eagerly, except
/// the last one, which stays so the position keeps pointing at the end of
/// the input. The front child only runs dry when it is the last one.
#[derive(Clone, Debug, Default)]
pub struct CompositeSource {
    children: VecDeque<CharSource>,
    exhausted: bool,
}

impl CompositeSource {
    pub fn new(children: Vec<CharSource>) -> Self {
        let mut source = CompositeSource { children: children.into(), exhausted: false };
        source.purge();
        source
    }

    pub fn push_front(&mut self, child: CharSource) {
        self.children.push_front(child);
        self.purge();
    }

    pub fn peek(&self) -> Result<Option<char>, AsmError> {
        if self.exhausted {
            return Err(AsmError::new(ErrorKind::UnexpectedEndOfInput, self.position()));
        }
        match self.children.front() {
            Some(child) => child.peek(),
            None => Ok(None),
        }
    }

    pub fn consume(&mut self) -> Result<Option<char>, AsmError> {
        if self.exhausted {
            return Err(AsmError::new(ErrorKind::UnexpectedEndOfInput, self.position()));
        }
        let c = match self.children.front_mut() {
            Some(child) => child.consume()?,
            None => None,
        };
        if c.is_none() {
            self.exhausted = true;
        }
        self.purge();
        Ok(c)
    }

    /// The position of the front child, or a zero position when empty.
    pub fn position(&self) -> Position {
        self.children.front().map(CharSource::position).unwrap_or_default()
    }

    fn is_drained(&self) -> bool {
        self.children.iter().all(CharSource::is_drained)
    }

    fn purge(&mut self) {
        while self.children.len() > 1 && self.children.front().map_or(false, CharSource::is_drained) {
            self.children.pop_front();
        }
    }
}

#[derive(Clone, Debug)]
pub enum CharSource {
    Buffer(BufferSource),
    Composite(CompositeSource),
}

impl CharSource {
    pub fn new(text: &str) -> Self {
        CharSource::Buffer(BufferSource::new(text))
    }

    pub fn named(text: &str, name: &str) -> Self {
        CharSource::Buffer(BufferSource::at(text, Position::new(name)))
    }

    pub fn peek(&self) -> Result<Option<char>, AsmError> {
        match self {
            CharSource::Buffer(source) => source.peek(),
            CharSource::Composite(source) => source.peek(),
        }
    }

    pub fn consume(&mut self) -> Result<Option<char>, AsmError> {
        match self {
            CharSource::Buffer(source) => source.consume(),
            CharSource::Composite(source) => source.consume(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            CharSource::Buffer(source) => source.position(),
            CharSource::Composite(source) => source.position(),
        }
    }

    /// Puts already consumed `text` back in front of the stream. Reading it
    /// again reports positions starting at `position`.
    pub fn prepend(&mut self, text: &str, position: Position) {
        let front = CharSource::Buffer(BufferSource::at(text, position));
        match self {
            CharSource::Composite(source) => source.push_front(front),
            CharSource::Buffer(_) => {
                let rest = std::mem::replace(self, CharSource::Composite(CompositeSource::default()));
                *self = CharSource::Composite(CompositeSource::new(vec![front, rest]));
            }
        }
    }

    fn is_drained(&self) -> bool {
        match self {
            CharSource::Buffer(source) => source.is_drained(),
            CharSource::Composite(source) => source.is_drained(),
        }
    }
}
