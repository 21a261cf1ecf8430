//! The symbol table and the symbols every program starts with.
use std::collections::HashMap;

/// The current address symbol.
pub const CURRENT_ADDRESS: &str = "$";

pub const WORD_SIZE: i64 = 4;

/// Every CPU instruction is four words.
pub const INSTRUCTION_SIZE: i64 = 4 * WORD_SIZE;

const MAX_ADDRESS: i64 = 0xFFFF_FFFF;

/// Memory-mapped locations at the top of the address space.
pub const PREDEFINED: [(&str, i64); 7] = [
    ("instruction_size", INSTRUCTION_SIZE),
    ("register3", MAX_ADDRESS - WORD_SIZE),
    ("register2", MAX_ADDRESS - 2 * WORD_SIZE),
    ("register1", MAX_ADDRESS - 3 * WORD_SIZE),
    ("register0", MAX_ADDRESS - 4 * WORD_SIZE),
    ("ivt0", MAX_ADDRESS - 5 * WORD_SIZE),
    ("flags0", MAX_ADDRESS - 6 * WORD_SIZE),
];

/// Maps symbol names to values. `$` is always present.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SymbolTable {
    symbols: HashMap<String, i64>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// A table seeded with `$` = 0 and the predefined symbols.
    pub fn new() -> Self {
        let mut table = SymbolTable::empty();
        for (name, value) in PREDEFINED.iter() {
            table.define(name, *value);
        }
        table
    }

    /// A table holding only `$` = 0.
    pub fn empty() -> Self {
        let mut symbols = HashMap::new();
        symbols.insert(CURRENT_ADDRESS.to_string(), 0);
        SymbolTable { symbols }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.symbols.get(name).copied()
    }

    /// Binds `name` to `value`, returning the previous value if any.
    pub fn define(&mut self, name: &str, value: i64) -> Option<i64> {
        self.symbols.insert(name.to_string(), value)
    }

    pub fn current_address(&self) -> i64 {
        self.get(CURRENT_ADDRESS).unwrap_or(0)
    }

    pub fn set_current_address(&mut self, address: i64) {
        self.define(CURRENT_ADDRESS, address);
    }

    /// All symbols sorted by name.
    pub fn sorted(&self) -> Vec<(&str, i64)> {
        let mut entries: Vec<(&str, i64)> =
            self.symbols.iter().map(|(name, value)| (name.as_str(), *value)).collect();
        entries.sort();
        entries
    }
}
