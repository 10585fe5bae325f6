// ABOUTME: Process-wide interning of identifier text into identity-comparable symbols

use std::collections::HashMap;

/// An interned identifier. Equality is slot identity, not string compare —
/// two `Symbol`s are equal iff they came from the same intern call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

/// Byte-exact, case-sensitive interning map from identifier text to `Symbol`.
/// The literal text `nil` never reaches here: the reader recognizes it as
/// the `Nil` value before atom classification falls through to interning.
#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    ids: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&sym) = self.ids.get(text) {
            return sym;
        }
        let sym = Symbol(self.names.len() as u32);
        self.names.push(text.to_string());
        self.ids.insert(text.to_string(), sym);
        sym
    }

    pub fn name(&self, sym: Symbol) -> &str {
        &self.names[sym.0 as usize]
    }
}
