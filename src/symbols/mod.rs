//! A ready-made symbol table. Hosts are free to bring their own
//! `Language::Sym` type; this module is for the ones that don't want
//! to. `make_symbol` hands out `SymRef`s which are `eq` (pointer
//! equal) whenever their names are equal, so symbol comparison
//! during lookup is a pointer comparison.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::{cmp, fmt, ops};

lazy_static! {
    /// Holds every symbol ever interned. Symbols are never freed;
    /// they live as long as the process, which is also why `SymRef`
    /// can be a plain `&'static`.
    static ref SYMBOLS_HEAP: Mutex<HashMap<String, SymRef>> = { Mutex::new(HashMap::new()) };
}

/// An interned identifier. The text is reachable through `Deref`,
/// but equality and hashing go by address, not by contents.
#[derive(Clone, Copy)]
pub struct SymRef(&'static Symbol);

pub struct Symbol {
    text: String,
}

/// Create a symbol by returning a pointer to an existing one with
/// the same name, or by interning a new one if no such exists. This
/// is the *only* way to obtain a `SymRef`, which is what makes
/// same-named symbols pointer equal.
pub fn make_symbol(text: &str) -> SymRef {
    let mut heap = SYMBOLS_HEAP.lock().unwrap();
    if let Some(&sym) = heap.get(text) {
        return sym;
    }
    let sym = SymRef(Box::leak(Box::new(Symbol {
        text: text.to_owned(),
    })));
    let _insert_res = heap.insert(text.to_owned(), sym);
    debug_assert!(_insert_res.is_none());
    sym
}

impl Symbol {
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn len(&self) -> usize {
        self.text.len()
    }
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl cmp::PartialEq for SymRef {
    fn eq(&self, other: &SymRef) -> bool {
        self.0 as *const Symbol == other.0 as *const Symbol
    }
}

impl cmp::Eq for SymRef {}

impl Hash for SymRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 as *const Symbol).hash(state);
    }
}

impl ops::Deref for SymRef {
    type Target = Symbol;
    fn deref(&self) -> &Symbol {
        self.0
    }
}

impl fmt::Display for SymRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl fmt::Debug for SymRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[symbol {}]", self.text())
    }
}
