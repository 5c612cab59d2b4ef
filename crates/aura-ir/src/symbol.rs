//! Interned symbolic atoms (`:name` in source).

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// An interned symbol name, stored without the leading `:`.
///
/// Cloning is a reference-count bump; equality compares the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <String as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

/// Per-compile symbol table. Equal names share one allocation.
#[derive(Debug, Default)]
pub struct Interner {
    table: FxHashMap<Box<str>, Symbol>,
}

impl Interner {
    /// Interns `name`; a leading `:` is stripped.
    pub fn intern(&mut self, name: &str) -> Symbol {
        let name = name.strip_prefix(':').unwrap_or(name);
        if let Some(sym) = self.table.get(name) {
            return sym.clone();
        }
        let sym = Symbol::new(name);
        self.table.insert(name.into(), sym.clone());
        sym
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_strips_colon_and_shares_storage() {
        let mut interner = Interner::default();
        let a = interner.intern(":relu");
        let b = interner.intern("relu");
        assert_eq!(a, "relu");
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_names_are_distinct_symbols() {
        let mut interner = Interner::default();
        assert_ne!(interner.intern(":adam"), interner.intern(":sgd"));
    }
}
