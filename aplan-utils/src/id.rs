//! Interned identifiers and their associated interning pool.
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::sync::Mutex;

lazy_static! {
    /// Pool of interned strings. Strings are leaked exactly once, so every
    /// identifier resolves to a `&'static str` and `Id` stays `Copy`.
    static ref POOL: Mutex<HashSet<&'static str>> = Mutex::new(HashSet::new());
}

fn intern(s: &str) -> &'static str {
    let mut pool = POOL.lock().unwrap();
    if let Some(&interned) = pool.get(s) {
        return interned;
    }
    let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
    pool.insert(leaked);
    leaked
}

/// Represents an identifier in an Aplan program.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id {
    id: &'static str,
}

impl Id {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Id {
            id: intern(id.as_ref()),
        }
    }

    /// The string this identifier resolves to in the interning pool.
    pub fn as_str(&self) -> &'static str {
        self.id
    }

    /// Length of the identifier in bytes. Collections that order their
    /// elements longest-first for greedy substitution rely on this.
    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// A new identifier with the same spelling, upper-cased.
    pub fn to_uppercase(&self) -> Id {
        Id::new(self.id.to_uppercase())
    }
}

impl Default for Id {
    fn default() -> Self {
        Id::new("")
    }
}

/* =================== Impls for Id to make them easier to use ============== */

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.id, f)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.id
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::new(s)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::new(s)
    }
}

impl From<&String> for Id {
    fn from(s: &String) -> Self {
        Id::new(s)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.id == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.id == *other
    }
}

impl PartialEq<String> for Id {
    fn eq(&self, other: &String) -> bool {
        self.id == other
    }
}
