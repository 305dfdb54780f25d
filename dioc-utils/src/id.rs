use std::sync::{Mutex, OnceLock};

use string_interner::{backend::StringBackend, StringInterner};

type Backend = StringBackend;
type Sym = <Backend as string_interner::backend::Backend>::Symbol;

fn table() -> &'static Mutex<StringInterner<Backend>> {
    static TABLE: OnceLock<Mutex<StringInterner<Backend>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(StringInterner::new()))
}

/// An interned identifier.
///
/// Every state variable, input, CSE alias and existential witness name
/// flows through this type so that the CSE pass and the planner can compare
/// and hash names by value without re-hashing the underlying string on every
/// lookup or comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(Sym);

impl Id {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        let mut t = table().lock().unwrap();
        Id(t.get_or_intern(name.as_ref()))
    }

    /// Look up the original string this id was interned from.
    pub fn resolve(&self) -> String {
        let t = table().lock().unwrap();
        t.resolve(self.0).expect("interned id must resolve").to_string()
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resolve())
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resolve())
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
        Id::new(s.as_str())
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.resolve() == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.resolve() == *other
    }
}
