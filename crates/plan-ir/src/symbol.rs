//! Interned symbols and dialect-qualified names.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

use crate::error::{IrError, IrResult};

// ============================================================================
// Symbol
// ============================================================================

/// Global string interner for symbols.
static INTERNER: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// Interned name (attribute keys, dialect names, op kinds, type tags).
///
/// Uses lasso for string interning with 4-byte Spur keys. Equality and
/// hashing work on the key; ordering follows interning order, not text.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Intern a static string and return its symbol. Prefer this over `from_dynamic` when possible.
    pub fn new(text: &'static str) -> Self {
        Self::get_or_else(text, |rodeo| rodeo.get_or_intern_static(text))
    }

    /// Intern a string and return its symbol. Prefer `new` if the text is static.
    pub fn from_dynamic(text: &str) -> Self {
        Self::get_or_else(text, |rodeo| rodeo.get_or_intern(text))
    }

    fn get_or_else(text: &str, f: impl for<'r> FnOnce(&'r mut Rodeo) -> Spur) -> Self {
        let mut lock = INTERNER.upgradable_read();
        Symbol(if let Some(spur) = lock.get(text) {
            spur
        } else {
            lock.with_upgraded(f)
        })
    }

    /// Access the symbol's text with zero-copy.
    ///
    /// Uses `read_recursive()` so that nested symbol operations inside the
    /// closure (Display, comparisons) cannot deadlock.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let interner = INTERNER.read_recursive();
        f(interner.resolve(&self.0))
    }

    /// Whether the text is a plain identifier: `[a-zA-Z_][a-zA-Z0-9_]*`.
    pub fn is_ident(&self) -> bool {
        self.with_str(is_ident)
    }
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl From<Cow<'_, str>> for Symbol {
    fn from(text: Cow<'_, str>) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.with_str(|s| s == *other)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| write!(f, "{s:?}"))
    }
}

/// Declare several symbol helpers at once.
///
/// # Example
/// ```
/// use plan_ir::symbols;
///
/// symbols! {
///     ATTR_NAME => "name",
///     ATTR_TYPE => "type",
/// }
///
/// assert_eq!(ATTR_NAME(), "name");
/// ```
#[macro_export]
macro_rules! symbols {
    ($($(#[$attr:meta])* $name:ident => $text:literal),* $(,)?) => {
        $(
            $(#[$attr])*
            #[allow(non_snake_case)]
            #[inline]
            pub fn $name() -> $crate::Symbol {
                $crate::Symbol::new($text)
            }
        )*
    };
}

// ============================================================================
// QualifiedName
// ============================================================================

/// A dialect-qualified name such as `rel_alg.literal`.
///
/// Operation kinds, type tags and structural categories all live in the
/// same `dialect.name` namespace of a [`crate::Context`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    dialect: Symbol,
    name: Symbol,
}

impl QualifiedName {
    pub fn new(dialect: Symbol, name: Symbol) -> Self {
        Self { dialect, name }
    }

    /// Shorthand for static dialect and name strings.
    pub fn from_static(dialect: &'static str, name: &'static str) -> Self {
        Self::new(Symbol::new(dialect), Symbol::new(name))
    }

    /// Parse `dialect.name`.
    ///
    /// Both halves must be identifiers; anything else is reported as an
    /// unknown identifier, since no such name can ever be registered.
    pub fn parse(text: &str) -> IrResult<Self> {
        match text.split_once('.') {
            Some((dialect, name)) if is_ident(dialect) && is_ident(name) => Ok(Self::new(
                Symbol::from_dynamic(dialect),
                Symbol::from_dynamic(name),
            )),
            _ => Err(IrError::unknown_identifier(text)),
        }
    }

    pub fn dialect(&self) -> Symbol {
        self.dialect
    }

    pub fn name(&self) -> Symbol {
        self.name
    }
}

impl TryFrom<&str> for QualifiedName {
    type Error = IrError;

    fn try_from(text: &str) -> IrResult<Self> {
        Self::parse(text)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dialect, self.name)
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dialect, self.name)
    }
}
