//! The type registry: a hierarchical namespace of named types.
//!
//! Only the minimal contract the parser needs exists so far: a trie of
//! namespaces keyed by dotted paths, seeded with the builtin scalar types
//! the literal type hints refer to. No lookup happens during parsing yet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use once_cell::sync::Lazy;

/// The twelve builtin scalar types, registered under `$builtin.` at
/// start-up.
pub const BUILTIN_SCALARS: [&str; 12] = [
    "u8", "i8", "u16", "i16", "u32", "i32", "u64", "i64", "u128", "i128", "f32", "f64",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Terminal,
    Sum,
    Product,
}

static NEXT_TYPE_ID: AtomicU32 = AtomicU32::new(0);

/// A type descriptor. Every constructed `Type` gets the next process-wide
/// monotonic identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    id: u32,
    pub kind: TypeKind,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            kind,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug)]
enum Entry {
    Namespace(Namespace),
    Type(Type),
}

#[derive(Debug, Default)]
struct Namespace {
    entries: HashMap<String, Entry>,
}

/// A trie of namespaces keyed by path segments. Types are stored at the
/// leaves; there is no removal.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    root: Namespace,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// A registry pre-populated with the builtin scalars.
    pub fn with_builtins() -> Self {
        let mut registry = TypeRegistry::new();
        for name in BUILTIN_SCALARS {
            registry.declare_type(&format!("$builtin.{name}"), Type::new(TypeKind::Terminal));
        }
        registry
    }

    /// Store a type at a dotted path, creating intermediate namespaces as
    /// needed. Declaring *through* an existing type replaces it with a
    /// namespace.
    pub fn declare_type(&mut self, path: &str, ty: Type) {
        let mut node = &mut self.root;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.entries.insert(segment.to_string(), Entry::Type(ty));
                return;
            }
            let entry = node
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Entry::Namespace(Namespace::default()));
            if !matches!(entry, Entry::Namespace(_)) {
                *entry = Entry::Namespace(Namespace::default());
            }
            node = match entry {
                Entry::Namespace(ns) => ns,
                _ => unreachable!("entry was just made a namespace"),
            };
        }
    }

    pub fn lookup(&self, path: &str) -> Option<&Type> {
        let mut node = &self.root;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            match node.entries.get(segment)? {
                Entry::Type(ty) if segments.peek().is_none() => return Some(ty),
                Entry::Namespace(ns) => node = ns,
                _ => return None,
            }
        }
        None
    }
}

/// The process-wide registry, seeded on first touch.
pub static REGISTRY: Lazy<RwLock<TypeRegistry>> =
    Lazy::new(|| RwLock::new(TypeRegistry::with_builtins()));

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn type_ids_are_monotonic() {
        let a = Type::new(TypeKind::Terminal);
        let b = Type::new(TypeKind::Sum);
        let c = Type::new(TypeKind::Product);
        assert!(a.id() < b.id());
        assert!(b.id() < c.id());
    }

    #[test]
    fn declare_and_look_up() {
        let mut registry = TypeRegistry::new();
        let ty = Type::new(TypeKind::Sum);
        let id = ty.id();
        registry.declare_type("pkg.shapes.circle", ty);
        let found = registry.lookup("pkg.shapes.circle").expect("declared type");
        assert_eq!(found.id(), id);
        assert_eq!(found.kind, TypeKind::Sum);
        assert!(registry.lookup("pkg.shapes.square").is_none());
        assert!(registry.lookup("pkg.shapes").is_none());
    }

    #[test]
    fn intermediate_namespaces_are_created() {
        let mut registry = TypeRegistry::new();
        registry.declare_type("a.b.c", Type::new(TypeKind::Terminal));
        registry.declare_type("a.b.d", Type::new(TypeKind::Terminal));
        assert!(registry.lookup("a.b.c").is_some());
        assert!(registry.lookup("a.b.d").is_some());
    }

    #[test]
    fn declaring_through_a_type_replaces_it() {
        let mut registry = TypeRegistry::new();
        registry.declare_type("a.b", Type::new(TypeKind::Terminal));
        registry.declare_type("a.b.c", Type::new(TypeKind::Terminal));
        assert!(registry.lookup("a.b").is_none());
        assert!(registry.lookup("a.b.c").is_some());
    }

    #[test]
    fn builtins_are_seeded() {
        let registry = TypeRegistry::with_builtins();
        for name in BUILTIN_SCALARS {
            let ty = registry
                .lookup(&format!("$builtin.{name}"))
                .unwrap_or_else(|| panic!("missing builtin {name}"));
            assert_eq!(ty.kind, TypeKind::Terminal);
        }
    }

    #[test]
    fn global_registry_has_the_builtins() {
        let registry = REGISTRY.read().expect("registry lock");
        assert!(registry.lookup("$builtin.u32").is_some());
        assert!(registry.lookup("$builtin.f64").is_some());
    }
}
