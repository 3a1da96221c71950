//! The type registry: a single-inheritance hierarchy of atom types.
//!
//! Every atom carries a `TypeId`. The builtin types are registered at
//! bootstrap in a fixed order, so their ids are compile-time constants; the
//! registry itself only answers name and ancestry questions after that.

use indexmap::IndexSet;

use crate::id::TypeId;

// ========== BUILTIN TYPE IDS ==========

pub const ATOM: TypeId = 0;
pub const NODE: TypeId = 1;
pub const LINK: TypeId = 2;
pub const CONCEPT: TypeId = 3;
pub const PREDICATE: TypeId = 4;
pub const NUMBER: TypeId = 5;
pub const VARIABLE: TypeId = 6;
pub const TYPE: TypeId = 7;
pub const TYPE_INH: TypeId = 8;
pub const LIST: TypeId = 9;
pub const MEMBER: TypeId = 10;
pub const INHERITANCE: TypeId = 11;
pub const EVALUATION: TypeId = 12;
pub const AND: TypeId = 13;
pub const OR: TypeId = 14;
pub const NOT: TypeId = 15;
pub const EQUAL: TypeId = 16;
pub const PRESENT: TypeId = 17;
pub const ABSENT: TypeId = 18;
pub const TYPE_CHOICE: TypeId = 19;
pub const TYPED_VARIABLE: TypeId = 20;
pub const VARIABLE_LIST: TypeId = 21;
pub const QUOTE: TypeId = 22;
pub const UNQUOTE: TypeId = 23;
pub const REPLACEMENT: TypeId = 24;
pub const SCOPE: TypeId = 25;
pub const LAMBDA: TypeId = 26;
pub const MEET: TypeId = 27;
pub const JOIN: TypeId = 28;
pub const MAXIMAL_JOIN: TypeId = 29;

/// (name, parent) for every builtin except the root. Order defines the ids
/// above, so entries must never be reordered.
const BUILTINS: &[(&str, TypeId)] = &[
    ("Node", ATOM),
    ("Link", ATOM),
    ("Concept", NODE),
    ("Predicate", NODE),
    ("Number", NODE),
    ("Variable", NODE),
    ("Type", NODE),
    ("TypeInh", NODE),
    ("List", LINK),
    ("Member", LINK),
    ("Inheritance", LINK),
    ("Evaluation", LINK),
    ("And", LINK),
    ("Or", LINK),
    ("Not", LINK),
    ("Equal", LINK),
    ("Present", LINK),
    ("Absent", LINK),
    ("TypeChoice", LINK),
    ("TypedVariable", LINK),
    ("VariableList", LINK),
    ("Quote", LINK),
    ("Unquote", LINK),
    ("Replacement", LINK),
    ("Scope", LINK),
    ("Lambda", SCOPE),
    ("Meet", SCOPE),
    ("Join", SCOPE),
    ("MaximalJoin", JOIN),
];

// ========== REGISTRY ==========

#[derive(Clone, Debug)]
pub struct TypeRegistry {
    names: IndexSet<String>,
    parents: Vec<Option<TypeId>>,
}

impl TypeRegistry {
    /// A registry holding exactly the builtin hierarchy.
    pub fn bootstrap() -> Self {
        let mut reg = TypeRegistry {
            names: IndexSet::new(),
            parents: Vec::new(),
        };
        let (root, _) = reg.names.insert_full("Atom".to_string());
        debug_assert_eq!(root, ATOM);
        reg.parents.push(None);
        for &(name, parent) in BUILTINS {
            reg.register(name, parent);
        }
        debug_assert_eq!(reg.lookup("MaximalJoin"), Some(MAXIMAL_JOIN));
        reg
    }

    /// Registers `name` under `parent`, or returns the existing id if the
    /// name is already taken.
    pub fn register(&mut self, name: &str, parent: TypeId) -> TypeId {
        debug_assert!(parent < self.names.len());
        let (id, inserted) = self.names.insert_full(name.to_string());
        if inserted {
            self.parents.push(Some(parent));
        }
        id
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get_index_of(name)
    }

    pub fn name(&self, ty: TypeId) -> &str {
        self.names.get_index(ty).map(|s| s.as_str()).unwrap_or("?")
    }

    pub fn parent(&self, ty: TypeId) -> Option<TypeId> {
        self.parents.get(ty).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when `sub` equals `sup` or sits below it in the hierarchy.
    pub fn is_a(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut cursor = Some(sub);
        while let Some(ty) = cursor {
            if ty == sup {
                return true;
            }
            cursor = self.parent(ty);
        }
        false
    }

    /// Every registered type at or below `ty`, in registration order.
    pub fn subtypes(&self, ty: TypeId) -> Vec<TypeId> {
        (0..self.len()).filter(|&t| self.is_a(t, ty)).collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::bootstrap()
    }
}

// Unit tests are in tests/unit_store.rs
