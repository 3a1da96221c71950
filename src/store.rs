//! The atom store: a typed, content-addressed hypergraph.
//!
//! All data lives in one arena of interned atoms. Nodes carry a name, links
//! carry an ordered list of child ids, and both carry a type from the
//! registry.
//!
//! Key design principles:
//! - **Interned**: structurally equal atoms share a single id
//! - **Append-only**: ids are insertion indices and stay valid for the
//!   lifetime of the store
//! - **Indexed**: incoming sets and per-type carriers are maintained on
//!   insert, so traversals never scan the arena

use indexmap::IndexSet;
use roaring::RoaringTreemap;

use crate::error::ReadError;
use crate::id::{AtomId, TypeId};
use crate::term::Term;
use crate::types::{self, TypeRegistry};

// ============================================================================
// KEYS
// ============================================================================

/// The interned shape of an atom: a named node, or a link over earlier ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AtomKey {
    Node(TypeId, String),
    Link(TypeId, Vec<AtomId>),
}

// ============================================================================
// VIEW TRAITS
// ============================================================================

/// Read access to a store of atoms.
///
/// `Store` implements this directly; `Overlay` implements it over a base
/// store plus scratch atoms, so searches can run against a widened view
/// without touching the base.
pub trait AtomView {
    fn types(&self) -> &TypeRegistry;
    fn len(&self) -> usize;
    fn key(&self, id: AtomId) -> &AtomKey;
    /// Ids of links that have `id` among their children.
    fn incoming(&self, id: AtomId) -> RoaringTreemap;
    /// Ids whose type is exactly `ty`.
    fn atoms_of_type(&self, ty: TypeId) -> RoaringTreemap;
    /// True when the atom is a variable or has one in its substructure.
    fn has_variables(&self, id: AtomId) -> bool;
    fn lookup_node(&self, ty: TypeId, name: &str) -> Option<AtomId>;
    fn lookup_link(&self, ty: TypeId, children: &[AtomId]) -> Option<AtomId>;

    /// True when the atom is scratch structure layered over a base store
    /// rather than data. Always false for a `Store`.
    fn is_scratch(&self, _id: AtomId) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn atom_type(&self, id: AtomId) -> TypeId {
        match self.key(id) {
            AtomKey::Node(ty, _) | AtomKey::Link(ty, _) => *ty,
        }
    }

    fn node_name(&self, id: AtomId) -> Option<&str> {
        match self.key(id) {
            AtomKey::Node(_, name) => Some(name.as_str()),
            AtomKey::Link(..) => None,
        }
    }

    fn outgoing(&self, id: AtomId) -> &[AtomId] {
        match self.key(id) {
            AtomKey::Node(..) => &[],
            AtomKey::Link(_, children) => children,
        }
    }

    fn is_link(&self, id: AtomId) -> bool {
        matches!(self.key(id), AtomKey::Link(..))
    }

    fn arity(&self, id: AtomId) -> usize {
        self.outgoing(id).len()
    }

    /// Ids whose type is `ty` or any subtype of it.
    fn atoms_isa(&self, ty: TypeId) -> RoaringTreemap {
        let mut out = RoaringTreemap::new();
        for sub in self.types().subtypes(ty) {
            out |= self.atoms_of_type(sub);
        }
        out
    }

    /// Rebuilds the atom as a self-contained term.
    fn export_term(&self, id: AtomId) -> Term {
        match self.key(id) {
            AtomKey::Node(ty, name) => Term::Node(*ty, name.clone()),
            AtomKey::Link(ty, children) => {
                Term::Link(*ty, children.iter().map(|&c| self.export_term(c)).collect())
            }
        }
    }

    /// Resolves a term to its interned id, without inserting anything.
    /// `None` when the term (or any subterm) is not in the view.
    fn lookup_term(&self, term: &Term) -> Option<AtomId> {
        match term {
            Term::Node(ty, name) => self.lookup_node(*ty, name),
            Term::Link(ty, children) => {
                let ids = children
                    .iter()
                    .map(|c| self.lookup_term(c))
                    .collect::<Option<Vec<AtomId>>>()?;
                self.lookup_link(*ty, &ids)
            }
        }
    }

    /// Ids with no incoming links.
    fn roots(&self) -> RoaringTreemap {
        let mut out = RoaringTreemap::new();
        for id in 0..self.len() {
            if self.incoming(id).is_empty() {
                out.insert(id as u64);
            }
        }
        out
    }
}

/// Write access: interning atoms into a store or an overlay.
pub trait AtomSink: AtomView {
    fn add_node(&mut self, ty: TypeId, name: &str) -> AtomId;
    /// Children must already be interned in this view.
    fn add_link(&mut self, ty: TypeId, children: Vec<AtomId>) -> AtomId;

    /// Interns a term bottom-up, returning the id of its root.
    fn intern_term(&mut self, term: &Term) -> AtomId {
        match term {
            Term::Node(ty, name) => self.add_node(*ty, name),
            Term::Link(ty, children) => {
                let ids = children.iter().map(|c| self.intern_term(c)).collect();
                self.add_link(*ty, ids)
            }
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// The owning store: registry plus interned atoms and their indexes.
pub struct Store {
    pub types: TypeRegistry,
    atoms: IndexSet<AtomKey>,
    incoming: Vec<RoaringTreemap>,
    carriers: Vec<RoaringTreemap>,
    varying: RoaringTreemap,
}

impl Store {
    pub fn new() -> Self {
        let types = TypeRegistry::bootstrap();
        let carriers = vec![RoaringTreemap::new(); types.len()];
        Store {
            types,
            atoms: IndexSet::new(),
            incoming: Vec::new(),
            carriers,
            varying: RoaringTreemap::new(),
        }
    }

    /// Parses `input` and interns every top-level form, returning ids in
    /// source order. Nothing is interned when any form fails to read.
    pub fn load_source(&mut self, input: &str) -> Result<Vec<AtomId>, ReadError> {
        let terms = crate::read_terms(&self.types, input)?;
        Ok(terms.iter().map(|t| self.intern_term(t)).collect())
    }

    // The registry is public and may have grown since the last insert.
    fn carrier_mut(&mut self, ty: TypeId) -> &mut RoaringTreemap {
        if self.carriers.len() < self.types.len() {
            self.carriers.resize_with(self.types.len(), RoaringTreemap::new);
        }
        &mut self.carriers[ty]
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl AtomView for Store {
    fn types(&self) -> &TypeRegistry {
        &self.types
    }

    fn len(&self) -> usize {
        self.atoms.len()
    }

    fn key(&self, id: AtomId) -> &AtomKey {
        &self.atoms[id]
    }

    fn incoming(&self, id: AtomId) -> RoaringTreemap {
        self.incoming.get(id).cloned().unwrap_or_default()
    }

    fn atoms_of_type(&self, ty: TypeId) -> RoaringTreemap {
        self.carriers.get(ty).cloned().unwrap_or_default()
    }

    fn has_variables(&self, id: AtomId) -> bool {
        self.varying.contains(id as u64)
    }

    fn lookup_node(&self, ty: TypeId, name: &str) -> Option<AtomId> {
        self.atoms.get_index_of(&AtomKey::Node(ty, name.to_string()))
    }

    fn lookup_link(&self, ty: TypeId, children: &[AtomId]) -> Option<AtomId> {
        self.atoms.get_index_of(&AtomKey::Link(ty, children.to_vec()))
    }
}

impl AtomSink for Store {
    fn add_node(&mut self, ty: TypeId, name: &str) -> AtomId {
        let key = AtomKey::Node(ty, name.to_string());
        if let Some(id) = self.atoms.get_index_of(&key) {
            return id;
        }
        let (id, _) = self.atoms.insert_full(key);
        self.incoming.push(RoaringTreemap::new());
        self.carrier_mut(ty).insert(id as u64);
        if self.types.is_a(ty, types::VARIABLE) {
            self.varying.insert(id as u64);
        }
        id
    }

    fn add_link(&mut self, ty: TypeId, children: Vec<AtomId>) -> AtomId {
        debug_assert!(children.iter().all(|&c| c < self.atoms.len()));
        let has_vars = children.iter().any(|&c| self.varying.contains(c as u64));
        let key = AtomKey::Link(ty, children);
        if let Some(id) = self.atoms.get_index_of(&key) {
            return id;
        }
        let (id, _) = self.atoms.insert_full(key);
        self.incoming.push(RoaringTreemap::new());
        self.carrier_mut(ty).insert(id as u64);
        if has_vars || self.types.is_a(ty, types::VARIABLE) {
            self.varying.insert(id as u64);
        }
        if let Some(AtomKey::Link(_, children)) = self.atoms.get_index(id) {
            for &c in children {
                self.incoming[c].insert(id as u64);
            }
        }
        id
    }
}

// Unit tests are in tests/unit_store.rs
