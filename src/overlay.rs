//! Overlay: a scratch layer of atoms over an immutable base store.
//!
//! Query compilation interns temporary structure (variables, pattern links,
//! the query scope itself) that must not leak into the base. An overlay
//! gives those atoms ids without copying the base.
//!
//! # Addressing
//!
//! Base atoms keep ids `0..base.len()`. Scratch atoms get ids
//! `base.len()..base.len()+delta_len()`, so the address space is contiguous
//! and reads fall through to the base below the split point.

use std::collections::HashMap;

use indexmap::IndexSet;
use roaring::RoaringTreemap;

use crate::id::{AtomId, TypeId};
use crate::store::{AtomKey, AtomSink, AtomView, Store};
use crate::types::{self, TypeRegistry};

pub struct Overlay<'a> {
    base: &'a Store,
    delta: IndexSet<AtomKey>,
    delta_incoming: HashMap<AtomId, RoaringTreemap>,
    delta_carriers: HashMap<TypeId, RoaringTreemap>,
    delta_varying: RoaringTreemap,
}

impl<'a> Overlay<'a> {
    pub fn new(base: &'a Store) -> Self {
        Overlay {
            base,
            delta: IndexSet::new(),
            delta_incoming: HashMap::new(),
            delta_carriers: HashMap::new(),
            delta_varying: RoaringTreemap::new(),
        }
    }

    pub fn base(&self) -> &'a Store {
        self.base
    }

    pub fn delta_len(&self) -> usize {
        self.delta.len()
    }

    fn delta_index(&self, key: &AtomKey) -> Option<AtomId> {
        self.delta.get_index_of(key).map(|i| self.base.len() + i)
    }
}

impl AtomView for Overlay<'_> {
    fn types(&self) -> &TypeRegistry {
        &self.base.types
    }

    fn len(&self) -> usize {
        self.base.len() + self.delta.len()
    }

    fn key(&self, id: AtomId) -> &AtomKey {
        if id < self.base.len() {
            self.base.key(id)
        } else {
            &self.delta[id - self.base.len()]
        }
    }

    fn incoming(&self, id: AtomId) -> RoaringTreemap {
        let mut out = if id < self.base.len() {
            self.base.incoming(id)
        } else {
            RoaringTreemap::new()
        };
        if let Some(extra) = self.delta_incoming.get(&id) {
            out |= extra;
        }
        out
    }

    fn atoms_of_type(&self, ty: TypeId) -> RoaringTreemap {
        let mut out = self.base.atoms_of_type(ty);
        if let Some(extra) = self.delta_carriers.get(&ty) {
            out |= extra;
        }
        out
    }

    fn has_variables(&self, id: AtomId) -> bool {
        if id < self.base.len() {
            self.base.has_variables(id)
        } else {
            self.delta_varying.contains(id as u64)
        }
    }

    /// Scratch atoms are exactly the delta: everything at or past the split.
    fn is_scratch(&self, id: AtomId) -> bool {
        id >= self.base.len()
    }

    fn lookup_node(&self, ty: TypeId, name: &str) -> Option<AtomId> {
        let key = AtomKey::Node(ty, name.to_string());
        self.base
            .lookup_node(ty, name)
            .or_else(|| self.delta_index(&key))
    }

    fn lookup_link(&self, ty: TypeId, children: &[AtomId]) -> Option<AtomId> {
        self.base
            .lookup_link(ty, children)
            .or_else(|| self.delta_index(&AtomKey::Link(ty, children.to_vec())))
    }
}

impl AtomSink for Overlay<'_> {
    fn add_node(&mut self, ty: TypeId, name: &str) -> AtomId {
        if let Some(id) = self.lookup_node(ty, name) {
            return id;
        }
        let key = AtomKey::Node(ty, name.to_string());
        let (index, _) = self.delta.insert_full(key);
        let id = self.base.len() + index;
        self.delta_carriers.entry(ty).or_default().insert(id as u64);
        if self.base.types.is_a(ty, types::VARIABLE) {
            self.delta_varying.insert(id as u64);
        }
        id
    }

    fn add_link(&mut self, ty: TypeId, children: Vec<AtomId>) -> AtomId {
        debug_assert!(children.iter().all(|&c| c < self.len()));
        if let Some(id) = self.lookup_link(ty, &children) {
            return id;
        }
        let has_vars = children.iter().any(|&c| self.has_variables(c));
        let out: Vec<AtomId> = children.clone();
        let (index, _) = self.delta.insert_full(AtomKey::Link(ty, children));
        let id = self.base.len() + index;
        self.delta_carriers.entry(ty).or_default().insert(id as u64);
        if has_vars || self.base.types.is_a(ty, types::VARIABLE) {
            self.delta_varying.insert(id as u64);
        }
        for c in out {
            self.delta_incoming.entry(c).or_default().insert(id as u64);
        }
        id
    }
}

// Property tests are in tests/proptest_store.rs
