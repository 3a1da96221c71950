//! Dense identifiers for interned atoms and registered types.
//!
//! The store and the type registry both hand out ids sequentially, so a plain
//! index is the whole identity. `OptAtomId` packs the unbound case into the
//! same machine word via `NonMaxUsize`, which keeps binding vectors flat.

pub use nonminmax::NonMaxUsize;

/// Index of an interned atom within a store (or an overlay over one).
pub type AtomId = usize;

/// Index of a registered type within the type registry.
pub type TypeId = usize;

/// An [`AtomId`] that may be unbound, without widening the representation.
pub type OptAtomId = Option<NonMaxUsize>;

#[inline]
pub fn some_atom(id: AtomId) -> OptAtomId {
    NonMaxUsize::new(id)
}

#[inline]
pub fn get_atom(opt: OptAtomId) -> Option<AtomId> {
    opt.map(|n| n.get())
}
