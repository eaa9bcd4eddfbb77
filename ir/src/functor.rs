//! Open dynamic dispatch tables.
//!
//! An [`IrFunctor`] is a vector of callbacks indexed by runtime type index.
//! A dispatch family (printer, analyser, ...) picks a callback type `F`,
//! registers one callback per node kind it handles, and looks callbacks up
//! by node. Third-party passes can extend a family's table without touching
//! the node definitions; [`DispatchGuard`] makes such extensions scoped so a
//! dynamically loaded plugin can unregister itself on unload.

use mirage_base::{internal_assert, internal_error};
use parking_lot::RwLock;

use crate::expr::{IrNodeKind, IrRef};
use crate::registry;

/// A per-kind callback table for one dispatch family.
pub struct IrFunctor<F> {
    table: Vec<Option<F>>,
}

impl<F> Default for IrFunctor<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> IrFunctor<F> {
    pub fn new() -> Self {
        Self { table: Vec::new() }
    }

    /// Is a callback registered for this node's kind?
    pub fn can_dispatch(&self, n: IrRef<'_>) -> bool {
        let index = n.type_index() as usize;
        index < self.table.len() && self.table[index].is_some()
    }

    /// The callback for this node's kind. Looking up an unregistered kind
    /// is an internal error naming the offending type key.
    pub fn get(&self, n: IrRef<'_>) -> &F {
        let index = n.type_index() as usize;
        match self.table.get(index).and_then(Option::as_ref) {
            Some(f) => f,
            None => internal_error!(
                "IrFunctor calls un-registered function on type {}",
                registry::type_index_to_key(n.type_index())
            ),
        }
    }

    /// Register the callback for kind `K`. Registering a kind twice is an
    /// internal error; use `clear_dispatch` first to replace.
    pub fn set_dispatch<K: IrNodeKind>(&mut self, f: F) -> &mut Self {
        let index = registry::type_key_to_index(K::TYPE_KEY) as usize;
        if self.table.len() <= index {
            self.table.resize_with(index + 1, || None);
        }
        internal_assert!(
            self.table[index].is_none(),
            "Dispatch for {} is already set",
            K::TYPE_KEY
        );
        self.table[index] = Some(f);
        self
    }

    /// Remove the callback for kind `K`, if any.
    pub fn clear_dispatch<K: IrNodeKind>(&mut self) -> &mut Self {
        let index = registry::type_key_to_index(K::TYPE_KEY) as usize;
        if index < self.table.len() {
            self.table[index] = None;
        }
        self
    }

    /// Look up and invoke in one step, for families whose callbacks take
    /// `(node, context)`.
    pub fn dispatch<C, R>(&self, n: IrRef<'_>, ctx: &mut C) -> R
    where
        F: Fn(IrRef<'_>, &mut C) -> R,
    {
        (self.get(n))(n, ctx)
    }
}

/// Records registrations against `'static` functor tables and clears them
/// all when dropped, in reverse registration order.
#[derive(Default)]
pub struct DispatchGuard {
    undo: Vec<Box<dyn FnOnce() + Send>>,
}

impl DispatchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` for kind `K` in a global table, to be unregistered when
    /// this guard drops.
    pub fn set_dispatch<K, F>(
        &mut self,
        table: &'static RwLock<IrFunctor<F>>,
        f: F,
    ) -> &mut Self
    where
        K: IrNodeKind,
        F: Send + Sync + 'static,
    {
        table.write().set_dispatch::<K>(f);
        self.undo.push(Box::new(move || {
            table.write().clear_dispatch::<K>();
        }));
        self
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        for undo in self.undo.drain(..).rev() {
            undo();
        }
    }
}
