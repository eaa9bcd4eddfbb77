//! The process-wide runtime type-index registry.
//!
//! Each node kind has a stable string type key (`"Add"`, `"IntImm"`, ...).
//! The first time a key is seen, it is assigned the next free `u32` index;
//! indices are contiguous from 0 and stable for the lifetime of the process,
//! though the key-to-index mapping can differ between runs. Dispatch tables
//! ([`crate::functor::IrFunctor`]) are vectors indexed by these.

use std::collections::HashMap;
use std::sync::LazyLock;

use mirage_base::internal_assert;
use parking_lot::RwLock;

struct Registry {
    keys: Vec<&'static str>,
    by_key: HashMap<&'static str, u32>,
}

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| {
    RwLock::new(Registry { keys: Vec::new(), by_key: HashMap::new() })
});

/// Index for a type key, assigning the next free one on first encounter.
pub fn type_key_to_index(key: &'static str) -> u32 {
    if let Some(&index) = REGISTRY.read().by_key.get(key) {
        return index;
    }
    let mut registry = REGISTRY.write();
    // Another thread may have raced us between the locks.
    if let Some(&index) = registry.by_key.get(key) {
        return index;
    }
    let index = registry.keys.len() as u32;
    registry.keys.push(key);
    registry.by_key.insert(key, index);
    tracing::trace!(key, index, "registered IR type key");
    index
}

/// The key a given index was assigned to.
pub fn type_index_to_key(index: u32) -> &'static str {
    let registry = REGISTRY.read();
    internal_assert!(
        (index as usize) < registry.keys.len(),
        "type index {index} was never registered"
    );
    registry.keys[index as usize]
}

/// How many distinct kinds have been seen so far.
pub fn registered_type_count() -> usize {
    REGISTRY.read().keys.len()
}
