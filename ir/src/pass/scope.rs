//! A stack of key/value bindings, for tracking things that are in scope
//! while walking nested binders. Pushing shadows, popping unshadows.

use std::collections::HashMap;
use std::hash::Hash;

use mirage_base::internal_assert;

pub struct Scope<K, V> {
    stacks: HashMap<K, Vec<V>>,
}

impl<K: Eq + Hash, V> Scope<K, V> {
    pub fn new() -> Self {
        Self { stacks: HashMap::new() }
    }

    /// Bind `value` to `key`, shadowing any existing binding.
    pub fn push(&mut self, key: K, value: V) {
        self.stacks.entry(key).or_default().push(value);
    }

    /// Undo the innermost binding for `key`. Popping an unbound key is an
    /// internal error.
    pub fn pop(&mut self, key: K) {
        let stack = self.stacks.get_mut(&key);
        let popped = stack.and_then(Vec::pop);
        internal_assert!(popped.is_some(), "popping a name not in scope");
    }

    /// Is some binding for `key` in scope?
    pub fn contains(&self, key: &K) -> bool {
        self.stacks.get(key).is_some_and(|stack| !stack.is_empty())
    }

    /// The innermost binding for `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.stacks.get(key).and_then(|stack| stack.last())
    }
}

impl<K: Eq + Hash, V> Default for Scope<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
