//! Ordered callback lists.
//!
//! Callbacks are identified by their `Arc` allocation, so registering a clone
//! of the same `Arc` refers to the same subscriber while two separately
//! allocated closures are always distinct.

use std::sync::Arc;

/// How a [`CallbackList`] treats a callback that is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Every registration is kept; a callback registered twice fires twice.
    Multiset,
    /// A second registration of the same callback is ignored.
    Unique,
}

/// Subscribers for one notification key, in registration order.
pub struct CallbackList<F: ?Sized> {
    callbacks: Vec<Arc<F>>,
    policy: DedupPolicy,
}

impl<F: ?Sized> CallbackList<F> {
    /// Creates an empty list with the given dedupe policy.
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            callbacks: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Registers a callback.
    ///
    /// Returns false if the list is [`DedupPolicy::Unique`] and the callback
    /// was already present.
    pub fn register(&mut self, callback: Arc<F>) -> bool {
        if self.policy == DedupPolicy::Unique && self.contains(&callback) {
            return false;
        }
        self.callbacks.push(callback);
        true
    }

    /// Removes the first registration of `callback`.
    ///
    /// Returns false (and does nothing) if it was not registered.
    pub fn unregister(&mut self, callback: &Arc<F>) -> bool {
        match self.callbacks.iter().position(|c| same_callback(c, callback)) {
            Some(pos) => {
                self.callbacks.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns true if `callback` is registered at least once.
    pub fn contains(&self, callback: &Arc<F>) -> bool {
        self.callbacks.iter().any(|c| same_callback(c, callback))
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Iterates over callbacks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<F>> {
        self.callbacks.iter()
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }
}

impl<F: ?Sized> std::fmt::Debug for CallbackList<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.callbacks.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Compares allocations only; vtable pointers of the same closure may differ
/// between codegen units.
fn same_callback<F: ?Sized>(a: &Arc<F>, b: &Arc<F>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
