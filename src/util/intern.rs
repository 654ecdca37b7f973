//! String interner for resource ids
//!
//! Resource ids are cloned into every edge list, state-store key, and event.
//! Interning gives a single allocation per unique id and O(1) `Arc` clones.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

static POOL: LazyLock<DashMap<Box<str>, Arc<str>>> = LazyLock::new(DashMap::new);

/// Intern a string, returning a shared `Arc<str>`.
///
/// Repeated calls with the same string return clones of the same allocation.
pub fn intern(s: &str) -> Arc<str> {
    if let Some(existing) = POOL.get(s) {
        return Arc::clone(existing.value());
    }
    let arc: Arc<str> = Arc::from(s);
    POOL.insert(Box::from(s), Arc::clone(&arc));
    arc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_allocation() {
        let a = intern("web-deployment");
        let b = intern("web-deployment");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn intern_distinct_strings() {
        let a = intern("alpha-node");
        let b = intern("beta-node");
        assert_ne!(a.as_ref(), b.as_ref());
    }

    #[test]
    fn intern_is_thread_safe() {
        use std::thread;

        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| intern("shared-id")))
            .collect();

        let arcs: Vec<Arc<str>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in arcs.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }
}
