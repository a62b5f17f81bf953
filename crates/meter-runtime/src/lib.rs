// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Small shared-state primitives used by the long-lived singletons of the
//! orchestrator: the scheduler's in-flight guards, the sandbox manager's
//! live-sandbox map, and the dashboard cache's memory tier.

use std::sync::{Arc, RwLock};

/// A thread-safe, atomically-replaceable snapshot list.
///
/// `Shared<T>` wraps `Arc<RwLock<Arc<[T]>>>` so readers get a cheap clone of
/// the current snapshot without holding the lock, and writers replace the
/// whole collection in one atomic swap. Used wherever a small amount of
/// global mutable state needs explicit init/reset between test cases.
pub struct Shared<T: Send + Sync + 'static>(Arc<RwLock<Arc<[T]>>>);

impl<T: Send + Sync + 'static> Shared<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(Arc::new(RwLock::new(items.into_boxed_slice().into())))
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    #[must_use]
    pub fn get(&self) -> Arc<[T]> {
        self.0.read().expect("Shared lock poisoned").clone()
    }

    pub fn set(&self, items: Vec<T>) {
        let new: Arc<[T]> = items.into_boxed_slice().into();
        *self.0.write().expect("Shared lock poisoned") = new;
    }
}

impl<T: Send + Sync + 'static> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Send + Sync + 'static> Default for Shared<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single boolean flag shared across tasks, used as the scheduler's
/// non-overlap guard (spec invariant: at most one run of each suite
/// in-flight at any instant).
#[derive(Clone)]
pub struct GuardFlag(Arc<std::sync::atomic::AtomicBool>);

impl GuardFlag {
    pub fn new() -> Self {
        Self(Arc::new(std::sync::atomic::AtomicBool::new(false)))
    }

    /// Attempt to acquire the guard. Returns `true` if this caller now holds
    /// it (it was free), `false` if another caller already holds it.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(
                false,
                true,
                std::sync::atomic::Ordering::SeqCst,
                std::sync::atomic::Ordering::SeqCst,
            )
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Default for GuardFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII helper that releases a [`GuardFlag`] on drop, so a suite tick that
/// panics or returns early via `?` still frees the guard for the next tick.
pub struct GuardScope(GuardFlag);

impl GuardScope {
    /// Try to acquire `flag`; returns `None` if already held.
    pub fn acquire(flag: &GuardFlag) -> Option<Self> {
        if flag.try_acquire() {
            Some(Self(flag.clone()))
        } else {
            None
        }
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        self.0.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_get_reflects_initial_items() {
        let s = Shared::new(vec![1, 2, 3]);
        assert_eq!(&*s.get(), &[1, 2, 3]);
    }

    #[test]
    fn shared_set_replaces_atomically() {
        let s = Shared::new(vec![1]);
        s.set(vec![9, 9]);
        assert_eq!(&*s.get(), &[9, 9]);
    }

    #[test]
    fn shared_empty_starts_with_no_items() {
        let s: Shared<i32> = Shared::empty();
        assert_eq!(s.get().len(), 0);
    }

    #[test]
    fn shared_clone_shares_storage() {
        let s = Shared::new(vec![1]);
        let s2 = s.clone();
        s.set(vec![2, 3]);
        assert_eq!(&*s2.get(), &[2, 3]);
    }

    #[test]
    fn guard_flag_second_acquire_fails_while_held() {
        let g = GuardFlag::new();
        assert!(g.try_acquire());
        assert!(!g.try_acquire());
    }

    #[test]
    fn guard_flag_release_allows_reacquire() {
        let g = GuardFlag::new();
        assert!(g.try_acquire());
        g.release();
        assert!(g.try_acquire());
    }

    #[test]
    fn guard_scope_releases_on_drop() {
        let g = GuardFlag::new();
        {
            let _scope = GuardScope::acquire(&g).expect("should acquire");
            assert!(g.is_held());
        }
        assert!(!g.is_held());
    }

    #[test]
    fn guard_scope_acquire_fails_when_already_held() {
        let g = GuardFlag::new();
        let _scope = GuardScope::acquire(&g).expect("first acquire succeeds");
        assert!(GuardScope::acquire(&g).is_none());
    }
}
