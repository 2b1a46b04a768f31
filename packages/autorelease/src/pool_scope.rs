use std::thread;

use crate::PoolManager;

/// Keeps a pool pushed on a [`PoolManager`] for as long as the guard is alive.
///
/// Created by [`PoolManager::push_scoped()`]. Dropping the guard pops the pool, which drains it.
/// The pool is also popped when the guard is dropped during unwinding.
///
/// Guards must be dropped in the reverse order of their creation. Because the guard borrows the
/// manager, the usual lexical scoping of Rust takes care of this unless guards are moved around
/// or the same manager is pushed and popped manually while a guard is alive.
#[derive(Debug)]
#[must_use = "the pool is popped as soon as the guard is dropped"]
pub struct PoolScope<'a> {
    manager: &'a PoolManager,

    // Stack depth right after our push, used to detect push/pop imbalance inside the scope.
    depth: usize,
}

impl<'a> PoolScope<'a> {
    pub(crate) fn new(manager: &'a PoolManager) -> Self {
        Self {
            manager,
            depth: manager.depth(),
        }
    }
}

impl Drop for PoolScope<'_> {
    fn drop(&mut self) {
        // A second panic during unwinding would abort, so we only check balance on the happy path.
        if !thread::panicking() {
            assert_eq!(
                self.manager.depth(),
                self.depth,
                "pool stack depth changed inside a pool scope; some push() or pop() is unmatched"
            );
        }

        _ = self.manager.try_pop();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::Release;

    assert_not_impl_any!(PoolScope<'static>: Send, Sync);

    #[derive(Debug, Default)]
    struct Recorder {
        releases: Cell<usize>,
    }

    impl Release for Recorder {
        fn retain(&self) {}

        fn release(&self) {
            self.releases.set(self.releases.get() + 1);
        }

        fn retain_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn guard_pops_on_drop() {
        let manager = PoolManager::new();
        let a = Rc::new(Recorder::default());

        let scope = manager.push_scoped();
        manager.add_object(&a);
        assert_eq!(manager.depth(), 1);

        drop(scope);
        assert_eq!(manager.depth(), 0);
        assert_eq!(a.releases.get(), 1);
    }

    #[test]
    fn nested_guards() {
        let manager = PoolManager::new();
        let outer_object = Rc::new(Recorder::default());
        let inner_object = Rc::new(Recorder::default());

        let _outer = manager.push_scoped();
        manager.add_object(&outer_object);

        {
            let _inner = manager.push_scoped();
            manager.add_object(&inner_object);
        }

        assert_eq!(inner_object.releases.get(), 1);
        assert_eq!(outer_object.releases.get(), 0);
        assert_eq!(manager.depth(), 1);
    }

    #[test]
    fn guard_pops_on_unwind() {
        let manager = PoolManager::new();
        let a = Rc::new(Recorder::default());

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            manager.scope(|| {
                manager.add_object(&a);
                panic!("boom");
            });
        }));

        assert!(result.is_err());
        assert_eq!(manager.depth(), 0);
        assert_eq!(a.releases.get(), 1);
    }

    #[test]
    #[should_panic]
    fn unbalanced_push_inside_scope_panics() {
        let manager = PoolManager::new();

        let scope = manager.push_scoped();
        manager.push();
        drop(scope);
    }
}
