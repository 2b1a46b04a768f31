use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::Release;
use crate::release::is_same_object;

/// A batch of deferred releases.
///
/// Every [`add()`][Self::add] records one release that is owed to the object. The debt is
/// discharged by [`clear()`][Self::clear], which calls [`Release::release()`] once per recorded
/// occurrence in the order the occurrences were added. An object added N times is released N
/// times.
///
/// The pool never calls [`Release::retain()`]. It holds an `Rc` handle to each pending object,
/// which only keeps the memory alive until the owed release has been issued.
///
/// Most code does not use this type directly but goes through a
/// [`PoolManager`][crate::PoolManager], which keeps a stack of pools and routes deferred releases
/// to the innermost one.
///
/// # Resource management
///
/// Dropping the pool drains it first. A pending release is never silently dropped.
///
/// # Thread safety
///
/// This type is single-threaded and is neither [`Send`] nor [`Sync`].
///
/// # Example
///
/// ```
/// use autorelease::{AutoreleasePool, Object, Release};
///
/// let pool = AutoreleasePool::new();
///
/// let name = Object::new("player".to_string());
/// name.retain();
/// pool.add(&name);
/// assert_eq!(name.retain_count(), 2);
///
/// pool.clear();
/// assert_eq!(name.retain_count(), 1);
/// assert!(pool.is_empty());
/// ```
pub struct AutoreleasePool {
    // Front is the oldest entry. Draining pops from the front so the release order
    // is the insertion order.
    pending: RefCell<VecDeque<Rc<dyn Release>>>,
}

impl AutoreleasePool {
    /// Creates a new empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(VecDeque::new()),
        }
    }

    /// Records one deferred release of `object`.
    ///
    /// This has no effect on the reference count of the object. The release will be issued
    /// when the pool is cleared or dropped.
    pub fn add<R>(&self, object: &Rc<R>)
    where
        R: Release + 'static,
    {
        self.add_erased(Rc::<R>::clone(object));
    }

    /// Records one deferred release of a type-erased `object`.
    ///
    /// Same as [`add()`][Self::add] for callers that only hold an `Rc<dyn Release>`.
    pub fn add_erased(&self, object: Rc<dyn Release>) {
        self.pending.borrow_mut().push_back(object);
    }

    /// Cancels one deferred release of `object` without issuing it.
    ///
    /// Only the oldest pending occurrence is removed. If the object was added twice, one call
    /// cancels one of the two owed releases.
    ///
    /// Returns `false` and does nothing if the object has no pending release in this pool.
    pub fn remove<R>(&self, object: &Rc<R>) -> bool
    where
        R: Release + ?Sized,
    {
        let mut pending = self.pending.borrow_mut();

        let Some(index) = pending
            .iter()
            .position(|candidate| is_same_object(candidate, object))
        else {
            return false;
        };

        // We hold on to the removed handle until after the borrow is released, so that dropping
        // the last Rc to an object cannot run arbitrary drop logic while the queue is borrowed.
        let removed = pending.remove(index);
        drop(pending);
        drop(removed);

        true
    }

    /// Issues every pending release, oldest first, and leaves the pool empty.
    ///
    /// The queue is not borrowed while an object is being released. Release logic may add
    /// objects to this pool or remove them from it. Objects added during the drain are released
    /// by the same call.
    pub fn clear(&self) {
        let mut released: usize = 0;

        while let Some(object) = self.take_oldest() {
            object.release();
            released = released.wrapping_add(1);
        }

        if released > 0 {
            tracing::trace!(released, "drained autorelease pool");
        }
    }

    /// Whether `object` has at least one pending release in this pool.
    #[must_use]
    pub fn contains<R>(&self, object: &Rc<R>) -> bool
    where
        R: Release + ?Sized,
    {
        self.pending
            .borrow()
            .iter()
            .any(|candidate| is_same_object(candidate, object))
    }

    /// Number of pending releases, counting repeated occurrences of the same object.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Whether the pool has no pending releases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    // A separate function so the `RefMut` is dropped before the caller sees the object.
    // In a `while let` scrutinee the temporary borrow would live for the whole loop body.
    fn take_oldest(&self) -> Option<Rc<dyn Release>> {
        self.pending.borrow_mut().pop_front()
    }
}

impl Default for AutoreleasePool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AutoreleasePool {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for AutoreleasePool {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoreleasePool")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::{Cell, RefCell};

    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(AutoreleasePool: Send, Sync);

    type Log = Rc<RefCell<Vec<&'static str>>>;

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        releases: Cell<usize>,
        log: Log,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Rc<Self> {
            Rc::new(Self {
                name,
                releases: Cell::new(0),
                log: Rc::clone(log),
            })
        }
    }

    impl Release for Recorder {
        fn retain(&self) {
            panic!("the pool must never retain");
        }

        fn release(&self) {
            self.releases.set(self.releases.get() + 1);
            self.log.borrow_mut().push(self.name);
        }

        fn retain_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn add_has_no_side_effect() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);

        pool.add(&a);

        assert_eq!(a.releases.get(), 0);
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&a));
    }

    #[test]
    fn clear_releases_each_occurrence() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);

        pool.add(&a);
        pool.add(&a);
        pool.add(&a);
        pool.clear();

        assert_eq!(a.releases.get(), 3);
        assert!(pool.is_empty());
    }

    #[test]
    fn clear_releases_in_insertion_order() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);
        let b = Recorder::new("b", &log);
        let c = Recorder::new("c", &log);

        pool.add(&b);
        pool.add(&a);
        pool.add(&c);
        pool.add(&a);
        pool.clear();

        assert_eq!(*log.borrow(), ["b", "a", "c", "a"]);
    }

    #[test]
    fn remove_cancels_release() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);
        let b = Recorder::new("b", &log);

        pool.add(&a);
        pool.add(&b);
        assert!(pool.remove(&a));
        pool.clear();

        assert_eq!(a.releases.get(), 0);
        assert_eq!(*log.borrow(), ["b"]);
    }

    #[test]
    fn remove_cancels_only_one_occurrence() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);

        pool.add(&a);
        pool.add(&a);
        assert!(pool.remove(&a));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&a));

        pool.clear();
        assert_eq!(a.releases.get(), 1);
    }

    #[test]
    fn remove_takes_oldest_occurrence() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);
        let b = Recorder::new("b", &log);

        pool.add(&a);
        pool.add(&b);
        pool.add(&a);
        assert!(pool.remove(&a));
        pool.clear();

        assert_eq!(*log.borrow(), ["b", "a"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);
        let b = Recorder::new("b", &log);

        pool.add(&a);
        assert!(!pool.remove(&b));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn remove_through_dyn_handle() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);
        let erased: Rc<dyn Release> = Rc::<Recorder>::clone(&a);

        pool.add(&a);
        assert!(pool.remove(&erased));
        assert!(pool.is_empty());
    }

    #[test]
    fn erased_handle_is_drained() {
        let log = Log::default();
        let pool = AutoreleasePool::new();
        let a = Recorder::new("a", &log);
        let erased: Rc<dyn Release> = Rc::<Recorder>::clone(&a);

        pool.add_erased(Rc::clone(&erased));
        pool.add(&a);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&erased));

        pool.clear();
        assert_eq!(a.releases.get(), 2);
    }

    #[test]
    fn drop_drains() {
        let log = Log::default();
        let a = Recorder::new("a", &log);

        {
            let pool = AutoreleasePool::new();
            pool.add(&a);
        }

        assert_eq!(a.releases.get(), 1);
    }

    #[test]
    fn clear_on_empty_pool_is_noop() {
        let pool = AutoreleasePool::default();
        pool.clear();
        assert!(pool.is_empty());
    }

    /// Releases another pending object from its own release logic, the way destruction of a
    /// parent might cancel the deferred release of a child it tears down itself.
    struct Parent {
        pool: Rc<AutoreleasePool>,
        child: Rc<Recorder>,
        late: Rc<Recorder>,
    }

    impl Release for Parent {
        fn retain(&self) {}

        fn release(&self) {
            self.pool.remove(&self.child);
            self.pool.add(&self.late);
        }

        fn retain_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn release_logic_may_reenter_pool() {
        let log = Log::default();
        let pool = Rc::new(AutoreleasePool::new());
        let child = Recorder::new("child", &log);
        let late = Recorder::new("late", &log);
        let parent = Rc::new(Parent {
            pool: Rc::clone(&pool),
            child: Rc::clone(&child),
            late: Rc::clone(&late),
        });

        pool.add(&parent);
        pool.add(&child);
        pool.clear();

        assert_eq!(child.releases.get(), 0);
        assert_eq!(late.releases.get(), 1);
        assert!(pool.is_empty());
    }
}
