use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Error, PoolManager, Release, Result};

/// A value with a manual reference count that is destroyed by its final release.
///
/// An `Object` starts with a reference count of one, owned by the code that created it. Each
/// [`retain()`][Release::retain] adds a reference and each [`release()`][Release::release] gives
/// one up. When the count reaches zero the payload `T` is dropped; the `Object` itself stays
/// allocated for as long as `Rc` handles to it exist but reports [`Error::ObjectDestroyed`] on
/// access.
///
/// Instead of releasing a reference right away, it can be handed to the current autorelease
/// pool via [`autorelease()`][Self::autorelease], which issues the release when that pool
/// is popped.
///
/// # Example
///
/// ```
/// use autorelease::{Object, PoolManager, Release};
///
/// let manager = PoolManager::instance();
/// manager.push();
///
/// // Hand our reference to the pool; it stays usable until the pool is popped.
/// let score = Object::new(10_u32).autorelease();
/// assert_eq!(score.with(|value| *value).unwrap(), 10);
///
/// manager.pop();
/// assert!(score.is_destroyed());
/// ```
#[derive(Debug)]
pub struct Object<T> {
    count: Cell<usize>,

    // `None` once the count has reached zero.
    value: RefCell<Option<T>>,
}

impl<T> Object<T> {
    /// Creates a new object with a reference count of one.
    #[must_use]
    pub fn new(value: T) -> Rc<Self> {
        Rc::new(Self {
            count: Cell::new(1),
            value: RefCell::new(Some(value)),
        })
    }

    /// Whether exactly one reference to the object is outstanding.
    #[must_use]
    pub fn is_single_reference(&self) -> bool {
        self.count.get() == 1
    }

    /// Whether the final release has already destroyed the payload.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.value.borrow().is_none()
    }

    /// Executes `f` with a shared reference to the payload.
    ///
    /// # Panics
    ///
    /// Panics if `f` issues the final release of this same object, because the payload cannot
    /// be dropped while it is borrowed.
    pub fn with<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.value.borrow().as_ref().map(f).ok_or(Error::ObjectDestroyed)
    }

    /// Executes `f` with an exclusive reference to the payload.
    ///
    /// # Panics
    ///
    /// Panics if `f` accesses the payload of this same object again or issues its final release.
    pub fn with_mut<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.value
            .borrow_mut()
            .as_mut()
            .map(f)
            .ok_or(Error::ObjectDestroyed)
    }
}

impl<T> Object<T>
where
    T: 'static,
{
    /// Hands one reference to the current pool of this thread's [`PoolManager`], which releases
    /// it when the pool is popped. Returns a handle to the same object.
    ///
    /// The reference count is not changed until the pool drains. If no pool has been pushed,
    /// one is created implicitly.
    #[must_use = "the returned handle is the only way to reach the object before the pool drains"]
    pub fn autorelease(self: &Rc<Self>) -> Rc<Self> {
        PoolManager::instance().add_object(self);
        Rc::clone(self)
    }
}

impl<T> Release for Object<T> {
    /// Adds a reference to the object.
    ///
    /// # Panics
    ///
    /// Panics if the object has already been destroyed. Retaining a destroyed object is a
    /// use-after-release bug in the calling code.
    fn retain(&self) {
        assert!(
            !self.is_destroyed(),
            "retained an object that was already destroyed by its final release"
        );

        let Some(count) = self.count.get().checked_add(1) else {
            panic!("reference count overflow; the object was retained usize::MAX times");
        };

        self.count.set(count);
    }

    /// Gives up a reference to the object, dropping the payload if this was the last one.
    ///
    /// # Panics
    ///
    /// Panics if the reference count is already zero. Releasing more often than retaining is an
    /// over-release bug in the calling code.
    fn release(&self) {
        let Some(count) = self.count.get().checked_sub(1) else {
            panic!("released an object more times than it was retained");
        };

        self.count.set(count);

        if count == 0 {
            // Taken out first so the payload's drop logic runs without the cell borrowed.
            let value = self.value.borrow_mut().take();
            drop(value);
        }
    }

    fn retain_count(&self) -> usize {
        self.count.get()
    }
}
