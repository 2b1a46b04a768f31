use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{
    AutoreleasePool, BootstrapPolicy, Error, PoolManagerBuilder, PoolScope, Release, Result,
};

thread_local! {
    static INSTANCE: Rc<PoolManager> = Rc::new(PoolManager::new());
}

/// A stack of nested [`AutoreleasePool`]s that routes deferred releases to the innermost pool.
///
/// Code that produces many short-lived objects brackets the work with [`push()`][Self::push] and
/// [`pop()`][Self::pop]. Objects marked for deferred release in between are registered with the
/// pool on top of the stack (the current pool) and are released when that pool is popped. Pools
/// nest: popping releases only what was registered since the matching push.
///
/// # Per-thread instances
///
/// [`instance()`][Self::instance] returns the manager of the calling thread, creating it on first
/// use. Each thread has its own independent stack, so no synchronization is involved. Separate
/// managers created via [`new()`][Self::new] or [`builder()`][Self::builder] can be passed around
/// by handle instead of going through the per-thread instance.
///
/// # Resource management
///
/// Dropping the manager [finalizes][Self::finalize] it, draining every pool still on the stack.
/// The per-thread instance is dropped when its thread exits.
///
/// # Thread safety
///
/// This type is single-threaded and is neither [`Send`] nor [`Sync`].
///
/// # Example
///
/// ```
/// use autorelease::{Object, PoolManager, Release};
///
/// let manager = PoolManager::new();
///
/// let frame = Object::new("frame".to_string());
/// frame.retain();
///
/// manager.push();
/// manager.add_object(&frame);
/// assert_eq!(frame.retain_count(), 2);
///
/// manager.pop();
/// assert_eq!(frame.retain_count(), 1);
/// ```
pub struct PoolManager {
    // The last element is the current pool.
    stack: RefCell<Vec<AutoreleasePool>>,

    bootstrap_policy: BootstrapPolicy,
}

impl PoolManager {
    /// Returns the pool manager of the current thread, creating it on first use.
    ///
    /// # Panics
    ///
    /// Panics if called while the thread-local storage of the current thread is being torn down,
    /// for example from release logic that runs when the per-thread manager drains its remaining
    /// pools at thread exit.
    #[must_use]
    pub fn instance() -> Rc<Self> {
        INSTANCE.with(Rc::clone)
    }

    /// Creates a new manager with default configuration and an empty pool stack.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for configuring a new manager.
    #[cfg_attr(test, mutants::skip)] // Gets replaced with itself by different name, bad mutation.
    pub fn builder() -> PoolManagerBuilder {
        PoolManagerBuilder::new()
    }

    #[must_use]
    pub(crate) fn new_inner(bootstrap_policy: BootstrapPolicy) -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
            bootstrap_policy,
        }
    }

    /// The policy applied when a deferred release arrives while the pool stack is empty.
    #[must_use]
    pub fn bootstrap_policy(&self) -> BootstrapPolicy {
        self.bootstrap_policy
    }

    /// Pushes a new empty pool onto the stack. The new pool becomes the current pool.
    pub fn push(&self) {
        let depth = {
            let mut stack = self.stack.borrow_mut();
            stack.push(AutoreleasePool::new());
            stack.len()
        };

        tracing::trace!(depth, "pushed autorelease pool");
    }

    /// Pops the current pool off the stack and issues every deferred release registered in it.
    ///
    /// The pool below it becomes the current pool before the drain starts, so release logic that
    /// requests further deferred releases registers them with the new current pool.
    ///
    /// # Panics
    ///
    /// Panics if the pool stack is empty. Popping past the bottom of the stack means that some
    /// calling code is missing a [`push()`][Self::push]. Use [`try_pop()`][Self::try_pop] to
    /// receive this condition as an error instead.
    pub fn pop(&self) {
        if let Err(error) = self.try_pop() {
            panic!("{error}; every pop() must be matched by an earlier push()");
        }
    }

    /// Pops the current pool off the stack and issues every deferred release registered in it.
    ///
    /// Behaves like [`pop()`][Self::pop] but reports an empty pool stack as
    /// [`Error::PoolStackEmpty`] instead of panicking. No pool is created in that case.
    pub fn try_pop(&self) -> Result<()> {
        let pool = self.stack.borrow_mut().pop().ok_or(Error::PoolStackEmpty)?;

        tracing::trace!(
            depth = self.depth(),
            pending = pool.len(),
            "popped autorelease pool"
        );

        // The pool is detached from the stack here, so the stack is not borrowed during release.
        pool.clear();

        Ok(())
    }

    /// Records one deferred release of `object` in the current pool.
    ///
    /// If the pool stack is empty, a pool is pushed first unless the manager is configured with
    /// [`BootstrapPolicy::Strict`].
    ///
    /// # Panics
    ///
    /// Panics if the pool stack is empty and the bootstrap policy is [`BootstrapPolicy::Strict`].
    pub fn add_object<R>(&self, object: &Rc<R>)
    where
        R: Release + 'static,
    {
        self.add_object_erased(Rc::<R>::clone(object));
    }

    /// Records one deferred release of a type-erased `object` in the current pool.
    ///
    /// Same as [`add_object()`][Self::add_object] for callers that only hold an
    /// `Rc<dyn Release>`.
    ///
    /// # Panics
    ///
    /// Panics if the pool stack is empty and the bootstrap policy is [`BootstrapPolicy::Strict`].
    pub fn add_object_erased(&self, object: Rc<dyn Release>) {
        if let Err(error) = self.try_add_object_erased(object) {
            panic!("{error}; push() a pool before requesting deferred release");
        }
    }

    /// Records one deferred release of `object` in the current pool.
    ///
    /// Behaves like [`add_object()`][Self::add_object] but reports a rejected bootstrap as
    /// [`Error::NoActivePool`] instead of panicking.
    pub fn try_add_object<R>(&self, object: &Rc<R>) -> Result<()>
    where
        R: Release + 'static,
    {
        self.try_add_object_erased(Rc::<R>::clone(object))
    }

    /// Records one deferred release of a type-erased `object` in the current pool.
    ///
    /// Same as [`try_add_object()`][Self::try_add_object] for callers that only hold an
    /// `Rc<dyn Release>`.
    pub fn try_add_object_erased(&self, object: Rc<dyn Release>) -> Result<()> {
        let mut stack = self.stack.borrow_mut();

        if let Some(current) = stack.last() {
            current.add_erased(object);
            return Ok(());
        }

        match self.bootstrap_policy {
            BootstrapPolicy::Lazy => {
                let pool = AutoreleasePool::new();
                pool.add_erased(object);
                stack.push(pool);

                tracing::debug!("deferred release requested with empty pool stack, pushed a pool");

                Ok(())
            }
            BootstrapPolicy::Strict => Err(Error::NoActivePool),
        }
    }

    /// Cancels one deferred release of `object` in the current pool without issuing it.
    ///
    /// Pools further down the stack are not searched. Returns `false` and does nothing if the
    /// current pool has no pending release of the object or if the pool stack is empty.
    pub fn remove_object<R>(&self, object: &Rc<R>) -> bool
    where
        R: Release + ?Sized,
    {
        self.stack
            .borrow()
            .last()
            .is_some_and(|current| current.remove(object))
    }

    /// Pops every pool on the stack, bottom pool included, issuing all deferred releases.
    ///
    /// Pools are drained from the top of the stack down. Afterwards the manager has an empty
    /// stack and can be used again.
    pub fn finalize(&self) {
        let mut popped: usize = 0;

        while self.try_pop().is_ok() {
            popped = popped.wrapping_add(1);
        }

        tracing::debug!(popped, "finalized autorelease pool manager");
    }

    /// Pushes a new pool and returns a guard that pops it when dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use autorelease::{Object, PoolManager, Release};
    ///
    /// let manager = PoolManager::new();
    /// let label = Object::new("label");
    /// label.retain();
    ///
    /// {
    ///     let _scope = manager.push_scoped();
    ///     manager.add_object(&label);
    ///     assert_eq!(label.retain_count(), 2);
    /// }
    ///
    /// assert_eq!(label.retain_count(), 1);
    /// ```
    pub fn push_scoped(&self) -> PoolScope<'_> {
        self.push();
        PoolScope::new(self)
    }

    /// Executes `f` inside a new pool that is popped when `f` returns or unwinds.
    ///
    /// # Example
    ///
    /// ```
    /// use autorelease::{Object, PoolManager, Release};
    ///
    /// let manager = PoolManager::new();
    /// let label = Object::new("label");
    ///
    /// manager.scope(|| {
    ///     label.retain();
    ///     manager.add_object(&label);
    /// });
    ///
    /// assert_eq!(label.retain_count(), 1);
    /// ```
    pub fn scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _scope = self.push_scoped();
        f()
    }

    /// Number of pools on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Number of pending releases in the current pool, or zero if the pool stack is empty.
    #[must_use]
    pub fn current_len(&self) -> usize {
        self.stack.borrow().last().map_or(0, AutoreleasePool::len)
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PoolManager {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl fmt::Debug for PoolManager {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolManager")
            .field("depth", &self.depth())
            .field("bootstrap_policy", &self.bootstrap_policy)
            .finish()
    }
}
