use std::ptr;
use std::rc::Rc;

/// An object that participates in manual reference counting.
///
/// The autorelease machinery only ever calls [`release()`][Self::release] on an object, once per
/// deferred release that was registered for it. It never calls [`retain()`][Self::retain]: code
/// that marks an object for deferred release is expected to already own the reference it is
/// handing over.
///
/// Pools hold objects as `Rc` handles. The `Rc` keeps the memory of the object valid until the
/// owed release has been issued but does not count as a reference in the sense of this trait.
/// What "destroyed" means for an implementation whose count reaches zero is up to that
/// implementation; [`Object`][crate::Object] drops its payload.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use autorelease::{AutoreleasePool, Release};
///
/// #[derive(Debug, Default)]
/// struct Texture {
///     count: Cell<usize>,
/// }
///
/// impl Release for Texture {
///     fn retain(&self) {
///         self.count.set(self.count.get() + 1);
///     }
///
///     fn release(&self) {
///         self.count.set(self.count.get() - 1);
///     }
///
///     fn retain_count(&self) -> usize {
///         self.count.get()
///     }
/// }
///
/// let texture = Rc::new(Texture::default());
/// texture.retain();
///
/// let pool = AutoreleasePool::new();
/// pool.add(&texture);
/// assert_eq!(texture.retain_count(), 1);
///
/// pool.clear();
/// assert_eq!(texture.retain_count(), 0);
/// ```
pub trait Release {
    /// Increments the reference count of the object.
    fn retain(&self);

    /// Decrements the reference count of the object, destroying it if the count reaches zero.
    fn release(&self);

    /// Returns the current reference count of the object.
    fn retain_count(&self) -> usize;
}

/// Whether two handles refer to the same object. Only the data address is compared, so a
/// concrete handle and a `dyn Release` handle to the same object are considered identical.
pub(crate) fn is_same_object<A, B>(a: &Rc<A>, b: &Rc<B>) -> bool
where
    A: ?Sized,
    B: ?Sized,
{
    ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
