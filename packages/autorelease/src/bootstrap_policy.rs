/// Determines what a [`PoolManager`][crate::PoolManager] does when a deferred release is
/// requested while no pool is on its stack.
///
/// By default, the manager creates a pool on demand so that deferred release is always safe
/// to request, even before any explicit push.
///
/// # Examples
///
/// ```
/// use autorelease::{BootstrapPolicy, PoolManager};
///
/// // The bootstrap policy is set at manager creation time.
/// let manager = PoolManager::builder()
///     .bootstrap_policy(BootstrapPolicy::Strict)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum BootstrapPolicy {
    /// A pool is pushed implicitly when a deferred release arrives with an empty stack.
    /// That pool is drained when it is eventually popped or when the manager is finalized.
    /// This is the default.
    #[default]
    Lazy,

    /// A deferred release with an empty stack is rejected.
    ///
    /// [`PoolManager::add_object()`][crate::PoolManager::add_object] panics and
    /// [`PoolManager::try_add_object()`][crate::PoolManager::try_add_object] returns
    /// [`Error::NoActivePool`][crate::Error::NoActivePool]. This exposes missing
    /// [`push()`][crate::PoolManager::push] calls instead of quietly extending the lifetime
    /// of objects until the next drain of an implicit pool.
    Strict,
}
