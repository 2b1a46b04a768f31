use thiserror::Error;

/// Errors reported by the fallible variants of the pool operations.
///
/// Most misuse of the pool stack is a programming error and the primary operations
/// ([`PoolManager::pop()`][1], [`Release::release()`][2] on [`Object`][3]) panic instead.
/// The `try_*` variants surface the same conditions as values.
///
/// [1]: crate::PoolManager::pop
/// [2]: crate::Release::release
/// [3]: crate::Object
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A pool was popped but the pool stack was empty. Some calling code popped more pools
    /// than it pushed.
    #[error("cannot pop an autorelease pool because the pool stack is empty")]
    PoolStackEmpty,

    /// A deferred release was requested with no pool on the stack and the manager is
    /// configured with [`BootstrapPolicy::Strict`][crate::BootstrapPolicy::Strict].
    #[error("no autorelease pool is active and the bootstrap policy forbids creating one")]
    NoActivePool,

    /// The payload of an [`Object`][crate::Object] was accessed after its final release.
    #[error("the object has already been destroyed by its final release")]
    ObjectDestroyed,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn messages_describe_the_problem() {
        assert!(Error::PoolStackEmpty.to_string().contains("stack is empty"));
        assert!(Error::NoActivePool.to_string().contains("bootstrap policy"));
        assert!(Error::ObjectDestroyed.to_string().contains("destroyed"));
    }
}
