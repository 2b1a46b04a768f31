use crate::{BootstrapPolicy, PoolManager};

/// Builder for creating an instance of [`PoolManager`].
///
/// This builder allows configuration of manager behavior before creation.
///
/// # Examples
///
/// ```
/// use autorelease::{BootstrapPolicy, PoolManager};
///
/// // Default manager.
/// let manager = PoolManager::builder().build();
///
/// // With strict bootstrap policy.
/// let manager = PoolManager::builder()
///     .bootstrap_policy(BootstrapPolicy::Strict)
///     .build();
/// ```
#[derive(Debug)]
#[must_use]
pub struct PoolManagerBuilder {
    bootstrap_policy: BootstrapPolicy,
}

impl PoolManagerBuilder {
    pub(crate) fn new() -> Self {
        Self {
            bootstrap_policy: BootstrapPolicy::default(),
        }
    }

    /// Sets the [bootstrap policy][BootstrapPolicy] for the manager. This governs what happens
    /// when a deferred release is requested while the pool stack is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use autorelease::{BootstrapPolicy, PoolManager};
    ///
    /// let manager = PoolManager::builder()
    ///     .bootstrap_policy(BootstrapPolicy::Strict)
    ///     .build();
    /// ```
    pub fn bootstrap_policy(mut self, policy: BootstrapPolicy) -> Self {
        self.bootstrap_policy = policy;
        self
    }

    /// Builds the manager with the specified configuration. The new manager has no pools.
    #[must_use]
    pub fn build(self) -> PoolManager {
        PoolManager::new_inner(self.bootstrap_policy)
    }
}
