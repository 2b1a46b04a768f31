#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Manual reference counting with deferred release.
//!
//! Objects that participate in manual reference counting implement [`Release`]. Instead of giving
//! up a reference immediately, code can mark the object for deferred release. The release is then
//! issued at a well-defined later point: when the [`AutoreleasePool`] that recorded it is drained.
//!
//! A [`PoolManager`] keeps a stack of nested pools. Deferred releases always go to the innermost
//! pool, and popping a pool issues exactly the releases recorded since the matching push, in the
//! order they were recorded. A typical use is to push a pool at the start of every iteration of
//! an update loop that creates many short-lived objects and to pop it at the end.
//!
//! Every thread has its own [`PoolManager::instance()`], created on first use. Stand-alone
//! managers can be created with [`PoolManager::new()`] or [`PoolManager::builder()`].
//!
//! [`Object<T>`][Object] is a ready-made reference-counted value that drops its payload on its
//! final release and knows how to [`autorelease()`][Object::autorelease] itself.
//!
//! # Example
//!
//! ```
//! use autorelease::{Object, PoolManager, Release};
//!
//! let manager = PoolManager::instance();
//!
//! let level = Object::new("level-1".to_string());
//!
//! for frame in 0..3 {
//!     manager.scope(|| {
//!         // The frame-local label is released when this iteration's pool is popped.
//!         let label = Object::new(format!("frame {frame}")).autorelease();
//!         assert!(!label.is_destroyed());
//!
//!         // Borrow the level for this frame only.
//!         level.retain();
//!         let _level = level.autorelease();
//!     });
//! }
//!
//! assert!(level.is_single_reference());
//! ```
//!
//! # Ordering
//!
//! A pool releases its objects first-in first-out. No ordering is defined between objects in
//! different pools beyond the stack discipline itself: inner pools are drained when popped, which
//! necessarily happens before their outer pools are popped.
//!
//! # Logging
//!
//! Pool lifecycle events are emitted through [`tracing`] at `trace` and `debug` level. The
//! package does not install a subscriber.

mod autorelease_pool;
mod bootstrap_policy;
mod builder;
mod error;
mod object;
mod pool_manager;
mod pool_scope;
mod release;

pub use autorelease_pool::*;
pub use bootstrap_policy::*;
pub use builder::*;
pub use error::*;
pub use object::*;
pub use pool_manager::*;
pub use pool_scope::*;
pub use release::*;
