//! dockbook-store — the key-value adapter behind the HTTP API.
//!
//! [`KvStore`] is the seam: the API layer holds an `Arc<dyn KvStore>` and
//! never knows which backend it talks to.
//!
//! - [`RedisStore`] speaks the Redis protocol to a resolved endpoint. The
//!   connection is opened lazily on first use and then shared by every
//!   request.
//! - [`MemoryStore`] keeps values in process memory (tests, `memory` mode).

use std::future::Future;
use std::pin::Pin;

pub mod error;
pub mod memory;
pub mod redis_store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Boxed future returned by [`KvStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// A string-to-string store shared by concurrent requests.
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Current value for `key`, or `None` if it was never set.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Overwrite the value for `key`.
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;
}
