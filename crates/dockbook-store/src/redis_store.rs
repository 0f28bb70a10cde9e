//! Redis-backed store.
//!
//! Constructing a [`RedisStore`] does no I/O. The first `get`/`set` opens a
//! multiplexed connection that every later request clones; the connection
//! itself pipelines concurrent commands, so only the slot holding it is
//! behind a mutex.
//!
//! A connection-level failure empties the slot, so the next request dials
//! again. The failing request itself is not retried.

use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use dockbook_core::Endpoint;

use crate::error::{StoreError, StoreResult};
use crate::{KvStore, StoreFuture};

pub struct RedisStore {
    endpoint: Endpoint,
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl RedisStore {
    /// Wrap `endpoint` in a store handle. Does not connect.
    pub fn new(endpoint: Endpoint) -> StoreResult<Self> {
        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(endpoint.host.clone(), endpoint.port),
            redis: redis::RedisConnectionInfo::default(),
        };
        let client = redis::Client::open(info)
            .map_err(|e| StoreError::Unavailable(format!("{endpoint}: {e}")))?;
        debug!(%endpoint, "redis store configured");
        Ok(Self {
            endpoint,
            client,
            conn: Mutex::new(None),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The shared connection, dialling it if there is none yet.
    async fn connection(&self) -> StoreResult<MultiplexedConnection> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        debug!(endpoint = %self.endpoint, "connecting to redis");
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, error = %e, "redis connection failed");
                StoreError::Unavailable(format!("{}: {e}", self.endpoint))
            })?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Classify a command error, dropping the cached connection if it broke.
    async fn command_failed(&self, op: &str, key: &str, err: redis::RedisError) -> StoreError {
        if is_connection_error(&err) {
            warn!(endpoint = %self.endpoint, %op, %key, error = %err, "redis connection lost");
            self.conn.lock().await.take();
            StoreError::Unavailable(format!("{}: {err}", self.endpoint))
        } else {
            warn!(endpoint = %self.endpoint, %op, %key, error = %err, "redis command failed");
            StoreError::Command(err.to_string())
        }
    }
}

fn is_connection_error(err: &redis::RedisError) -> bool {
    err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
}

impl KvStore for RedisStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut conn = self.connection().await?;
            let result: redis::RedisResult<Option<String>> = conn.get(key).await;
            match result {
                Ok(value) => {
                    debug!(%key, found = value.is_some(), "redis GET");
                    Ok(value)
                }
                Err(e) => Err(self.command_failed("GET", key, e).await),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut conn = self.connection().await?;
            let result: redis::RedisResult<()> = conn.set(key, value).await;
            match result {
                Ok(()) => {
                    debug!(%key, bytes = value.len(), "redis SET");
                    Ok(())
                }
                Err(e) => Err(self.command_failed("SET", key, e).await),
            }
        })
    }
}
