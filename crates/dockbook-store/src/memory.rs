//! In-process store.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::{KvStore, StoreFuture};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().expect("memory store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        let value = self.values.read().expect("memory store lock").get(key).cloned();
        Box::pin(async move { Ok(value) })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        self.values
            .write()
            .expect("memory store lock")
            .insert(key.to_string(), value.to_string());
        debug!(%key, bytes = value.len(), "value stored in memory");
        Box::pin(async move { Ok(()) })
    }
}
