use std::{collections::BTreeMap, ops::ControlFlow, sync::RwLock};

use super::{Result, Store};

/// In-memory version of a store.
#[derive(Debug, Default)]
pub struct InMemStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        InMemStore::default()
    }
}

impl Store for InMemStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let mut inner = self.inner.write().expect("should lock");
        if inner.contains_key(key) {
            return Ok(false);
        }
        inner.insert(key.to_vec(), value.to_vec());
        Ok(true)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read().expect("should lock").get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.inner.read().expect("should lock").contains_key(key))
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        Ok(self
            .inner
            .write()
            .expect("should lock")
            .remove(key)
            .is_some())
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<()> {
        let inner = self.inner.read().expect("should lock");
        for (key, value) in inner.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if visitor(key.as_slice(), value.as_slice()).is_break() {
                break;
            }
        }
        Ok(())
    }
}
