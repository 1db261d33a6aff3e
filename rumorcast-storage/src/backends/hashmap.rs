//! # HashMap storage backend
//!
//! Storage backend that keeps data in a heap-allocated HashMap. It does not
//! persist across process restarts; it exists so the rest of the workspace
//! (and its tests) can depend on `Storage` without pulling in a real
//! database.
use std::collections::HashMap;

use crate::storage::{Result, Storage, StorageIterator, WriteBatch, WriteBatchItem};

/// HashMap backend.
#[derive(Debug, Default)]
pub struct Backend(HashMap<Vec<u8>, Vec<u8>>);

impl Backend {
    /// Build a new, empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for Backend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.0.get(key).cloned())
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.0.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.0.remove(key);
        Ok(())
    }

    fn prefix_iterator<'a, 'b: 'a>(&'a self, prefix: &'b [u8]) -> Result<StorageIterator<'a>> {
        let matches: Vec<_> = self
            .0
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(matches.into_iter()))
    }

    fn write(&mut self, batch: WriteBatch) -> Result<()> {
        trace!("applying write batch of {} item(s)", batch.batch.len());
        for item in batch.batch {
            match item {
                WriteBatchItem::Put(key, value) => {
                    self.0.insert(key, value);
                }
                WriteBatchItem::Delete(key) => {
                    self.0.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> Box<dyn Storage> {
        Box::new(Backend::new())
    }

    #[test]
    fn test_hashmap() {
        let mut storage = backend();

        assert_eq!(None, storage.get(b"name").unwrap());
        assert_eq!((), storage.put(b"name".to_vec(), b"john".to_vec()).unwrap());
        assert_eq!(Some(b"john".to_vec()), storage.get(b"name").unwrap());
        assert_eq!((), storage.delete(b"name").unwrap());
        assert_eq!(None, storage.get(b"name").unwrap());
    }

    #[test]
    fn test_prefix_iterator() {
        let mut storage = backend();
        storage.put(b"rumors/1".to_vec(), b"a".to_vec()).unwrap();
        storage.put(b"rumors/2".to_vec(), b"b".to_vec()).unwrap();
        storage.put(b"votes/1".to_vec(), b"c".to_vec()).unwrap();

        let mut found: Vec<_> = storage.prefix_iterator(b"rumors/").unwrap().collect();
        found.sort();
        assert_eq!(
            found,
            vec![
                (b"rumors/1".to_vec(), b"a".to_vec()),
                (b"rumors/2".to_vec(), b"b".to_vec())
            ]
        );
    }

    #[test]
    fn test_write_batch_is_atomic_in_order() {
        let mut storage = backend();
        let mut batch = WriteBatch::default();
        batch.put(b"k".to_vec(), b"v1".to_vec());
        batch.put(b"k".to_vec(), b"v2".to_vec());
        storage.write(batch).unwrap();
        assert_eq!(storage.get(b"k").unwrap(), Some(b"v2".to_vec()));
    }
}
