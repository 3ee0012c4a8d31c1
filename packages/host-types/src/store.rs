//! The host state store abstraction.
//!
//! The host state machine is written against a minimal binary key-value
//! surface so it can sit on top of whatever backing store the embedding
//! chain provides. Records are serialized as canonical JSON: field order is
//! struct order, so two hosts running this implementation produce identical
//! bytes for identical records, which is what handshake membership proofs
//! check against.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Error raised by the typed store accessors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stored record failed to decode.
    #[error("stored record at `{path}` is corrupt: {source}")]
    Corrupt {
        /// The store path of the record.
        path: String,
        /// The decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// A record failed to encode.
    #[error("failed to encode record for `{path}`: {source}")]
    Encode {
        /// The store path of the record.
        path: String,
        /// The encode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Minimal binary key-value store the host state machine runs against.
pub trait HostStore {
    /// Read the value at `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write `value` at `key`, overwriting any previous value.
    fn set(&mut self, key: &[u8], value: &[u8]);

    /// Delete the value at `key`. Deleting an absent key is a no-op.
    fn remove(&mut self, key: &[u8]);

    /// Whether a value exists at `key`.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Read and JSON-decode the record at `path`.
///
/// # Errors
/// Returns [`StoreError::Corrupt`] if the stored bytes do not decode.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn HostStore,
    path: &str,
) -> Result<Option<T>, StoreError> {
    store
        .get(path.as_bytes())
        .map(|bytes| {
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.to_string(),
                source,
            })
        })
        .transpose()
}

/// JSON-encode `value` and write it at `path`.
///
/// # Errors
/// Returns [`StoreError::Encode`] if the value does not encode.
pub fn set_json<T: Serialize>(
    store: &mut dyn HostStore,
    path: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = encode_json(path, value)?;
    store.set(path.as_bytes(), &bytes);
    Ok(())
}

/// JSON-encode `value` the way [`set_json`] would store it.
///
/// Handshake handlers use this to build the expected counterparty record
/// bytes that membership proofs are checked against.
///
/// # Errors
/// Returns [`StoreError::Encode`] if the value does not encode.
pub fn encode_json<T: Serialize>(path: &str, value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|source| StoreError::Encode {
        path: path.to_string(),
        source,
    })
}

/// In-memory [`HostStore`] used in tests and single-process embeddings.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    data: std::collections::BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.data.insert(key.to_vec(), value.to_vec());
    }

    fn remove(&mut self, key: &[u8]) {
        self.data.remove(key);
    }
}

/// A mutable view of a store with every key prefixed.
///
/// Used to scope a sandboxed client's self-managed state under its own
/// namespace, so untrusted code can never touch host records.
pub struct PrefixedStore<'a> {
    prefix: Vec<u8>,
    inner: &'a mut dyn HostStore,
}

impl<'a> PrefixedStore<'a> {
    /// Wrap `inner`, prepending `prefix` to every key.
    pub fn new(prefix: impl Into<Vec<u8>>, inner: &'a mut dyn HostStore) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    fn prefixed(&self, key: &[u8]) -> Vec<u8> {
        let mut full = self.prefix.clone();
        full.extend_from_slice(key);
        full
    }
}

impl HostStore for PrefixedStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(&self.prefixed(key))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        let key = self.prefixed(key);
        self.inner.set(&key, value);
    }

    fn remove(&mut self, key: &[u8]) {
        let key = self.prefixed(key);
        self.inner.remove(&key);
    }
}

/// A read-only view of a store with every key prefixed.
///
/// Handed to sandbox queries: holders only ever receive a shared reference,
/// so the write methods are unreachable and implemented as no-ops.
pub struct ReadPrefixedStore<'a> {
    prefix: Vec<u8>,
    inner: &'a dyn HostStore,
}

impl<'a> ReadPrefixedStore<'a> {
    /// Wrap `inner`, prepending `prefix` to every key.
    pub fn new(prefix: impl Into<Vec<u8>>, inner: &'a dyn HostStore) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    fn prefixed(&self, key: &[u8]) -> Vec<u8> {
        let mut full = self.prefix.clone();
        full.extend_from_slice(key);
        full
    }
}

impl HostStore for ReadPrefixedStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(&self.prefixed(key))
    }

    fn set(&mut self, _key: &[u8], _value: &[u8]) {}

    fn remove(&mut self, _key: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::{get_json, set_json, HostStore, MemStore, PrefixedStore};

    #[test]
    fn mem_store_get_set_remove() {
        let mut store = MemStore::new();
        assert!(!store.has(b"k"));
        store.set(b"k", b"v");
        assert_eq!(store.get(b"k"), Some(b"v".to_vec()));
        store.remove(b"k");
        assert!(store.get(b"k").is_none());
    }

    #[test]
    fn prefixed_store_isolates_namespaces() {
        let mut store = MemStore::new();
        {
            let mut scoped = PrefixedStore::new(&b"sandbox/"[..], &mut store);
            scoped.set(b"state", b"blob");
        }
        assert_eq!(store.get(b"sandbox/state"), Some(b"blob".to_vec()));
        assert!(store.get(b"state").is_none());
    }

    #[test]
    fn json_accessors_round_trip_and_flag_corruption() {
        let mut store = MemStore::new();
        set_json(&mut store, "record", &vec![1u64, 2, 3]).unwrap();
        let back: Option<Vec<u64>> = get_json(&store, "record").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));

        store.set(b"record", b"not json");
        let corrupt: Result<Option<Vec<u64>>, _> = get_json(&store, "record");
        assert!(corrupt.is_err());
    }
}
