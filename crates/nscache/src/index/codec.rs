//! Index entry encoding.
//!
//! A key set is stored as a sorted JSON array of strings. An absent entry is
//! the empty set.

use std::collections::BTreeSet;

use bytes::Bytes;

use crate::error::{CacheError, CacheResult};

pub(crate) type KeySet = BTreeSet<String>;

pub(crate) fn decode_key_set(index_key: &str, raw: Option<Bytes>) -> CacheResult<KeySet> {
    match raw {
        None => Ok(KeySet::new()),
        Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| CacheError::Serialization {
            key: index_key.to_string(),
            message: format!("failed to parse index entry: {}", e),
        }),
    }
}

pub(crate) fn encode_key_set(index_key: &str, set: &KeySet) -> CacheResult<Bytes> {
    serde_json::to_vec(set)
        .map(Bytes::from)
        .map_err(|e| CacheError::Serialization {
            key: index_key.to_string(),
            message: format!("failed to serialize index entry: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_empty() {
        assert!(decode_key_set("__root-keys__", None).unwrap().is_empty());
    }

    #[test]
    fn test_encoding_is_sorted() {
        let set: KeySet = ["b", "", "a.c"].iter().map(|s| s.to_string()).collect();
        let bytes = encode_key_set("__keys-list__x", &set).unwrap();
        assert_eq!(&bytes[..], br#"["","a.c","b"]"#);
    }

    #[test]
    fn test_corrupt_entry_is_error() {
        let err = decode_key_set("__keys-list__x", Some(Bytes::from_static(b"not json{{")))
            .unwrap_err();
        match err {
            CacheError::Serialization { key, .. } => assert_eq!(key, "__keys-list__x"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
