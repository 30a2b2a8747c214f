//! Stable content hashing for configurations and payloads.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::{CoefError, ErrorInfo};

/// Computes a stable hexadecimal SHA-256 digest of the JSON encoding of
/// `value`.
///
/// Maps inside `serde_json::Value` are ordered, so structurally equal
/// payloads always hash to the same string.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, CoefError> {
    let bytes = serde_json::to_vec(value)
        .map_err(|err| CoefError::Serde(ErrorInfo::new("hash-serialize", err.to_string())))?;
    let digest = Sha256::digest(bytes);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_hash() {
        let a: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        let b = json!({"a": 2, "b": 1});
        assert_eq!(
            stable_hash_string(&a).unwrap(),
            stable_hash_string(&b).unwrap()
        );
    }
}
