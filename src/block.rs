//! Single nested blocks and their set hash.
//!
//! Blocks such as `sku` or `publish_content_link` appear in configuration as
//! a collection holding exactly one element. In Rust they are a single typed
//! value; this module converts at the JSON boundary and provides the stable
//! hash used to compare such blocks irrespective of ordering.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable 64-bit hash of a string.
///
/// Deterministic across processes and platforms (BLAKE3, first eight bytes).
pub fn hash_string(value: &str) -> u64 {
    let digest = blake3::hash(value.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// A nested block identified by one of its fields.
pub trait SetElement {
    /// The field that identifies this block.
    fn set_key(&self) -> &str;

    /// Hash of [`SetElement::set_key`].
    fn set_hash(&self) -> u64 {
        hash_string(self.set_key())
    }
}

/// Serialize a single block as a one-element list.
pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    [value].serialize(serializer)
}

/// Deserialize a single block from a list with exactly one element, or a bare object.
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    match OneOrMany::<T>::deserialize(deserializer)? {
        OneOrMany::One(value) => Ok(value),
        OneOrMany::Many(mut values) => {
            if values.len() != 1 {
                return Err(D::Error::custom(format!(
                    "expected exactly one block, got {}",
                    values.len()
                )));
            }
            Ok(values.remove(0))
        },
    }
}
