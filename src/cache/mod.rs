//! Key/value cache with optional expiry.
//!
//! Values are stored as JSON bytes so the trait stays object-safe;
//! `get_json` and `set_json` do the (de)serialization for callers.

mod in_memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::error::AppError;

pub use in_memory::InMemoryCache;

#[async_trait]
pub trait Cache: Send + Sync {
    /// `Ok(None)` when the key is missing or expired.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Stores `value`; with `ttl == None` it never expires.
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<(), AppError>;

    /// Stores `value` only when `key` is missing or expired, in one step.
    /// Returns whether the value was stored.
    async fn set_if_absent(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    fn is_healthy(&self) -> bool;
}

/// Reads and decodes a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Result<Option<T>, AppError> {
    match cache.get_bytes(key).await? {
        Some(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // A stale entry from an older shape is treated as a miss.
                log::warn!("Discarding undecodable cache entry '{}': {}", key, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), AppError> {
    let bytes = serde_json::to_vec(value)?;
    cache.set_bytes(key, bytes, ttl).await
}

/// Key of the cached feedback list shown on a course page.
pub fn feedback_list_key(course_id: i32) -> String {
    format!("feedback_list_{}", course_id)
}

/// Key of the lock that limits how often a user may write to support.
pub fn mail_feedback_lock_key(user_id: i32) -> String {
    format!("mail_feedback_lock_{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(feedback_list_key(2), "feedback_list_2");
        assert_eq!(mail_feedback_lock_key(7), "mail_feedback_lock_7");
    }

    #[actix_rt::test]
    async fn test_json_helpers() {
        let cache = InMemoryCache::new();
        set_json(&cache, "numbers", &vec![1, 2, 3], None).await.unwrap();
        let numbers: Option<Vec<i32>> = get_json(&cache, "numbers").await.unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        cache.set_bytes("broken", b"not json".to_vec(), None).await.unwrap();
        let broken: Option<Vec<i32>> = get_json(&cache, "broken").await.unwrap();
        assert!(broken.is_none());
    }
}
