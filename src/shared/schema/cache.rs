use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::shared::constants::DEFAULT_SCHEMA_CACHE_CAPACITY;

use super::document::SchemaDocument;
use super::field::FieldDescriptor;
use super::generator::generate;
use super::SchemaError;

/// Cache key for a field list: SHA-256 over its canonical JSON form.
///
/// Canonical here means sorted object keys with the list order kept intact.
/// Field order matters because `required` ordering makes generation
/// order-sensitive, so reordered field lists hash to different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey(String);

impl SchemaKey {
    pub fn of(fields: &[FieldDescriptor]) -> Result<Self, SchemaError> {
        let canonical = serde_json::to_value(fields).map_err(|err| {
            SchemaError::InvalidTemplate(format!("field list is not serializable: {err}"))
        })?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounded LRU cache in front of [`generate`].
///
/// Strictly a performance layer: a miss, an evicted entry or a poisoned lock
/// all fall through to regeneration, which is deterministic, so results never
/// depend on cache state. Safe to clear at any time.
pub struct SchemaCache {
    entries: Mutex<LruCache<SchemaKey, SchemaDocument>>,
}

impl SchemaCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Schema for `fields`, reusing a cached document when one is present.
    pub fn get_or_generate(&self, fields: &[FieldDescriptor]) -> Result<SchemaDocument, SchemaError> {
        let key = SchemaKey::of(fields)?;

        if let Ok(mut entries) = self.entries.lock() {
            if let Some(doc) = entries.get(&key) {
                return Ok(doc.clone());
            }
        }

        let doc = generate(fields)?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, doc.clone());
        }
        Ok(doc)
    }

    /// Whether a document for `fields` is currently cached. Does not touch
    /// recency order.
    pub fn contains(&self, fields: &[FieldDescriptor]) -> bool {
        let Ok(key) = SchemaKey::of(fields) else {
            return false;
        };
        self.entries
            .lock()
            .map(|entries| entries.contains(&key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::schema::FieldSpec;
    use std::sync::Arc;

    fn fields(name: &str) -> Vec<FieldDescriptor> {
        FieldDescriptor::parse_all(&[FieldSpec::new(name, "string")]).unwrap()
    }

    #[test]
    fn cached_result_matches_direct_generation() {
        let cache = SchemaCache::new(8);
        let list = fields("email");

        let first = cache.get_or_generate(&list).unwrap();
        let second = cache.get_or_generate(&list).unwrap();
        let direct = generate(&list).unwrap();

        assert_eq!(first, direct);
        assert_eq!(second, direct);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_sensitive_to_field_order() {
        let a = FieldDescriptor::parse_all(&[
            FieldSpec::new("first", "string"),
            FieldSpec::new("second", "integer"),
        ])
        .unwrap();
        let b = FieldDescriptor::parse_all(&[
            FieldSpec::new("second", "integer"),
            FieldSpec::new("first", "string"),
        ])
        .unwrap();

        assert_ne!(SchemaKey::of(&a).unwrap(), SchemaKey::of(&b).unwrap());
    }

    #[test]
    fn least_recently_used_entry_is_evicted_at_capacity() {
        let cache = SchemaCache::new(2);
        let first = fields("first");
        let second = fields("second");
        let third = fields("third");

        cache.get_or_generate(&first).unwrap();
        cache.get_or_generate(&second).unwrap();
        // Touch `first` so `second` is the least recently used entry.
        cache.get_or_generate(&first).unwrap();
        cache.get_or_generate(&third).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&first));
        assert!(!cache.contains(&second));
        assert!(cache.contains(&third));

        // An evicted list recomputes to exactly its original document.
        let recomputed = cache.get_or_generate(&second).unwrap();
        assert_eq!(recomputed, generate(&second).unwrap());
    }

    #[test]
    fn clearing_never_affects_results() {
        let cache = SchemaCache::new(4);
        let list = fields("email");

        let before = cache.get_or_generate(&list).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        let after = cache.get_or_generate(&list).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn generation_errors_pass_through_without_caching() {
        let cache = SchemaCache::new(4);
        let duplicates = FieldDescriptor::parse_all(&[
            FieldSpec::new("name", "string"),
            FieldSpec::new("name", "string"),
        ])
        .unwrap();

        assert!(cache.get_or_generate(&duplicates).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_callers_agree_on_the_result() {
        let cache = Arc::new(SchemaCache::new(4));
        let list = fields("shared");
        let expected = generate(&list).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let list = list.clone();
                std::thread::spawn(move || cache.get_or_generate(&list).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
