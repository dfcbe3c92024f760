//! Schema registry with a shared, concurrent cache.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, instrument};

use ldaptools_core::error::LdapResult;

use crate::config::CacheType;

use super::{InMemorySchemaParser, SchemaDefinition, SchemaParser};

/// Cache key: (schema name, object type), both lowercased.
type SchemaKey = (String, String);

/// Resolves object types to schema definitions.
///
/// Cheap to clone; clones share the parser and the cache. Concurrent resolves
/// of the same key may both parse, but only the first result is stored and
/// every caller gets the stored definition.
#[derive(Clone)]
pub struct SchemaRegistry {
    parser: Arc<dyn SchemaParser>,
    cache: Option<Arc<DashMap<SchemaKey, Arc<SchemaDefinition>>>>,
}

impl SchemaRegistry {
    /// Create a registry over a parser with the given cache backend.
    pub fn new(parser: impl SchemaParser + 'static, cache: CacheType) -> Self {
        Self {
            parser: Arc::new(parser),
            cache: match cache {
                CacheType::Memory => Some(Arc::new(DashMap::new())),
                CacheType::None => None,
            },
        }
    }

    /// Registry over the built-in schemas with an in-memory cache.
    pub fn with_default_schemas() -> Self {
        Self::new(
            InMemorySchemaParser::with_default_schemas(),
            CacheType::Memory,
        )
    }

    /// Resolve the definition of `object_type` in `schema_name`.
    #[instrument(skip(self))]
    pub fn resolve(&self, object_type: &str, schema_name: &str) -> LdapResult<Arc<SchemaDefinition>> {
        let Some(cache) = &self.cache else {
            return self.parser.parse(object_type, schema_name).map(Arc::new);
        };

        let key = (schema_name.to_lowercase(), object_type.to_lowercase());
        if let Some(hit) = cache.get(&key) {
            debug!("Schema cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        debug!("Schema cache miss");
        let parsed = Arc::new(self.parser.parse(object_type, schema_name)?);
        let stored = cache.entry(key).or_insert(parsed);
        Ok(Arc::clone(stored.value()))
    }

    /// Same parser with the given cache type.
    ///
    /// A registry that already uses `cache` is returned as a clone, so the
    /// cache stays shared with every other clone.
    #[must_use]
    pub fn with_cache(&self, cache: CacheType) -> Self {
        if self.cache_type() == cache {
            return self.clone();
        }
        Self {
            parser: Arc::clone(&self.parser),
            cache: match cache {
                CacheType::Memory => Some(Arc::new(DashMap::new())),
                CacheType::None => None,
            },
        }
    }

    pub fn cache_type(&self) -> CacheType {
        match self.cache {
            Some(_) => CacheType::Memory,
            None => CacheType::None,
        }
    }

    /// Drop one cached definition.
    pub fn invalidate(&self, object_type: &str, schema_name: &str) {
        if let Some(cache) = &self.cache {
            cache.remove(&(schema_name.to_lowercase(), object_type.to_lowercase()));
        }
    }

    /// Drop every cached definition.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Number of cached definitions.
    pub fn cached_count(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("cached", &self.cached_count())
            .field("cache_enabled", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingParser {
        inner: InMemorySchemaParser,
        calls: Arc<AtomicUsize>,
    }

    impl SchemaParser for CountingParser {
        fn parse(&self, object_type: &str, schema_name: &str) -> LdapResult<SchemaDefinition> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.parse(object_type, schema_name)
        }
    }

    fn counting(cache: CacheType) -> (SchemaRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let parser = CountingParser {
            inner: InMemorySchemaParser::with_default_schemas(),
            calls: Arc::clone(&calls),
        };
        (SchemaRegistry::new(parser, cache), calls)
    }

    #[test]
    fn test_resolve_caches_by_schema_and_type() {
        let (registry, calls) = counting(CacheType::Memory);

        let first = registry.resolve("user", "ad").unwrap();
        let second = registry.resolve("USER", "AD").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        registry.resolve("user", "openldap").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_count(), 2);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let (registry, calls) = counting(CacheType::Memory);

        registry.resolve("user", "ad").unwrap();
        registry.invalidate("user", "ad");
        registry.resolve("user", "ad").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        registry.clear();
        assert_eq!(registry.cached_count(), 0);
    }

    #[test]
    fn test_no_cache_parses_every_time() {
        let (registry, calls) = counting(CacheType::None);

        registry.resolve("group", "ad").unwrap();
        registry.resolve("group", "ad").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_count(), 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let (registry, calls) = counting(CacheType::Memory);

        assert!(registry.resolve("computer", "openldap").is_err());
        assert!(registry.resolve("computer", "openldap").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_with_same_cache_type_keeps_shared_cache() {
        let (registry, calls) = counting(CacheType::Memory);
        let shared = registry.with_cache(CacheType::Memory);

        registry.resolve("user", "ad").unwrap();
        shared.resolve("user", "ad").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(shared.cached_count(), 1);

        let uncached = registry.with_cache(CacheType::None);
        assert_eq!(uncached.cache_type(), CacheType::None);
        assert_eq!(uncached.cached_count(), 0);
    }

    #[test]
    fn test_concurrent_resolve_returns_same_definition() {
        let registry = SchemaRegistry::with_default_schemas();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.resolve("user", "ad").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let cached = registry.resolve("user", "ad").unwrap();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &cached)));
    }
}
