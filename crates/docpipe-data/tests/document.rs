//! Pipeline behaviour against instrumented retrievers, transformers and caches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docpipe_cache::{Cache, CacheError, CacheResult, FileCache, FileCacheConfig, MemoryCache};
use docpipe_data::{retriever_fn, uri_fn, Document, DocumentError, Retriever, UriAsKey};
use docpipe_transform::{ObjectSpec, TransformSpec, Transformer};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Counts calls and returns `"id: <uri>"`.
fn counting_retriever(calls: Arc<AtomicUsize>) -> impl Retriever {
    retriever_fn(move |uri, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(json!(format!("id: {}", uri))) }
    })
}

/// Counts calls and wraps the input as `{ "transformed": input }`.
fn counting_wrapper(calls: Arc<AtomicUsize>) -> Transformer {
    Transformer::new([TransformSpec::function(move |data| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "transformed": data }))
    })])
}

/// Cache instrumented with store/retrieve counters.
#[derive(Default)]
struct CountingCache {
    inner: MemoryCache,
    stores: AtomicUsize,
    retrieves: AtomicUsize,
}

impl CountingCache {
    fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            inner: MemoryCache::new(lifetime),
            ..Self::default()
        }
    }

    fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    fn retrieves(&self) -> usize {
        self.retrieves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for CountingCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.inner.exists(key).await
    }

    async fn store(&self, key: &str, value: &Value) -> CacheResult<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.inner.store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> CacheResult<Value> {
        self.retrieves.fetch_add(1, Ordering::SeqCst);
        self.inner.retrieve(key).await
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.inner.remove(key).await
    }

    async fn remaining_lifetime(&self, key: &str) -> CacheResult<Duration> {
        self.inner.remaining_lifetime(key).await
    }
}

/// Reports every key as fresh and always returns `"cached"`.
struct AlwaysFresh;

#[async_trait]
impl Cache for AlwaysFresh {
    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(true)
    }

    async fn store(&self, _key: &str, _value: &Value) -> CacheResult<()> {
        Ok(())
    }

    async fn retrieve(&self, _key: &str) -> CacheResult<Value> {
        Ok(json!("cached"))
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn remaining_lifetime(&self, _key: &str) -> CacheResult<Duration> {
        Ok(Duration::from_secs(100))
    }
}

/// Never fresh and fails every store.
struct BrokenStore;

#[async_trait]
impl Cache for BrokenStore {
    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn store(&self, key: &str, _value: &Value) -> CacheResult<()> {
        Err(CacheError::Io {
            path: format!("cache/{}.json", key).into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }

    async fn retrieve(&self, key: &str) -> CacheResult<Value> {
        Err(CacheError::not_found(key))
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        Err(CacheError::not_found(key))
    }

    async fn remaining_lifetime(&self, _key: &str) -> CacheResult<Duration> {
        Ok(Duration::ZERO)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("upstream returned {status}")]
struct UpstreamError {
    status: u16,
}

#[tokio::test]
async fn test_retrieves_and_transforms() {
    let doc = Document::builder()
        .retriever(retriever_fn(|uri, _| async move { Ok(json!(format!("id: {}", uri))) }))
        .uri_template("{id}")
        .transformer(TransformSpec::function(|data| Ok(json!({ "transformed": data }))))
        .build()
        .unwrap();

    let data = doc.get("1", &Value::Null).await.unwrap();
    assert_eq!(data, json!({ "transformed": "id: 1" }));
}

#[tokio::test]
async fn test_fresh_transformed_cache_skips_all_work() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let transforms = Arc::new(AtomicUsize::new(0));
    let raw = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));
    let transformed = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));

    let doc = Document::builder()
        .retriever(counting_retriever(fetches.clone()))
        .uri_template("{id}")
        .transformer(counting_wrapper(transforms.clone()))
        .raw_cache(raw.clone())
        .transformed_cache(transformed.clone())
        .build()
        .unwrap();

    let first = doc.get("1", &Value::Null).await.unwrap();
    let second = doc.get("1", &Value::Null).await.unwrap();

    assert_eq!(first, json!({ "transformed": "id: 1" }));
    assert_eq!(second, first);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(transforms.load(Ordering::SeqCst), 1);
    assert_eq!(raw.stores(), 1);
    assert_eq!(raw.retrieves(), 0);
    assert_eq!(transformed.stores(), 1);
    assert_eq!(transformed.retrieves(), 1);
}

#[tokio::test]
async fn test_fresh_raw_cache_skips_retriever_only() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let transforms = Arc::new(AtomicUsize::new(0));
    let raw = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));
    let transformed = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));

    let doc = Document::builder()
        .retriever(counting_retriever(fetches.clone()))
        .uri_template("/items/{id}")
        .transformer(counting_wrapper(transforms.clone()))
        .raw_cache(raw.clone())
        .transformed_cache(transformed.clone())
        .build()
        .unwrap();

    let key = doc.cache_key_for("7", &Value::Null).await.unwrap();
    raw.store(key.as_str(), &json!("from raw cache")).await.unwrap();

    let data = doc.get("7", &Value::Null).await.unwrap();

    assert_eq!(data, json!({ "transformed": "from raw cache" }));
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert_eq!(transforms.load(Ordering::SeqCst), 1);
    // Only the seeding store; data served from cache is not stored again.
    assert_eq!(raw.stores(), 1);
    assert_eq!(transformed.stores(), 1);
    assert_eq!(
        transformed.retrieve(key.as_str()).await.unwrap(),
        json!({ "transformed": "from raw cache" })
    );
}

#[tokio::test]
async fn test_cold_caches_fetch_once_and_store_each_once() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let raw = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));
    let transformed = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));

    let doc = Document::builder()
        .retriever(counting_retriever(fetches.clone()))
        .uri_template("{id}")
        .transformer(TransformSpec::function(|data| Ok(json!({ "transformed": data }))))
        .raw_cache(raw.clone())
        .transformed_cache(transformed.clone())
        .build()
        .unwrap();

    doc.get("1", &Value::Null).await.unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(raw.stores(), 1);
    assert_eq!(transformed.stores(), 1);

    let key = doc.cache_key_for("1", &Value::Null).await.unwrap();
    assert_eq!(raw.retrieve(key.as_str()).await.unwrap(), json!("id: 1"));
}

#[tokio::test]
async fn test_returns_cached_raw_data() {
    let doc = Document::builder()
        .retriever(retriever_fn(|_, _| async { Ok(json!("fresh")) }))
        .uri_template("")
        .raw_cache(AlwaysFresh)
        .build()
        .unwrap();

    assert_eq!(doc.get("", &Value::Null).await.unwrap(), json!("cached"));
}

#[tokio::test]
async fn test_returns_cached_transformed_data() {
    let doc = Document::builder()
        .retriever(retriever_fn(|_, _| async { Ok(json!("fresh")) }))
        .transformer(TransformSpec::function(|raw| {
            Ok(json!(format!("transformed {}", raw.as_str().unwrap_or_default())))
        }))
        .uri_template("")
        .transformed_cache(AlwaysFresh)
        .build()
        .unwrap();

    assert_eq!(doc.get("", &Value::Null).await.unwrap(), json!("cached"));
}

#[tokio::test]
async fn test_zero_lifetime_file_cache_persists_but_never_hits() {
    let dir = TempDir::new().unwrap();
    let fetches = Arc::new(AtomicUsize::new(0));

    let doc = Document::builder()
        .retriever(counting_retriever(fetches.clone()))
        .uri_template("/items/{id}")
        .raw_cache(FileCache::new(FileCacheConfig::new(dir.path().join("raw"))))
        .transformed_cache(FileCache::new(FileCacheConfig::new(dir.path().join("transformed"))))
        .build()
        .unwrap();

    doc.get("1", &Value::Null).await.unwrap();
    doc.get("1", &Value::Null).await.unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 2);

    let key = doc.cache_key_for("1", &Value::Null).await.unwrap();
    assert!(dir.path().join("raw").join(format!("{}.json", key)).is_file());
    assert!(dir.path().join("transformed").join(format!("{}.json", key)).is_file());
}

#[tokio::test]
async fn test_file_caches_serve_second_call() {
    let dir = TempDir::new().unwrap();
    let fetches = Arc::new(AtomicUsize::new(0));
    let spec = ObjectSpec::from_json(&json!({
        "title": "fields.summary",
        "labels": { "src": "fields.labels", "iterate": true, "max": 2 },
        "secret": false
    }))
    .unwrap();

    let counter = fetches.clone();
    let doc = Document::builder()
        .name("Issue")
        .retriever(retriever_fn(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Ok(json!({
                    "fields": { "summary": "Crash on start", "labels": ["bug", "p1", "ui"] },
                    "secret": "token"
                }))
            }
        }))
        .uri_template("https://tracker.example.com/issues/{id}")
        .transformer(spec)
        .raw_cache(FileCache::new(
            FileCacheConfig::new(dir.path().join("raw")).with_lifetime_secs(600),
        ))
        .transformed_cache(FileCache::new(
            FileCacheConfig::new(dir.path().join("transformed")).with_lifetime_secs(600),
        ))
        .build()
        .unwrap();

    let expected = json!({ "title": "Crash on start", "labels": ["bug", "p1"] });
    assert_eq!(doc.get("12", &Value::Null).await.unwrap(), expected);
    assert_eq!(doc.get("12", &Value::Null).await.unwrap(), expected);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_raw_text_file_cache() {
    let dir = TempDir::new().unwrap();

    let doc = Document::builder()
        .retriever(retriever_fn(|_, _| async { Ok(json!("<html>page</html>")) }))
        .uri_template("page-{id}")
        .cache_id(UriAsKey)
        .raw_cache(FileCache::new(
            FileCacheConfig::new(dir.path())
                .with_extension("html")
                .with_lifetime_secs(600)
                .raw_text(),
        ))
        .build()
        .unwrap();

    doc.get("home", &Value::Null).await.unwrap();

    let on_disk = std::fs::read_to_string(dir.path().join("page-home.html")).unwrap();
    assert_eq!(on_disk, "<html>page</html>");
}

#[tokio::test]
async fn test_options_reach_uri_and_retriever() {
    let doc = Document::builder()
        .retriever(retriever_fn(|uri, options| async move {
            Ok(json!({ "uri": uri, "token": options["token"] }))
        }))
        .uri(uri_fn(|id, options| {
            Ok(format!("/{}/{}", options["org"].as_str().unwrap_or("none"), id))
        }))
        .build()
        .unwrap();

    let data = doc
        .get("9", &json!({ "org": "acme", "token": "t" }))
        .await
        .unwrap();
    assert_eq!(data, json!({ "uri": "/acme/9", "token": "t" }));
}

#[tokio::test]
async fn test_retrieval_error_propagates_unmodified() {
    let transformed = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));
    let doc = Document::builder()
        .retriever(retriever_fn(|_, _| async {
            Err(anyhow::Error::new(UpstreamError { status: 503 }))
        }))
        .uri_template("{id}")
        .transformed_cache(transformed.clone())
        .build()
        .unwrap();

    let err = doc.get("1", &Value::Null).await.unwrap_err();

    assert_eq!(err.to_string(), "upstream returned 503");
    let DocumentError::Retrieval(source) = &err else {
        panic!("expected retrieval error, got {:?}", err);
    };
    assert_eq!(source.downcast_ref::<UpstreamError>().unwrap().status, 503);
    assert_eq!(transformed.stores(), 0);
}

#[tokio::test]
async fn test_cache_store_failure_aborts() {
    let transforms = Arc::new(AtomicUsize::new(0));
    let doc = Document::builder()
        .retriever(retriever_fn(|_, _| async { Ok(json!("fresh")) }))
        .uri_template("{id}")
        .transformer(counting_wrapper(transforms.clone()))
        .raw_cache(BrokenStore)
        .build()
        .unwrap();

    let err = doc.get("1", &Value::Null).await.unwrap_err();

    assert!(matches!(err, DocumentError::Cache(CacheError::Io { .. })));
    assert_eq!(transforms.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transform_error_propagates() {
    let transformed = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));
    let doc = Document::builder()
        .retriever(retriever_fn(|_, _| async { Ok(json!({})) }))
        .uri_template("{id}")
        .transformer(TransformSpec::function(|_| anyhow::bail!("bad shape")))
        .transformed_cache(transformed.clone())
        .build()
        .unwrap();

    let err = doc.get("1", &Value::Null).await.unwrap_err();

    assert!(matches!(err, DocumentError::Transform(_)));
    assert_eq!(err.to_string(), "bad shape");
    assert_eq!(transformed.stores(), 0);
}

#[tokio::test]
async fn test_outdated_transformed_entry_is_rebuilt_from_raw() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let transforms = Arc::new(AtomicUsize::new(0));
    let raw = Arc::new(CountingCache::with_lifetime(Duration::from_secs(60)));
    let transformed = Arc::new(CountingCache::with_lifetime(Duration::ZERO));

    let doc = Document::builder()
        .retriever(counting_retriever(fetches.clone()))
        .uri_template("{id}")
        .transformer(counting_wrapper(transforms.clone()))
        .raw_cache(raw.clone())
        .transformed_cache(transformed.clone())
        .build()
        .unwrap();

    doc.get("1", &Value::Null).await.unwrap();
    doc.get("1", &Value::Null).await.unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(transforms.load(Ordering::SeqCst), 2);
    assert_eq!(raw.retrieves(), 1);
    assert_eq!(transformed.stores(), 2);
    assert_eq!(transformed.retrieves(), 0);
}
