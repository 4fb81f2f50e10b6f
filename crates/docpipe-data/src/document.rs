//! The document pipeline.

use std::fmt;
use std::sync::Arc;

use docpipe_cache::{Cache, CacheKey, PseudoCache};
use docpipe_transform::Transformer;
use serde_json::Value;
use tracing::Instrument;

use crate::error::{DocumentError, DocumentResult};
use crate::retriever::Retriever;
use crate::uri::{CacheIdSource, ContentHash, UriSource, UriTemplate};

const DEFAULT_NAME: &str = "Document";

/// A retrievable, cached, transformed document type.
///
/// Each call derives the document's URI and cache key, then:
///
/// 1. returns the transformed-cache entry if it is fresh;
/// 2. otherwise takes raw data from the raw cache if fresh, or from the
///    retriever (storing freshly fetched data in the raw cache);
/// 3. transforms the raw data, stores the result in the transformed cache and
///    returns it.
///
/// Concurrent calls for the same id are not coalesced: each may hit the
/// retriever and the last write to each cache wins.
pub struct Document {
    name: String,
    retriever: Arc<dyn Retriever>,
    uri: Arc<dyn UriSource>,
    cache_id: Arc<dyn CacheIdSource>,
    transformer: Transformer,
    raw_cache: Arc<dyn Cache>,
    transformed_cache: Arc<dyn Cache>,
}

impl Document {
    /// Start defining a document.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Produce the transformed document for `id`.
    ///
    /// Ids are rendered with `Display` before reaching the URI source, so
    /// `get(42, ..)` and `get("42", ..)` address the same document.
    pub async fn get(&self, id: impl fmt::Display, options: &Value) -> DocumentResult<Value> {
        let id = id.to_string();
        let span = tracing::debug_span!("document", name = %self.name, id = %id);
        self.resolve(&id, options).instrument(span).await
    }

    /// URI of the document for `id`.
    pub async fn uri_for(&self, id: impl fmt::Display, options: &Value) -> DocumentResult<String> {
        self.render_uri(&id.to_string(), options).await
    }

    /// Cache key of the document for `id`.
    pub async fn cache_key_for(
        &self,
        id: impl fmt::Display,
        options: &Value,
    ) -> DocumentResult<CacheKey> {
        let uri = self.uri_for(id, options).await?;
        self.cache_id
            .cache_id(&uri)
            .await
            .map_err(DocumentError::CacheId)
    }

    async fn render_uri(&self, id: &str, options: &Value) -> DocumentResult<String> {
        self.uri.uri(id, options).await.map_err(DocumentError::Uri)
    }

    async fn resolve(&self, id: &str, options: &Value) -> DocumentResult<Value> {
        let uri = self.render_uri(id, options).await?;
        let key = self
            .cache_id
            .cache_id(&uri)
            .await
            .map_err(DocumentError::CacheId)?;

        if self.transformed_cache.is_fresh(key.as_str()).await? {
            tracing::debug!(%uri, "returning cached transformed data");
            return Ok(self.transformed_cache.retrieve(key.as_str()).await?);
        }

        let raw_cached = self.raw_cache.is_fresh(key.as_str()).await?;
        tracing::debug!(
            %uri,
            source = if raw_cached { "cache" } else { "source" },
            "retrieving raw data"
        );

        let raw = if raw_cached {
            self.raw_cache.retrieve(key.as_str()).await?
        } else {
            let raw = self
                .retriever
                .retrieve(&uri, options)
                .await
                .map_err(DocumentError::Retrieval)?;
            self.raw_cache.store(key.as_str(), &raw).await?;
            raw
        };

        tracing::debug!("raw data retrieved, applying transformation");
        let transformed = self.transformer.transform(raw).await?;

        self.transformed_cache
            .store(key.as_str(), &transformed)
            .await?;
        tracing::debug!("transformation applied");

        Ok(transformed)
    }

    /// Human-readable name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The retriever.
    pub fn retriever(&self) -> &Arc<dyn Retriever> {
        &self.retriever
    }

    /// The URI source.
    pub fn uri_source(&self) -> &Arc<dyn UriSource> {
        &self.uri
    }

    /// The cache-key source.
    pub fn cache_id_source(&self) -> &Arc<dyn CacheIdSource> {
        &self.cache_id
    }

    /// The transformer.
    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// The raw-data cache.
    pub fn raw_cache(&self) -> &Arc<dyn Cache> {
        &self.raw_cache
    }

    /// The transformed-data cache.
    pub fn transformed_cache(&self) -> &Arc<dyn Cache> {
        &self.transformed_cache
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("transformer", &self.transformer)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Document`].
///
/// A retriever and a URI source (template or function) are required;
/// everything else has a default: identity transformer, pseudo caches (no
/// caching), SHA-256 cache keys, and the name `"Document"`.
#[derive(Default)]
pub struct DocumentBuilder {
    name: Option<String>,
    retriever: Option<Arc<dyn Retriever>>,
    uri: Option<Arc<dyn UriSource>>,
    cache_id: Option<Arc<dyn CacheIdSource>>,
    transformer: Option<Transformer>,
    raw_cache: Option<Arc<dyn Cache>>,
    transformed_cache: Option<Arc<dyn Cache>>,
}

impl DocumentBuilder {
    /// Set the human-readable name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the retriever.
    pub fn retriever(mut self, retriever: impl Retriever + 'static) -> Self {
        self.retriever = Some(Arc::new(retriever));
        self
    }

    /// Derive URIs with a source such as [`uri_fn`](crate::uri_fn).
    pub fn uri(mut self, source: impl UriSource + 'static) -> Self {
        self.uri = Some(Arc::new(source));
        self
    }

    /// Derive URIs by substituting the id into a `{id}` template.
    pub fn uri_template(self, template: impl Into<String>) -> Self {
        self.uri(UriTemplate::new(template))
    }

    /// Derive cache keys with a custom source.
    pub fn cache_id(mut self, source: impl CacheIdSource + 'static) -> Self {
        self.cache_id = Some(Arc::new(source));
        self
    }

    /// Set the transformer.
    pub fn transformer(mut self, transformer: impl Into<Transformer>) -> Self {
        self.transformer = Some(transformer.into());
        self
    }

    /// Set the raw-data cache.
    pub fn raw_cache(mut self, cache: impl Cache + 'static) -> Self {
        self.raw_cache = Some(Arc::new(cache));
        self
    }

    /// Set the transformed-data cache.
    pub fn transformed_cache(mut self, cache: impl Cache + 'static) -> Self {
        self.transformed_cache = Some(Arc::new(cache));
        self
    }

    /// Validate and build the document.
    pub fn build(self) -> DocumentResult<Document> {
        let retriever = self.retriever.ok_or_else(|| {
            DocumentError::Config(
                "a retriever must be provided when defining a document".to_string(),
            )
        })?;
        let uri = self.uri.ok_or_else(|| {
            DocumentError::Config(
                "either a URI template or a URI function must be provided when defining a document"
                    .to_string(),
            )
        })?;

        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
        tracing::debug!(name = %name, "defining document");

        Ok(Document {
            name,
            retriever,
            uri,
            cache_id: self.cache_id.unwrap_or_else(|| Arc::new(ContentHash)),
            transformer: self.transformer.unwrap_or_default(),
            raw_cache: self.raw_cache.unwrap_or_else(|| Arc::new(PseudoCache)),
            transformed_cache: self
                .transformed_cache
                .unwrap_or_else(|| Arc::new(PseudoCache)),
        })
    }
}
