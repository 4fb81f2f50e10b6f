//! Address and cache-key derivation.

use async_trait::async_trait;
use docpipe_cache::CacheKey;
use serde_json::Value;

/// Derives the URI of a document from its id and the call's options.
#[async_trait]
pub trait UriSource: Send + Sync {
    /// URI for `id`.
    async fn uri(&self, id: &str, options: &Value) -> anyhow::Result<String>;
}

/// URI built by substituting the id into a template.
///
/// The first `{id}` placeholder, matched case-insensitively, is replaced.
/// A template without a placeholder yields the template unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    template: String,
}

impl UriTemplate {
    const PLACEHOLDER: &'static str = "{id}";

    /// Create a template such as `https://api.example.com/items/{id}`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw template string.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render the template for an id.
    pub fn render(&self, id: &str) -> String {
        // ASCII lowercasing keeps byte offsets aligned with the template.
        match self.template.to_ascii_lowercase().find(Self::PLACEHOLDER) {
            Some(start) => {
                let end = start + Self::PLACEHOLDER.len();
                format!("{}{}{}", &self.template[..start], id, &self.template[end..])
            }
            None => self.template.clone(),
        }
    }
}

#[async_trait]
impl UriSource for UriTemplate {
    async fn uri(&self, id: &str, _options: &Value) -> anyhow::Result<String> {
        Ok(self.render(id))
    }
}

/// URI source backed by a closure.
#[derive(Clone)]
pub struct FnUri<F> {
    f: F,
}

/// Wrap a closure `(id, options) -> uri` as a [`UriSource`].
pub fn uri_fn<F>(f: F) -> FnUri<F>
where
    F: Fn(&str, &Value) -> anyhow::Result<String> + Send + Sync,
{
    FnUri { f }
}

#[async_trait]
impl<F> UriSource for FnUri<F>
where
    F: Fn(&str, &Value) -> anyhow::Result<String> + Send + Sync,
{
    async fn uri(&self, id: &str, options: &Value) -> anyhow::Result<String> {
        (self.f)(id, options)
    }
}

/// Derives the cache key of a document from its URI.
#[async_trait]
pub trait CacheIdSource: Send + Sync {
    /// Cache key for `uri`. Must be deterministic.
    async fn cache_id(&self, uri: &str) -> anyhow::Result<CacheKey>;
}

/// Default cache-key source: hex SHA-256 of the URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHash;

#[async_trait]
impl CacheIdSource for ContentHash {
    async fn cache_id(&self, uri: &str) -> anyhow::Result<CacheKey> {
        Ok(CacheKey::from_uri(uri))
    }
}

/// Uses the URI itself as the cache key.
#[derive(Debug, Clone, Copy, Default)]
pub struct UriAsKey;

#[async_trait]
impl CacheIdSource for UriAsKey {
    async fn cache_id(&self, uri: &str) -> anyhow::Result<CacheKey> {
        Ok(CacheKey::new(uri))
    }
}

/// Cache-key source backed by a closure.
#[derive(Clone)]
pub struct FnCacheId<F> {
    f: F,
}

/// Wrap a closure `uri -> key` as a [`CacheIdSource`].
pub fn cache_id_fn<F>(f: F) -> FnCacheId<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    FnCacheId { f }
}

#[async_trait]
impl<F> CacheIdSource for FnCacheId<F>
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    async fn cache_id(&self, uri: &str) -> anyhow::Result<CacheKey> {
        (self.f)(uri).map(CacheKey::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_substitutes_id() {
        let template = UriTemplate::new("https://api.example.com/items/{id}?full=1");
        assert_eq!(template.render("42"), "https://api.example.com/items/42?full=1");
    }

    #[test]
    fn test_template_placeholder_is_case_insensitive() {
        assert_eq!(UriTemplate::new("/users/{ID}/profile").render("7"), "/users/7/profile");
        assert_eq!(UriTemplate::new("/users/{Id}").render("7"), "/users/7");
    }

    #[test]
    fn test_template_replaces_first_placeholder_only() {
        assert_eq!(UriTemplate::new("{id}/{id}").render("a"), "a/{id}");
    }

    #[test]
    fn test_template_without_placeholder() {
        assert_eq!(UriTemplate::new("/static").render("1"), "/static");
        assert_eq!(UriTemplate::new("").render("1"), "");
    }

    #[test]
    fn test_template_with_non_ascii_prefix() {
        assert_eq!(UriTemplate::new("/café/{id}").render("9"), "/café/9");
    }

    #[tokio::test]
    async fn test_uri_fn_uses_options() {
        let source = uri_fn(|id, options| {
            Ok(format!("/repos/{}/issues/{}", options["repo"].as_str().unwrap_or("-"), id))
        });
        let uri = source.uri("3", &json!({ "repo": "octo" })).await.unwrap();
        assert_eq!(uri, "/repos/octo/issues/3");
    }

    #[tokio::test]
    async fn test_content_hash_is_stable() {
        let a = ContentHash.cache_id("/items/1").await.unwrap();
        let b = ContentHash.cache_id("/items/1").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a, CacheKey::from_uri("/items/1"));
    }

    #[tokio::test]
    async fn test_uri_as_key_and_fn_cache_id() {
        assert_eq!(UriAsKey.cache_id("items-1").await.unwrap().as_str(), "items-1");

        let source = cache_id_fn(|uri| Ok(uri.replace('/', "_")));
        assert_eq!(source.cache_id("/items/1").await.unwrap().as_str(), "_items_1");
    }
}
