//! Request identity keys.

use sha2::{Digest, Sha256};
use url::Url;

/// Normalized identity of a cacheable request.
///
/// Only GET identities can be constructed, so a non-GET request can never
/// end up as a key in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    url: String,
}

impl RequestKey {
    /// Key for a GET of `url`. The fragment is never part of the identity.
    pub fn get(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { url: url.into() }
    }

    pub fn method(&self) -> &'static str {
        "GET"
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Content-addressed hash used as the stored primary key.
    pub fn hash(&self) -> String {
        compute_cache_key(self.method(), &self.url)
    }
}

/// Compute the hash of a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://news.example/");
        let hash2 = compute_cache_key("GET", "https://news.example/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://news.example/api");
        let post = compute_cache_key("POST", "https://news.example/api");
        assert_ne!(get, post);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://news.example/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_drops_fragment() {
        let a = RequestKey::get(&Url::parse("https://news.example/logo.png#top").unwrap());
        let b = RequestKey::get(&Url::parse("https://news.example/logo.png").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.url(), "https://news.example/logo.png");
    }

    #[test]
    fn test_key_keeps_query() {
        let a = RequestKey::get(&Url::parse("https://news.example/feed?page=1").unwrap());
        let b = RequestKey::get(&Url::parse("https://news.example/feed?page=2").unwrap());
        assert_ne!(a.hash(), b.hash());
    }
}
