//! Network transport for intercepted requests.
//!
//! ### Pass-through semantics
//! - Method, headers, and body are forwarded as received
//! - HTTP error statuses are responses, never errors
//! - Only transport failures (DNS, refused, timeout, truncated body) are
//!   reported, as `Error::Transport`
//! - Bodies are never size-limited here; the router decides what to store
//!
//! ### Limits
//! - Max redirects: 5

pub mod url;

use bytes::Bytes;
use reqwest::{Client, Method};
use shellcache_core::{AppConfig, Error, RequestDescriptor, ResponseSnapshot};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize};

/// Anything that can carry a request to the network.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Send `request` and return the full response.
    ///
    /// Rejects only when no response could be obtained.
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed network transport.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("network error: {}", e)))?;

        let status = response.status().as_u16();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            "{} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(ResponseSnapshot { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP/1.1 exchange on loopback and return the base URL.
    ///
    /// The raw request head is sent back through `seen`.
    async fn serve_once(body: Vec<u8>) -> (::url::Url, tokio::sync::oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut head = Vec::new();
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&head).to_string());
            let status = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len());
            socket.write_all(status.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        (::url::Url::parse(&format!("http://{addr}/")).unwrap(), rx)
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "news-pwa/2".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "news-pwa/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let client =
            FetchClient::new(FetchConfig { timeout: Duration::from_millis(500), ..Default::default() }).unwrap();
        // Port 9 on loopback: nothing listens, so the connection is refused.
        let url = ::url::Url::parse("http://127.0.0.1:9/").unwrap();
        let err = client.fetch(&RequestDescriptor::get(url)).await.unwrap_err();
        assert!(err.is_transport(), "expected transport failure, got {err}");
    }

    #[tokio::test]
    async fn test_invalid_method_rejected() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = ::url::Url::parse("http://127.0.0.1:9/").unwrap();
        let req = RequestDescriptor::new("GE T", url, shellcache_core::RequestMode::Cors, "");
        let err = client.fetch(&req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_large_body_returned_whole() {
        let (url, _seen) = serve_once(vec![b'x'; 64 * 1024]).await;
        let client = FetchClient::new(FetchConfig::default()).unwrap();

        let response = client.fetch(&RequestDescriptor::get(url.join("big.bin").unwrap())).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), 64 * 1024);
    }

    #[tokio::test]
    async fn test_request_headers_forwarded() {
        let (url, seen) = serve_once(b"ok".to_vec()).await;
        let client = FetchClient::new(FetchConfig::default()).unwrap();

        let request = RequestDescriptor::get(url.join("feed").unwrap()).with_header("Authorization", "Bearer t0k");
        let response = client.fetch(&request).await.unwrap();
        assert_eq!(&response.body[..], b"ok");

        let head = seen.await.unwrap().to_ascii_lowercase();
        assert!(head.contains("authorization: bearer t0k"), "request head was {head}");
    }
}
