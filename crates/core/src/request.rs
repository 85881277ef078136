//! Intercepted request descriptors.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Request mode as reported by the document context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full document load that replaces the page.
    Navigate,
    SameOrigin,
    NoCors,
    Cors,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Navigate => "navigate",
            RequestMode::SameOrigin => "same-origin",
            RequestMode::NoCors => "no-cors",
            RequestMode::Cors => "cors",
        }
    }
}

impl std::str::FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// An outgoing request observed by the router.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Uppercase HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: Url,
    pub mode: RequestMode,
    /// Declared destination; empty when the caller did not declare one.
    pub destination: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RequestDescriptor {
    /// Build a descriptor with no headers and no body.
    pub fn new(method: &str, url: Url, mode: RequestMode, destination: &str) -> Self {
        Self {
            method: method.trim().to_ascii_uppercase(),
            url,
            mode,
            destination: destination.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Plain GET issued by a subresource load.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, RequestMode::NoCors, "")
    }

    /// Top-level document load.
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Navigate, "document")
    }

    /// Append a request header, forwarded as given.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}
