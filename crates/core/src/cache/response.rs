//! Stored response snapshots.

use bytes::Bytes;

/// Immutable snapshot of a response: status, headers, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseSnapshot {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub(crate) fn headers_json(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string(&self.headers)?)
    }

    pub(crate) fn from_row(status: u16, headers_json: &str, body: Vec<u8>) -> Result<Self, crate::Error> {
        let headers = serde_json::from_str(headers_json)?;
        Ok(Self { status, headers, body: Bytes::from(body) })
    }
}
