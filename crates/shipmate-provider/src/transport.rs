//! Blocking HTTP transport.

use std::fmt;
use std::thread::sleep;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{ProviderError, ProviderResult};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// An API request.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL, including the query string.
    pub url: String,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Creates a request without body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let sensitive = name.eq_ignore_ascii_case("authorization")
                    || name.eq_ignore_ascii_case("private-token");
                (name.as_str(), if sensitive { "[redacted]" } else { value.as_str() })
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// An API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Decode`] if the body has another shape.
    pub fn json<T: DeserializeOwned>(&self, url: &str) -> ProviderResult<T> {
        serde_json::from_str(&self.body).map_err(|source| ProviderError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Sends API requests.
pub trait Transport: Send + Sync {
    /// Performs one request.
    ///
    /// Any status is a successful round-trip; callers interpret it.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when no response was received.
    fn send(&self, request: &HttpRequest) -> ProviderResult<HttpResponse>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with a 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> ProviderResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("shipmate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| ProviderError::Transport {
                url: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            max_retries: 2,
            retry_delay: Duration::from_millis(200),
        })
    }

    fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, reqwest::Error> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> ProviderResult<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");

        // Reads are retried; a failed write may still have reached the server.
        let attempts = if request.method == Method::Get {
            self.max_retries + 1
        } else {
            1
        };
        let mut delay = self.retry_delay;
        let mut attempt = 1;

        loop {
            match self.send_once(request) {
                Ok(response) => {
                    debug!(status = response.status, url = %request.url, "received response");
                    return Ok(response);
                }
                Err(source) if attempt < attempts => {
                    warn!(url = %request.url, attempt, error = %source, "request failed, retrying");
                    sleep(delay);
                    delay *= 2;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(ProviderError::Transport {
                        url: request.url.clone(),
                        source,
                    });
                }
            }
        }
    }
}

/// Builds an endpoint URL below `base`.
///
/// Each segment is percent-encoded on its own, so a `/` inside a segment
/// becomes `%2F`.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidUrl`] if `base` is not an absolute URL.
pub fn endpoint(base: &str, segments: &[&str], query: &[(&str, &str)]) -> ProviderResult<String> {
    let mut url = Url::parse(base).map_err(|_| ProviderError::InvalidUrl(base.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ProviderError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}
