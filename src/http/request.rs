use std::collections::HashMap;

use crate::http::header::canonical_header_key;

/// The only protocol version the server speaks.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP request methods.
///
/// Only GET is served; any other method token is rejected by the parser
/// before a `Request` is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
}

/// Represents a validated HTTP request from a client.
///
/// `Host` and `Connection` are lifted out of the header map into `host` and
/// `close`; every other header is stored under its canonical key.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request URL, always starting with "/"
    pub url: String,
    /// HTTP version, always "HTTP/1.1"
    pub version: String,
    /// Remaining request headers keyed by canonical name
    pub headers: HashMap<String, String>,
    /// Value of the Host header
    pub host: String,
    /// True when the client sent `Connection: close`
    pub close: bool,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    url: Option<String>,
    host: Option<String>,
    headers: HashMap<String, String>,
    close: bool,
}

impl Method {
    /// Parses an HTTP method token. Case-sensitive.
    ///
    /// ```
    /// # use docserve::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("POST"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            url: None,
            host: None,
            headers: HashMap::new(),
            close: false,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Adds a header. The key is stored in canonical form.
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(canonical_header_key(key), value.into());
        self
    }

    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let url = self.url.ok_or("url missing")?;
        if !url.starts_with('/') {
            return Err("url must start with '/'");
        }

        Ok(Request {
            method: Method::GET,
            url,
            version: HTTP_VERSION.to_string(),
            headers: self.headers,
            host: self.host.ok_or("host missing")?,
            close: self.close,
        })
    }
}

impl Request {
    /// Whether the connection may stay open after answering this request.
    pub fn keep_alive(&self) -> bool {
        !self.close
    }
}
