use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::http::header::canonical_header_key;
use crate::http::mime;
use crate::http::request::{HTTP_VERSION, Request};
use crate::http::resolver::ResolvedFile;

/// HTTP status codes produced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use docserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// An HTTP response waiting to be serialized.
///
/// The body is never held in memory here: when `file_path` is set, the
/// writer streams that file's bytes after the headers.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Protocol version for the status line
    pub version: String,
    /// Headers keyed by canonical name
    pub headers: HashMap<String, String>,
    /// The valid request this response answers; `None` for 400 responses
    pub request: Option<Request>,
    /// File whose contents form the body; `None` means an empty body
    pub file_path: Option<PathBuf>,
}

/// Formats a timestamp as an HTTP date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

impl Response {
    fn new(status: StatusCode) -> Self {
        let mut response = Self {
            status,
            version: HTTP_VERSION.to_string(),
            headers: HashMap::new(),
            request: None,
            file_path: None,
        };
        response.set_header("Date", format_http_date(SystemTime::now()));
        response
    }

    /// Adds or replaces a header, storing it under its canonical key.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        self.headers.insert(canonical_header_key(key), value.into());
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_key(key))
            .map(|v| v.as_str())
    }

    /// 200 OK serving `file`.
    pub fn ok(request: Request, file: ResolvedFile) -> Self {
        let mut response = Self::new(StatusCode::Ok);

        response.set_header("Last-Modified", format_http_date(file.modified));
        response.set_header("Content-Length", file.size.to_string());
        response.set_header("Content-Type", mime::content_type_for(&file.path));
        if request.close {
            response.set_header("Connection", "close");
        }

        response.file_path = Some(file.path);
        response.request = Some(request);
        response
    }

    /// 400 Bad Request. Always closes the connection.
    pub fn bad_request() -> Self {
        let mut response = Self::new(StatusCode::BadRequest);
        response.set_header("Connection", "close");
        response
    }

    /// 404 Not Found.
    pub fn not_found(request: Request) -> Self {
        let mut response = Self::new(StatusCode::NotFound);
        if request.close {
            response.set_header("Connection", "close");
        }
        response.request = Some(request);
        response
    }

    /// Whether the connection must be closed once this response is written:
    /// the request asked for it, or the request was malformed.
    pub fn closes_connection(&self) -> bool {
        self.status == StatusCode::BadRequest
            || self.request.as_ref().is_some_and(|req| !req.keep_alive())
    }
}
