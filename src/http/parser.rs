use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::{Instant, timeout_at};

use crate::http::header::{canonical_header_key, is_valid_header_key};
use crate::http::request::{HTTP_VERSION, Method, Request};

/// Longest accepted line, terminator included.
pub const MAX_LINE_BYTES: usize = 8 * 1024;
/// Most header lines accepted in one request.
pub const MAX_HEADERS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("end of stream")]
    EndOfStream,
    #[error("read deadline exceeded")]
    TimedOut,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no bytes received")]
    NoBytesReceived,
    #[error("line is not valid UTF-8")]
    InvalidEncoding,
    #[error("malformed start line: {0:?}")]
    MalformedStartLine(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("url is missing its leading slash: {0}")]
    MissingLeadingSlash(String),
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("malformed header line: {0:?}")]
    MalformedHeaderLine(String),
    #[error("invalid header key: {0:?}")]
    InvalidHeaderKey(String),
    #[error("invalid header value for {0}")]
    InvalidHeaderValue(String),
    #[error("missing Host header")]
    MissingHost,
    #[error("line longer than {} bytes", MAX_LINE_BYTES)]
    LineTooLong,
    #[error("more than {} headers", MAX_HEADERS)]
    TooManyHeaders,
}

impl ParseError {
    /// Transport failures, as opposed to malformed input.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ParseError::EndOfStream | ParseError::TimedOut | ParseError::Io(_)
        )
    }
}

/// Result of trying to read one request off a connection.
#[derive(Debug)]
pub enum ReadOutcome {
    Success(Request),
    /// `bytes_seen` is false only when the start line came back empty, which
    /// lets the caller tell an idle connection from a partial request.
    Failure { error: ParseError, bytes_seen: bool },
}

/// Reads exactly one request from `reader`. Every line read is bounded by
/// `deadline`.
pub async fn read_request<R>(reader: &mut R, deadline: Instant) -> ReadOutcome
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();

    // Start line
    if let Err(error) = read_line(reader, deadline, &mut line).await {
        let bytes_seen = !line.is_empty();
        return ReadOutcome::Failure { error, bytes_seen };
    }
    if line.is_empty() {
        return ReadOutcome::Failure {
            error: ParseError::NoBytesReceived,
            bytes_seen: false,
        };
    }

    match read_after_start_line(reader, deadline, &line, &mut Vec::new()).await {
        Ok(request) => ReadOutcome::Success(request),
        Err(error) => ReadOutcome::Failure {
            error,
            bytes_seen: true,
        },
    }
}

async fn read_after_start_line<R>(
    reader: &mut R,
    deadline: Instant,
    start_line: &[u8],
    line: &mut Vec<u8>,
) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let start_line = std::str::from_utf8(start_line).map_err(|_| ParseError::InvalidEncoding)?;
    let (method, url, version) = parse_start_line(start_line)?;

    // Headers
    let mut headers = HashMap::new();
    let mut host = None;
    let mut close = false;
    let mut count = 0;

    loop {
        read_line(reader, deadline, line).await?;
        if line.is_empty() {
            break;
        }

        count += 1;
        if count > MAX_HEADERS {
            return Err(ParseError::TooManyHeaders);
        }

        let text = std::str::from_utf8(line).map_err(|_| ParseError::InvalidEncoding)?;
        let (key, value) = parse_header_line(text)?;

        match key.as_str() {
            "Host" => host = Some(value),
            "Connection" => close = value == "close",
            _ => {
                headers.insert(key, value);
            }
        }
    }

    let host = host.ok_or(ParseError::MissingHost)?;

    Ok(Request {
        method,
        url,
        version,
        headers,
        host,
        close,
    })
}

/// Splits a start line into method, url and version, validating each.
pub fn parse_start_line(line: &str) -> Result<(Method, String, String), ParseError> {
    let parts: Vec<&str> = line.split(' ').collect();
    let &[method, url, version] = parts.as_slice() else {
        return Err(ParseError::MalformedStartLine(line.to_string()));
    };

    let method =
        Method::from_str(method).ok_or_else(|| ParseError::UnsupportedMethod(method.to_string()))?;

    if !url.starts_with('/') {
        return Err(ParseError::MissingLeadingSlash(url.to_string()));
    }

    if version != HTTP_VERSION {
        return Err(ParseError::UnsupportedProtocol(version.to_string()));
    }

    Ok((method, url.to_string(), version.to_string()))
}

/// Parses a `Key: value` line into a canonical key and a value with leading
/// spaces removed.
pub fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::MalformedHeaderLine(line.to_string()))?;

    if !is_valid_header_key(key) {
        return Err(ParseError::InvalidHeaderKey(key.to_string()));
    }
    let key = canonical_header_key(key);

    let value = value.trim_start_matches(' ');
    // Lines are split on the terminator, so a CR left here is corrupt input.
    if value.contains('\r') {
        return Err(ParseError::InvalidHeaderValue(key));
    }

    Ok((key, value.to_string()))
}

/// Reads one line of at most `MAX_LINE_BYTES` into `line` with its terminator
/// (`\r\n` or `\n`) stripped. On failure `line` keeps whatever bytes arrived
/// before it.
async fn read_line<R>(reader: &mut R, deadline: Instant, line: &mut Vec<u8>) -> Result<(), ParseError>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();

    let mut limited = (&mut *reader).take(MAX_LINE_BYTES as u64);
    let n = match timeout_at(deadline, limited.read_until(b'\n', line)).await {
        Ok(read) => read?,
        Err(_) => return Err(ParseError::TimedOut),
    };

    if line.len() >= MAX_LINE_BYTES && line.last() != Some(&b'\n') {
        return Err(ParseError::LineTooLong);
    }

    // Zero bytes, or a line cut short without its terminator.
    if n == 0 || line.last() != Some(&b'\n') {
        return Err(ParseError::EndOfStream);
    }

    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }

    Ok(())
}
