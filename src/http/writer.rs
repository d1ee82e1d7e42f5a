use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::HTTP_VERSION;
use crate::http::response::Response;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("unsupported response protocol: {0}")]
    UnsupportedVersion(String),
    #[error("cannot read body file {path}: {source}")]
    Body {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connection closed while writing")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes the status line and headers. Headers are emitted sorted by key so
/// the output does not depend on insertion order.
pub fn write_head(resp: &Response, buf: &mut BytesMut) -> Result<(), WriteError> {
    if resp.version != HTTP_VERSION {
        return Err(WriteError::UnsupportedVersion(resp.version.clone()));
    }

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        resp.version,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.put_slice(status_line.as_bytes());

    // Headers
    let mut headers: Vec<(&String, &String)> = resp.headers.iter().collect();
    headers.sort_by(|a, b| a.0.cmp(b.0));

    for (k, v) in headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    Ok(())
}

/// Serializes the whole response, body included, into one buffer.
pub async fn serialize_response(resp: &Response) -> Result<BytesMut, WriteError> {
    let mut buf = BytesMut::with_capacity(512);
    write_head(resp, &mut buf)?;

    // Body
    if let Some(path) = &resp.file_path {
        let body = tokio::fs::read(path).await.map_err(|source| WriteError::Body {
            path: path.display().to_string(),
            source,
        })?;
        buf.put_slice(&body);
    }

    Ok(buf)
}

pub struct ResponseWriter {
    buffer: BytesMut,
    written: usize,
}

impl ResponseWriter {
    pub async fn new(response: &Response) -> Result<Self, WriteError> {
        Ok(Self {
            buffer: serialize_response(response).await?,
            written: 0,
        })
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> Result<(), WriteError>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(WriteError::Closed);
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
