//! HTTP/1.1 static file serving.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection state machine (read, dispatch, respond)
//! - **`parser`**: Reads one request line-by-line off a buffered stream
//! - **`request`**: Validated request representation
//! - **`response`**: 200 / 400 / 404 responses
//! - **`writer`**: Serializes responses (headers sorted by key) and writes them out
//! - **`resolver`**: Maps URLs to files below the document root
//! - **`header`**: Header key validation and canonical casing
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← Deadline armed, read one request
//!        └──────┬───────────┘
//!               │ Request or parse failure (idle timeout / EOF → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │    Dispatch      │ ← Resolve path, build 200 / 404 / 400
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Responded     │ ← Serialize and write in one go
//!        └──────┬───────────┘
//!               ├─ Keep-Alive → AwaitingRequest (same connection)
//!               └─ Connection: close or 400 → Closed
//! ```

pub mod connection;
pub mod header;
pub mod mime;
pub mod parser;
pub mod request;
pub mod resolver;
pub mod response;
pub mod writer;
