//! docserve - static file HTTP/1.1 server
//!
//! Serves GET requests from a document root over persistent connections.

pub mod config;
pub mod http;
pub mod server;
