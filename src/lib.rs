//! fileserve - minimal HTTP/1.1 static file server
//!
//! Core library: request parsing, path resolution and response writing.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
