//! HTTP retrieval layer.

pub mod http;
