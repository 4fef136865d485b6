//! Utility modules for the iconhub library

pub mod http;

pub use http::HttpClient;
