//! Network utilities for HTTP operations and request signing.
//!
//! This module provides:
//! - HTTP client wrapper with uniform error mapping
//! - AWS SigV4 signing for S3-compatible PUTs

mod client;
pub mod sigv4;

pub use client::{extract_domain, HttpClient};
pub use sigv4::{SigV4Signer, SignableRequest};
