//! HTTP client module for the portal backend.
//!
//! This module provides the `ApiClient` for talking to the backend REST API
//! and the `RequestAugmenter` that every request passes through before it
//! is sent. The API uses JWT bearer tokens obtained from the login endpoint.

pub mod augment;
pub mod client;
pub mod error;

pub use augment::{AugmentError, RequestAugmenter};
pub use client::{ApiClient, LoginResponse};
pub use error::ApiError;
