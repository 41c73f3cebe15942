//! Bearer-token stage applied to every outgoing request.

use std::sync::Arc;

use reqwest::header::{self, HeaderValue, InvalidHeaderValue};
use reqwest::Request;
use thiserror::Error;
use tracing::trace;

use crate::auth::ACCESS_KEY;
use crate::storage::{Storage, StorageError};

#[derive(Error, Debug)]
pub enum AugmentError {
    #[error("Failed to read access token: {0}")]
    Storage(#[from] StorageError),

    #[error("Stored access token is not a valid header value")]
    InvalidToken(#[from] InvalidHeaderValue),
}

/// Attaches `Authorization: Bearer <token>` to requests.
///
/// The token is read from durable storage on every call rather than from a
/// `SessionStore`, so any client sharing the storage sees the latest login
/// or logout. Responses are never inspected.
#[derive(Clone)]
pub struct RequestAugmenter {
    storage: Arc<dyn Storage>,
}

impl RequestAugmenter {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Set the authorization header if a token is stored, replacing any
    /// existing value. Without a token the request is left untouched.
    pub fn augment(&self, request: &mut Request) -> Result<(), AugmentError> {
        let token = match self.storage.get_item(ACCESS_KEY)? {
            Some(token) if !token.is_empty() => token,
            _ => {
                trace!(url = %request.url(), "No access token, sending unauthenticated");
                return Ok(());
            }
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        request.headers_mut().insert(header::AUTHORIZATION, value);
        trace!(url = %request.url(), "Attached bearer token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use reqwest::{Client, Method};

    fn request(client: &Client) -> Request {
        client
            .request(Method::GET, "http://127.0.0.1:8000/api/documents/")
            .header(header::ACCEPT, "application/json")
            .build()
            .unwrap()
    }

    #[test]
    fn test_attaches_bearer_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("access", "tok123").unwrap();
        let augmenter = RequestAugmenter::new(storage);

        let mut req = request(&Client::new());
        augmenter.augment(&mut req).unwrap();

        let auth = req.headers().get(header::AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer tok123");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn test_without_token_leaves_headers_unchanged() {
        let augmenter = RequestAugmenter::new(Arc::new(MemoryStorage::new()));

        let client = Client::new();
        let mut req = request(&client);
        let before = req.headers().clone();
        augmenter.augment(&mut req).unwrap();

        assert_eq!(req.headers(), &before);
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_overwrites_existing_authorization() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("access", "fresh").unwrap();
        let augmenter = RequestAugmenter::new(storage);

        let mut req = Client::new()
            .get("http://127.0.0.1:8000/api/memos/")
            .header(header::AUTHORIZATION, "Bearer stale")
            .build()
            .unwrap();
        augmenter.augment(&mut req).unwrap();

        let values: Vec<_> = req.headers().get_all(header::AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].to_str().unwrap(), "Bearer fresh");
    }

    #[test]
    fn test_reads_storage_at_call_time() {
        let storage = Arc::new(MemoryStorage::new());
        let augmenter = RequestAugmenter::new(storage.clone());
        let client = Client::new();

        storage.set_item("access", "first").unwrap();
        let mut req = request(&client);
        augmenter.augment(&mut req).unwrap();
        assert_eq!(req.headers()[header::AUTHORIZATION], "Bearer first");

        storage.remove_item("access").unwrap();
        let mut req = request(&client);
        augmenter.augment(&mut req).unwrap();
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_rejects_token_with_control_characters() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("access", "bad\ntoken").unwrap();
        let augmenter = RequestAugmenter::new(storage);

        let mut req = request(&Client::new());
        let err = augmenter.augment(&mut req).unwrap_err();
        assert!(matches!(err, AugmentError::InvalidToken(_)));
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }
}
