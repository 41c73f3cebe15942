//! API client for the portal backend.
//!
//! Every request built here goes through the `RequestAugmenter` right
//! before it is handed to `reqwest`, so whatever token durable storage holds
//! at that moment is the one sent.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::auth::NewSession;
use crate::storage::Storage;

use super::{ApiError, RequestAugmenter};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, relative to the base URL
const LOGIN_PATH: &str = "/api/auth/login/";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login payload: a token pair and, usually, the user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "unknown"))]
    pub user: Option<Value>,
}

impl From<LoginResponse> for NewSession {
    fn from(login: LoginResponse) -> Self {
        NewSession {
            access: login.access,
            refresh: login.refresh,
            user: login.user.filter(|u| !u.is_null()),
        }
    }
}

/// API client for the portal backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    augmenter: RequestAugmenter,
}

impl ApiClient {
    /// Create a client for `base_url` that authorizes requests from `storage`
    pub fn new(base_url: &str, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let base_url = Self::validate_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            augmenter: RequestAugmenter::new(storage),
        })
    }

    fn validate_base_url(base_url: &str) -> Result<String, ApiError> {
        let invalid = |reason: String| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let parsed = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(base_url.trim().trim_end_matches('/').to_string()),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path, with exactly one `/` at the join
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Exchange email and password for a token pair.
    ///
    /// Nothing is persisted here; pass the result to
    /// `SessionStore::set_session`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .request(Method::POST, LOGIN_PATH)
            .json(&LoginRequest { email, password });

        let response = self.send(request).await?;
        let login: LoginResponse = Self::decode(response, LOGIN_PATH).await?;
        debug!(has_user = login.user.is_some(), "Login succeeded");
        Ok(login)
    }

    /// Authenticated GET, decoding the JSON body into `T`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Self::decode(response, path).await
    }

    /// Authenticated GET returning the raw JSON body
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.get(path).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json")
    }

    /// Build, authorize, and dispatch a request.
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let mut request = builder.build()?;
        self.augmenter.augment(&mut request)?;

        debug!(
            method = %request.method(),
            url = %request.url(),
            authorized = request.headers().contains_key(header::AUTHORIZATION),
            "Sending request"
        );

        let response = self.client.execute(request).await?;
        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", path, e))
        })
    }
}
