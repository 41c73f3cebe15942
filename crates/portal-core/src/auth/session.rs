use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::UserProfile;
use crate::storage::{Storage, StorageError};

/// Durable key for the raw access token
pub const ACCESS_KEY: &str = "access";

/// Durable key for the raw refresh token
pub const REFRESH_KEY: &str = "refresh";

/// Durable key for the JSON-serialized user profile
pub const USER_KEY: &str = "user";

/// Removal order. The access token goes first so that a reader racing a
/// non-transactional backend already sees an unauthenticated session.
const SESSION_KEYS: [&str; 3] = [ACCESS_KEY, REFRESH_KEY, USER_KEY];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct SessionData {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[cfg_attr(feature = "ts", ts(type = "unknown"))]
    pub user: Option<Value>,
}

impl SessionData {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Credentials handed to `SessionStore::set_session` after a successful login.
///
/// Tokens are not validated here; an empty token is persisted as given.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub access: String,
    pub refresh: String,
    pub user: Option<Value>,
}

impl NewSession {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }
}

/// The authenticated session and its durable backing.
///
/// Owned by the application and passed to whatever needs it. Both mutations
/// write durable storage before touching memory, so a failed write leaves
/// the in-memory session as it was.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    data: SessionData,
}

impl SessionStore {
    /// Load the session from durable storage.
    ///
    /// Missing or empty entries read as absent. A `user` entry that is not
    /// valid JSON is dropped with a warning instead of failing hydration.
    pub fn hydrate(storage: Arc<dyn Storage>) -> Result<Self, StorageError> {
        let access_token = non_empty(storage.get_item(ACCESS_KEY)?);
        let refresh_token = non_empty(storage.get_item(REFRESH_KEY)?);
        let user = storage.get_item(USER_KEY)?.and_then(|raw| parse_user(&raw));

        let data = SessionData {
            access_token,
            refresh_token,
            user,
        };
        debug!(
            authenticated = data.is_authenticated(),
            has_user = data.user.is_some(),
            "Session hydrated"
        );

        Ok(Self { storage, data })
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_authenticated()
    }

    /// Replace the session after a successful login.
    ///
    /// When `user` is `None` the durable `user` entry is left untouched while
    /// the in-memory profile becomes absent; a later hydrate may therefore
    /// restore a profile from an earlier login.
    pub fn set_session(&mut self, session: NewSession) -> Result<(), StorageError> {
        if session.access.is_empty() || session.refresh.is_empty() {
            warn!("Persisting session with an empty token");
        }

        // A JSON null profile counts as no profile, as it does on hydrate
        let user = session.user.filter(|u| !u.is_null());
        let user_json = user.as_ref().map(serde_json::to_string).transpose()?;

        // Access token last, so a reader of a non-transactional backend that
        // sees the new token also sees the rest of the session.
        {
            let mut entries: Vec<(&str, &str)> = Vec::with_capacity(3);
            if let Some(ref json) = user_json {
                entries.push((USER_KEY, json.as_str()));
            }
            entries.push((REFRESH_KEY, session.refresh.as_str()));
            entries.push((ACCESS_KEY, session.access.as_str()));
            self.storage.set_items(&entries)?;
        }

        self.data = SessionData {
            access_token: Some(session.access),
            refresh_token: Some(session.refresh),
            user,
        };
        info!(has_user = self.data.user.is_some(), "Session stored");
        Ok(())
    }

    /// Log out: drop all three fields from durable storage and memory.
    /// Calling this on an empty session is a no-op.
    pub fn clear_session(&mut self) -> Result<(), StorageError> {
        self.storage.remove_items(&SESSION_KEYS)?;
        self.data = SessionData::default();
        info!("Session cleared");
        Ok(())
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn access_token(&self) -> Option<&str> {
        self.data.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.data.refresh_token.as_deref()
    }

    pub fn user(&self) -> Option<&Value> {
        self.data.user.as_ref()
    }

    /// Typed view over the stored profile, for display
    pub fn profile(&self) -> Option<UserProfile> {
        self.data.user.as_ref().map(UserProfile::from_value)
    }

    /// Shared handle to the durable backing, for building an `ApiClient`
    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_user(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => None,
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed stored user profile");
            None
        }
    }
}
