//! Portal client core.
//!
//! Session lifecycle for the portal backend: a `SessionStore` holding the
//! access/refresh tokens and user profile in durable storage, and an
//! `ApiClient` whose requests are authorized by a `RequestAugmenter` reading
//! the current token from that same storage.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use portal_core::{ApiClient, Config, SessionStore};
//!
//! let config = Config::load()?;
//! let mut session = SessionStore::hydrate(config.open_storage()?)?;
//!
//! let api = ApiClient::new(config.base_url(), session.storage())?;
//! if !session.is_authenticated() {
//!     let login = api.login("ana@example.org", "secret").await?;
//!     session.set_session(login.into())?;
//! }
//! let documents = api.get_json("/api/documents/").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, AugmentError, LoginResponse, RequestAugmenter};
pub use auth::{NewSession, SessionData, SessionStore};
pub use config::{Config, StorageBackend};
pub use models::UserProfile;
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage, StorageError};
