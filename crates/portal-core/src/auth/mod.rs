//! Authentication session management.
//!
//! This module provides:
//! - `SessionStore`: access/refresh tokens and the user profile, mirrored
//!   to durable storage on every mutation
//! - `NewSession`: the credentials a successful login hands to the store
//!
//! The session has two observable modes, authenticated and not, and only
//! `set_session` and `clear_session` move between them. There is no expiry
//! tracking and no token refresh.

pub mod session;

pub use session::{NewSession, SessionData, SessionStore, ACCESS_KEY, REFRESH_KEY, USER_KEY};
