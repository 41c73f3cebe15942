//! Data models for portal entities.
//!
//! - `UserProfile`: display view of the logged-in user's profile

pub mod user;

pub use user::UserProfile;
