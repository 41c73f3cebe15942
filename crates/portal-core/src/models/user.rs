use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display view of the profile returned by the login endpoint.
///
/// The session keeps the profile as opaque JSON; this view only reads the
/// fields the client shows and ignores everything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct UserProfile {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
}

impl UserProfile {
    /// Read the view out of an opaque profile. A profile that does not have
    /// the expected shape yields an empty view.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Best available human-readable name
    pub fn display_name(&self) -> String {
        let non_blank = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        if let Some(name) = non_blank(&self.full_name).or_else(|| non_blank(&self.name)) {
            return name;
        }

        let parts: Vec<String> = [non_blank(&self.first_name), non_blank(&self.last_name)]
            .into_iter()
            .flatten()
            .collect();
        if !parts.is_empty() {
            return parts.join(" ");
        }

        non_blank(&self.email).unwrap_or_else(|| "unknown user".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_backend_profile() {
        let profile = UserProfile::from_value(&json!({
            "id": 12,
            "email": "ana@example.org",
            "first_name": "Ana",
            "last_name": "Silva",
            "full_name": "Ana Silva",
            "initials": "AS",
            "role": "DIVISION_ADMIN",
            "avatar_url": null,
            "is_active": true
        }));
        assert_eq!(profile.id, Some(12));
        assert_eq!(profile.role.as_deref(), Some("DIVISION_ADMIN"));
        assert_eq!(profile.display_name(), "Ana Silva");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let names_only = UserProfile {
            first_name: Some("Ana".to_string()),
            last_name: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(names_only.display_name(), "Ana");

        let email_only = UserProfile {
            email: Some("ana@example.org".to_string()),
            full_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(email_only.display_name(), "ana@example.org");

        assert_eq!(UserProfile::default().display_name(), "unknown user");
    }

    #[test]
    fn test_unexpected_shape_is_empty() {
        assert_eq!(UserProfile::from_value(&json!([1, 2])), UserProfile::default());
        assert_eq!(UserProfile::from_value(&json!({"id": "twelve"})), UserProfile::default());
    }
}
