use serde::{Deserialize, Serialize};

use super::Organization;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl User {
    /// Full name, falling back to the email address.
    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// Kind of work a staff member does within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffType {
    Care,
    Admin,
    Other,
    #[serde(other)]
    Unknown,
}

/// Returned by `getProfile`: who is signed in and in which organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: User,
    #[serde(default)]
    pub current_organization: Option<Organization>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub staff_type: Option<StaffType>,
}

/// Returned by `login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut user = User {
            id: "u1".to_string(),
            email: "sam@example.com".to_string(),
            first_name: Some("Sam".to_string()),
            last_name: Some("Okafor".to_string()),
            phone: None,
        };
        assert_eq!(user.display_name(), "Sam Okafor");

        user.first_name = None;
        user.last_name = None;
        assert_eq!(user.display_name(), "sam@example.com");
    }

    #[test]
    fn test_parse_profile_with_unknown_staff_type() {
        let json = r#"{
            "user": {"id": "u1", "email": "a@b.c"},
            "permissions": ["shifts:write"],
            "staffType": "nurse"
        }"#;
        let profile: Profile = serde_json::from_str(json).expect("parse profile");
        assert_eq!(profile.staff_type, Some(StaffType::Unknown));
        assert!(profile.current_organization.is_none());
    }
}
