use serde::{Deserialize, Serialize};

use super::{StaffType, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Manager,
    Staff,
    #[serde(other)]
    Unknown,
}

impl StaffRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            StaffRole::Admin => "Admin",
            StaffRole::Manager => "Manager",
            StaffRole::Staff => "Staff",
            StaffRole::Unknown => "Unknown",
        }
    }
}

/// Join between a user and an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMembership {
    pub user: User,
    pub organization_id: String,
    pub role: StaffRole,
    #[serde(default)]
    pub staff_type: Option<StaffType>,
}
