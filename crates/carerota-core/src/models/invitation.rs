use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Organization, StaffRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    #[serde(alias = "declined")]
    Rejected,
    #[serde(other)]
    Unknown,
}

/// A staff invitation or an organization-link invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<StaffRole>,
    #[serde(default)]
    pub organization: Option<Organization>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
}

impl InvitationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvitationStatus::Accepted | InvitationStatus::Expired | InvitationStatus::Rejected
        )
    }
}

impl Invitation {
    /// Status as of `now`: a pending invitation past its expiry reads as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if now >= self.expires_at => InvitationStatus::Expired,
            status => status,
        }
    }

    pub fn can_respond(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }
}
