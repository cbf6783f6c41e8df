use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    Agency,
    Home,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: OrganizationType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

impl Organization {
    pub fn is_agency(&self) -> bool {
        self.org_type == OrganizationType::Agency
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Format the address as a single line.
    pub fn formatted(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.line1, &self.line2, &self.city, &self.postcode]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Placeholder organization an agency creates for a home that has not
/// joined yet. Claiming merges it into a real organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryHome {
    pub temporary_id: String,
    pub name: String,
    #[serde(default)]
    pub is_claimed: bool,
    #[serde(default)]
    pub claimed_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Records moved by the server when a temporary home is claimed or unclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStats {
    #[serde(default)]
    pub shifts: u32,
    #[serde(default)]
    pub timesheets: u32,
    #[serde(default)]
    pub invoices: u32,
}

impl MigrationStats {
    pub fn total(&self) -> u32 {
        self.shifts + self.timesheets + self.invoices
    }

    pub fn summary(&self) -> String {
        format!(
            "{} shifts, {} timesheets, {} invoices moved",
            self.shifts, self.timesheets, self.invoices
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub temporary_id: String,
    #[serde(default)]
    pub claimed_by: Option<String>,
    #[serde(default)]
    pub migration_stats: MigrationStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_organization() {
        let json = r#"{
            "id": "org-1",
            "name": "Meadow View",
            "type": "home",
            "category": "residential",
            "address": {"line1": "1 High St", "city": "Leeds", "postcode": "LS1 1AA"}
        }"#;
        let org: Organization = serde_json::from_str(json).expect("parse organization");
        assert_eq!(org.org_type, OrganizationType::Home);
        assert!(!org.is_agency());
        assert_eq!(
            org.address.and_then(|a| a.formatted()),
            Some("1 High St, Leeds, LS1 1AA".to_string())
        );
    }

    #[test]
    fn test_address_formatted_empty() {
        let address = Address {
            line1: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(address.formatted(), None);
    }

    #[test]
    fn test_migration_stats() {
        let outcome: ClaimOutcome = serde_json::from_str(
            r#"{"temporaryId":"tmp-9","claimedBy":"org-2","migrationStats":{"shifts":12,"invoices":2}}"#,
        )
        .expect("parse claim outcome");
        assert_eq!(outcome.migration_stats.total(), 14);
        assert_eq!(
            outcome.migration_stats.summary(),
            "12 shifts, 0 timesheets, 2 invoices moved"
        );
    }
}
