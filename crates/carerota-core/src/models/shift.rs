use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShiftStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftPattern {
    pub id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl ShiftPattern {
    /// Length of the shift; patterns ending before they start run overnight.
    pub fn duration(&self) -> Duration {
        let span = self.end_time - self.start_time;
        if span <= Duration::zero() {
            span + Duration::days(1)
        } else {
            span
        }
    }

    pub fn is_overnight(&self) -> bool {
        self.end_time <= self.start_time
    }
}

/// One dated occurrence of a pattern needing `count` staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInstance {
    pub id: String,
    pub date: NaiveDate,
    pub pattern: ShiftPattern,
    #[serde(default)]
    pub assigned_users: Vec<User>,
    pub status: ShiftStatus,
    pub count: u32,
}

impl ShiftInstance {
    pub fn open_slots(&self) -> u32 {
        let assigned = u32::try_from(self.assigned_users.len()).unwrap_or(u32::MAX);
        self.count.saturating_sub(assigned)
    }

    pub fn is_full(&self) -> bool {
        self.open_slots() == 0
    }

    /// More people assigned than slots; only the server can cause this.
    pub fn is_overfilled(&self) -> bool {
        self.assigned_users.len() > self.count as usize
    }

    pub fn can_assign(&self, additional: usize) -> bool {
        additional <= self.open_slots() as usize
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assigned_users.iter().any(|u| u.id == user_id)
    }
}
