use std::fmt;

/// Cache tag. Reads provide tags, writes invalidate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Profile,
    Organization,
    LinkedOrganizations,
    OrganizationInvitations,
    TemporaryHomes,
    Staff,
    StaffInvitations,
    Shifts,
    ShiftPatterns,
    Attendance,
}

impl Tag {
    pub const ALL: [Tag; 10] = [
        Tag::Profile,
        Tag::Organization,
        Tag::LinkedOrganizations,
        Tag::OrganizationInvitations,
        Tag::TemporaryHomes,
        Tag::Staff,
        Tag::StaffInvitations,
        Tag::Shifts,
        Tag::ShiftPatterns,
        Tag::Attendance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Profile => "Profile",
            Tag::Organization => "Organization",
            Tag::LinkedOrganizations => "LinkedOrganizations",
            Tag::OrganizationInvitations => "OrganizationInvitations",
            Tag::TemporaryHomes => "TemporaryHomes",
            Tag::Staff => "Staff",
            Tag::StaffInvitations => "StaffInvitations",
            Tag::Shifts => "Shifts",
            Tag::ShiftPatterns => "ShiftPatterns",
            Tag::Attendance => "Attendance",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
