//! Data models for the staffing domain.
//!
//! All entities are server-owned; these are the client's transient copies,
//! parsed at the network boundary:
//!
//! - `User`, `Profile`, `StaffType`: the signed-in person and their access
//! - `Organization`, `TemporaryHome`, `MigrationStats`: agencies and homes
//! - `StaffMembership`, `StaffRole`: user/organization join
//! - `Invitation`: staff and organization-link invitations
//! - `ShiftInstance`, `ShiftPattern`: scheduling calendar entries
//! - `QrCode`, `AttendanceRecord`, `ScanResult`: QR clock-in

pub mod attendance;
pub mod invitation;
pub mod organization;
pub mod shift;
pub mod staff;
pub mod user;

pub use attendance::{AttendanceRecord, QrCode, ScanAction, ScanResult};
pub use invitation::{Invitation, InvitationStatus};
pub use organization::{
    Address, ClaimOutcome, Contact, MigrationStats, Organization, OrganizationType,
    TemporaryHome,
};
pub use shift::{ShiftInstance, ShiftPattern, ShiftStatus};
pub use staff::{StaffMembership, StaffRole};
pub use user::{LoginPayload, Profile, StaffType, User};
