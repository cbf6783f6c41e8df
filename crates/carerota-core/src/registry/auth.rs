//! Authentication and profile endpoints.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use super::{Endpoint, Mutation, Query, Tag};
use crate::api::{ApiError, ApiResponse, Method};
use crate::models::{LoginPayload, Profile};

#[derive(Clone, Serialize)]
pub struct LoginArgs {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginArgs")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct Login;

impl Endpoint for Login {
    type Args = LoginArgs;
    type Response = ApiResponse<LoginPayload>;

    const NAME: &'static str = "login";
    const METHOD: Method = Method::Post;

    fn path(_args: &LoginArgs) -> String {
        "/auth/login".to_string()
    }

    fn body(args: &LoginArgs) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({ "email": args.email, "password": args.password })))
    }

    fn validate(args: &LoginArgs) -> Result<(), ApiError> {
        if args.email.trim().is_empty() || args.password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

impl Mutation for Login {
    const INVALIDATES: &'static [Tag] = &[Tag::Profile];
}

pub struct GetProfile;

impl Endpoint for GetProfile {
    type Args = ();
    type Response = ApiResponse<Profile>;

    const NAME: &'static str = "getProfile";
    const METHOD: Method = Method::Get;

    fn path(_args: &()) -> String {
        "/auth/profile".to_string()
    }
}

impl Query for GetProfile {
    const PROVIDES: &'static [Tag] = &[Tag::Profile];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOrganizationArgs {
    pub organization_id: String,
}

/// Changes the organization the session acts for; nearly every view
/// depends on it.
pub struct SwitchOrganization;

impl Endpoint for SwitchOrganization {
    type Args = SwitchOrganizationArgs;
    type Response = ApiResponse<Profile>;

    const NAME: &'static str = "switchOrganization";
    const METHOD: Method = Method::Post;

    fn path(_args: &SwitchOrganizationArgs) -> String {
        "/auth/switch-organization".to_string()
    }

    fn body(args: &SwitchOrganizationArgs) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({ "organizationId": args.organization_id })))
    }
}

impl Mutation for SwitchOrganization {
    const INVALIDATES: &'static [Tag] = &[
        Tag::Profile,
        Tag::Organization,
        Tag::LinkedOrganizations,
        Tag::Staff,
        Tag::Shifts,
        Tag::Attendance,
    ];
}
