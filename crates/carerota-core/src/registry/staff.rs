//! Staff list and staff invitation lifecycle endpoints.

use serde::Serialize;
use serde_json::Value;

use super::{json_body, segment, Endpoint, Mutation, Query, Tag};
use crate::api::{Ack, ApiError, ApiResponse, Method, Paginated};
use crate::models::{Invitation, StaffMembership, StaffRole, StaffType};

/// Default page size for staff lists.
pub const DEFAULT_PAGE_LIMIT: u64 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct ListStaffArgs {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
}

impl Default for ListStaffArgs {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            search: None,
        }
    }
}

pub struct ListStaff;

impl Endpoint for ListStaff {
    type Args = ListStaffArgs;
    type Response = Paginated<StaffMembership>;

    const NAME: &'static str = "listStaff";
    const METHOD: Method = Method::Get;

    fn path(_args: &ListStaffArgs) -> String {
        "/staff".to_string()
    }

    fn query(args: &ListStaffArgs) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", args.page.to_string()), ("limit", args.limit.to_string())];
        if let Some(search) = args.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                query.push(("search", search.to_string()));
            }
        }
        query
    }
}

impl Query for ListStaff {
    const PROVIDES: &'static [Tag] = &[Tag::Staff];
}

pub struct ListStaffInvitations;

impl Endpoint for ListStaffInvitations {
    type Args = ();
    type Response = ApiResponse<Vec<Invitation>>;

    const NAME: &'static str = "listStaffInvitations";
    const METHOD: Method = Method::Get;

    fn path(_args: &()) -> String {
        "/staff/invitations".to_string()
    }
}

impl Query for ListStaffInvitations {
    const PROVIDES: &'static [Tag] = &[Tag::StaffInvitations];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteStaffArgs {
    pub email: String,
    pub role: StaffRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_type: Option<StaffType>,
}

pub struct InviteStaff;

impl Endpoint for InviteStaff {
    type Args = InviteStaffArgs;
    type Response = ApiResponse<Invitation>;

    const NAME: &'static str = "inviteStaff";
    const METHOD: Method = Method::Post;

    fn path(_args: &InviteStaffArgs) -> String {
        "/staff/invitations".to_string()
    }

    fn body(args: &InviteStaffArgs) -> Result<Option<Value>, ApiError> {
        let args = InviteStaffArgs {
            email: args.email.trim().to_string(),
            ..args.clone()
        };
        json_body(Self::NAME, &args)
    }

    fn validate(args: &InviteStaffArgs) -> Result<(), ApiError> {
        let email = args.email.trim();
        let valid = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !valid {
            return Err(ApiError::Validation(format!("'{}' is not a valid email", email)));
        }
        if args.role == StaffRole::Unknown {
            return Err(ApiError::Validation("A role is required".to_string()));
        }
        Ok(())
    }
}

impl Mutation for InviteStaff {
    const INVALIDATES: &'static [Tag] = &[Tag::StaffInvitations];
}

/// Args: invitation token.
pub struct AcceptStaffInvitation;

impl Endpoint for AcceptStaffInvitation {
    type Args = String;
    type Response = ApiResponse<StaffMembership>;

    const NAME: &'static str = "acceptStaffInvitation";
    const METHOD: Method = Method::Post;

    fn path(token: &String) -> String {
        format!("/staff/invitations/{}/accept", segment(token))
    }
}

impl Mutation for AcceptStaffInvitation {
    const INVALIDATES: &'static [Tag] = &[Tag::StaffInvitations, Tag::Staff, Tag::Profile];
}

/// Args: invitation token.
pub struct DeclineStaffInvitation;

impl Endpoint for DeclineStaffInvitation {
    type Args = String;
    type Response = Ack;

    const NAME: &'static str = "declineStaffInvitation";
    const METHOD: Method = Method::Post;

    fn path(token: &String) -> String {
        format!("/staff/invitations/{}/decline", segment(token))
    }
}

impl Mutation for DeclineStaffInvitation {
    const INVALIDATES: &'static [Tag] = &[Tag::StaffInvitations];
}

/// Args: invitation id.
pub struct RevokeStaffInvitation;

impl Endpoint for RevokeStaffInvitation {
    type Args = String;
    type Response = Ack;

    const NAME: &'static str = "revokeStaffInvitation";
    const METHOD: Method = Method::Delete;

    fn path(invitation_id: &String) -> String {
        format!("/staff/invitations/{}", segment(invitation_id))
    }
}

impl Mutation for RevokeStaffInvitation {
    const INVALIDATES: &'static [Tag] = &[Tag::StaffInvitations];
}

/// Args: user id of the staff member.
pub struct RemoveStaff;

impl Endpoint for RemoveStaff {
    type Args = String;
    type Response = Ack;

    const NAME: &'static str = "removeStaff";
    const METHOD: Method = Method::Delete;

    fn path(user_id: &String) -> String {
        format!("/staff/{}", segment(user_id))
    }
}

impl Mutation for RemoveStaff {
    const INVALIDATES: &'static [Tag] = &[Tag::Staff, Tag::Shifts];
}
