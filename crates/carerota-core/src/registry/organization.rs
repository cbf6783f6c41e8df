//! Organization, link invitation and temporary home endpoints.

use serde::Serialize;
use serde_json::{json, Value};

use super::{json_body, segment, Endpoint, Mutation, Query, Tag};
use crate::api::{Ack, ApiError, ApiResponse, Method, Paginated};
use crate::models::{
    Address, ClaimOutcome, Contact, Invitation, Organization, OrganizationType, TemporaryHome,
};

/// Default page size for organization lists.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

pub struct GetCurrentOrganization;

impl Endpoint for GetCurrentOrganization {
    type Args = ();
    type Response = ApiResponse<Organization>;

    const NAME: &'static str = "getCurrentOrganization";
    const METHOD: Method = Method::Get;

    fn path(_args: &()) -> String {
        "/organizations/current".to_string()
    }
}

impl Query for GetCurrentOrganization {
    const PROVIDES: &'static [Tag] = &[Tag::Organization];
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

impl OrganizationChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.address.is_none()
            && self.contact.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOrganizationArgs {
    pub id: String,
    pub changes: OrganizationChanges,
}

pub struct UpdateOrganization;

impl Endpoint for UpdateOrganization {
    type Args = UpdateOrganizationArgs;
    type Response = ApiResponse<Organization>;

    const NAME: &'static str = "updateOrganization";
    const METHOD: Method = Method::Patch;

    fn path(args: &UpdateOrganizationArgs) -> String {
        format!("/organizations/{}", segment(&args.id))
    }

    fn body(args: &UpdateOrganizationArgs) -> Result<Option<Value>, ApiError> {
        json_body(Self::NAME, &args.changes)
    }

    fn validate(args: &UpdateOrganizationArgs) -> Result<(), ApiError> {
        if args.changes.is_empty() {
            return Err(ApiError::Validation("Nothing to update".to_string()));
        }
        if matches!(args.changes.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(ApiError::Validation("Organization name is required".to_string()));
        }
        Ok(())
    }
}

impl Mutation for UpdateOrganization {
    const INVALIDATES: &'static [Tag] = &[Tag::Organization, Tag::LinkedOrganizations];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedOrganizationsArgs {
    pub page: u64,
    pub limit: u64,
    pub org_type: Option<OrganizationType>,
}

impl Default for LinkedOrganizationsArgs {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            org_type: None,
        }
    }
}

pub struct ListLinkedOrganizations;

impl Endpoint for ListLinkedOrganizations {
    type Args = LinkedOrganizationsArgs;
    type Response = Paginated<Organization>;

    const NAME: &'static str = "listLinkedOrganizations";
    const METHOD: Method = Method::Get;

    fn path(_args: &LinkedOrganizationsArgs) -> String {
        "/organizations/linked".to_string()
    }

    fn query(args: &LinkedOrganizationsArgs) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", args.page.to_string()), ("limit", args.limit.to_string())];
        match args.org_type {
            Some(OrganizationType::Agency) => query.push(("type", "agency".to_string())),
            Some(OrganizationType::Home) => query.push(("type", "home".to_string())),
            Some(OrganizationType::Unknown) | None => {}
        }
        query
    }
}

impl Query for ListLinkedOrganizations {
    const PROVIDES: &'static [Tag] = &[Tag::LinkedOrganizations];
}

pub struct ListLinkInvitations;

impl Endpoint for ListLinkInvitations {
    type Args = ();
    type Response = ApiResponse<Vec<Invitation>>;

    const NAME: &'static str = "listLinkInvitations";
    const METHOD: Method = Method::Get;

    fn path(_args: &()) -> String {
        "/organizations/link-invitations".to_string()
    }
}

impl Query for ListLinkInvitations {
    const PROVIDES: &'static [Tag] = &[Tag::OrganizationInvitations];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLinkInvitationArgs {
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct SendLinkInvitation;

impl Endpoint for SendLinkInvitation {
    type Args = SendLinkInvitationArgs;
    type Response = ApiResponse<Invitation>;

    const NAME: &'static str = "sendLinkInvitation";
    const METHOD: Method = Method::Post;

    fn path(_args: &SendLinkInvitationArgs) -> String {
        "/organizations/link-invitations".to_string()
    }

    fn body(args: &SendLinkInvitationArgs) -> Result<Option<Value>, ApiError> {
        json_body(Self::NAME, args)
    }
}

impl Mutation for SendLinkInvitation {
    const INVALIDATES: &'static [Tag] = &[Tag::OrganizationInvitations];
}

#[derive(Debug, Clone, Serialize)]
pub struct RespondToLinkInvitationArgs {
    pub token: String,
    pub accept: bool,
}

pub struct RespondToLinkInvitation;

impl Endpoint for RespondToLinkInvitation {
    type Args = RespondToLinkInvitationArgs;
    type Response = Ack;

    const NAME: &'static str = "respondToLinkInvitation";
    const METHOD: Method = Method::Post;

    fn path(args: &RespondToLinkInvitationArgs) -> String {
        format!("/organizations/link-invitations/{}/respond", segment(&args.token))
    }

    fn body(args: &RespondToLinkInvitationArgs) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({ "accept": args.accept })))
    }
}

impl Mutation for RespondToLinkInvitation {
    const INVALIDATES: &'static [Tag] = &[Tag::OrganizationInvitations, Tag::LinkedOrganizations];
}

/// Args: id of the linked organization.
pub struct UnlinkOrganization;

impl Endpoint for UnlinkOrganization {
    type Args = String;
    type Response = Ack;

    const NAME: &'static str = "unlinkOrganization";
    const METHOD: Method = Method::Delete;

    fn path(organization_id: &String) -> String {
        format!("/organizations/linked/{}", segment(organization_id))
    }
}

impl Mutation for UnlinkOrganization {
    const INVALIDATES: &'static [Tag] = &[Tag::LinkedOrganizations, Tag::Staff];
}

pub struct ListTemporaryHomes;

impl Endpoint for ListTemporaryHomes {
    type Args = ();
    type Response = ApiResponse<Vec<TemporaryHome>>;

    const NAME: &'static str = "listTemporaryHomes";
    const METHOD: Method = Method::Get;

    fn path(_args: &()) -> String {
        "/temporary-homes".to_string()
    }
}

impl Query for ListTemporaryHomes {
    const PROVIDES: &'static [Tag] = &[Tag::TemporaryHomes];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemporaryHomeArgs {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

pub struct CreateTemporaryHome;

impl Endpoint for CreateTemporaryHome {
    type Args = CreateTemporaryHomeArgs;
    type Response = ApiResponse<TemporaryHome>;

    const NAME: &'static str = "createTemporaryHome";
    const METHOD: Method = Method::Post;

    fn path(_args: &CreateTemporaryHomeArgs) -> String {
        "/temporary-homes".to_string()
    }

    fn body(args: &CreateTemporaryHomeArgs) -> Result<Option<Value>, ApiError> {
        json_body(Self::NAME, args)
    }

    fn validate(args: &CreateTemporaryHomeArgs) -> Result<(), ApiError> {
        if args.name.trim().is_empty() {
            return Err(ApiError::Validation("Home name is required".to_string()));
        }
        Ok(())
    }
}

impl Mutation for CreateTemporaryHome {
    const INVALIDATES: &'static [Tag] = &[Tag::TemporaryHomes];
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTemporaryHomeArgs {
    pub temporary_id: String,
    pub organization_id: String,
}

/// Merges a temporary home into a real organization. The server moves the
/// placeholder's shifts, timesheets and invoices and reports the counts.
pub struct ClaimTemporaryHome;

impl Endpoint for ClaimTemporaryHome {
    type Args = ClaimTemporaryHomeArgs;
    type Response = ApiResponse<ClaimOutcome>;

    const NAME: &'static str = "claimTemporaryHome";
    const METHOD: Method = Method::Post;

    fn path(args: &ClaimTemporaryHomeArgs) -> String {
        format!("/temporary-homes/{}/claim", segment(&args.temporary_id))
    }

    fn body(args: &ClaimTemporaryHomeArgs) -> Result<Option<Value>, ApiError> {
        Ok(Some(json!({ "organizationId": args.organization_id })))
    }
}

impl Mutation for ClaimTemporaryHome {
    const INVALIDATES: &'static [Tag] =
        &[Tag::TemporaryHomes, Tag::LinkedOrganizations, Tag::Shifts];
}

/// Args: temporary id of the claimed home.
pub struct UnclaimTemporaryHome;

impl Endpoint for UnclaimTemporaryHome {
    type Args = String;
    type Response = ApiResponse<ClaimOutcome>;

    const NAME: &'static str = "unclaimTemporaryHome";
    const METHOD: Method = Method::Post;

    fn path(temporary_id: &String) -> String {
        format!("/temporary-homes/{}/unclaim", segment(temporary_id))
    }
}

impl Mutation for UnclaimTemporaryHome {
    const INVALIDATES: &'static [Tag] =
        &[Tag::TemporaryHomes, Tag::LinkedOrganizations, Tag::Shifts];
}
