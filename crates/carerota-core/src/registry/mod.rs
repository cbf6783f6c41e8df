//! Endpoint registry.
//!
//! Every remote operation is a unit type implementing [`Endpoint`] plus
//! either [`Query`] (cached read, provides tags) or [`Mutation`] (uncached
//! write, invalidates tags). Tags are a closed enum and the tag lists are
//! associated constants, so the mutation→tags map is fixed at compile time.

pub mod attendance;
pub mod auth;
pub mod organization;
pub mod shifts;
pub mod staff;
pub mod tags;

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiError, Envelope, Method};

pub use tags::Tag;

/// Payload type an endpoint resolves to once its envelope is unwrapped.
pub type Output<E> = <<E as Endpoint>::Response as Envelope>::Payload;

/// A remote operation: method, URL template and request/response shapes.
pub trait Endpoint: Send + Sync + 'static {
    /// Request parameters. Serialized form doubles as the cache key.
    type Args: Serialize + Clone + Send + Sync + 'static;
    /// Wire envelope the response body is parsed into.
    type Response: Envelope;

    /// Unique name, used in cache keys and logs.
    const NAME: &'static str;
    const METHOD: Method;

    /// Path relative to the API base URL, starting with `/`.
    fn path(args: &Self::Args) -> String;

    fn query(_args: &Self::Args) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn body(_args: &Self::Args) -> Result<Option<Value>, ApiError> {
        Ok(None)
    }

    /// Client-side checks run before anything goes on the wire.
    fn validate(_args: &Self::Args) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Cached read.
pub trait Query: Endpoint {
    const PROVIDES: &'static [Tag];
}

/// Uncached write.
pub trait Mutation: Endpoint {
    const INVALIDATES: &'static [Tag];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Write,
}

/// Static description of one registered endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointInfo {
    pub name: &'static str,
    pub method: Method,
    pub kind: OperationKind,
    pub tags: &'static [Tag],
}

impl EndpointInfo {
    pub fn query<Q: Query>() -> Self {
        Self {
            name: Q::NAME,
            method: Q::METHOD,
            kind: OperationKind::Read,
            tags: Q::PROVIDES,
        }
    }

    pub fn mutation<M: Mutation>() -> Self {
        Self {
            name: M::NAME,
            method: M::METHOD,
            kind: OperationKind::Write,
            tags: M::INVALIDATES,
        }
    }
}

/// Every endpoint the client knows about.
pub fn catalog() -> Vec<EndpointInfo> {
    use attendance::*;
    use auth::*;
    use organization::*;
    use shifts::*;
    use staff::*;

    vec![
        // auth
        EndpointInfo::mutation::<Login>(),
        EndpointInfo::query::<GetProfile>(),
        EndpointInfo::mutation::<SwitchOrganization>(),
        // organization
        EndpointInfo::query::<GetCurrentOrganization>(),
        EndpointInfo::mutation::<UpdateOrganization>(),
        EndpointInfo::query::<ListLinkedOrganizations>(),
        EndpointInfo::query::<ListLinkInvitations>(),
        EndpointInfo::mutation::<SendLinkInvitation>(),
        EndpointInfo::mutation::<RespondToLinkInvitation>(),
        EndpointInfo::mutation::<UnlinkOrganization>(),
        EndpointInfo::query::<ListTemporaryHomes>(),
        EndpointInfo::mutation::<CreateTemporaryHome>(),
        EndpointInfo::mutation::<ClaimTemporaryHome>(),
        EndpointInfo::mutation::<UnclaimTemporaryHome>(),
        // staff
        EndpointInfo::query::<ListStaff>(),
        EndpointInfo::query::<ListStaffInvitations>(),
        EndpointInfo::mutation::<InviteStaff>(),
        EndpointInfo::mutation::<AcceptStaffInvitation>(),
        EndpointInfo::mutation::<DeclineStaffInvitation>(),
        EndpointInfo::mutation::<RevokeStaffInvitation>(),
        EndpointInfo::mutation::<RemoveStaff>(),
        // shifts
        EndpointInfo::query::<ListShifts>(),
        EndpointInfo::query::<ListShiftPatterns>(),
        EndpointInfo::mutation::<CreateShiftPattern>(),
        EndpointInfo::mutation::<CreateShift>(),
        EndpointInfo::mutation::<AssignStaff>(),
        EndpointInfo::mutation::<UnassignStaff>(),
        EndpointInfo::mutation::<DeleteShift>(),
        // attendance
        EndpointInfo::query::<ListAttendance>(),
        EndpointInfo::mutation::<GenerateQrCode>(),
        EndpointInfo::mutation::<ScanQrCode>(),
    ]
}

/// Serialize `args` as a request body. A value that cannot be represented
/// as JSON fails the request instead of going out without a body.
pub(crate) fn json_body<T: Serialize + ?Sized>(
    endpoint: &str,
    args: &T,
) -> Result<Option<Value>, ApiError> {
    serde_json::to_value(args)
        .map(Some)
        .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", endpoint, e)))
}

/// Percent-encode a single path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_endpoint_names_are_unique() {
        let catalog = catalog();
        let names: HashSet<&str> = catalog.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_every_tag_is_provided_by_some_read() {
        let provided: HashSet<Tag> = catalog()
            .iter()
            .filter(|e| e.kind == OperationKind::Read)
            .flat_map(|e| e.tags.iter().copied())
            .collect();
        for tag in Tag::ALL {
            assert!(provided.contains(&tag), "no read provides {tag}");
        }
    }

    #[test]
    fn test_reads_use_get() {
        for info in catalog().iter().filter(|e| e.kind == OperationKind::Read) {
            assert_eq!(info.method, Method::Get, "{} should be a GET", info.name);
        }
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("abc-123"), "abc-123");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("tok+=="), "tok%2B%3D%3D");
        assert_eq!(segment("café"), "caf%C3%A9");
    }
}
