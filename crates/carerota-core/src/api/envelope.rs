//! Response envelopes shared by every endpoint.
//!
//! The server wraps single resources in `{success, data, message?}`, lists in
//! `{data, pagination}`, and bare writes in `{success, message?}`. Each
//! endpoint names its envelope; the client unwraps it into the payload the
//! caller actually wants.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::utils::Pagination;

/// A wire envelope that can be unwrapped into its payload.
pub trait Envelope: DeserializeOwned + Send + 'static {
    type Payload: Send + Sync + 'static;

    /// Check the success discriminant and hand back the payload.
    fn into_payload(self) -> Result<Self::Payload, ApiError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope for ApiResponse<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Payload = T;

    fn into_payload(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::InvalidResponse("response is missing data".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Envelope for Paginated<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Payload = Paginated<T>;

    fn into_payload(self) -> Result<Self, ApiError> {
        Ok(self)
    }
}

impl<T> Paginated<T> {
    /// "Showing 21 to 25 of 25" for the current page.
    pub fn showing_label(&self) -> String {
        self.pagination.showing_label()
    }
}

/// Envelope for writes that return no data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope for Ack {
    /// The server's confirmation message, if any.
    type Payload = Option<String>;

    fn into_payload(self) -> Result<Option<String>, ApiError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let resp: ApiResponse<String> =
            serde_json::from_str(r#"{"success":true,"data":"hello"}"#).expect("parse");
        assert_eq!(resp.into_payload(), Ok("hello".to_string()));
    }

    #[test]
    fn test_api_response_failure_discriminant() {
        let resp: ApiResponse<String> =
            serde_json::from_str(r#"{"success":false,"message":"Home already claimed"}"#)
                .expect("parse");
        assert_eq!(
            resp.into_payload(),
            Err(ApiError::Rejected("Home already claimed".to_string()))
        );
    }

    #[test]
    fn test_api_response_missing_data() {
        let resp: ApiResponse<String> =
            serde_json::from_str(r#"{"success":true}"#).expect("parse");
        assert!(matches!(resp.into_payload(), Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_paginated_parse() {
        let json = r#"{"data":[1,2,3,4,5],"pagination":{"total":25,"page":3,"limit":10,"totalPages":3}}"#;
        let page: Paginated<u32> = serde_json::from_str(json).expect("parse");
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.showing_label(), "Showing 21 to 25 of 25");
    }

    #[test]
    fn test_ack() {
        let ok: Ack = serde_json::from_str(r#"{"success":true,"message":"Revoked"}"#).expect("parse");
        assert_eq!(ok.into_payload(), Ok(Some("Revoked".to_string())));

        let rejected: Ack = serde_json::from_str(r#"{"success":false}"#).expect("parse");
        assert!(rejected.into_payload().is_err());
    }
}
