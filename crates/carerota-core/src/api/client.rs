//! API client for the staffing REST API.
//!
//! `ApiClient` turns a registry endpoint plus its arguments into a request,
//! sends it through the configured transport and parses the body into the
//! endpoint's envelope.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ApiError, ApiRequest, Envelope, Transport};
use crate::auth::SessionStore;
use crate::registry::{Endpoint, Output};

/// Body assumed for successful responses that carry none (204 and friends).
const EMPTY_SUCCESS_BODY: &str = r#"{"success":true}"#;

/// API client.
/// Clone is cheap - the transport and session are shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        session: SessionStore,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn request_for<E: Endpoint>(&self, args: &E::Args) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest {
            method: E::METHOD,
            url: format!("{}{}", self.base_url, E::path(args)),
            query: E::query(args),
            body: E::body(args)?,
            bearer: self.session.token(),
        })
    }

    /// Execute an endpoint and unwrap its envelope.
    ///
    /// Errors come back as values. A 401 additionally tears the session
    /// down, whichever endpoint produced it.
    pub async fn execute<E: Endpoint>(&self, args: &E::Args) -> Result<Output<E>, ApiError> {
        E::validate(args)?;

        let request = self.request_for::<E>(args)?;
        debug!(endpoint = E::NAME, method = E::METHOD.as_str(), url = %request.url, "Sending request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint = E::NAME, error = %e, "Request failed");
                return Err(e);
            }
        };

        if !response.is_success() {
            let err = ApiError::from_status(response.status, &response.body);
            if err.is_unauthorized() {
                warn!(endpoint = E::NAME, "Unauthorized response, ending session");
                self.session.teardown();
            } else {
                debug!(endpoint = E::NAME, status = response.status, error = %err, "Request rejected");
            }
            return Err(err);
        }

        let body = if response.body.trim().is_empty() {
            EMPTY_SUCCESS_BODY
        } else {
            response.body.as_str()
        };

        let envelope: E::Response = serde_json::from_str(body).map_err(|e| {
            warn!(endpoint = E::NAME, error = %e, "Failed to parse response");
            ApiError::InvalidResponse(format!("{}: {}", E::NAME, e))
        })?;
        envelope.into_payload()
    }
}
