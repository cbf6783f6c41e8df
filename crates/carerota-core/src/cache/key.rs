use std::fmt;

use crate::api::ApiError;
use crate::registry::Endpoint;

/// Identity of a cached read: endpoint name plus its serialized arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: &'static str,
    args: String,
}

impl CacheKey {
    pub fn new<E: Endpoint>(args: &E::Args) -> Result<Self, ApiError> {
        let args = serde_json::to_string(args)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", E::NAME, e)))?;
        Ok(Self {
            endpoint: E::NAME,
            args,
        })
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}
