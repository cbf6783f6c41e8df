//! Application state shared by every consumer.
//!
//! `AppContext` wires the session, API client and query cache together once.
//! Frontends receive it (or clones of its parts) instead of reaching for
//! globals, and tests build it around a scripted transport.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, HttpTransport, Transport};
use crate::auth::{
    FileTokenStore, KeyringTokenStore, SessionAction, SessionState, SessionStore, TokenStore,
};
use crate::cache::QueryCache;
use crate::config::Config;
use crate::models::{Organization, Profile};
use crate::registry::auth::{GetProfile, Login, LoginArgs, SwitchOrganization, SwitchOrganizationArgs};
use crate::registry::organization::{OrganizationChanges, UpdateOrganization, UpdateOrganizationArgs};

#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub session: SessionStore,
    pub api: ApiClient,
    pub cache: QueryCache,
}

impl AppContext {
    /// Build around an explicit transport and session persistence. Any
    /// session `token_store` holds is restored.
    pub fn new(config: Config, transport: Arc<dyn Transport>, token_store: Box<dyn TokenStore>) -> Self {
        let session = SessionStore::restore(token_store);
        let api = ApiClient::new(transport, config.api_base_url(), session.clone());
        let cache = QueryCache::new(api.clone(), config.cache_config());
        Self {
            config,
            session,
            api,
            cache,
        }
    }

    /// Production wiring: HTTP transport plus file or keychain persistence.
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = HttpTransport::new().context("Failed to create HTTP client")?;
        let token_store: Box<dyn TokenStore> = if config.use_keyring {
            Box::new(KeyringTokenStore)
        } else {
            Box::new(FileTokenStore::new(config.cache_dir()?))
        };
        Ok(Self::new(config, Arc::new(transport), token_store))
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Sign in and load the profile.
    ///
    /// The session holds the token before any read is re-fetched, so no
    /// request goes out with the old credentials and nothing cached for a
    /// previous user survives.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionState, ApiError> {
        let args = LoginArgs {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let payload = self.api.execute::<Login>(&args).await?;
        // Resets the cache and re-fetches mounted reads with the new token
        self.session.dispatch(SessionAction::CredentialsSet {
            token: payload.token,
            user: payload.user,
        });
        info!(email = %args.email, "Logged in");

        if let Err(e) = self.load_profile().await {
            // The token is good; the profile can be loaded later
            warn!(error = %e, "Failed to load profile after login");
        }
        Ok(self.session.state())
    }

    /// Fetch the profile (cached) and fold it into the session.
    pub async fn load_profile(&self) -> Result<Arc<Profile>, ApiError> {
        let profile = self.cache.query::<GetProfile>(()).await?;
        self.session
            .dispatch(SessionAction::ProfileLoaded(Profile::clone(&profile)));
        Ok(profile)
    }

    /// Act for another organization. Reads scoped to the organization are
    /// invalidated by the mutation itself.
    pub async fn switch_organization(&self, organization_id: &str) -> Result<SessionState, ApiError> {
        let args = SwitchOrganizationArgs {
            organization_id: organization_id.to_string(),
        };
        let profile = self.cache.mutate::<SwitchOrganization>(&args).await?;
        info!(organization = %organization_id, "Switched organization");
        Ok(self.session.dispatch(SessionAction::ProfileLoaded(profile)))
    }

    /// Edit an organization; edits to the current one are reflected in the
    /// session right away.
    pub async fn update_organization(
        &self,
        organization_id: &str,
        changes: OrganizationChanges,
    ) -> Result<Organization, ApiError> {
        let args = UpdateOrganizationArgs {
            id: organization_id.to_string(),
            changes,
        };
        let organization = self.cache.mutate::<UpdateOrganization>(&args).await?;
        if self.session.state().organization_id() == Some(organization.id.as_str()) {
            self.session
                .dispatch(SessionAction::OrganizationSwitched(organization.clone()));
        }
        Ok(organization)
    }

    /// End the session locally. The cache drops everything it holds as the
    /// credentials are cleared.
    pub fn logout(&self) {
        self.session.teardown();
        info!("Logged out");
    }
}
