use std::sync::Arc;

use anyhow::Result;
use reqwest::RequestBuilder;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::api::error::ApiError;
use crate::api::request::RetryableRequest;
use crate::utils::mask_token;

use super::identity::IdentityClient;
use super::store::TokenStore;
use super::tokens::{CredentialPair, TokenKey};

/// Client-side path of the login entry point
pub const LOGIN_PATH: &str = "/login";

/// Buffered navigation events per subscriber
const REDIRECT_CHANNEL_CAPACITY: usize = 16;

/// Navigation request emitted for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
}

impl Redirect {
    pub fn login() -> Self {
        Self {
            path: LOGIN_PATH.to_string(),
        }
    }
}

/// Owns the persisted credential pair and the `authenticated` flag.
///
/// The flag is published through a watch channel; it is only true while an
/// access token is stored. Unrecoverable session loss is announced on a
/// broadcast channel as a redirect to the login entry point.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    identity: IdentityClient,
    state: watch::Sender<bool>,
    redirects: broadcast::Sender<Redirect>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>, identity: IdentityClient) -> Self {
        let (state, _) = watch::channel(false);
        let (redirects, _) = broadcast::channel(REDIRECT_CHANNEL_CAPACITY);
        Self {
            store,
            identity,
            state,
            redirects,
        }
    }

    /// Dedicated identity-service channel (never intercepted)
    pub fn identity(&self) -> &IdentityClient {
        &self.identity
    }

    /// Derive `authenticated` from the persisted access token.
    /// Expiry is not checked here; the first 401 takes care of that.
    pub fn initialize(&self) -> bool {
        let authenticated = self.access_token().is_some();
        self.set_authenticated(authenticated);
        info!(authenticated, "Session initialized");
        authenticated
    }

    pub fn is_authenticated(&self) -> bool {
        *self.state.borrow()
    }

    /// Observe `authenticated` transitions
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Observe navigation requests caused by session loss
    pub fn redirects(&self) -> broadcast::Receiver<Redirect> {
        self.redirects.subscribe()
    }

    /// Persist both tokens and mark the session authenticated.
    /// Token contents are trusted as issued by the identity service.
    pub fn login(&self, access: &str, refresh: &str) -> Result<()> {
        self.store.set(TokenKey::Access, access)?;
        self.store.set(TokenKey::Refresh, refresh)?;
        self.set_authenticated(true);
        info!(access = %mask_token(access), "Logged in");
        Ok(())
    }

    pub fn login_with(&self, pair: &CredentialPair) -> Result<()> {
        self.login(&pair.access, &pair.refresh)
    }

    /// Clear both tokens and mark the session unauthenticated. Idempotent.
    ///
    /// The flag is cleared even when storage fails, and both removals are
    /// attempted; the first storage error is returned.
    pub fn logout(&self) -> Result<()> {
        let mut first_error = None;
        for key in TokenKey::ALL {
            if let Err(e) = self.store.remove(key) {
                warn!(key = %key, error = %e, "Failed to clear token");
                first_error.get_or_insert(e);
            }
        }
        if self.set_authenticated(false) {
            info!("Logged out");
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Current access token; storage errors read as "no token"
    pub fn access_token(&self) -> Option<String> {
        self.read_token(TokenKey::Access)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_token(TokenKey::Refresh)
    }

    /// Add `Authorization: Bearer <access>` when an access token is stored;
    /// otherwise return the request unchanged.
    pub fn attach_credential(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Recover from a 401 by exchanging the refresh token once.
    ///
    /// On success the new access token is persisted before the request is
    /// returned, flagged as retried, ready to be resubmitted. The caller
    /// attaches the credential again when it rebuilds the request.
    ///
    /// `original` is the error the 401 response was mapped to.
    ///
    /// - no refresh token: log out, redirect, return `original`
    /// - refresh fails: log out, redirect, return `RefreshFailed`
    /// - request already retried: return `original` untouched
    pub async fn handle_unauthorized(
        &self,
        failed: RetryableRequest,
        original: ApiError,
    ) -> Result<RetryableRequest, ApiError> {
        if failed.is_retried() {
            debug!(path = failed.request().path(), "Retried request rejected again");
            return Err(original);
        }

        let Some(refresh) = self.refresh_token() else {
            warn!(path = failed.request().path(), "Access rejected and no refresh token stored");
            self.end_session();
            return Err(original);
        };

        debug!(path = failed.request().path(), "Access token rejected, refreshing");
        let access = match self.identity.refresh_access(&refresh).await {
            Ok(access) => access,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.end_session();
                return Err(ApiError::RefreshFailed(Box::new(e)));
            }
        };

        if let Err(e) = self.store.set(TokenKey::Access, &access) {
            warn!(error = %e, "Failed to persist refreshed token, ending session");
            self.end_session();
            return Err(ApiError::RefreshFailed(Box::new(ApiError::storage(e))));
        }
        self.set_authenticated(true);
        info!(access = %mask_token(&access), "Access token refreshed");

        Ok(failed.mark_retried())
    }

    /// Irrecoverable session loss: clear credentials and send the user to login
    fn end_session(&self) {
        // logout() already logged any storage failure
        let _ = self.logout();
        if self.redirects.send(Redirect::login()).is_err() {
            debug!("No redirect subscribers");
        }
    }

    fn read_token(&self, key: TokenKey) -> Option<String> {
        match self.store.get(key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read token");
                None
            }
        }
    }

    /// Returns true when the flag actually changed
    fn set_authenticated(&self, authenticated: bool) -> bool {
        self.state.send_if_modified(|current| {
            let changed = *current != authenticated;
            *current = authenticated;
            changed
        })
    }
}
