//! Dedicated channel to the identity service.
//!
//! Requests sent here never pass through the credential interceptor, so a
//! failing refresh cannot trigger another refresh.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::request::endpoint_url;

use super::tokens::CredentialPair;

/// Token issuance endpoint, relative to the API base URL
const TOKEN_ENDPOINT: &str = "token/";

/// Token refresh endpoint, relative to the API base URL
const REFRESH_ENDPOINT: &str = "token/refresh/";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: Option<String>,
    refresh: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: Option<String>,
}

/// Non-intercepted HTTP client for token issuance and renewal.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
}

impl IdentityClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: crate::config::normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange an email and password for a fresh credential pair
    pub async fn obtain_pair(&self, email: &str, password: &str) -> Result<CredentialPair, ApiError> {
        let url = endpoint_url(&self.base_url, TOKEN_ENDPOINT);
        debug!(email = email, "Requesting token pair");

        let response = self
            .client
            .post(&url)
            .json(&TokenRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            // A 401 here is a rejected sign-in, not an expired session
            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::invalid_credentials(&body));
            }
            return Err(ApiError::from_status(status, &body));
        }

        let tokens: TokenResponse = response.json().await?;
        match (tokens.access, tokens.refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(CredentialPair { access, refresh })
            }
            _ => Err(ApiError::InvalidResponse(
                "Login response missing access or refresh token".to_string(),
            )),
        }
    }

    /// Exchange a refresh token for a new access token.
    /// Anything other than `200` with an `access` field is a failure.
    pub async fn refresh_access(&self, refresh: &str) -> Result<String, ApiError> {
        let url = endpoint_url(&self.base_url, REFRESH_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Token refresh refused");
            return Err(ApiError::from_status(status, &body));
        }

        let renewed: RefreshResponse = response.json().await?;
        match renewed.access {
            Some(access) if !access.is_empty() => Ok(access),
            _ => Err(ApiError::InvalidResponse(
                "Refresh response missing access token".to_string(),
            )),
        }
    }
}
