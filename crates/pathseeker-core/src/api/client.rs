//! API client for communicating with the PathSeeker REST API.
//!
//! Every request goes through the session manager: the stored access token
//! is attached on the way out, and a 401 triggers one refresh-and-retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::auth::SessionManager;
use crate::models::{
    CurrentUser, EditableProfile, NewProfile, Profile, Registration, UserUpdate,
};

use super::request::{ApiRequest, RetryableRequest};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const CURRENT_USER_ENDPOINT: &str = "auth/me/";
const USERS_ENDPOINT: &str = "users/";
const PROFILES_ENDPOINT: &str = "profiles/";

/// API client for PathSeeker.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client sending requests to the session's identity base URL
    pub fn new(session: Arc<SessionManager>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: session.identity().base_url().to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ===== Request Pipeline =====

    /// Send a request with the stored credential.
    ///
    /// A 401 on the first attempt hands the request to the session manager;
    /// when it comes back renewed it is sent once more and that outcome is
    /// returned. Transport errors are returned unchanged.
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let request = RetryableRequest::new(request);
        let response = self.dispatch(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_response(response).await;
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let original = ApiError::from_status(status, &body);

        let request = self.session.handle_unauthorized(request, original).await?;
        debug!(path = request.request().path(), "Resubmitting with refreshed token");
        let response = self.dispatch(&request).await?;
        Self::check_response(response).await
    }

    async fn dispatch(&self, request: &RetryableRequest) -> Result<Response, ApiError> {
        let builder = request.request().build(&self.client, &self.base_url);
        let response = self.session.attach_credential(builder).send().await?;
        debug!(
            method = %request.request().method(),
            path = request.request().path(),
            status = %response.status(),
            retried = request.is_retried(),
            "API response"
        );
        Ok(response)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path().to_string();
        let response = self.execute(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e)))
    }

    // ===== Session =====

    /// Exchange email and password for tokens and start a session
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let pair = self.session.identity().obtain_pair(email, password).await?;
        self.session.login_with(&pair).map_err(ApiError::storage)?;
        info!(email = email, "Login successful");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.logout().map_err(ApiError::storage)
    }

    /// Create an account. The form is validated locally first.
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let body = registration
            .to_new_user()
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        let response = self.execute(ApiRequest::post(USERS_ENDPOINT, &body)?).await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                info!(uname = %body.uname, "Account created");
                Ok(())
            }
            status => Err(ApiError::InvalidResponse(format!(
                "Unexpected response from server: {}",
                status
            ))),
        }
    }

    // ===== Account & Profile =====

    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.send_json(ApiRequest::get(CURRENT_USER_ENDPOINT)).await
    }

    pub async fn update_current_user(&self, update: &UserUpdate) -> Result<CurrentUser, ApiError> {
        self.send_json(ApiRequest::patch(CURRENT_USER_ENDPOINT, update)?).await
    }

    pub async fn fetch_profile(&self, user_id: i64) -> Result<Profile, ApiError> {
        let path = format!("{}{}/", PROFILES_ENDPOINT, user_id);
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn create_profile(&self, user_id: i64) -> Result<Profile, ApiError> {
        self.send_json(ApiRequest::post(PROFILES_ENDPOINT, &NewProfile { user: user_id })?)
            .await
    }

    /// Load the signed-in user's profile, creating it when the lookup fails.
    /// Session and transport failures are returned instead.
    pub async fn load_profile(&self) -> Result<EditableProfile, ApiError> {
        let user = self.current_user().await?;
        let profile = match self.fetch_profile(user.user_id).await {
            Ok(profile) => profile,
            Err(e) if e.is_auth_failure() || matches!(e, ApiError::NetworkError(_)) => {
                return Err(e)
            }
            Err(e) => {
                info!(user_id = user.user_id, error = %e, "No profile yet, creating one");
                self.create_profile(user.user_id).await?
            }
        };
        Ok(EditableProfile::from_parts(&user, profile))
    }

    /// Save names on the account, then the profile details
    pub async fn save_profile(&self, profile: &EditableProfile) -> Result<(), ApiError> {
        let profile_id = profile
            .profile_id
            .ok_or_else(|| ApiError::Validation("Profile has not been created yet".to_string()))?;

        self.update_current_user(&profile.user_update()).await?;

        let path = format!("{}{}/", PROFILES_ENDPOINT, profile_id);
        let _: Profile = self
            .send_json(ApiRequest::patch(path, &profile.profile_update())?)
            .await?;
        info!(profile_id, "Profile saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityClient, MemoryTokenStore, Redirect, TokenKey, TokenStore};
    use crate::test_support::{Reply, TestServer};
    use serde_json::json;

    fn client_for(server: &TestServer) -> (Arc<MemoryTokenStore>, ApiClient) {
        let store = Arc::new(MemoryTokenStore::new());
        let identity = IdentityClient::new(server.base_url()).unwrap();
        let session = Arc::new(SessionManager::new(store.clone(), identity));
        (store, ApiClient::new(session).unwrap())
    }

    fn me() -> Reply {
        Reply::json(200, json!({"user_id": 7, "email": "ada@example.com", "first_name": "Ada", "last_name": "Lovelace"}))
    }

    #[tokio::test]
    async fn test_request_carries_exact_token() {
        let server = TestServer::start(|_| me()).await;
        let (_store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let user = client.current_user().await.unwrap();

        assert_eq!(user.user_id, 7);
        let requests = server.requests_to("auth/me/");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer A1"));
    }

    #[tokio::test]
    async fn test_request_without_token_is_sent_unmodified() {
        let server = TestServer::start(|_| Reply::json(201, json!({"id": 1}))).await;
        let (_store, client) = client_for(&server);

        let registration = Registration {
            email: "ada@example.com".to_string(),
            password: "engine".to_string(),
            confirm_password: "engine".to_string(),
            ..Default::default()
        };
        client.register(&registration).await.unwrap();

        let requests = server.requests_to("users/");
        assert_eq!(requests.len(), 1);
        assert!(requests[0].authorization.is_none());
        assert_eq!(requests[0].json()["uname"], "ada");
        assert_eq!(requests[0].json()["role"], "student");
    }

    #[tokio::test]
    async fn test_expired_token_refreshed_and_retried_once() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/token/refresh/" => Reply::json(200, json!({"access": "A2"})),
            _ if req.authorization.as_deref() == Some("Bearer A2") => me(),
            _ => Reply::json(401, json!({"detail": "Given token not valid for any token type"})),
        })
        .await;
        let (store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let user = client.current_user().await.unwrap();

        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(store.get(TokenKey::Access).unwrap().as_deref(), Some("A2"));
        assert_eq!(store.get(TokenKey::Refresh).unwrap().as_deref(), Some("R1"));
        assert!(client.session().is_authenticated());

        let refreshes = server.requests_to("token/refresh/");
        assert_eq!(refreshes.len(), 1);
        assert_eq!(refreshes[0].json(), json!({"refresh": "R1"}));
        assert!(refreshes[0].authorization.is_none());

        let attempts = server.requests_to("auth/me/");
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].authorization.as_deref(), Some("Bearer A1"));
        assert_eq!(attempts[1].authorization.as_deref(), Some("Bearer A2"));
    }

    #[tokio::test]
    async fn test_refused_refresh_ends_session() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/token/refresh/" => {
                Reply::json(401, json!({"detail": "Token is invalid or expired"}))
            }
            _ => Reply::json(401, json!({"detail": "Token expired"})),
        })
        .await;
        let (store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();
        let mut redirects = client.session().redirects();
        let mut state = client.session().subscribe();

        let result = client.current_user().await;

        match result {
            Err(ApiError::RefreshFailed(cause)) => assert!(matches!(
                *cause,
                ApiError::Unauthorized(ref msg) if msg == "Token is invalid or expired"
            )),
            other => panic!("expected refresh failure, got {:?}", other),
        }
        assert_eq!(store.get(TokenKey::Access).unwrap(), None);
        assert_eq!(store.get(TokenKey::Refresh).unwrap(), None);
        assert!(!client.session().is_authenticated());
        assert!(!*state.borrow_and_update());
        assert_eq!(redirects.try_recv().unwrap(), Redirect::login());
        // Original request is not resubmitted
        assert_eq!(server.requests_to("auth/me/").len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_transport_error_ends_session() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/token/refresh/" => Reply::Drop,
            _ => Reply::json(401, json!({})),
        })
        .await;
        let (store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();
        let mut redirects = client.session().redirects();

        let result = client.fetch_profile(7).await;

        match result {
            Err(ApiError::RefreshFailed(cause)) => assert!(matches!(*cause, ApiError::NetworkError(_))),
            other => panic!("expected refresh failure, got {:?}", other),
        }
        assert_eq!(store.get(TokenKey::Access).unwrap(), None);
        assert!(!client.session().is_authenticated());
        assert_eq!(redirects.try_recv().unwrap().path, "/login");
    }

    #[tokio::test]
    async fn test_refresh_without_access_field_ends_session() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/token/refresh/" => Reply::json(200, json!({"token": "A2"})),
            _ => Reply::json(401, json!({})),
        })
        .await;
        let (store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let result = client.current_user().await;

        assert!(matches!(
            result,
            Err(ApiError::RefreshFailed(ref cause)) if matches!(**cause, ApiError::InvalidResponse(_))
        ));
        assert_eq!(store.get(TokenKey::Refresh).unwrap(), None);
    }

    #[tokio::test]
    async fn test_retry_rejected_again_propagates() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/token/refresh/" => Reply::json(200, json!({"access": "A2"})),
            _ => Reply::json(401, json!({"detail": "User is inactive"})),
        })
        .await;
        let (store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();
        let mut redirects = client.session().redirects();

        let result = client.current_user().await;

        assert!(matches!(result, Err(ApiError::Unauthorized(ref msg)) if msg == "User is inactive"));
        assert_eq!(server.requests_to("token/refresh/").len(), 1);
        assert_eq!(server.requests_to("auth/me/").len(), 2);
        assert_eq!(store.get(TokenKey::Access).unwrap().as_deref(), Some("A2"));
        assert!(client.session().is_authenticated());
        assert!(redirects.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unauthorized_without_refresh_token() {
        let server = TestServer::start(|_| {
            Reply::json(401, json!({"detail": "Given token not valid for any token type"}))
        })
        .await;
        let (store, client) = client_for(&server);
        store.set(TokenKey::Access, "A1").unwrap();
        assert!(client.session().initialize());
        let mut redirects = client.session().redirects();

        let result = client.current_user().await;

        assert!(matches!(
            result,
            Err(ApiError::Unauthorized(ref msg)) if msg == "Given token not valid for any token type"
        ));
        assert!(server.requests_to("token/refresh/").is_empty());
        assert!(!client.session().is_authenticated());
        assert_eq!(store.get(TokenKey::Access).unwrap(), None);
        assert_eq!(redirects.try_recv().unwrap(), Redirect::login());
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let server = TestServer::start(|_| Reply::Drop).await;
        let (store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let result = client.current_user().await;

        assert!(matches!(result, Err(ApiError::NetworkError(_))));
        assert_eq!(server.requests().len(), 1);
        assert!(client.session().is_authenticated());
        assert_eq!(store.get(TokenKey::Access).unwrap().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let server = TestServer::start(|_| Reply::json(404, json!({"detail": "Not found."}))).await;
        let (_store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let result = client.fetch_profile(99).await;

        assert!(matches!(result, Err(ApiError::NotFound(ref msg)) if msg == "Not found."));
        assert!(server.requests_to("token/refresh/").is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_requests_refresh_independently() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/token/refresh/" => Reply::json(200, json!({"access": "A2"})),
            _ if req.authorization.as_deref() == Some("Bearer A2") => me(),
            _ => Reply::json(401, json!({})),
        })
        .await;
        let (store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let (first, second) = futures::join!(client.current_user(), client.current_user());

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(server.requests_to("token/refresh/").len(), 2);
        assert_eq!(store.get(TokenKey::Access).unwrap().as_deref(), Some("A2"));
    }

    #[tokio::test]
    async fn test_login_stores_issued_pair() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/token/" if req.json()["password"] == "engine" => {
                Reply::json(200, json!({"access": "A1", "refresh": "R1"}))
            }
            _ => Reply::json(401, json!({"detail": "No active account found with the given credentials"})),
        })
        .await;
        let (store, client) = client_for(&server);

        let result = client.login("ada@example.com", "wrong").await;
        assert!(matches!(
            result,
            Err(ApiError::InvalidCredentials(ref msg))
                if msg == "No active account found with the given credentials"
        ));
        assert!(!client.session().is_authenticated());

        client.login("ada@example.com", "engine").await.unwrap();
        assert!(client.session().is_authenticated());
        assert_eq!(store.get(TokenKey::Access).unwrap().as_deref(), Some("A1"));
        assert_eq!(store.get(TokenKey::Refresh).unwrap().as_deref(), Some("R1"));

        let requests = server.requests_to("token/");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].json()["email"], "ada@example.com");
        // A failed login never goes through refresh
        assert!(server.requests_to("token/refresh/").is_empty());
    }

    #[tokio::test]
    async fn test_load_profile_creates_missing_profile() {
        let server = TestServer::start(|req| match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/api/auth/me/") => me(),
            ("GET", "/api/profiles/7/") => Reply::json(404, json!({"detail": "Not found."})),
            ("POST", "/api/profiles/") => Reply::json(201, json!({"profile_id": 3, "user": 7})),
            _ => Reply::json(500, json!({})),
        })
        .await;
        let (_store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let profile = client.load_profile().await.unwrap();

        assert_eq!(profile.profile_id, Some(3));
        assert_eq!(profile.first_name, "Ada");
        assert!(profile.skills.is_empty());
        let created = server.requests_to("profiles/");
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].json(), json!({"user": 7}));
    }

    #[tokio::test]
    async fn test_load_profile_does_not_create_after_session_loss() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/auth/me/" => me(),
            _ => Reply::json(401, json!({})),
        })
        .await;
        let (_store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let result = client.load_profile().await;

        assert!(matches!(result, Err(ApiError::RefreshFailed(_))));
        assert!(server.requests_to("profiles/").is_empty());
    }

    #[tokio::test]
    async fn test_save_profile_patches_account_and_profile() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/api/auth/me/" => me(),
            _ => Reply::json(200, json!({"profile_id": 3, "bio": "Hello"})),
        })
        .await;
        let (_store, client) = client_for(&server);
        client.session().login("A1", "R1").unwrap();

        let mut profile = EditableProfile {
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            bio: "Hello".to_string(),
            profile_id: Some(3),
            ..Default::default()
        };
        profile.add_skill("Mathematics");
        client.save_profile(&profile).await.unwrap();

        let account = server.requests_to("auth/me/");
        assert_eq!(account[0].method, "PATCH");
        assert_eq!(account[0].json(), json!({"first_name": "Ada", "last_name": "Byron"}));

        let details = server.requests_to("profiles/3/");
        assert_eq!(details[0].method, "PATCH");
        assert_eq!(details[0].json()["skills"], json!(["Mathematics"]));
        assert_eq!(details[0].authorization.as_deref(), Some("Bearer A1"));
    }

    #[tokio::test]
    async fn test_save_profile_requires_profile_id() {
        let server = TestServer::start(|_| me()).await;
        let (_store, client) = client_for(&server);

        let result = client.save_profile(&EditableProfile::default()).await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert!(server.requests().is_empty());
    }
}
