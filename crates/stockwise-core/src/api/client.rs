//! API client for communicating with the inventory REST backend.
//!
//! Every request goes through [`ApiClient::send`] (or [`ApiClient::fetch_blob`]
//! for downloads) so token attachment, the request timeout, 401 teardown and
//! envelope normalization happen in exactly one place.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{
    LogNavigator, MemorySessionStore, Navigator, Role, SessionCapability, SessionData, SessionStore,
    Teardown,
};
use crate::config::ApiConfig;

use super::envelope;
use super::error::{status_line, truncate_body};
use super::{ApiError, ApiRequest, ClientError};

pub type ApiResult<T> = std::result::Result<T, ClientError>;

const LOGIN_PATH: &str = "/auth/login";
const VALIDATE_PATH: &str = "/auth/validate";
const REGISTER_PATH: &str = "/auth/register";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    id: Option<i64>,
}

/// Result of a successful login. The token is already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub role: Option<Role>,
    pub user_id: Option<i64>,
}

/// Account to create through `/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl NewAccount {
    /// Validate raw form input. Accepts `general` as an alias for `user`.
    pub fn new(username: &str, password: &str, role: &str) -> ApiResult<Self> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(local_validation("Username and password are required"));
        }
        let role = Role::parse(role)
            .ok_or_else(|| local_validation("Invalid role (use 'user' or 'admin')"))?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            role,
        })
    }
}

/// API client for the inventory backend.
/// Clone is cheap - reqwest::Client and the injected capabilities are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a client with the given session store and navigator
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        // No client-level timeout: the deadline is raced in `exchange`
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config,
            store,
            navigator,
        })
    }

    /// Client with an in-memory session and a logging navigator
    pub fn in_memory(config: ApiConfig) -> anyhow::Result<Self> {
        Self::new(
            config,
            Arc::new(MemorySessionStore::new()),
            Arc::new(LogNavigator),
        )
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn has_token(&self) -> bool {
        self.store.token().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.origin, path)
    }

    fn build_headers(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> ApiResult<header::HeaderMap> {
        let mut headers = request.headers.clone();
        if request.body.is_some() && !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            );
        }
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Send the request and read the whole body, racing the configured timeout.
    ///
    /// Handles the 401 side effect before returning. When the login redirect
    /// fires the call ends here with `SessionExpired`; otherwise the 401
    /// continues as an ordinary `ApiError`.
    async fn exchange(&self, request: &ApiRequest) -> ApiResult<(StatusCode, Vec<u8>)> {
        let started_at = Utc::now();
        let token = self.store.token();
        let headers = self.build_headers(request, token.as_deref())?;

        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(serde_json::to_vec(body).map_err(ClientError::Encode)?);
        }

        let transfer = async {
            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes.to_vec()))
        };

        // A late response after the deadline is dropped with the future
        let (status, bytes) = match tokio::time::timeout(self.config.timeout, transfer).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(path = %request.path, error = %e, "Request failed");
                return Err(ClientError::Network(e));
            }
            Err(_) => {
                warn!(path = %request.path, timeout = ?self.config.timeout, "Request timed out");
                return Err(ClientError::Timeout(self.config.timeout));
            }
        };

        debug!(method = %request.method, path = %request.path, status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            self.end_session(token.as_deref(), started_at, request.suppress_login_redirect)?;
        }

        Ok((status, bytes))
    }

    /// Tear down the session after a 401; navigate unless suppressed.
    ///
    /// Only the call that actually clears the session hands off to the
    /// navigator. Siblings rejected with the same token end quietly.
    fn end_session(
        &self,
        sent_token: Option<&str>,
        started_at: DateTime<Utc>,
        suppress_redirect: bool,
    ) -> ApiResult<()> {
        let teardown = self
            .store
            .end_if_current(sent_token, started_at)
            .map_err(ClientError::Storage)?;
        let route = self.config.login_route.clone();
        match teardown {
            Teardown::Superseded => {
                debug!("401 for a superseded session, keeping current one");
                Ok(())
            }
            _ if suppress_redirect => Ok(()),
            Teardown::AlreadyCleared => {
                debug!("Session already ended by another request");
                Err(ClientError::SessionExpired {
                    redirected_to: route,
                })
            }
            Teardown::Cleared => {
                warn!("Backend rejected session, token cleared");
                self.navigator.navigate(&route);
                Err(ClientError::SessionExpired {
                    redirected_to: route,
                })
            }
        }
    }

    /// Execute a request and return the normalized payload.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let (status, bytes) = self.exchange(&request).await?;

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let body = envelope::parse_body(&bytes);
        if body.is_none() && !bytes.is_empty() {
            debug!(body = %truncate_body(&String::from_utf8_lossy(&bytes)), "Response body is not JSON");
        }

        envelope::normalize(status, body).map_err(|e| {
            debug!(status = e.status, message = %e.message, "Request rejected");
            ClientError::Api(e)
        })
    }

    /// Execute a request and deserialize the normalized payload.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let payload = self.send(request).await?;
        Ok(serde_json::from_value(payload)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(ClientError::Encode)?;
        self.execute(ApiRequest::post(path, body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(ClientError::Encode)?;
        self.execute(ApiRequest::put(path, body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(ApiRequest::delete(path)).await
    }

    // ===== Downloads =====

    /// Fetch a raw binary payload (CSV/PDF exports).
    pub async fn get_blob(&self, path: &str) -> ApiResult<Vec<u8>> {
        self.fetch_blob(ApiRequest::get(path)).await
    }

    pub async fn fetch_blob(&self, request: ApiRequest) -> ApiResult<Vec<u8>> {
        let (status, bytes) = self.exchange(&request).await?;
        if status.is_success() {
            return Ok(bytes);
        }

        let body = envelope::parse_body(&bytes);
        let err = match body {
            Some(ref b) => ApiError::from_parts(status, Some(b)),
            None => ApiError::new(status.as_u16(), status_line(status), None),
        };
        Err(ClientError::Api(err))
    }

    /// Download a blob and write it to `dest`. Returns the byte count.
    pub async fn download_to(&self, path: &str, dest: &Path) -> ApiResult<usize> {
        let bytes = self.get_blob(path).await?;
        write_file(dest, &bytes)?;
        Ok(bytes.len())
    }

    // ===== Session =====

    /// Authenticate and store the session.
    ///
    /// Bad credentials come back as a 401 `ApiError`; they never trigger the
    /// login redirect.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginOutcome> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(local_validation("Username and password are required"));
        }

        let body = serde_json::to_value(LoginRequest { username, password })
            .map_err(ClientError::Encode)?;
        let request = ApiRequest::post(LOGIN_PATH, body).without_login_redirect();
        let response: LoginResponse = self.execute(request).await?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("login response has no token".to_string()))?;

        let data = SessionData::new(token)
            .with_role(response.role.clone())
            .with_user_id(response.id);
        self.store.save(&data).map_err(ClientError::Storage)?;
        debug!(user_id = ?response.id, "Session stored");

        Ok(LoginOutcome {
            role: response.role.as_deref().and_then(Role::parse),
            user_id: response.id,
        })
    }

    /// Forget the session entirely.
    pub fn logout(&self) -> ApiResult<()> {
        self.store.clear().map_err(ClientError::Storage)
    }

    /// Navigate to the login route when there is no token at all.
    pub fn ensure_authenticated(&self) -> bool {
        if self.has_token() {
            return true;
        }
        self.navigator.navigate(&self.config.login_route);
        false
    }

    /// Best-effort role check. Any failure means "not privileged".
    pub async fn session_capability(&self) -> SessionCapability {
        if !self.has_token() {
            return SessionCapability::anonymous();
        }

        let request = ApiRequest::get(VALIDATE_PATH).without_login_redirect();
        match self.send(request).await {
            Ok(payload) => {
                let capability = SessionCapability::from_payload(&payload);
                self.remember_capability(&capability);
                capability
            }
            Err(e) => {
                warn!(error = %e, "Could not validate session role");
                SessionCapability::anonymous()
            }
        }
    }

    // Keep the cached role/id in step with what the backend reports
    fn remember_capability(&self, capability: &SessionCapability) {
        if let Some(mut data) = self.store.load() {
            let role = capability.role.map(|r| r.as_str().to_string());
            if data.role != role || data.user_id != capability.user_id {
                data.role = role;
                data.user_id = capability.user_id;
                if let Err(e) = self.store.save(&data) {
                    warn!(error = %e, "Failed to cache session role");
                }
            }
        }
    }

    /// Capability check for admin-only screens.
    pub async fn require_admin(&self) -> ApiResult<SessionCapability> {
        let capability = self.session_capability().await;
        if capability.is_admin() {
            Ok(capability)
        } else {
            Err(ClientError::Api(ApiError::new(
                403,
                "Administrator role required",
                Some("FORBIDDEN".to_string()),
            )))
        }
    }

    /// Create an account. Backend restricts this to administrators.
    pub async fn register(&self, account: &NewAccount) -> ApiResult<Value> {
        self.post(REGISTER_PATH, account).await
    }
}

/// Write `bytes` to `dest`, creating parent directories.
pub(crate) fn write_file(dest: &Path, bytes: &[u8]) -> ApiResult<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))
            .map_err(ClientError::Storage)?;
    }
    std::fs::write(dest, bytes)
        .with_context(|| format!("Failed to write {}", dest.display()))
        .map_err(ClientError::Storage)
}

pub(crate) fn local_validation(message: &str) -> ClientError {
    ClientError::Api(ApiError::new(
        400,
        message,
        Some("VALIDATION_ERROR".to_string()),
    ))
}
