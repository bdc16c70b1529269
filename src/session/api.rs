//! HTTP client for the auth API. Requests carry passwords or bearer tokens,
//! so spans skip request bodies and the `Authorization` header is never logged.
//! There is no request timeout and no retry; a call suspends until the server
//! answers or the connection fails.

use super::{
    error::ApiError,
    types::{AuthResponse, LoginRequest, MeResponse, RegisterRequest, User},
};
use crate::APP_USER_AGENT;
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info_span, instrument, Instrument};
use url::Url;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const ME_PATH: &str = "/api/auth/me";

/// Network collaborator used by the session manager.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token and principal.
    ///
    /// # Errors
    /// Returns `ApiError::Rejected` on non-2xx statuses with a JSON body.
    async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, ApiError>;

    /// Creates an account and returns its token and principal.
    ///
    /// # Errors
    /// Returns `ApiError::Rejected` on non-2xx statuses with a JSON body.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError>;

    /// Resolves the principal behind `token`.
    ///
    /// # Errors
    /// Returns an error for any non-2xx status, transport failure, or malformed body.
    async fn me(&self, token: &SecretString) -> Result<User, ApiError>;
}

/// [`AuthApi`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Builds a client against `base_url`, e.g. `https://app.tld`.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the URL is not absolute http(s) or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, ApiError> {
        let url = self.url(LOGIN_PATH);
        let body = LoginRequest { email, password };

        let span = info_span!("auth.login", http.method = "POST", url = %url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }

    #[instrument(skip(self, password))]
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let url = self.url(REGISTER_PATH);
        let body = RegisterRequest {
            name,
            email,
            password,
        };

        let span = info_span!("auth.register", http.method = "POST", url = %url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        handle_json_response(response).await
    }

    #[instrument(skip(self, token))]
    async fn me(&self, token: &SecretString) -> Result<User, ApiError> {
        let url = self.url(ME_PATH);

        let span = info_span!("auth.me", http.method = "GET", url = %url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        let me: MeResponse = handle_json_response(response).await?;

        Ok(me.user)
    }
}

/// Validates `base_url` and strips trailing slashes.
fn normalize_base_url(base_url: &str) -> Result<String, ApiError> {
    let trimmed = base_url.trim();
    let url = Url::parse(trimmed)
        .map_err(|err| ApiError::Config(format!("Invalid API base URL {trimmed:?}: {err}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ApiError::Config(format!(
                "Invalid API base URL {trimmed:?}: unsupported scheme {scheme}"
            )))
        }
    }

    if url.host().is_none() {
        return Err(ApiError::Config(format!(
            "Invalid API base URL {trimmed:?}: no host specified"
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Joins a base URL and a path with exactly one slash between them.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

/// Best-effort `message` from an error body of any JSON shape.
fn error_message(body: &Value) -> Option<String> {
    body.get("message").and_then(Value::as_str).map(str::to_string)
}

/// Decodes a 2xx body as `T`. On other statuses the body must still be JSON,
/// of any shape; a string `message` field is carried in `ApiError::Rejected`,
/// and a body that is not JSON surfaces as `ApiError::Parse`.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ApiError::Network(format!("Failed to read response: {err}")))?;

    if status.is_success() {
        return serde_json::from_slice::<T>(&bytes)
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")));
    }

    debug!(status = status.as_u16(), "request rejected");

    let body: Value = serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::Parse(format!("Failed to decode error response: {err}")))?;

    Err(ApiError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}
