//! REST API client for the wall server.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<_, ApiError>`; failure bodies are flattened into
//! a single message here so callers never see structured server errors. The
//! client holds no session state: tokens are passed in per call and storage
//! is never touched.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use super::error::ApiError;
use super::transport::{BrowserTransport, HttpRequest, Method, Transport};
use super::types::{AuthResponse, LoginPayload, NewPost, Post, RegisterPayload, User};
use crate::config::ApiConfig;

const LOGIN_PATH: &str = "/api/auth/login/";
const REGISTER_PATH: &str = "/api/auth/registration/";
const LOGOUT_PATH: &str = "/api/auth/logout/";
const CURRENT_USER_PATH: &str = "/api/auth/user/";
const MESSAGES_PATH: &str = "/api/messages/";

/// Client used by the running app.
pub type WallApi = ApiClient<BrowserTransport>;

/// Method, body and extra headers for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self { method: Method::Post, ..Self::default() }
    }

    /// Attach `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_string(value).map_err(|e| ApiError::Encode(e.to_string()))?);
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Stateless REST client bound to one base URL.
#[derive(Clone, Debug, Default)]
pub struct ApiClient<T> {
    config: ApiConfig,
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ApiConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Perform one request and decode the success body as `R`.
    ///
    /// `Content-Type: application/json` is always sent; with a token,
    /// `Authorization: Token <token>` is added. A single attempt is made.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Transport`] when no response was obtained.
    /// - [`ApiError::Status`] for non-2xx responses, carrying the flattened body.
    /// - [`ApiError::Decode`] when a success body does not match `R`.
    pub async fn request<R: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> Result<R, ApiError> {
        let request = self.build_request(path, options, token);
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }
        decode_success(&response.body)
    }

    fn build_request(&self, path: &str, options: RequestOptions, token: Option<&str>) -> HttpRequest {
        let mut headers = Vec::with_capacity(options.headers.len() + 2);
        set_header(&mut headers, "Content-Type", "application/json".to_owned());
        for (name, value) in options.headers {
            set_header(&mut headers, &name, value);
        }
        if let Some(token) = token {
            set_header(&mut headers, "Authorization", format!("Token {token}"));
        }
        HttpRequest { method: options.method, url: self.config.endpoint(path), headers, body: options.body }
    }

    /// `POST /api/auth/login/`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, ApiError> {
        self.request(LOGIN_PATH, RequestOptions::post().json(payload)?, None).await
    }

    /// `POST /api/auth/registration/`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        self.request(REGISTER_PATH, RequestOptions::post().json(payload)?, None).await
    }

    /// `POST /api/auth/logout/`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.request::<IgnoredAny>(LOGOUT_PATH, RequestOptions::post(), Some(token))
            .await
            .map(|_| ())
    }

    /// `GET /api/auth/user/`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.request(CURRENT_USER_PATH, RequestOptions::get(), Some(token)).await
    }

    /// `GET /api/messages/`, newest first as ordered by the server.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn list_messages(&self) -> Result<Vec<Post>, ApiError> {
        self.request(MESSAGES_PATH, RequestOptions::get(), None).await
    }

    /// `POST /api/messages/` as the token's owner.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn create_message(&self, content: &str, token: &str) -> Result<Post, ApiError> {
        let options = RequestOptions::post().json(&NewPost { content })?;
        self.request(MESSAGES_PATH, options, Some(token)).await
    }
}

/// The auth endpoints the session layer depends on.
#[allow(async_fn_in_trait)]
pub trait AuthApi {
    async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, ApiError>;
    async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError>;
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
    async fn current_user(&self, token: &str) -> Result<User, ApiError>;
}

impl<T: Transport> AuthApi for ApiClient<T> {
    async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, ApiError> {
        ApiClient::login(self, payload).await
    }

    async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        ApiClient::register(self, payload).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        ApiClient::logout(self, token).await
    }

    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        ApiClient::current_user(self, token).await
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_owned(), value));
}

/// Empty success bodies decode as JSON `null`.
fn decode_success<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}
