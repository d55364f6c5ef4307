use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    config::ClientConfig,
    models::{
        ApiResponse, AvatarResponse, AvatarUpdate, LoginRequest, LoginResponse, ProfileUpdate,
        RegisterRequest, Rejection, TokenPayload, User, UserPayload,
    },
};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, warn};
use url::Url;

use super::{AuthGateway, Credentials, fallback};
use crate::{
    error::{GatewayError, LOGIN_TIMEOUT_MESSAGE, REQUEST_TIMEOUT_MESSAGE},
    storage::{REFRESH_TOKEN_KEY, SessionStore, TOKEN_KEY},
};

const ACCESS_TOKEN_HEADER: &str = "access-token";
const REFRESH_TOKEN_HEADER: &str = "refresh-token";
const USER_AGENT: &str = concat!("clinic-registry/", env!("CARGO_PKG_VERSION"));

/// Which timeout and timeout message a call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Login,
    Standard,
}

impl CallKind {
    fn timeout_message(self) -> &'static str {
        match self {
            Self::Login => LOGIN_TIMEOUT_MESSAGE,
            Self::Standard => REQUEST_TIMEOUT_MESSAGE,
        }
    }
}

/// reqwest-backed client for the registry API.
///
/// Credentials are read from the shared [`SessionStore`] on every request,
/// so a token written by the session manager is used by the very next call.
#[derive(Clone)]
pub struct HttpGateway {
    config: ClientConfig,
    client: Client,
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.config.api_base_url.as_str())
            .field("login_timeout", &self.config.login_timeout())
            .field("request_timeout", &self.config.request_timeout())
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Create a gateway for the API described by `config`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, GatewayError> {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.user_agent(USER_AGENT);
        let client = builder
            .build()
            .map_err(|err| GatewayError::Request(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            config: config.clone(),
            client,
            store,
        })
    }

    /// Root of every endpoint.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.api_base_url
    }

    pub(crate) fn api_url(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.config.endpoint(path)?)
    }

    fn timeout(&self, kind: CallKind) -> Duration {
        match kind {
            CallKind::Login => self.config.login_timeout(),
            CallKind::Standard => self.config.request_timeout(),
        }
    }

    /// `path` followed by one percent-encoded segment, e.g. a record id.
    pub(crate) fn api_url_with(&self, path: &str, segment: &str) -> Result<Url, GatewayError> {
        let mut url = self.api_url(path)?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::Request("API base URL cannot take a path".to_string()))?
            .push(segment);
        Ok(url)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    fn apply_credentials(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(token) = self.store.get(TOKEN_KEY) {
            request = request.header(ACCESS_TOKEN_HEADER, token);
        }
        if let Some(token) = self.store.get(REFRESH_TOKEN_KEY) {
            request = request.header(REFRESH_TOKEN_HEADER, token);
        }
        request
    }

    /// Send `request` with credentials and the timeout for `kind`.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        kind: CallKind,
    ) -> Result<Response, GatewayError> {
        let request = self.apply_credentials(request).timeout(self.timeout(kind));
        #[cfg(not(target_arch = "wasm32"))]
        let started = std::time::Instant::now();

        let response = request.send().await.map_err(|err| {
            warn!(error = %err, ?kind, "API request failed before a response arrived");
            classify(&err, kind)
        })?;

        #[cfg(not(target_arch = "wasm32"))]
        debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "API response received"
        );
        #[cfg(target_arch = "wasm32")]
        debug!(url = %response.url(), status = response.status().as_u16(), "API response received");

        Ok(response)
    }

    /// Send `request` and decode the JSON body as `T`.
    ///
    /// Non-2xx answers become [`GatewayError::Rejected`] with the body's
    /// `message`, or `fallback`.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        kind: CallKind,
        fallback: &str,
    ) -> Result<T, GatewayError> {
        let response = self.send(request, kind).await?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| classify(&err, kind))?;

        if !status.is_success() {
            let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            let rejection = Rejection::from_body(&value, fallback);
            warn!(status = status.as_u16(), message = %rejection, "API rejected request");
            return Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message: rejection.message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| GatewayError::Decode(err.to_string()))
    }

    /// Send `request` and return the raw body of a successful answer.
    pub(crate) async fn call_bytes(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Vec<u8>, GatewayError> {
        let response = self.send(request, CallKind::Standard).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message: fallback.to_string(),
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| classify(&err, CallKind::Standard))?;
        Ok(body.to_vec())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl AuthGateway for HttpGateway {
    /// Authenticate with email/password credentials.
    async fn login(&self, email: &str, password: &str) -> Result<Credentials, GatewayError> {
        let url = self.api_url("auth/login")?;
        debug!(email, "sending login request");
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body: LoginResponse = self
            .call(
                self.client.post(url).json(&payload),
                CallKind::Login,
                fallback::LOGIN,
            )
            .await?;

        if !body.success {
            return Err(Rejection::new(body.message, fallback::LOGIN).into());
        }
        debug!(
            has_user = body.user.is_some(),
            has_access_token = body.access_token.is_some(),
            has_refresh_token = body.refresh_token.is_some(),
            "login response received"
        );
        match (body.user, body.access_token, body.refresh_token) {
            (Some(user), Some(access_token), Some(refresh_token)) => Ok(Credentials {
                user,
                access_token,
                refresh_token,
            }),
            _ => Err(GatewayError::Decode(
                "login response is missing the user or a token".to_string(),
            )),
        }
    }

    /// Create an account.
    async fn register(&self, request: &RegisterRequest) -> Result<Option<User>, GatewayError> {
        let url = self.api_url("auth/registration")?;
        let body: ApiResponse<UserPayload> = self
            .call(
                self.client.post(url).json(request),
                CallKind::Standard,
                fallback::REGISTER,
            )
            .await?;
        if !body.success {
            return Err(Rejection::new(body.message, fallback::REGISTER).into());
        }
        Ok(body.data.map(|payload| payload.user))
    }

    /// Terminate the current session.
    async fn logout(&self) -> Result<(), GatewayError> {
        let url = self.api_url("auth/logout")?;
        let body: ApiResponse<serde_json::Value> = self
            .call(self.client.get(url), CallKind::Standard, fallback::LOGOUT)
            .await?;
        Ok(body.into_ack(fallback::LOGOUT)?)
    }

    /// Exchange the persisted refresh token for a new access token.
    async fn refresh_token(&self) -> Result<String, GatewayError> {
        let url = self.api_url("auth/refresh")?;
        let body: ApiResponse<TokenPayload> = self
            .call(self.client.post(url), CallKind::Standard, fallback::REFRESH)
            .await?;
        Ok(body.into_data(fallback::REFRESH)?.token)
    }

    /// Retrieve the authenticated user profile.
    async fn get_user_profile(&self) -> Result<User, GatewayError> {
        let url = self.api_url("users/me")?;
        let body: ApiResponse<UserPayload> = self
            .call(self.client.get(url), CallKind::Standard, fallback::PROFILE)
            .await?;
        Ok(body.into_data(fallback::PROFILE)?.user)
    }

    async fn update_user_profile(&self, update: &ProfileUpdate) -> Result<User, GatewayError> {
        let url = self.api_url("users/update-info")?;
        let body: ApiResponse<UserPayload> = self
            .call(
                self.client.put(url).json(update),
                CallKind::Standard,
                fallback::PROFILE_UPDATE,
            )
            .await?;
        Ok(body.into_data(fallback::PROFILE_UPDATE)?.user)
    }

    async fn update_avatar(&self, update: &AvatarUpdate) -> Result<User, GatewayError> {
        let url = self.api_url("users/update-avatar")?;
        let body: AvatarResponse = self
            .call(
                self.client.put(url).json(update),
                CallKind::Standard,
                fallback::AVATAR_UPDATE,
            )
            .await?;
        Ok(body.into_user(fallback::AVATAR_UPDATE)?)
    }
}

fn classify(err: &reqwest::Error, kind: CallKind) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(kind.timeout_message())
    } else if err.is_builder() {
        GatewayError::Request(err.to_string())
    } else if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else {
        GatewayError::Connectivity
    }
}
