//! API gateway: the seam between session logic and the registry API.
//!
//! The session manager only depends on [`AuthGateway`], whose methods
//! already return normalized results: envelopes are unwrapped, the two
//! avatar response shapes are merged, and transport failures are mapped to
//! [`GatewayError`]. [`HttpGateway`] is the reqwest implementation and also
//! carries the patient, calendar and account endpoints.

mod http;
mod registry;


pub use http::HttpGateway;

use async_trait::async_trait;
use shared::models::{AvatarUpdate, ProfileUpdate, RegisterRequest, User};
use std::fmt;

use crate::error::GatewayError;

/// Fallback messages used when the server explains nothing.
pub mod fallback {
    pub const LOGIN: &str = "Login failed";
    pub const REGISTER: &str = "Registration failed";
    pub const LOGOUT: &str = "Logout failed";
    pub const REFRESH: &str = "Token refresh failed";
    pub const PROFILE: &str = "Failed to load profile";
    pub const PROFILE_UPDATE: &str = "Profile update failed";
    pub const AVATAR_UPDATE: &str = "Avatar update failed";
    pub const PASSWORD_UPDATE: &str = "Password update failed";
    pub const REQUEST: &str = "API request failed";
    pub const PATIENTS: &str = "Failed to load patient data";
    pub const EXPORT: &str = "Failed to export patient data";
    pub const IMPORT: &str = "Failed to import patient data";
    pub const TEMPLATE: &str = "Failed to download template";
}

/// Identity and tokens returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user.id)
            .finish_non_exhaustive()
    }
}

/// Authentication operations the session manager needs from the API.
///
/// Implementations attach whatever credentials are currently persisted.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait AuthGateway: Send + Sync {
    /// Exchange email and password for a user record and token pair.
    async fn login(&self, email: &str, password: &str) -> Result<Credentials, GatewayError>;

    /// Create an account. Does not sign the caller in.
    async fn register(&self, request: &RegisterRequest) -> Result<Option<User>, GatewayError>;

    /// Invalidate the session server-side.
    async fn logout(&self) -> Result<(), GatewayError>;

    /// Obtain a new access token using the persisted refresh token.
    async fn refresh_token(&self) -> Result<String, GatewayError>;

    /// Fetch the account the current access token belongs to.
    async fn get_user_profile(&self) -> Result<User, GatewayError>;

    async fn update_user_profile(&self, update: &ProfileUpdate) -> Result<User, GatewayError>;

    async fn update_avatar(&self, update: &AvatarUpdate) -> Result<User, GatewayError>;
}
