//! Authentication and account-management payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Pagination, Role, User};

/// Credentials submitted to `auth/login`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login answer. Unlike every other endpoint it is not wrapped in an
/// envelope: user and tokens sit at the top level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Account creation request sent to `auth/registration`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Base64 data URL of the initial avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("avatar", &self.avatar.as_ref().map(String::len))
            .finish()
    }
}

/// Partial profile change; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    /// `true` when neither field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// New avatar as a base64 data URL.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvatarUpdate {
    pub avatar: String,
}

impl fmt::Debug for AvatarUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarUpdate")
            .field("avatar_len", &self.avatar.len())
            .finish()
    }
}

/// Password change request.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordUpdate { .. }")
    }
}

/// Admin request to change another account's role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdate {
    pub user_id: String,
    pub role: Role,
}

/// `data` payload carrying a user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPayload {
    pub user: User,
}

/// `data` payload of `auth/refresh`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPayload {
    pub token: String,
}

impl fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPayload { .. }")
    }
}

/// Avatar update answer. The server has been seen sending the user both as
/// `data.user` and at the top level; [`AvatarResponse::into_user`] accepts
/// either.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvatarResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<UserPayload>,
    #[serde(default)]
    pub user: Option<User>,
}

impl AvatarResponse {
    /// Normalize both response shapes into one user record.
    ///
    /// # Errors
    /// Returns a [`super::Rejection`] if the update failed or carried no user.
    pub fn into_user(self, fallback: &str) -> Result<User, super::Rejection> {
        if !self.success {
            return Err(super::Rejection::new(self.message, fallback));
        }
        self.data
            .map(|payload| payload.user)
            .or(self.user)
            .ok_or_else(|| super::Rejection::new(self.message, fallback))
    }
}

/// Admin listing of accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}
