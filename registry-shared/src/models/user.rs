use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::Timestamp;

/// Account role assigned by the registry API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Return the wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role grants `permission`.
    #[must_use]
    pub fn allows(self, permission: Permission) -> bool {
        match permission {
            Permission::Admin => self == Self::Admin,
            Permission::Read | Permission::Write | Permission::Delete => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err("unknown user role"),
        }
    }
}

/// Coarse capability checked before offering an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Read,
    Write,
    Delete,
    Admin,
}

/// Uploaded avatar image reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Avatar {
    pub public_id: String,
    pub url: String,
}

/// Registry account as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Avatar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl User {
    /// Name to show for this account: `name`, then `displayName`, then the email.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or(&self.email)
    }
}

/// `true` when `user` is present and an administrator.
#[must_use]
pub fn is_admin(user: Option<&User>) -> bool {
    user.is_some_and(|user| user.role == Role::Admin)
}

/// `true` when `user` is present and a regular user.
#[must_use]
pub fn is_user(user: Option<&User>) -> bool {
    user.is_some_and(|user| user.role == Role::User)
}

/// `true` when `user` is present and its role grants `permission`.
#[must_use]
pub fn has_permission(user: Option<&User>, permission: Permission) -> bool {
    user.is_some_and(|user| user.role.allows(permission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_with_role(role: Role) -> User {
        User {
            id: "64f0c2a1".to_string(),
            email: "nurse@clinic.test".to_string(),
            name: None,
            display_name: None,
            role,
            avatar: None,
            is_verified: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_user_deserializes_api_shape() {
        let user: User = serde_json::from_value(json!({
            "_id": "64f0c2a1",
            "email": "admin@clinic.test",
            "name": "Dr. Sari",
            "role": "admin",
            "avatar": { "public_id": "avatars/1", "url": "https://cdn.test/1.png" },
            "isVerified": true,
            "createdAt": "2025-01-02T03:04:05.000Z",
            "updatedAt": "2025-01-02T03:04:05.000Z"
        }))
        .unwrap();

        assert_eq!(user.id, "64f0c2a1");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.is_verified, Some(true));
        assert_eq!(user.avatar.unwrap().url, "https://cdn.test/1.png");
    }

    #[test]
    fn test_user_serialization_uses_wire_names() {
        let mut user = user_with_role(Role::User);
        user.display_name = Some("Nurse".to_string());

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["_id"], "64f0c2a1");
        assert_eq!(value["displayName"], "Nurse");
        assert_eq!(value["role"], "user");
        assert!(value.get("avatar").is_none());
    }

    #[test]
    fn test_role_round_trip_from_str() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_label_falls_back_to_email() {
        let mut user = user_with_role(Role::User);
        assert_eq!(user.label(), "nurse@clinic.test");
        user.display_name = Some("Nurse".to_string());
        assert_eq!(user.label(), "Nurse");
        user.name = Some("Ayu".to_string());
        assert_eq!(user.label(), "Ayu");
    }

    #[test]
    fn test_role_helpers() {
        let admin = user_with_role(Role::Admin);
        let user = user_with_role(Role::User);

        assert!(is_admin(Some(&admin)));
        assert!(!is_admin(Some(&user)));
        assert!(!is_admin(None));
        assert!(is_user(Some(&user)));
        assert!(!is_user(None));
    }

    #[test]
    fn test_permissions() {
        let admin = user_with_role(Role::Admin);
        let user = user_with_role(Role::User);

        for permission in [Permission::Read, Permission::Write, Permission::Delete] {
            assert!(has_permission(Some(&user), permission));
            assert!(has_permission(Some(&admin), permission));
        }
        assert!(has_permission(Some(&admin), Permission::Admin));
        assert!(!has_permission(Some(&user), Permission::Admin));
        assert!(!has_permission(None, Permission::Read));
    }
}
