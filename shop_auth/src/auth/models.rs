//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account ID type, assigned by the store
pub type AccountId = Uuid;

/// Capability tag carried by accounts and tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Stored account record
///
/// Holds the credential hash, so it is never serialized and its `Debug`
/// output redacts the hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub credential_hash: String,
    pub role: Role,
    pub display_name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Public view of the account without the credential hash
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            display_name: self.display_name.clone(),
            active: self.active,
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("credential_hash", &"<redacted>")
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Account fields supplied on creation; the store assigns `id` and `created_at`
#[derive(Clone)]
pub struct NewAccount {
    pub email: String,
    pub credential_hash: String,
    pub role: Role,
    pub display_name: String,
    pub active: bool,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("credential_hash", &"<redacted>")
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .field("active", &self.active)
            .finish()
    }
}

/// Account as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: AccountId,
    pub email: String,
    pub role: Role,
    #[serde(rename = "name")]
    pub display_name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Account registration request
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// Account login request
#[derive(Clone, Deserialize)]
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

/// Mutable profile fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
}

/// Which lifetime a token was issued with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenClaims {
    pub sub: AccountId,
    pub email: String,
    pub role: Role,
    pub iat: i64, // Issued at timestamp
    pub exp: i64, // Expiration timestamp
    pub typ: TokenKind,
    pub jti: Uuid,
}

/// Access/refresh pair handed out at login and refresh
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Identity attached to a request that passed the auth gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: AccountId,
    pub email: String,
    pub role: Role,
}

impl From<TokenClaims> for AuthContext {
    fn from(claims: TokenClaims) -> Self {
        Self {
            account_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "ann@example.com".to_string(),
            credential_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            role: Role::Customer,
            display_name: "Ann".to_string(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_debug_redacts_hash() {
        let account = sample_account();
        let rendered = format!("{account:?}");
        assert!(!rendered.contains("argon2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_profile_serialization_has_no_credential() {
        let profile = sample_account().profile();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["role"], "customer");
        assert!(json.get("credential_hash").is_none());
    }

    #[test]
    fn test_login_request_debug_redacts_password() {
        let request = LoginRequest {
            email: "ann@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(!format!("{request:?}").contains("secret123"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }
}
