//! Session service: registration, login, token refresh and profile access.
//!
//! The service is stateless between requests. Its dependencies (store,
//! hasher, signing keys) are injected at construction and only read
//! afterwards, so one instance is shared by every request.

use std::sync::Arc;
use std::time::Duration;

use super::errors::{AuthError, AuthResult};
use super::models::{
    AccountId, AccountProfile, LoginRequest, NewAccount, ProfileUpdate, RegisterRequest, Role,
    TokenClaims, TokenKind, TokenPair,
};
use super::password::CredentialHasher;
use super::tokens::{TokenConfig, TokenIssuer, TokenVerifier};
use crate::db::{CredentialStore, timeouts::with_timeout};

/// Password length bounds, in characters
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Maximum display name length, in characters
pub const MAX_NAME_LEN: usize = 100;

/// Orchestrates the store, hasher, issuer and verifier
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<CredentialHasher>,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    store_timeout: Duration,
}

impl SessionService {
    /// Create a new session service
    ///
    /// # Arguments
    ///
    /// * `store` - Credential store adapter
    /// * `hasher` - Password hasher
    /// * `tokens` - Signing secret and token lifetimes
    /// * `store_timeout` - Bound applied to every store call
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<CredentialHasher>,
        tokens: &TokenConfig,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer: TokenIssuer::new(tokens),
            verifier: TokenVerifier::new(tokens),
            store_timeout,
        }
    }

    /// Verifier sharing this service's signing key, for the auth gate
    pub fn verifier(&self) -> TokenVerifier {
        self.verifier.clone()
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - malformed email, password outside
    ///   8..=128 characters, or empty/overlong name
    /// * `AuthError::DuplicateAccount` - email already registered
    /// * `AuthError::StoreUnavailable` - store timed out or unreachable
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<AccountId> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;
        let display_name = validate_name(&request.name)?;

        let credential_hash = self.hasher.hash_blocking(request.password).await?;
        let new_account = NewAccount {
            email,
            credential_hash,
            role: Role::Customer,
            display_name,
            active: true,
        };

        // The store's uniqueness constraint is the only duplicate check
        let account = with_timeout(self.store_timeout, self.store.insert(new_account))
            .await
            .inspect_err(|e| {
                if e.is_transient() {
                    log::warn!("Store call failed during registration: {e}");
                }
            })?;

        log::info!("Registered account {}", account.id);
        Ok(account.id)
    }

    /// Verify credentials and issue an access/refresh pair
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - unknown email, wrong password,
    ///   or inactive account; the caller cannot tell which
    /// * `AuthError::StoreUnavailable` - store timed out or unreachable
    pub async fn login(&self, request: LoginRequest) -> AuthResult<TokenPair> {
        let email = normalize_email(&request.email);

        let account = if validate_email(&email).is_ok() {
            with_timeout(self.store_timeout, self.store.find_by_email(&email))
                .await
                .inspect_err(|e| log::warn!("Store call failed during login: {e}"))?
        } else {
            None
        };

        let stored_hash = account.as_ref().map(|a| a.credential_hash.clone());
        let matched = self
            .hasher
            .verify_blocking(request.password, stored_hash)
            .await?;

        match account {
            Some(account) if matched && account.active => {
                log::debug!("Login succeeded for account {}", account.id);
                self.issue_pair(account.id, &account.email, account.role)
            }
            _ => {
                log::info!("Login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Exchange a refresh token for a new access/refresh pair
    ///
    /// The account is not re-read: a refresh token stays usable until it
    /// expires even if the account is later deactivated.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidToken` - any verification failure, or an
    ///   access token presented in place of a refresh token
    pub fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self
            .verifier
            .verify_kind(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                log::info!("Refresh rejected: {e}");
                AuthError::InvalidToken
            })?;

        let TokenClaims {
            sub, email, role, ..
        } = claims;
        self.issue_pair(sub, &email, role)
    }

    /// Stateless acknowledgement; issued tokens stay valid until they expire
    pub fn logout(&self) {}

    /// Fetch an account's public profile
    ///
    /// # Errors
    ///
    /// * `AuthError::NotFound` - no account with this ID
    /// * `AuthError::StoreUnavailable` - store timed out or unreachable
    pub async fn profile(&self, account_id: AccountId) -> AuthResult<AccountProfile> {
        let account = with_timeout(self.store_timeout, self.store.find_by_id(account_id))
            .await?
            .ok_or(AuthError::NotFound)?;
        Ok(account.profile())
    }

    /// Merge mutable profile fields and return the updated profile
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - empty or overlong name
    /// * `AuthError::NotFound` - no account with this ID
    /// * `AuthError::StoreUnavailable` - store timed out or unreachable
    pub async fn update_profile(
        &self,
        account_id: AccountId,
        update: ProfileUpdate,
    ) -> AuthResult<AccountProfile> {
        let update = ProfileUpdate {
            name: update.name.as_deref().map(validate_name).transpose()?,
        };

        let account = with_timeout(
            self.store_timeout,
            self.store.update_profile(account_id, &update),
        )
        .await?
        .ok_or(AuthError::NotFound)?;
        Ok(account.profile())
    }

    /// Whether the store answers a liveness check within the store timeout
    pub async fn ready(&self) -> AuthResult<()> {
        with_timeout(self.store_timeout, self.store.ping())
            .await
            .map_err(AuthError::from)
    }

    fn issue_pair(&self, account_id: AccountId, email: &str, role: Role) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issuer.issue_access_token(account_id, email, role)?,
            refresh_token: self.issuer.issue_refresh_token(account_id, email, role)?,
            token_type: "Bearer".to_string(),
            expires_in: self.issuer.access_ttl_secs(),
        })
    }
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an already normalized email address
pub fn validate_email(email: &str) -> AuthResult<()> {
    let invalid = || AuthError::Validation("Invalid email address".to_string());

    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || !domain.contains('.')
    {
        return Err(invalid());
    }
    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> AuthResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate and trim a display name
pub fn validate_name(name: &str) -> AuthResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@shop.example.org").is_ok());

        for bad in ["", "ax.com", "@x.com", "a@", "a@x", "a@.com", "a@x.", "a@b@x.com", "a b@x.com"] {
            assert!(validate_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(128)).is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_password_length_counts_characters() {
        // Eight characters, sixteen bytes
        assert!(validate_password("ääääääää").is_ok());
        assert!(validate_password("äääää").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ann ").unwrap(), "Ann");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }
}
