//! Signed, time-bounded session tokens.
//!
//! Tokens are HS256 JWTs. Issuance and verification are pure functions of
//! the claims, the current time and the process secret; nothing is stored.
//! The `*_at` variants take the current time explicitly so expiry
//! boundaries can be exercised deterministically.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::Deserialize;
use uuid::Uuid;

use super::errors::{AuthError, AuthResult, VerificationError};
use super::models::{AccountId, Role, TokenClaims, TokenKind};

/// Minimum signing secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// The single signing algorithm accepted
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const SIGNING_ALGORITHM_NAME: &str = "HS256";

/// Signing secret plus token lifetimes, loaded once at startup
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Build a token configuration
    ///
    /// # Errors
    ///
    /// * `AuthError::Configuration` - secret shorter than [`MIN_SECRET_LEN`],
    ///   or lifetimes that are not positive with access shorter than refresh
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> AuthResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if access_ttl <= Duration::zero() || refresh_ttl <= Duration::zero() {
            return Err(AuthError::Configuration(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if access_ttl >= refresh_ttl {
            return Err(AuthError::Configuration(
                "access token lifetime must be shorter than refresh token lifetime".to_string(),
            ));
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            access_ttl,
            refresh_ttl,
        })
    }

    /// 15 minute access tokens and 7 day refresh tokens
    pub fn with_default_lifetimes(secret: &str) -> AuthResult<Self> {
        Self::new(secret, Duration::minutes(15), Duration::days(7))
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Creates signed access and refresh tokens
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(&config.secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Issue a short-lived access token
    pub fn issue_access_token(
        &self,
        account_id: AccountId,
        email: &str,
        role: Role,
    ) -> AuthResult<String> {
        self.issue_at(TokenKind::Access, account_id, email, role, Utc::now().timestamp())
    }

    /// Issue a long-lived refresh token
    pub fn issue_refresh_token(
        &self,
        account_id: AccountId,
        email: &str,
        role: Role,
    ) -> AuthResult<String> {
        self.issue_at(TokenKind::Refresh, account_id, email, role, Utc::now().timestamp())
    }

    /// Issue a token of `kind` as if the current time were `now` (unix seconds)
    pub fn issue_at(
        &self,
        kind: TokenKind,
        account_id: AccountId,
        email: &str,
        role: Role,
        now: i64,
    ) -> AuthResult<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = TokenClaims {
            sub: account_id,
            email: email.to_string(),
            role,
            iat: now,
            exp: now + ttl.num_seconds(),
            typ: kind,
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }
}

/// Validates token signature and expiry and extracts typed claims
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

/// Only the header field needed to pin the algorithm
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

impl TokenVerifier {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Expiry is checked below with a strict `now < exp` and no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(&config.secret),
            validation,
        }
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<TokenClaims, VerificationError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the current time were `now` (unix seconds)
    ///
    /// # Errors
    ///
    /// * `MalformedToken` - not three base64url segments, unreadable header,
    ///   or claims missing/unknown/mistyped
    /// * `BadSignature` - algorithm other than HS256 (including `none`) or
    ///   signature mismatch
    /// * `Expired` - `now >= exp`
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, VerificationError> {
        let algorithm = header_algorithm(token)?;
        if algorithm != SIGNING_ALGORITHM_NAME {
            return Err(VerificationError::BadSignature);
        }

        let claims = decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => VerificationError::BadSignature,
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                _ => VerificationError::MalformedToken,
            })?
            .claims;

        if now >= claims.exp {
            return Err(VerificationError::Expired);
        }
        Ok(claims)
    }

    /// Verify and additionally require the token to be of `kind`
    ///
    /// A token of the wrong kind is reported as `MalformedToken`.
    pub fn verify_kind(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<TokenClaims, VerificationError> {
        let claims = self.verify(token)?;
        if claims.typ != kind {
            return Err(VerificationError::MalformedToken);
        }
        Ok(claims)
    }
}

/// Read the `alg` header field without trusting anything else in the token
fn header_algorithm(token: &str) -> Result<String, VerificationError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(VerificationError::MalformedToken);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| VerificationError::MalformedToken)?;
    let raw: RawHeader =
        serde_json::from_slice(&bytes).map_err(|_| VerificationError::MalformedToken)?;
    Ok(raw.alg)
}
