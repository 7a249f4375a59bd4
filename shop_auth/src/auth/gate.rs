//! Transport-independent request gate for protected operations.

use super::errors::{AuthError, AuthResult, VerificationError};
use super::models::{AuthContext, TokenKind};
use super::tokens::TokenVerifier;

/// Checks the bearer credential of a protected request
#[derive(Clone)]
pub struct AuthGate {
    verifier: TokenVerifier,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Authenticate a request from its raw authorization header value
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingCredential` - no header, a non-bearer scheme, or
    ///   an empty token
    /// * `AuthError::TokenExpired` - signature valid, lifetime over
    /// * `AuthError::InvalidToken` - any other verification failure, or a
    ///   refresh token presented as an access token
    pub fn authenticate(&self, authorization: Option<&str>) -> AuthResult<AuthContext> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::MissingCredential)?;

        let claims = self.verifier.verify(token).map_err(|e| match e {
            VerificationError::Expired => AuthError::TokenExpired,
            VerificationError::MalformedToken | VerificationError::BadSignature => {
                AuthError::InvalidToken
            }
        })?;

        if claims.typ != TokenKind::Access {
            return Err(AuthError::InvalidToken);
        }
        Ok(AuthContext::from(claims))
    }
}

/// Extract the token from a `Bearer <token>` header value
///
/// The scheme name is matched case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
