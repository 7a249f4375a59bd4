//! Authentication: account registration, credential verification, token
//! issuance and renewal, and request gating.
//!
//! This module implements:
//! - Argon2id password hashing with a tunable work factor
//! - HS256 JWT access tokens (15-minute expiry)
//! - Rotating refresh tokens (7-day expiry)
//! - A stateless gate that turns a bearer header into an [`AuthContext`]
//!
//! ## Example
//!
//! ```no_run
//! use shop_auth::auth::{
//!     CredentialHasher, HashingConfig, LoginRequest, RegisterRequest, SessionService, TokenConfig,
//! };
//! use shop_auth::db::InMemoryCredentialStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tokens = TokenConfig::with_default_lifetimes(&std::env::var("JWT_SECRET")?)?;
//!     let sessions = SessionService::new(
//!         Arc::new(InMemoryCredentialStore::new()),
//!         Arc::new(CredentialHasher::new(HashingConfig::default())?),
//!         &tokens,
//!         Duration::from_secs(5),
//!     );
//!
//!     sessions
//!         .register(RegisterRequest {
//!             email: "ann@example.com".to_string(),
//!             password: "secret123".to_string(),
//!             name: "Ann".to_string(),
//!         })
//!         .await?;
//!
//!     let pair = sessions
//!         .login(LoginRequest {
//!             email: "ann@example.com".to_string(),
//!             password: "secret123".to_string(),
//!         })
//!         .await?;
//!     println!("access token expires in {}s", pair.expires_in);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod gate;
pub mod models;
pub mod password;
pub mod service;
pub mod tokens;

pub use errors::{AuthError, AuthResult, VerificationError};
pub use gate::AuthGate;
pub use models::{
    Account, AccountId, AccountProfile, AuthContext, LoginRequest, NewAccount, ProfileUpdate,
    RegisterRequest, Role, TokenClaims, TokenKind, TokenPair,
};
pub use password::{CredentialHasher, HashingConfig};
pub use service::SessionService;
pub use tokens::{TokenConfig, TokenIssuer, TokenVerifier};
