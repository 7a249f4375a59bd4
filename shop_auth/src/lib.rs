//! # shop_auth
//!
//! Authentication and session-token lifecycle for the shop's services.
//!
//! ## Architecture
//!
//! Components, leaves first:
//!
//! - **Credential store** ([`db::CredentialStore`]): durable email to
//!   credential/profile mapping, PostgreSQL or in-memory
//! - **Password hasher** ([`auth::CredentialHasher`]): salted Argon2id
//! - **Token issuer/verifier** ([`auth::TokenIssuer`], [`auth::TokenVerifier`]):
//!   HS256 access and refresh tokens
//! - **Session service** ([`auth::SessionService`]): register, login,
//!   refresh, logout and profile operations
//! - **Auth gate** ([`auth::AuthGate`]): bearer header to [`auth::AuthContext`]
//!
//! The HTTP boundary lives in the `shop_auth_server` crate.

/// Accounts, credentials, tokens and the session service.
pub mod auth;
pub use auth::{AuthContext, AuthError, AuthGate, AuthResult, SessionService};

/// Credential store adapters and connection pooling.
pub mod db;
