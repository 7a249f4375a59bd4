/// Property-based tests for token issuance and verification using proptest
///
/// These tests verify that issued tokens round-trip their claims and that
/// any mutation of a signed token is rejected.
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use proptest::prelude::*;
use shop_auth::auth::{Role, TokenConfig, TokenIssuer, TokenKind, TokenVerifier, VerificationError};
use uuid::Uuid;

const SECRET: &str = "property-test-secret-0123456789abcdef";
const NOW: i64 = 1_700_000_000;

fn keys() -> (TokenIssuer, TokenVerifier) {
    let config = TokenConfig::with_default_lifetimes(SECRET).unwrap();
    (TokenIssuer::new(&config), TokenVerifier::new(&config))
}

// Strategy to generate a plausible normalized email
fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z0-9._]{1,20}", "[a-z0-9]{1,12}", "[a-z]{2,6}")
        .prop_map(|(local, host, tld)| format!("{local}@{host}.{tld}"))
}

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Customer), Just(Role::Admin)]
}

fn kind_strategy() -> impl Strategy<Value = TokenKind> {
    prop_oneof![Just(TokenKind::Access), Just(TokenKind::Refresh)]
}

proptest! {
    #[test]
    fn test_issued_claims_roundtrip(
        id in any::<u128>(),
        email in email_strategy(),
        role in role_strategy(),
        kind in kind_strategy(),
    ) {
        let (issuer, verifier) = keys();
        let account_id = Uuid::from_u128(id);
        let token = issuer.issue_at(kind, account_id, &email, role, NOW).unwrap();

        let claims = verifier.verify_at(&token, NOW).unwrap();
        prop_assert_eq!(claims.sub, account_id);
        prop_assert_eq!(claims.email, email);
        prop_assert_eq!(claims.role, role);
        prop_assert_eq!(claims.typ, kind);
        prop_assert_eq!(claims.iat, NOW);

        let lifetime = match kind {
            TokenKind::Access => 15 * 60,
            TokenKind::Refresh => 7 * 24 * 60 * 60,
        };
        prop_assert_eq!(claims.exp - claims.iat, lifetime);
    }

    #[test]
    fn test_expiry_is_strict(offset in 0i64..1_000_000) {
        let (issuer, verifier) = keys();
        let token = issuer
            .issue_at(TokenKind::Access, Uuid::new_v4(), "a@x.com", Role::Customer, NOW)
            .unwrap();
        let exp = NOW + 15 * 60;

        prop_assert_eq!(
            verifier.verify_at(&token, exp + offset),
            Err(VerificationError::Expired)
        );
        if offset > 0 {
            prop_assert!(verifier.verify_at(&token, exp - offset.min(15 * 60)).is_ok());
        }
    }

    #[test]
    fn test_mutated_token_rejected(position in any::<prop::sample::Index>(), replacement in "[A-Za-z0-9_-]") {
        let (issuer, verifier) = keys();
        let token = issuer
            .issue_at(TokenKind::Access, Uuid::new_v4(), "a@x.com", Role::Customer, NOW)
            .unwrap();

        let mut bytes = token.clone().into_bytes();
        let idx = position.index(bytes.len());
        prop_assume!(bytes[idx] != b'.');
        let new_byte = replacement.as_bytes()[0];
        prop_assume!(bytes[idx] != new_byte);
        bytes[idx] = new_byte;
        let mutated = String::from_utf8(bytes).unwrap();

        // Base64url slack bits can leave the decoded bytes unchanged; any
        // token that decodes differently must be rejected.
        if let Ok(claims) = verifier.verify_at(&mutated, NOW) {
            let original = verifier.verify_at(&token, NOW).unwrap();
            prop_assert_eq!(claims, original);
        }
    }

    #[test]
    fn test_role_escalation_rejected(email in email_strategy()) {
        let (issuer, verifier) = keys();
        let token = issuer
            .issue_at(TokenKind::Access, Uuid::new_v4(), &email, Role::Customer, NOW)
            .unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let mut claims: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        claims["role"] = serde_json::json!("admin");
        let forged = format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode(claims.to_string()), parts[2]);

        prop_assert_eq!(verifier.verify_at(&forged, NOW), Err(VerificationError::BadSignature));
    }
}

#[test]
fn test_foreign_secret_rejected() {
    let (issuer, _) = keys();
    let other = TokenConfig::with_default_lifetimes("another-secret-entirely-0123456789").unwrap();
    let token = issuer
        .issue_at(TokenKind::Access, Uuid::new_v4(), "a@x.com", Role::Customer, NOW)
        .unwrap();

    assert_eq!(
        TokenVerifier::new(&other).verify_at(&token, NOW),
        Err(VerificationError::BadSignature)
    );
}

#[test]
fn test_unsigned_token_rejected() {
    let (_, verifier) = keys();
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(
        serde_json::json!({
            "sub": Uuid::new_v4(),
            "email": "a@x.com",
            "role": "admin",
            "iat": NOW,
            "exp": NOW + 900,
            "typ": "access",
            "jti": Uuid::new_v4(),
        })
        .to_string(),
    );

    for token in [format!("{header}.{claims}."), format!("{header}.{claims}")] {
        assert!(verifier.verify_at(&token, NOW).is_err(), "{token} accepted");
    }
    assert_eq!(
        verifier.verify_at(&format!("{header}.{claims}."), NOW),
        Err(VerificationError::BadSignature)
    );
}
