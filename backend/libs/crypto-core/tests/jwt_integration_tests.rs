/// Integration tests for crypto-core JWT functionality
///
/// This test module covers:
/// - Token issuing and validation
/// - Claims extraction
/// - Error handling for invalid tokens
/// - Password hashing round trip used by login
use crypto_core::jwt::{generate_access_token, initialize_jwt, validate_token};
use crypto_core::password::{hash_password, verify_password};
use crypto_core::CryptoError;
use std::sync::Once;
use uuid::Uuid;

// FOR TESTING ONLY
const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

fn init_test_keys() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        initialize_jwt(TEST_SECRET, 900).expect("Failed to initialize test keys");
    });
}

#[test]
fn test_second_initialization_is_rejected() {
    init_test_keys();

    let result = initialize_jwt(TEST_SECRET, 900);
    assert!(matches!(result, Err(CryptoError::AlreadyInitialized)));
}

#[test]
fn test_extract_claims_from_valid_token() {
    init_test_keys();

    let user_id = Uuid::new_v4();
    let issued = generate_access_token(user_id, "claims@example.com", false)
        .expect("Failed to generate token");
    assert_eq!(issued.expires_in, 900);

    let claims = validate_token(&issued.token).unwrap().claims;
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.email, "claims@example.com");
    assert_eq!(claims.token_type, "access");
    assert!(!claims.is_staff);
    assert_eq!(claims.exp - claims.iat, 900);
}

#[test]
fn test_validate_malformed_token() {
    init_test_keys();

    for token in ["", "not-a-jwt", "a.b.c"] {
        assert!(
            matches!(validate_token(token), Err(CryptoError::InvalidToken(_))),
            "token {:?} should be rejected",
            token
        );
    }
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    init_test_keys();

    let now = chrono::Utc::now().timestamp();
    let claims = crypto_core::jwt::Claims {
        sub: Uuid::new_v4().to_string(),
        iat: now,
        exp: now + 600,
        jti: Uuid::new_v4().to_string(),
        token_type: "access".to_string(),
        email: "forged@example.com".to_string(),
        is_staff: true,
    };
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"another-secret-that-is-long-enough-too"),
    )
    .unwrap();

    assert!(validate_token(&forged).is_err());
}

#[test]
fn test_complete_login_lifecycle() {
    init_test_keys();

    let stored_hash = hash_password("testpassword").unwrap();
    assert!(verify_password("testpassword", &stored_hash).unwrap());

    let user_id = Uuid::new_v4();
    let issued = generate_access_token(user_id, "life@example.com", true).unwrap();
    let claims = validate_token(&issued.token).unwrap().claims;
    assert_eq!(claims.sub, user_id.to_string());
    assert!(claims.is_staff);
}
