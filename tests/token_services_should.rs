use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use cine_api::server::error::{Error, TokenError};
use cine_api::server::services::token_services::DownloadTokenService;

const TTL_MINUTES: i64 = 30;
const TTL_MS: i64 = TTL_MINUTES * 60 * 1000;

fn service() -> DownloadTokenService {
    DownloadTokenService::new("test_secret".to_string(), TTL_MINUTES)
}

#[test]
fn test_issue_verify_roundtrip() {
    let svc = service();

    let token = svc.issue("movie-42", "720P").expect("issue should succeed");
    let claims = svc.verify(&token).expect("fresh token should verify");

    assert_eq!(claims.resource_id, "movie-42");
    assert_eq!(claims.quality, "720P");
    assert!(claims.issued_at > 0);
}

#[test]
fn test_quality_preserved_verbatim() {
    let svc = service();

    let token = svc.issue("9481", "4K").expect("issue should succeed");
    let claims = svc.verify(&token).expect("token should verify");

    assert_eq!(claims.quality, "4K");
}

#[test]
fn test_rejects_empty_inputs() {
    let svc = service();

    assert!(matches!(svc.issue("", "720P"), Err(Error::InvalidInput(_))));
    assert!(matches!(svc.issue("movie-42", ""), Err(Error::InvalidInput(_))));
}

#[test]
fn test_tokens_are_url_safe_without_padding() {
    let svc = service();

    let token = svc.issue("movie-42", "1080P").expect("issue should succeed");

    assert!(!token.contains('+'));
    assert!(!token.contains('/'));
    assert!(!token.contains('='));
}

#[test]
fn test_any_single_character_tamper_in_signature_fails() {
    let svc = service();

    let token = svc.issue("movie-42", "1080P").expect("issue should succeed");
    let raw = URL_SAFE_NO_PAD.decode(&token).expect("token should be base64url");
    let payload: serde_json::Value = serde_json::from_slice(&raw).expect("token should be json");
    let hash = payload["hash"].as_str().expect("hash field present").to_string();

    for i in 0..hash.len() {
        let mut chars: Vec<char> = hash.chars().collect();
        chars[i] = if chars[i] == '0' { '1' } else { '0' };
        let mutated: String = chars.into_iter().collect();

        let mut forged = payload.clone();
        forged["hash"] = serde_json::Value::String(mutated);
        let forged_token =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).expect("payload serializes"));

        assert_eq!(
            svc.verify(&forged_token),
            Err(TokenError::BadSignature),
            "flipping signature char {} should invalidate the token",
            i
        );
    }
}

#[test]
fn test_tampered_fields_fail_signature_check() {
    let svc = service();

    let token = svc.issue("movie-42", "480P").expect("issue should succeed");
    let raw = URL_SAFE_NO_PAD.decode(&token).expect("token should be base64url");
    let mut payload: serde_json::Value =
        serde_json::from_slice(&raw).expect("token should be json");

    // upgrade the quality without re-signing
    payload["q"] = serde_json::Value::String("4K".to_string());
    let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).expect("payload serializes"));

    assert_eq!(svc.verify(&forged), Err(TokenError::BadSignature));
}

#[test]
fn test_expiry_boundaries() {
    let svc = service();

    let token = svc.issue("movie-42", "720P").expect("issue should succeed");
    let issued_at = svc.verify(&token).expect("token should verify").issued_at;

    // one millisecond inside the window
    assert!(svc.verify_at(&token, issued_at + TTL_MS - 1).is_ok());
    // exactly at the window edge still passes
    assert!(svc.verify_at(&token, issued_at + TTL_MS).is_ok());
    // one millisecond past is dead, regardless of the valid signature
    assert_eq!(
        svc.verify_at(&token, issued_at + TTL_MS + 1),
        Err(TokenError::Expired)
    );
}

#[test]
fn test_malformed_tokens_never_panic() {
    let svc = service();

    // not base64 at all
    assert_eq!(svc.verify("%%%not-base64%%%"), Err(TokenError::MalformedToken));

    // base64 but not json
    let not_json = URL_SAFE_NO_PAD.encode(b"definitely not json");
    assert_eq!(svc.verify(&not_json), Err(TokenError::MalformedToken));

    // json but missing required fields
    let partial = URL_SAFE_NO_PAD.encode(br#"{"id":"movie-42","q":"720P","t":123}"#);
    assert_eq!(svc.verify(&partial), Err(TokenError::MalformedToken));

    // fields present but empty
    let empty_fields = URL_SAFE_NO_PAD.encode(br#"{"id":"","q":"720P","t":123,"hash":"abc"}"#);
    assert_eq!(svc.verify(&empty_fields), Err(TokenError::MalformedToken));

    assert_eq!(svc.verify(""), Err(TokenError::MalformedToken));
}

#[test]
fn test_different_secret_invalidates() {
    let issuer = DownloadTokenService::new("secret_a".to_string(), TTL_MINUTES);
    let verifier = DownloadTokenService::new("secret_b".to_string(), TTL_MINUTES);

    let token = issuer.issue("movie-42", "720P").expect("issue should succeed");

    assert_eq!(verifier.verify(&token), Err(TokenError::BadSignature));
}
