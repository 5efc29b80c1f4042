use super::*;
use crate::data::memory::MemoryBackend;

// =============================================================================
// bytes_to_hex / tokens
// =============================================================================

#[test]
fn bytes_to_hex_pads_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a, 0xff]), "0aff");
}

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn generate_token_is_64_hex_chars_and_unique() {
    let a = generate_token();
    let b = generate_token();
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

#[test]
fn hash_token_is_stable_sha256() {
    assert_eq!(hash_token("abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    assert_ne!(hash_token("abc"), hash_token("abd"));
}

// =============================================================================
// session lifecycle
// =============================================================================

#[tokio::test]
async fn created_session_validates_until_deleted() {
    let backend = MemoryBackend::new();
    let user = backend.create_user("a@example.com", "h").await.unwrap();

    let token = create_session(&backend, user.id, 1).await.unwrap();
    let resolved = validate_session(&backend, &token).await.unwrap();
    assert_eq!(resolved, Some(SessionUser { id: user.id, email: "a@example.com".into() }));

    delete_session(&backend, &token).await.unwrap();
    assert_eq!(validate_session(&backend, &token).await.unwrap(), None);
}

#[tokio::test]
async fn zero_ttl_session_is_already_expired() {
    let backend = MemoryBackend::new();
    let user = backend.create_user("a@example.com", "h").await.unwrap();
    let token = create_session(&backend, user.id, 0).await.unwrap();
    assert_eq!(validate_session(&backend, &token).await.unwrap(), None);
}

#[tokio::test]
async fn unknown_token_resolves_to_none() {
    let backend = MemoryBackend::new();
    assert_eq!(validate_session(&backend, "missing").await.unwrap(), None);
}
