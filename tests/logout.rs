mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use common::{FakeProvider, UnreachableStore, seed_session};
use idp_session::{SubjectId, VerificationFailure};
use idp_session::middleware::{AuthError, CookieKey, MemorySessionStore, SessionAuthConfig, revoke};

fn memory_store() -> MemorySessionStore {
    SessionAuthConfig::new(CookieKey::generate()).memory_store()
}

fn provider() -> FakeProvider {
    FakeProvider::new().with_credential("cred-u1", "u1")
}

#[tokio::test]
async fn logout_without_credential_touches_nothing() {
    let store = memory_store();
    let provider = provider();
    let (session, jar) = seed_session(&store, None).await;

    let err = revoke(&store, &provider, jar, "/", true).await.unwrap_err();

    assert!(matches!(err, AuthError::MissingCredential));
    assert!(store.contains(session.key().unwrap()).await);
    assert!(provider.revoked().is_empty());
}

#[tokio::test]
async fn logout_without_cookie_is_missing_credential() {
    let store = memory_store();
    let err = revoke(&store, &provider(), CookieJar::new(), "/", true)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingCredential));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unverifiable_credential_keeps_local_session() {
    let store = memory_store();
    let provider = provider();
    let (session, jar) = seed_session(&store, Some("cred-unknown")).await;

    let err = revoke(&store, &provider, jar, "/", true).await.unwrap_err();

    assert!(matches!(
        err,
        AuthError::Verification(VerificationFailure::Expired)
    ));
    assert!(store.contains(session.key().unwrap()).await);
    assert!(provider.revoked().is_empty());
}

#[tokio::test]
async fn failed_revocation_keeps_local_session() {
    let store = memory_store();
    let provider = provider().failing_revocation();
    let (session, jar) = seed_session(&store, Some("cred-u1")).await;

    let err = revoke(&store, &provider, jar, "/", true).await.unwrap_err();

    assert!(matches!(err, AuthError::Revocation(_)));
    assert!(store.contains(session.key().unwrap()).await);
    assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn aborted_revocation_keeps_local_session() {
    let store = memory_store();
    let provider = provider().hanging_revocation();
    let (session, jar) = seed_session(&store, Some("cred-u1")).await;

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        revoke(&store, &provider, jar, "/", true),
    )
    .await;

    assert!(outcome.is_err(), "revocation should still be pending");
    assert!(store.contains(session.key().unwrap()).await);
}

#[tokio::test]
async fn successful_logout_revokes_then_destroys() {
    let store = memory_store();
    let provider = provider();
    let (session, jar) = seed_session(&store, Some("cred-u1")).await;

    let response = revoke(&store, &provider, jar, "/", true)
        .await
        .unwrap()
        .into_response();

    assert_eq!(provider.revoked(), vec![SubjectId::from("u1")]);
    assert!(!store.contains(session.key().unwrap()).await);

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("__session=;"), "got {set_cookie}");
    assert!(set_cookie.contains("Max-Age=0"), "got {set_cookie}");
}

#[tokio::test]
async fn revoking_an_already_revoked_subject_is_not_fatal() {
    let store = memory_store();
    let provider = provider();
    let (_, first) = seed_session(&store, Some("cred-u1")).await;
    let (_, second) = seed_session(&store, Some("cred-u1")).await;

    for jar in [first, second] {
        let response = revoke(&store, &provider, jar, "/", true)
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    assert_eq!(provider.revoked(), vec![SubjectId::from("u1"), SubjectId::from("u1")]);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unreachable_store_fails_before_any_side_effect() {
    let provider = provider();
    let err = revoke(&UnreachableStore, &provider, CookieJar::new(), "/", true)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Store(_)));
    assert!(provider.revoked().is_empty());
}
