//! Credential lifecycle tests against an in-memory SQLite database:
//! uniqueness across users, the last-credential floor, and atomic login
//! recording.

use civitas_auth::db::{credentials, users};
use civitas_auth::error::AppError;
use civitas_auth::webauthn::error::CeremonyError;
use civitas_auth::webauthn::types::{base64url_encode, AuthenticatorTransport, VerifiedCredential};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn sample_credential(id_byte: u8) -> VerifiedCredential {
    VerifiedCredential {
        credential_id: vec![id_byte; 16],
        public_key: vec![0xA5, 0x01, 0x02],
        counter: 0,
        transports: vec![AuthenticatorTransport::Internal],
    }
}

#[tokio::test]
async fn credential_ids_are_unique_across_users() {
    let pool = test_pool().await;
    let alice = users::create_user(&pool, "alice@x.com", "Alice").await.unwrap();
    let bob = users::create_user(&pool, "bob@x.com", "Bob").await.unwrap();

    let credential = sample_credential(1);
    let stored = credentials::insert_credential(&pool, &alice.id, &credential)
        .await
        .unwrap();

    // Bob presenting the same credential ID is rejected.
    let err = credentials::insert_credential(&pool, &bob.id, &credential)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::CredentialAlreadyRegistered)
    ));

    // Alice's original row is untouched.
    let rows = credentials::find_by_user_id(&pool, &alice.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, stored.id);
    assert_eq!(rows[0].user_id, alice.id);
    assert!(credentials::find_by_user_id(&pool, &bob.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn re_registering_the_same_authenticator_is_rejected() {
    let pool = test_pool().await;
    let user = users::create_user(&pool, "a@x.com", "A").await.unwrap();

    let credential = sample_credential(2);
    credentials::insert_credential(&pool, &user.id, &credential)
        .await
        .unwrap();

    let err = credentials::insert_credential(&pool, &user.id, &credential)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::CredentialAlreadyRegistered)
    ));
}

#[tokio::test]
async fn last_credential_cannot_be_deleted() {
    let pool = test_pool().await;
    let user = users::create_user(&pool, "a@x.com", "A").await.unwrap();

    let only = credentials::insert_credential(&pool, &user.id, &sample_credential(3))
        .await
        .unwrap();

    let err = credentials::delete_credential(&pool, &user.id, &only.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::CannotRemoveLastCredential)
    ));

    // Still there.
    assert_eq!(credentials::count_by_user(&pool, &user.id).await.unwrap(), 1);
}

#[tokio::test]
async fn deleting_one_of_two_credentials_succeeds() {
    let pool = test_pool().await;
    let user = users::create_user(&pool, "a@x.com", "A").await.unwrap();

    let first = credentials::insert_credential(&pool, &user.id, &sample_credential(4))
        .await
        .unwrap();
    let second = credentials::insert_credential(&pool, &user.id, &sample_credential(5))
        .await
        .unwrap();

    credentials::delete_credential(&pool, &user.id, &first.id)
        .await
        .unwrap();

    let remaining = credentials::find_by_user_id(&pool, &user.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);
}

#[tokio::test]
async fn presenting_another_users_credential_is_an_identity_mismatch() {
    let pool = test_pool().await;
    let alice = users::create_user(&pool, "alice@x.com", "Alice").await.unwrap();
    let bob = users::create_user(&pool, "bob@x.com", "Bob").await.unwrap();

    let stored = credentials::insert_credential(&pool, &alice.id, &sample_credential(20))
        .await
        .unwrap();

    // Bob claims Alice's credential: rejected before any verification or
    // counter update happens.
    let err = credentials::find_owned_credential(&pool, &bob.id, &stored.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::UserIdentityMismatch)
    ));

    // The owner resolves it fine, and the stored counter is untouched.
    let resolved = credentials::find_owned_credential(&pool, &alice.id, &stored.id)
        .await
        .unwrap();
    assert_eq!(resolved.counter, 0);
    assert!(resolved.last_used_at.is_none());
}

#[tokio::test]
async fn presenting_an_unregistered_credential_is_unknown() {
    let pool = test_pool().await;
    let user = users::create_user(&pool, "a@x.com", "A").await.unwrap();

    let missing = base64url_encode(&[0xEE; 16]);
    let err = credentials::find_owned_credential(&pool, &user.id, &missing)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::UnknownCredential)
    ));
}

#[tokio::test]
async fn deleting_a_nonexistent_credential_is_unknown_even_with_one_left() {
    let pool = test_pool().await;
    let user = users::create_user(&pool, "a@x.com", "A").await.unwrap();

    credentials::insert_credential(&pool, &user.id, &sample_credential(21))
        .await
        .unwrap();

    // The id is bad, not the count: the error must say so.
    let missing = base64url_encode(&[0xDD; 16]);
    let err = credentials::delete_credential(&pool, &user.id, &missing)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::UnknownCredential)
    ));
    assert_eq!(credentials::count_by_user(&pool, &user.id).await.unwrap(), 1);
}

#[tokio::test]
async fn deleting_another_users_credential_fails() {
    let pool = test_pool().await;
    let alice = users::create_user(&pool, "alice@x.com", "Alice").await.unwrap();
    let bob = users::create_user(&pool, "bob@x.com", "Bob").await.unwrap();

    credentials::insert_credential(&pool, &alice.id, &sample_credential(6))
        .await
        .unwrap();
    let target = credentials::insert_credential(&pool, &alice.id, &sample_credential(7))
        .await
        .unwrap();
    // Bob holds two of his own so the count check passes.
    credentials::insert_credential(&pool, &bob.id, &sample_credential(8))
        .await
        .unwrap();
    credentials::insert_credential(&pool, &bob.id, &sample_credential(9))
        .await
        .unwrap();

    let err = credentials::delete_credential(&pool, &bob.id, &target.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::UnknownCredential)
    ));
    assert_eq!(credentials::count_by_user(&pool, &alice.id).await.unwrap(), 2);
}

#[tokio::test]
async fn record_login_updates_counter_and_last_used_together() {
    let pool = test_pool().await;
    let user = users::create_user(&pool, "a@x.com", "A").await.unwrap();

    let stored = credentials::insert_credential(&pool, &user.id, &sample_credential(10))
        .await
        .unwrap();
    assert_eq!(stored.counter, 0);
    assert!(stored.last_used_at.is_none());

    credentials::record_login(&pool, &stored.id, 7).await.unwrap();

    let after = credentials::find_by_credential_id(&pool, &stored.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.counter, 7);
    assert!(after.last_used_at.is_some());
}

#[tokio::test]
async fn record_login_on_unknown_credential_fails() {
    let pool = test_pool().await;

    let missing = base64url_encode(&[0xFF; 16]);
    let err = credentials::record_login(&pool, &missing, 1).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Ceremony(CeremonyError::UnknownCredential)
    ));
}

#[tokio::test]
async fn transports_round_trip_through_storage() {
    let pool = test_pool().await;
    let user = users::create_user(&pool, "a@x.com", "A").await.unwrap();

    let stored = credentials::insert_credential(&pool, &user.id, &sample_credential(11))
        .await
        .unwrap();
    assert_eq!(
        credentials::decode_transports(stored.transports.as_deref()),
        vec![AuthenticatorTransport::Internal]
    );

    // Corrupt stored values degrade to an empty list.
    assert!(credentials::decode_transports(Some("not-json")).is_empty());
    assert!(credentials::decode_transports(None).is_empty());
}
