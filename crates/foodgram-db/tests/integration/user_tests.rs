use foodgram_core::AppError;
use foodgram_core::models::{PageRequest, UserRecord};
use foodgram_core::traits::{SubscriptionStore, UserStore};
use foodgram_db::Database;

use crate::integration::common::setup_test_db;

fn record(username: &str) -> UserRecord {
    UserRecord {
        email: format!("{username}@example.com"),
        username: username.into(),
        first_name: username.into(),
        last_name: "Tester".into(),
        password_hash: "$argon2id$stub".into(),
    }
}

fn field_of(err: AppError) -> String {
    match err {
        AppError::Validation { field, .. } => field,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_and_fetch_user() {
    let (pool, _container) = setup_test_db().await;
    let users = Database::from_pool(pool).user_repo();

    let alice = users.create_user(&record("alice")).await.unwrap();
    assert!(alice.id > 0);

    assert!(users.email_exists("ALICE@example.com").await.unwrap());
    assert!(users.username_exists("alice").await.unwrap());
    assert!(!users.username_exists("bob").await.unwrap());

    let creds = users
        .credentials_by_email("alice@example.com")
        .await
        .unwrap()
        .expect("credentials exist");
    assert_eq!(creds.user, alice);
    assert_eq!(creds.password_hash, "$argon2id$stub");

    let profile = users.get_profile(alice.id, None).await.unwrap().unwrap();
    assert!(!profile.is_subscribed);
}

#[tokio::test]
async fn duplicate_email_is_validation_error() {
    let (pool, _container) = setup_test_db().await;
    let users = Database::from_pool(pool).user_repo();

    users.create_user(&record("alice")).await.unwrap();
    let mut dup = record("alice2");
    dup.email = "alice@example.com".into();

    let err = users.create_user(&dup).await.unwrap_err();
    assert_eq!(field_of(err), "email");
}

#[tokio::test]
async fn tokens_resolve_and_revoke() {
    let (pool, _container) = setup_test_db().await;
    let users = Database::from_pool(pool).user_repo();
    let alice = users.create_user(&record("alice")).await.unwrap();

    let digest = "a".repeat(64);
    users.insert_token(alice.id, &digest).await.unwrap();
    assert_eq!(users.user_by_token(&digest).await.unwrap(), Some(alice.clone()));

    assert_eq!(users.delete_tokens(alice.id).await.unwrap(), 1);
    assert_eq!(users.user_by_token(&digest).await.unwrap(), None);
}

#[tokio::test]
async fn inactive_users_cannot_authenticate() {
    let (pool, _container) = setup_test_db().await;
    let users = Database::from_pool(pool.clone()).user_repo();
    let alice = users.create_user(&record("alice")).await.unwrap();
    let digest = "b".repeat(64);
    users.insert_token(alice.id, &digest).await.unwrap();

    let joined: bool = sqlx::query_scalar(
        "SELECT is_active AND date_joined <= NOW() FROM users WHERE id = $1",
    )
    .bind(alice.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(joined);

    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(alice.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(users.user_by_token(&digest).await.unwrap(), None);
    assert!(users.credentials_by_email("alice@example.com").await.unwrap().is_none());
    // Still visible as an author.
    assert!(users.get_profile(alice.id, None).await.unwrap().is_some());
}

#[tokio::test]
async fn list_profiles_paginates_by_id() {
    let (pool, _container) = setup_test_db().await;
    let users = Database::from_pool(pool).user_repo();
    for name in ["alice", "bob", "carol"] {
        users.create_user(&record(name)).await.unwrap();
    }

    let page = users
        .list_profiles(None, PageRequest::new(Some(2), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].user.username, "carol");
}

#[tokio::test]
async fn subscriptions_are_unique_and_not_self() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);
    let users = db.user_repo();
    let subs = db.subscription_repo();

    let alice = users.create_user(&record("alice")).await.unwrap();
    let bob = users.create_user(&record("bob")).await.unwrap();

    assert!(subs.subscribe(alice.id, bob.id).await.unwrap());
    assert!(!subs.subscribe(alice.id, bob.id).await.unwrap());

    let profile = users.get_profile(bob.id, Some(alice.id)).await.unwrap().unwrap();
    assert!(profile.is_subscribed);

    let err = subs.subscribe(alice.id, alice.id).await.unwrap_err();
    assert_eq!(field_of(err), "author");

    let authors = subs
        .subscribed_authors(alice.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(authors.total, 1);
    assert_eq!(authors.items[0], bob);

    assert!(subs.unsubscribe(alice.id, bob.id).await.unwrap());
    assert!(!subs.unsubscribe(alice.id, bob.id).await.unwrap());
}
