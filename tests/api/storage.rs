use chrono::{Datelike, Utc};
use claim::{assert_err, assert_ok};

use birthday_reminder::reminders::{
    collect_reminders, ProfileDirectory, StoreError, SubscriptionSource,
};
use birthday_reminder::storage::PostgresStore;

use crate::helpers::{id, insert_subscription, insert_user, spawn_db};

#[tokio::test]
async fn subscriptions_are_listed_and_negative_alert_days_are_skipped() {
    let db_pool = spawn_db().await;
    insert_user(&db_pool, id(1), "Ana", "ana@example.com", 5, 17)
        .await
        .unwrap();
    insert_user(&db_pool, id(2), "Bruno", "bruno@example.com", 11, 2)
        .await
        .unwrap();
    insert_subscription(&db_pool, id(2), id(1), 3).await.unwrap();
    insert_subscription(&db_pool, id(1), id(2), -1).await.unwrap();

    let store = PostgresStore::new(db_pool);
    let subscriptions = store.list_all_subscriptions().await.unwrap();

    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].subscriber, id(2));
    assert_eq!(subscriptions[0].celebrant, id(1));
    assert_eq!(subscriptions[0].alert_days, 3);
}

#[tokio::test]
async fn stored_profile_is_read_back() {
    let db_pool = spawn_db().await;
    insert_user(&db_pool, id(1), "Ana María", "ana@example.com", 2, 29)
        .await
        .unwrap();

    let profile = PostgresStore::new(db_pool).get_profile(id(1)).await.unwrap();

    assert_eq!(profile.id, id(1));
    assert_eq!(profile.display_name.as_ref(), "Ana María");
    assert_eq!(profile.email.as_ref(), "ana@example.com");
    assert_eq!(
        (profile.birth_date.month(), profile.birth_date.day()),
        (2, 29)
    );
}

#[tokio::test]
async fn missing_profile_is_not_found() {
    let db_pool = spawn_db().await;

    let err = PostgresStore::new(db_pool)
        .get_profile(id(7))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(missing) if missing == id(7)));
}

#[tokio::test]
async fn users_that_could_not_be_read_back_are_refused_on_insert() {
    let db_pool = spawn_db().await;
    let long_name = "a".repeat(65);
    let test_cases = vec![
        (long_name.as_str(), "long@example.com", 1, 1, "name over 64 characters"),
        ("   ", "blank@example.com", 1, 1, "blank name"),
        ("Ana\nMaría", "ana@example.com", 1, 1, "name with a line break"),
        ("Ana", "not-an-email", 1, 1, "email without @"),
        ("Ana", "ana@example.com", 2, 30, "impossible birthday"),
        ("Ana", "ana@example.com", 13, 1, "month out of range"),
    ];

    for (n, (name, email, month, day, description)) in test_cases.into_iter().enumerate() {
        assert_err!(
            insert_user(&db_pool, id(n as u128), name, email, month, day).await,
            "The users table accepted a row with a {}.",
            description
        );
    }

    assert_ok!(insert_user(&db_pool, id(100), &"a".repeat(64), "ana@example.com", 1, 1).await);
}

#[tokio::test]
async fn profile_failing_email_validation_is_an_invalid_record() {
    let db_pool = spawn_db().await;
    // Underscores are not allowed in domain names.
    insert_user(&db_pool, id(1), "Ana", "ana@exa_mple.com", 5, 17)
        .await
        .unwrap();

    let err = PostgresStore::new(db_pool)
        .get_profile(id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidRecord { id: record, .. } if record == id(1)));
}

#[tokio::test]
async fn reminders_are_collected_from_the_database() {
    let db_pool = spawn_db().await;
    let now = Utc::now();
    let birthday = now.date_naive() + chrono::Duration::days(2);
    insert_user(
        &db_pool,
        id(1),
        "Ana",
        "ana@example.com",
        birthday.month() as i32,
        birthday.day() as i32,
    )
    .await
    .unwrap();
    insert_user(&db_pool, id(2), "Bruno", "bruno@example.com", 1, 1)
        .await
        .unwrap();
    insert_user(&db_pool, id(3), "Carla", "carla@example.com", 1, 1)
        .await
        .unwrap();
    insert_subscription(&db_pool, id(2), id(1), 2).await.unwrap();
    insert_subscription(&db_pool, id(3), id(1), 5).await.unwrap();

    let store = PostgresStore::new(db_pool);
    let batch = collect_reminders(&store, &store, now).await.unwrap();

    assert_eq!(batch.messages(), ["Ana celebrates their birthday in 2 days!"]);
    assert_eq!(batch.recipients()[0].len(), 1);
    assert_eq!(batch.recipients()[0][0].as_ref(), "bruno@example.com");
}
