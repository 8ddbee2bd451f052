use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use birthday_reminder::reminders::{NotificationScheduler, REMINDER_SUBJECT};
use birthday_reminder::storage::InMemoryStore;

use crate::helpers::{email_client, profile, subscription, wait_until};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn recipients_of(body: &serde_json::Value) -> Vec<String> {
    body["personalizations"][0]["to"]
        .as_array()
        .unwrap()
        .iter()
        .map(|to| to["email"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn one_email_is_sent_per_celebrant_with_all_matching_subscribers() {
    let now = Utc::now();
    let email_server = MockServer::start().await;
    let store = Arc::new(InMemoryStore::new(
        vec![
            subscription(2, 1, 1),
            subscription(3, 1, 1),
            subscription(4, 1, 2),
            subscription(2, 5, 7),
        ],
        vec![
            profile(1, "one", 1, now),
            profile(2, "two", 100, now),
            profile(3, "three", 200, now),
            profile(4, "four", 300, now),
            profile(5, "five", 7, now),
        ],
    ));

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&email_server)
        .await;

    let handle = NotificationScheduler::new(
        store.clone(),
        store.clone(),
        Arc::new(email_client(&email_server)),
    )
    .with_clock(move || now)
    .start(now, DAY);

    wait_until(|| store.listings() == 1).await;
    handle.cancel_and_wait().await;

    let mut emails: Vec<(String, Vec<String>)> = email_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();

            assert_eq!(body["subject"], REMINDER_SUBJECT);
            (
                body["content"][0]["value"].as_str().unwrap().to_string(),
                recipients_of(&body),
            )
        })
        .collect();
    emails.sort();

    assert_eq!(
        emails,
        vec![
            (
                String::from("five celebrates their birthday in 7 days!"),
                vec![String::from("two@two.net")],
            ),
            (
                String::from("one celebrates their birthday in 1 days!"),
                vec![String::from("two@two.net"), String::from("three@three.net")],
            ),
        ]
    );
}

#[tokio::test]
async fn no_email_is_sent_when_no_threshold_matches() {
    let now = Utc::now();
    let email_server = MockServer::start().await;
    let store = Arc::new(InMemoryStore::new(
        vec![subscription(9, 5, 3)],
        vec![profile(5, "five", 7, now), profile(9, "nine", 30, now)],
    ));

    Mock::given(path("/mail/send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&email_server)
        .await;

    let handle = NotificationScheduler::new(
        store.clone(),
        store.clone(),
        Arc::new(email_client(&email_server)),
    )
    .with_clock(move || now)
    .start(now, DAY);

    wait_until(|| store.listings() == 1).await;
    handle.cancel_and_wait().await;
}

#[tokio::test]
async fn mail_service_failures_do_not_stop_the_schedule() {
    let now = Utc::now();
    let email_server = MockServer::start().await;
    let store = Arc::new(InMemoryStore::new(
        vec![subscription(2, 1, 1)],
        vec![profile(1, "one", 1, now), profile(2, "two", 100, now)],
    ));

    Mock::given(path("/mail/send"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2..)
        .mount(&email_server)
        .await;

    let handle = NotificationScheduler::new(
        store.clone(),
        store.clone(),
        Arc::new(email_client(&email_server)),
    )
    .with_clock(move || now)
    .start(now, Duration::from_millis(200));

    wait_until(|| store.listings() >= 2).await;
    handle.cancel_and_wait().await;
}
