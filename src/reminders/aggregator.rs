use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::profile::Profile;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscription::Subscription;
use crate::reminders::contracts::{ProfileDirectory, SubscriptionSource};
use crate::reminders::error::{ReminderError, StoreError};

/// Reminders produced by one pass: `messages()[i]` goes to every address in
/// `recipients()[i]`. Both sequences always have the same length and no
/// recipient list is empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReminderBatch {
    messages: Vec<String>,
    recipients: Vec<Vec<SubscriberEmail>>,
}

impl ReminderBatch {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn recipients(&self) -> &[Vec<SubscriberEmail>] {
        &self.recipients
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SubscriberEmail])> {
        self.messages
            .iter()
            .map(String::as_str)
            .zip(self.recipients.iter().map(Vec::as_slice))
    }

    // The message of a group is pushed as soon as the group opens; it is
    // taken back here if nobody turned out to want it.
    fn close_group(&mut self, recipients: Vec<SubscriberEmail>) {
        if recipients.is_empty() {
            self.messages.pop();
        } else {
            self.recipients.push(recipients);
        }
    }
}

impl IntoIterator for ReminderBatch {
    type Item = (String, Vec<SubscriberEmail>);
    type IntoIter = std::iter::Zip<
        std::vec::IntoIter<String>,
        std::vec::IntoIter<Vec<SubscriberEmail>>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter().zip(self.recipients)
    }
}

struct OpenGroup {
    celebrant: Uuid,
    days_until: u32,
    recipients: Vec<SubscriberEmail>,
}

pub fn reminder_message(profile: &Profile, days_until: u32) -> String {
    format!(
        "{} celebrates their birthday in {} days!",
        profile.display_name, days_until
    )
}

/// Lists every subscription from `source` and aggregates it into a batch.
#[tracing::instrument(name = "Collecting birthday reminders", skip(source, directory))]
pub async fn collect_reminders(
    source: &dyn SubscriptionSource,
    directory: &dyn ProfileDirectory,
    now: DateTime<Utc>,
) -> Result<ReminderBatch, ReminderError> {
    let subscriptions = source
        .list_all_subscriptions()
        .await
        .map_err(ReminderError::SourceUnavailable)?;

    aggregate(subscriptions, directory, now).await
}

/// Groups `subscriptions` by celebrant and builds one reminder per celebrant
/// whose birthday is exactly as many days away as at least one subscriber
/// asked for.
///
/// Each celebrant is looked up once. Any failed lookup aborts the whole
/// aggregation: no partial batch is ever returned.
pub async fn aggregate(
    mut subscriptions: Vec<Subscription>,
    directory: &dyn ProfileDirectory,
    now: DateTime<Utc>,
) -> Result<ReminderBatch, ReminderError> {
    let mut batch = ReminderBatch::default();

    if subscriptions.is_empty() {
        return Ok(batch);
    }

    // `sort_by_key` is stable, so rows of one celebrant stay contiguous.
    subscriptions.sort_by_key(|subscription| subscription.celebrant);

    let mut group: Option<OpenGroup> = None;

    for subscription in subscriptions {
        let open = match group.take() {
            Some(open) if open.celebrant == subscription.celebrant => group.insert(open),
            previous => {
                if let Some(previous) = previous {
                    batch.close_group(previous.recipients);
                }

                let celebrant = lookup_profile(directory, subscription.celebrant).await?;
                let days_until = celebrant
                    .birth_date
                    .days_until(now)
                    .ok_or(ReminderError::BirthdayOutOfRange(celebrant.id))?;

                batch.messages.push(reminder_message(&celebrant, days_until));

                group.insert(OpenGroup {
                    celebrant: subscription.celebrant,
                    days_until,
                    recipients: Vec::new(),
                })
            }
        };

        if subscription.alert_days == open.days_until {
            let subscriber = lookup_profile(directory, subscription.subscriber).await?;

            open.recipients.push(subscriber.email);
        }
    }

    if let Some(last) = group {
        batch.close_group(last.recipients);
    }

    Ok(batch)
}

async fn lookup_profile(
    directory: &dyn ProfileDirectory,
    id: Uuid,
) -> Result<Profile, ReminderError> {
    directory.get_profile(id).await.map_err(|err| match err {
        StoreError::NotFound(id) => ReminderError::ProfileNotFound(id),
        source => ReminderError::ProfileLookupFailed { id, source },
    })
}
