//! Collaborators the reminder core pulls data from and pushes messages to.
//! Storage and mail delivery live behind these traits so the aggregation and
//! scheduling logic never touches SQL or HTTP.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::profile::Profile;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscription::Subscription;
use crate::reminders::error::{SinkError, StoreError};

#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// Every subscription currently on record, in no particular order.
    async fn list_all_subscriptions(&self) -> Result<Vec<Subscription>, StoreError>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Returns `StoreError::NotFound` when no user has this id.
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError>;
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Delivers one message to the whole recipient list in a single call.
    async fn send(
        &self,
        recipients: &[SubscriberEmail],
        subject: &str,
        body: &str,
    ) -> Result<(), SinkError>;
}
