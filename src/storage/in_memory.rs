use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::domain::profile::Profile;
use crate::domain::subscription::Subscription;
use crate::reminders::{ProfileDirectory, StoreError, SubscriptionSource};

/// Fixed set of subscriptions and profiles held in memory.
///
/// Keeps track of how often it is read, which makes it handy for local runs
/// and for checking how many lookups a reminder pass performs.
#[derive(Default)]
pub struct InMemoryStore {
    subscriptions: Vec<Subscription>,
    profiles: HashMap<Uuid, Profile>,
    listings: AtomicUsize,
    lookups: Mutex<HashMap<Uuid, usize>>,
}

impl InMemoryStore {
    pub fn new(
        subscriptions: Vec<Subscription>,
        profiles: impl IntoIterator<Item = Profile>,
    ) -> InMemoryStore {
        InMemoryStore {
            subscriptions,
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.id, profile))
                .collect(),
            ..Default::default()
        }
    }

    /// Number of times the full subscription list was requested.
    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Number of times the profile with `id` was requested.
    pub fn lookups_of(&self, id: Uuid) -> usize {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SubscriptionSource for InMemoryStore {
    async fn list_all_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        self.listings.fetch_add(1, Ordering::SeqCst);

        Ok(self.subscriptions.clone())
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryStore {
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError> {
        *self
            .lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default() += 1;

        self.profiles
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
