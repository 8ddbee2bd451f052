use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::birth_date::BirthDate;
use crate::domain::display_name::DisplayName;
use crate::domain::profile::Profile;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscription::Subscription;
use crate::reminders::{ProfileDirectory, StoreError, SubscriptionSource};

/// Read-only view over the `users` and `subscriptions` tables.
pub struct PostgresStore {
    db_pool: PgPool,
}

impl PostgresStore {
    pub fn new(db_pool: PgPool) -> PostgresStore {
        PostgresStore { db_pool }
    }
}

#[async_trait]
impl SubscriptionSource for PostgresStore {
    #[tracing::instrument(name = "Fetching all subscriptions from the database", skip(self))]
    async fn list_all_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT subscriber_id, celebrant_id, alert_days
            FROM subscriptions
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            StoreError::Unavailable(Box::new(err))
        })?;

        let mut subscriptions = Vec::with_capacity(rows.len());

        for row in rows {
            let subscriber: Uuid = row.try_get("subscriber_id").map_err(unavailable)?;
            let celebrant: Uuid = row.try_get("celebrant_id").map_err(unavailable)?;
            let alert_days: i32 = row.try_get("alert_days").map_err(unavailable)?;

            match u32::try_from(alert_days) {
                Ok(alert_days) => subscriptions.push(Subscription {
                    subscriber,
                    celebrant,
                    alert_days,
                }),
                Err(_) => tracing::warn!(
                    %subscriber,
                    %celebrant,
                    "Skipping subscription with negative alert_days {}",
                    alert_days
                ),
            }
        }

        Ok(subscriptions)
    }
}

#[async_trait]
impl ProfileDirectory for PostgresStore {
    #[tracing::instrument(name = "Fetching a profile from the database", skip(self))]
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, email, birth_month, birth_day
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            StoreError::Unavailable(Box::new(err))
        })?
        .ok_or(StoreError::NotFound(id))?;

        parse_profile(id, &row)
    }
}

fn parse_profile(id: Uuid, row: &PgRow) -> Result<Profile, StoreError> {
    let invalid = |reason: String| StoreError::InvalidRecord { id, reason };

    let display_name: String = row.try_get("display_name").map_err(unavailable)?;
    let email: String = row.try_get("email").map_err(unavailable)?;
    let birth_month: i32 = row.try_get("birth_month").map_err(unavailable)?;
    let birth_day: i32 = row.try_get("birth_day").map_err(unavailable)?;

    let birth_month = u32::try_from(birth_month).map_err(|err| invalid(err.to_string()))?;
    let birth_day = u32::try_from(birth_day).map_err(|err| invalid(err.to_string()))?;

    Ok(Profile {
        id,
        display_name: DisplayName::parse(display_name).map_err(invalid)?,
        email: SubscriberEmail::parse(email).map_err(invalid)?,
        birth_date: BirthDate::parse(birth_month, birth_day).map_err(invalid)?,
    })
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(Box::new(err))
}
