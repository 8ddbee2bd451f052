mod aggregator;
mod contracts;
mod error;
mod scheduler;

pub use aggregator::{aggregate, collect_reminders, reminder_message, ReminderBatch};
pub use contracts::{MessageSink, ProfileDirectory, SubscriptionSource};
pub use error::{BoxError, ReminderError, SinkError, StoreError};
pub use scheduler::{NotificationScheduler, SchedulerHandle, SchedulerState, REMINDER_SUBJECT};
