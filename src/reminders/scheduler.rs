use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::reminders::aggregator::collect_reminders;
use crate::reminders::contracts::{MessageSink, ProfileDirectory, SubscriptionSource};
use crate::reminders::error::ReminderError;

pub const REMINDER_SUBJECT: &str = "Birthday reminder!";

const MIN_PERIOD: Duration = Duration::from_millis(1);
// Keeps `Instant + period` representable for the interval timer.
const MAX_PERIOD: Duration = Duration::from_secs(366 * 24 * 60 * 60);

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// Waiting for the start instant.
    Armed,
    Running,
    Stopped,
}

/// Periodically turns subscriptions into birthday reminders and hands them to
/// a message sink.
pub struct NotificationScheduler {
    source: Arc<dyn SubscriptionSource>,
    directory: Arc<dyn ProfileDirectory>,
    sink: Arc<dyn MessageSink>,
    clock: Clock,
}

/// Owned by whoever started the scheduler. Dropping it leaves the scheduler
/// running; call [`SchedulerHandle::cancel_and_wait`] to stop it.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    tracker: TaskTracker,
    state: watch::Receiver<SchedulerState>,
}

impl NotificationScheduler {
    pub fn new(
        source: Arc<dyn SubscriptionSource>,
        directory: Arc<dyn ProfileDirectory>,
        sink: Arc<dyn MessageSink>,
    ) -> NotificationScheduler {
        NotificationScheduler {
            source,
            directory,
            sink,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock used for the start alignment and for the
    /// reference instant of every pass.
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> NotificationScheduler {
        self.clock = Arc::new(clock);
        self
    }

    /// Spawns the scheduler loop on the current tokio runtime.
    ///
    /// The first pass runs at `start_at`, or right away if that instant has
    /// already gone by. After it, one pass runs every `period`, which is
    /// clamped to between 1ms and 366 days.
    pub fn start(self, start_at: DateTime<Utc>, period: Duration) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let (state_tx, state) = watch::channel(SchedulerState::Idle);

        tracker.spawn(Arc::new(self).run(
            start_at,
            period.clamp(MIN_PERIOD, MAX_PERIOD),
            cancel.clone(),
            tracker.clone(),
            state_tx,
        ));

        SchedulerHandle {
            cancel,
            tracker,
            state,
        }
    }

    async fn run(
        self: Arc<Self>,
        start_at: DateTime<Utc>,
        period: Duration,
        cancel: CancellationToken,
        tracker: TaskTracker,
        state: watch::Sender<SchedulerState>,
    ) {
        if let Ok(delay) = (start_at - (self.clock)()).to_std() {
            state.send_replace(SchedulerState::Armed);
            tracing::info!("Birthday reminders will start at {}", start_at);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    state.send_replace(SchedulerState::Stopped);
                    tracing::info!("Birthday reminders were cancelled before starting");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        state.send_replace(SchedulerState::Running);
        tracing::info!(
            period_seconds = period.as_secs(),
            "Birthday reminder scheduler started"
        );

        self.run_pass(&tracker).await;

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.run_pass(&tracker).await,
            }
        }

        state.send_replace(SchedulerState::Stopped);
        tracing::info!("Birthday reminder scheduler stopped");
    }

    /// Builds this pass's reminders and spawns one delivery per message. A
    /// failed aggregation only costs this pass.
    #[tracing::instrument(name = "Running a birthday reminder pass", skip(self, tracker))]
    async fn run_pass(&self, tracker: &TaskTracker) {
        let batch = match collect_reminders(
            self.source.as_ref(),
            self.directory.as_ref(),
            (self.clock)(),
        )
        .await
        {
            Ok(batch) => batch,
            Err(err) => {
                tracing::error!("Failed to build birthday reminders: {:?}", err);
                return;
            }
        };

        tracing::info!("Sending {} different birthday reminders", batch.len());

        for (message, recipients) in batch {
            tracker.spawn(dispatch(Arc::clone(&self.sink), message, recipients).in_current_span());
        }
    }
}

#[tracing::instrument(
    name = "Delivering a birthday reminder",
    skip(sink, recipients),
    fields(recipients = recipients.len())
)]
async fn dispatch(sink: Arc<dyn MessageSink>, message: String, recipients: Vec<SubscriberEmail>) {
    if let Err(err) = sink.send(&recipients, REMINDER_SUBJECT, &message).await {
        let err = ReminderError::SinkFailure(err);
        tracing::error!("Failed to deliver a birthday reminder: {:?}", err);
    }
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Token that stops the scheduler when cancelled. Useful to tie it to a
    /// wider shutdown signal.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops scheduling new passes and waits until the loop and every
    /// delivery already spawned have finished. A pass whose aggregation is
    /// under way is allowed to complete and dispatch.
    pub async fn cancel_and_wait(self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
