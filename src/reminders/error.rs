use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a subscription source or profile directory.
#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("No profile exists with id {0}.")]
    NotFound(Uuid),
    #[error("Record {id} is not a valid profile: {reason}")]
    InvalidRecord { id: Uuid, reason: String },
    #[error("The store could not be reached.")]
    Unavailable(#[source] BoxError),
}

/// Failure reported by a message sink for a single delivery.
#[derive(thiserror::Error)]
pub enum SinkError {
    #[error("A reminder needs at least one recipient.")]
    NoRecipients,
    #[error("The mail service did not accept the reminder.")]
    Transport(#[from] reqwest::Error),
}

#[derive(thiserror::Error)]
pub enum ReminderError {
    #[error("Failed to list subscriptions.")]
    SourceUnavailable(#[source] StoreError),
    #[error("Profile {0} does not exist.")]
    ProfileNotFound(Uuid),
    #[error("Failed to look up profile {id}.")]
    ProfileLookupFailed {
        id: Uuid,
        #[source]
        source: StoreError,
    },
    #[error("The next birthday of {0} is out of range.")]
    BirthdayOutOfRange(Uuid),
    #[error("Failed to deliver a birthday reminder.")]
    SinkFailure(#[source] SinkError),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl std::fmt::Debug for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl std::fmt::Debug for ReminderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

fn error_chain_fmt(
    error: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    write!(f, "{}", error)?;

    let mut current = error.source();
    while let Some(cause) = current {
        write!(f, "\nCaused by:\n\t({})", cause)?;
        current = cause.source();
    }

    Ok(())
}
