use uuid::Uuid;

/// A subscriber asking to be reminded `alert_days` days before the
/// celebrant's birthday.
///
/// Nothing makes these rows unique: duplicates are honored as they come.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub subscriber: Uuid,
    pub celebrant: Uuid,
    pub alert_days: u32,
}
