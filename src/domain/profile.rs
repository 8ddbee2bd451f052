use uuid::Uuid;

use crate::domain::birth_date::BirthDate;
use crate::domain::display_name::DisplayName;
use crate::domain::subscriber_email::SubscriberEmail;

/// Directory entry for a user. Reminders read the birthday when the user is
/// a celebrant and the email when the user is a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: DisplayName,
    pub email: SubscriberEmail,
    pub birth_date: BirthDate,
}
