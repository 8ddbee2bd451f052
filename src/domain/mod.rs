pub mod birth_date;
pub mod display_name;
pub mod profile;
pub mod subscriber_email;
pub mod subscription;
