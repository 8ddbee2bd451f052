mod health_check;
mod reminders;
mod storage;
