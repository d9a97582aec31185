pub mod birthday_models;
pub mod birthday_schedule;
pub mod birthday_service;
pub mod birthday_store;

pub use birthday_models::*;
pub use birthday_schedule::{birthday_date_of, duration_until_next_midnight};
pub use birthday_service::{BirthdayError, BirthdayService};
pub use birthday_store::BirthdayStore;
