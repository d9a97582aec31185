// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "birthdays/mod.rs"]
pub mod birthdays;

#[path = "community/mod.rs"]
pub mod community;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "store_error.rs"]
pub mod store_error;

#[path = "voice/mod.rs"]
pub mod voice;

#[path = "warnings/mod.rs"]
pub mod warnings;
