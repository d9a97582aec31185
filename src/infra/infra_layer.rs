// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "birthdays/mod.rs"]
pub mod birthdays;

#[path = "storage/mod.rs"]
pub mod storage;

#[path = "warnings/mod.rs"]
pub mod warnings;
