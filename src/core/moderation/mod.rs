// Core moderation module - contains anti-spam business logic.
// Following the same pattern as the warnings and voice modules.

pub mod moderation_models;
pub mod moderation_service;
pub mod timeout_parser;

pub use moderation_models::*;
pub use moderation_service::*;
pub use timeout_parser::*;
