pub mod warning_models;
pub mod warning_service;
pub mod warning_store;

pub use warning_models::{Warning, AUTO_KICK_THRESHOLD};
pub use warning_service::{WarningError, WarningLedger};
pub use warning_store::{StoreError, WarningStore};
