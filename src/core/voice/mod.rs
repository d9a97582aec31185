pub mod voice_models;
pub mod voice_service;

pub use voice_models::*;
pub use voice_service::{duration_bar, format_duration_ms, VoiceSessionTracker};
