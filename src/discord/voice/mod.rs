pub mod voice_events;
