pub mod json_document;

pub use json_document::JsonDocument;
