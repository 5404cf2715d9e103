pub mod analysis;
pub mod chat;
pub mod demo;
pub mod error;
pub mod llm_config;
pub mod settings;
pub mod time_window;

// Parsed table model
pub mod csv;
