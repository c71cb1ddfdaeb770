pub mod analytics;
pub mod app;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod engine;
pub mod export;
pub mod image;
pub mod message;
pub mod persona;
pub mod router;
pub mod session;
pub mod template;
