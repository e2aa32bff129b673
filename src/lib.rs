// Library crate for integration tests.
// main.rs has its own mod declarations; this re-exports all modules.

pub mod auth;
pub mod config;
pub mod console_log;
pub mod environment;
pub mod error;
pub mod registry;
pub mod report;
pub mod resume;
pub mod sweep;
