// Domain module - Shared data model and error types
pub mod config;
pub mod error;
