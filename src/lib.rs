pub mod api;
pub mod cache;
pub mod cli;
pub mod core;
pub mod error;
pub mod format;
pub mod history;
