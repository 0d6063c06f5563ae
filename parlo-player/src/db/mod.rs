//! Database access layer
//!
//! A small SQLite store for user preferences that outlive the process.

pub mod init;
pub mod settings;

pub use init::{init_database, init_memory_database};
