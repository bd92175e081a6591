// Shared foundation for the box-score pipeline: configuration, record types
// and the SQLite store.

pub mod config;
pub mod db;
pub mod records;
