//! orderpass shared types and utilities
//!
//! Domain types, store errors and database helpers used by the relay server.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
