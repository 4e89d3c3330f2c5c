//! # nexus-store
//!
//! Durable key-value storage for the Nexus dashboard, backed by SQLite.
//!
//! The dashboard persists exactly two entries, the favorites list and the
//! notification log, each as a JSON array overwritten wholesale on every
//! mutation.  The crate exposes a synchronous [`Database`] handle with a raw
//! entry API plus typed helpers for both entries.

pub mod database;
pub mod favorites;
pub mod kv;
pub mod migrations;
pub mod notifications;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
