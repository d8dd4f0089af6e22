//! Ticket dashboard common types and errors.
//!
//! This crate provides foundational types shared across td-core modules:
//! - Content fingerprints used to key the load cache
//! - Derived ticket classifications (state tag, SLA category, month bucket)
//! - Schema versioning for JSON outputs
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod fingerprint;
pub mod output;
pub mod schema;
pub mod ticket;

pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
pub use ticket::{MonthBucket, SlaCategory, StateTag};
