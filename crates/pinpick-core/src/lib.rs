//! Core data types for pinpick.
//!
//! This crate defines what a resolution pass works with: package identities and
//! aliases, versions, the compatibility rule table, the dependency ledger, and
//! project configuration.
//!
//! This crate is intentionally free of network I/O and process spawning.

pub mod config;
pub mod ledger;
pub mod package;
pub mod rules;
pub mod version;
