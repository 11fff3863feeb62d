//! Shared utilities for pinpick.
//!
//! This crate provides cross-cutting concerns used by all other pinpick crates:
//! error types, filesystem helpers, process spawning, and terminal status output.

pub mod errors;
pub mod fs;
pub mod process;
pub mod progress;
