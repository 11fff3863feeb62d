//! Compatibility resolution engine: version catalogs, rule-aware version
//! selection, deterministic ordering, installation and the resolution pass.

pub mod catalog;
pub mod downgrade;
pub mod graph;
pub mod installer;
pub mod pass;
pub mod resolver;
