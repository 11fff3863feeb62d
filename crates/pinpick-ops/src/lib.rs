//! High-level operations wiring CLI commands to the scanner, the interpreter
//! probe and the resolution pass.

pub mod confirm;
pub mod ops_check;
pub mod ops_outdated;
pub mod ops_resolve;
pub mod ops_rules;
pub mod probe;
pub mod project;
pub mod scan;
