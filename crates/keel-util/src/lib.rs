//! Shared utilities for keel.
//!
//! Cross-cutting concerns used by the operation and CLI crates: the unified
//! error type, filesystem helpers and terminal status lines.

pub mod errors;
pub mod fs;
pub mod status;
