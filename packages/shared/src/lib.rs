//! Utilities shared by the Tayori binaries: logging setup and time handling.

pub mod logger;
pub mod time;
