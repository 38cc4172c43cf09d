//! Utility modules: lenient JSON parsing, retry.

pub mod json;
pub mod retry;
