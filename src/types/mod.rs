//! Core types shared by agents, adapters and tools.

pub mod generation;
pub mod message;

pub use generation::*;
pub use message::*;
