//! ISP wire protocol building blocks.

pub mod command;
pub mod uuencode;

// Re-export common types
pub use command::{BootStatus, Command, return_code};
