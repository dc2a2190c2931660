//! Chime Protocol - Command grammar and console output
//!
//! This crate owns the textual surface of the alarm console: parsing the
//! four command shapes typed at the prompt, and rendering announcements,
//! confirmations and status reports back out. Everything here is pure;
//! the engine never formats and the binary never parses.

pub mod command;
pub mod parse;
pub mod render;

pub use command::Command;
pub use parse::{parse_command, ParseError, ParseResult};
pub use render::PROMPT;
