//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (keyboard codes, pointer hits)
//! - Storage (LocalStorage on web, no-op natively)

pub mod input;
pub mod storage;

pub use input::{InputEvent, StartButton, map_key, map_pointer, prevents_default};
