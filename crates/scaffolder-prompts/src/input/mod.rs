//! Terminal input decoding
//!
//! This module provides:
//! - Typed key and mouse events
//! - A byte stream decoder (CSI/SS3 keys, SGR mouse, UTF-8)
//! - A broadcast hub that fans events out to subscribers
//! - The stdin reader thread and the async decode pump

pub mod decoder;
pub mod event;
pub mod hub;
pub mod reader;

pub use decoder::{encode_sgr, Decoder};
pub use event::{
    InputEvent, Key, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
pub use hub::{InputHub, Subscription};
pub use reader::{pump, spawn_pump, spawn_stdin_reader, ByteChunks};
