//! Keyboard emulation for the target window.
//!
//! The controller only needs the [`KeySink`] trait; the Windows implementation
//! posts key messages straight to the target's main window.

pub mod keyboard;
pub mod window;

pub use keyboard::{
    KeySink, KeyState, KeyStroke, VirtualKey, char_to_key, decode_vk_scan, type_text,
};
