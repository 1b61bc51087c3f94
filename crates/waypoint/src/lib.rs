//! # waypoint
//!
//! Drives an entity inside an external process toward a target location.
//!
//! This crate provides:
//! - Ground-plane geometry (positions, headings, relative bearings)
//! - Process memory access traits with a Windows backend
//! - Signature scanning over module images, with wildcard bytes
//! - Multi-level pointer chain resolution
//! - A bang-bang movement controller that turns and walks by emulating keys
//!
//! The controller polls memory on every step and has no internal threads.
//! Long-running calls take a [`StopSignal`] so another thread can cancel them.

pub mod cancel;
pub mod error;
pub mod geometry;
pub mod input;
pub mod memory;
pub mod movement;
pub mod prelude;
pub mod signature;

pub use cancel::{PollClock, StopSignal};
pub use error::{Error, Result};
pub use geometry::{Direction, Heading, Position, look_at_rotation, turn_direction};
pub use input::{
    KeySink, KeyState, KeyStroke, VirtualKey, char_to_key, decode_vk_scan, type_text,
};
pub use memory::{
    MemoryRegion, ModuleDescriptor, PointerChain, ProcessMemory, Protection, ReadMemory, Resolve,
    read_pointer, resolve,
};
pub use movement::{
    AddressSpec, ControllerConfig, ControllerConfigBuilder, HeadingUnit, KeyBindings,
    MovementController, MovementState, TransformAddresses, TransformSpec,
};
pub use signature::{Signature, SignatureScanner, find_pattern, format_pattern, parse_pattern};

#[cfg(target_os = "windows")]
pub use input::window::{WindowKeySink, find_main_window};
#[cfg(target_os = "windows")]
pub use memory::WindowsProcess;
