//! Prelude module for convenient imports
//!
//! ```ignore
//! use waypoint::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Controller types: `MovementController`, `ControllerConfig`, `TransformSpec`
//! - Geometry: `Position`, `Heading`, `Direction`
//! - Collaborator traits: `ReadMemory`, `ProcessMemory`, `KeySink`
//! - Cancellation: `StopSignal`
//! - Error handling: `Error`, `Result`

pub use crate::cancel::StopSignal;
pub use crate::error::{Error, Result};
pub use crate::geometry::{Direction, Heading, Position};
pub use crate::input::{KeySink, KeyState, VirtualKey};
pub use crate::memory::{PointerChain, ProcessMemory, ReadMemory};
pub use crate::movement::{
    AddressSpec, ControllerConfig, KeyBindings, MovementController, TransformAddresses,
    TransformSpec,
};
pub use crate::signature::Signature;
