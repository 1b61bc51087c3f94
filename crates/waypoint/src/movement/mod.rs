//! Closed-loop orientation and locomotion for one entity.
//!
//! ## Example
//!
//! ```ignore
//! use waypoint::prelude::*;
//!
//! let process = WindowsProcess::attach(pid)?;
//! let keys = WindowKeySink::for_process(pid)?;
//! let spec = TransformSpec {
//!     x: AddressSpec::Chain(PointerChain::new(0x1_4000_0000 + 0x2A1B0, [0x28, 0x90])),
//!     // ...
//! };
//!
//! let config = ControllerConfig::builder().max_polls(2_000).build();
//! let mut controller = MovementController::from_spec(process, keys, &spec, config)?;
//!
//! let stop = StopSignal::new();
//! controller.move_to(Position::planar(120.0, -48.5), &stop)?;
//! ```

mod address;
mod config;
mod controller;
mod state;

pub use address::{AddressSpec, TransformAddresses, TransformSpec};
pub use config::{ControllerConfig, ControllerConfigBuilder, HeadingUnit, KeyBindings};
pub use controller::MovementController;
pub use state::MovementState;
