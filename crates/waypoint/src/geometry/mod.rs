//! Ground-plane geometry for the controlled entity.
//!
//! Positions are world-space coordinates read from the target process. Only the
//! horizontal axes (x and z) take part in distance and bearing math.

mod heading;
mod position;

pub use heading::{Direction, Heading, look_at_rotation, turn_direction};
pub use position::Position;
