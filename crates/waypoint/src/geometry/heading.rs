use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use super::Position;

/// Which way to turn toward a target
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, Display,
)]
pub enum Direction {
    Left,
    Right,
}

/// Rotation of the entity, in degrees.
///
/// Only `y` (rotation about the vertical axis) is ever populated. The value is
/// not normalized; readings straight from memory may be negative or exceed 360.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Heading {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Heading with only the vertical-axis rotation set
    pub const fn yaw(degrees: f64) -> Self {
        Self::new(0.0, degrees, 0.0)
    }
}

/// Pick the turn direction for a relative bearing in `[0, 360)`.
///
/// Anything past 180 degrees is closer going right.
pub fn turn_direction(relative_bearing: f64) -> Direction {
    if relative_bearing > 180.0 {
        Direction::Right
    } else {
        Direction::Left
    }
}

/// Relative bearing from `origin` to `target` given the current heading.
///
/// Returns a value in `[0, 360)`; 0 (or just under 360) means the entity
/// already faces the target.
pub fn look_at_rotation(origin: Position, target: Position, heading: Heading) -> f64 {
    let mut relative = absolute_bearing(origin, target) - heading.y;
    if relative < 0.0 {
        relative += 360.0;
    }
    wrap_degrees(relative)
}

/// Bearing of `target` seen from `origin`, measured from the +z axis toward +x.
fn absolute_bearing(origin: Position, target: Position) -> f64 {
    let degrees = (target.x - origin.x).atan2(target.z - origin.z).to_degrees();
    if degrees >= 0.0 {
        degrees
    } else {
        180.0 + (180.0 - degrees.abs())
    }
}

/// Fold any angle into `[0, 360)`.
fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
