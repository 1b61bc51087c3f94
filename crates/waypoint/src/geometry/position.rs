use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point in the target process's world space.
///
/// `y` is the vertical axis. Equality is tolerant: components read from another
/// process's floating-point state rarely compare bit-for-bit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Per-component tolerance used by `==`
    pub const EPSILON: f64 = 1e-6;

    pub const ZERO: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a ground-plane position with `y = 0`
    pub const fn planar(x: f64, z: f64) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Euclidean distance over x and z only
    pub fn planar_distance(self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx.hypot(dz)
    }

    /// Compare with an explicit per-component tolerance
    pub fn approx_eq(self, other: Position, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }

    /// Exact component-wise comparison
    pub fn exact_eq(self, other: Position) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(*other, Self::EPSILON)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Position {
        Position::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Position> for f64 {
    type Output = Position;

    fn mul(self, rhs: Position) -> Position {
        rhs * self
    }
}

impl Div<f64> for Position {
    type Output = Position;

    fn div(self, rhs: f64) -> Position {
        Position::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}
