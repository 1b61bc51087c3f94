use std::fmt;

use strum::IntoStaticStr;

use crate::geometry::Direction;

/// What the controller is currently doing with the keyboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoStaticStr)]
pub enum MovementState {
    #[default]
    Idle,
    Turning(Direction),
    Aligned,
    MovingForward,
}

impl MovementState {
    pub fn is_turning(self) -> bool {
        matches!(self, Self::Turning(_))
    }
}

impl fmt::Display for MovementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Turning(direction) => write!(f, "Turning({})", direction),
            other => {
                let name: &'static str = (*other).into();
                f.write_str(name)
            }
        }
    }
}
