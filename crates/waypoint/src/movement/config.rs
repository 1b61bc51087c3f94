use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::geometry::Direction;
use crate::input::VirtualKey;

/// Unit of the raw heading value stored in the target
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    Display,
)]
pub enum HeadingUnit {
    #[default]
    Radians,
    Degrees,
}

impl HeadingUnit {
    /// Convert a raw reading to degrees
    pub fn to_degrees(self, raw: f32) -> f64 {
        match self {
            Self::Radians => f64::from(raw).to_degrees(),
            Self::Degrees => f64::from(raw),
        }
    }
}

/// Keys used for turning and walking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub turn_left: VirtualKey,
    pub turn_right: VirtualKey,
    pub forward: VirtualKey,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            turn_left: VirtualKey::A,
            turn_right: VirtualKey::D,
            forward: VirtualKey::W,
        }
    }
}

impl KeyBindings {
    pub fn turn(&self, direction: Direction) -> VirtualKey {
        match direction {
            Direction::Left => self.turn_left,
            Direction::Right => self.turn_right,
        }
    }
}

/// Tuning for the movement controller.
///
/// A right turn runs until the relative bearing reaches `right_coarse`, then
/// `right_fine`. A left turn runs until it drops to `left_coarse`, then
/// `left_fine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub right_coarse: f64,
    pub right_fine: f64,
    pub left_coarse: f64,
    pub left_fine: f64,
    /// Planar distance at which `move_to` stops walking
    pub stop_radius: f64,
    /// Delay before every sample
    pub poll_interval: Duration,
    /// Samples allowed in one `look_at`, restarts included. `None` is unbounded.
    pub max_polls: Option<u32>,
    /// `look_at` calls allowed in one `move_to`. `None` is unbounded.
    pub max_course_corrections: Option<u32>,
    pub heading_unit: HeadingUnit,
    pub keys: KeyBindings,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            right_coarse: 355.0,
            right_fine: 357.0,
            left_coarse: 5.0,
            left_fine: 3.0,
            stop_radius: 10.0,
            poll_interval: Duration::from_millis(75),
            max_polls: None,
            max_course_corrections: None,
            heading_unit: HeadingUnit::Radians,
            keys: KeyBindings::default(),
        }
    }
}

impl ControllerConfig {
    /// Create a new configuration builder
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Coarse then fine stop thresholds for a turn
    pub fn thresholds(&self, direction: Direction) -> [f64; 2] {
        match direction {
            Direction::Right => [self.right_coarse, self.right_fine],
            Direction::Left => [self.left_coarse, self.left_fine],
        }
    }

    /// Whether a turn in `direction` has not yet reached `threshold`
    pub fn keep_turning(direction: Direction, bearing: f64, threshold: f64) -> bool {
        match direction {
            Direction::Right => bearing < threshold,
            Direction::Left => bearing > threshold,
        }
    }
}

/// Builder for ControllerConfig
#[derive(Debug, Clone, Default)]
pub struct ControllerConfigBuilder {
    right_thresholds: Option<(f64, f64)>,
    left_thresholds: Option<(f64, f64)>,
    stop_radius: Option<f64>,
    poll_interval: Option<Duration>,
    max_polls: Option<u32>,
    max_course_corrections: Option<u32>,
    heading_unit: Option<HeadingUnit>,
    keys: Option<KeyBindings>,
}

impl ControllerConfigBuilder {
    /// Set the coarse and fine thresholds for right turns
    pub fn right_thresholds(mut self, coarse: f64, fine: f64) -> Self {
        self.right_thresholds = Some((coarse, fine));
        self
    }

    /// Set the coarse and fine thresholds for left turns
    pub fn left_thresholds(mut self, coarse: f64, fine: f64) -> Self {
        self.left_thresholds = Some((coarse, fine));
        self
    }

    pub fn stop_radius(mut self, radius: f64) -> Self {
        self.stop_radius = Some(radius);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Bound the samples taken by a single `look_at`
    pub fn max_polls(mut self, polls: u32) -> Self {
        self.max_polls = Some(polls);
        self
    }

    /// Bound the `look_at` calls made by a single `move_to`
    pub fn max_course_corrections(mut self, corrections: u32) -> Self {
        self.max_course_corrections = Some(corrections);
        self
    }

    pub fn heading_unit(mut self, unit: HeadingUnit) -> Self {
        self.heading_unit = Some(unit);
        self
    }

    pub fn keys(mut self, keys: KeyBindings) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ControllerConfig {
        let default = ControllerConfig::default();
        let (right_coarse, right_fine) = self
            .right_thresholds
            .unwrap_or((default.right_coarse, default.right_fine));
        let (left_coarse, left_fine) = self
            .left_thresholds
            .unwrap_or((default.left_coarse, default.left_fine));

        ControllerConfig {
            right_coarse,
            right_fine,
            left_coarse,
            left_fine,
            stop_radius: self.stop_radius.unwrap_or(default.stop_radius),
            poll_interval: self.poll_interval.unwrap_or(default.poll_interval),
            max_polls: self.max_polls.or(default.max_polls),
            max_course_corrections: self
                .max_course_corrections
                .or(default.max_course_corrections),
            heading_unit: self.heading_unit.unwrap_or(default.heading_unit),
            keys: self.keys.unwrap_or(default.keys),
        }
    }
}
