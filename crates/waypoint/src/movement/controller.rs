//! The bang-bang movement controller.
//!
//! Every decision is taken on a fresh sample of position and heading. Turning
//! is two-staged (coarse then fine threshold) so the entity does not oscillate
//! around the target bearing. A sample that flips the turn direction means the
//! turn overshot; the held key is released and alignment starts over in place.

use std::time::Duration;

use tracing::{debug, trace, warn};

use super::{ControllerConfig, MovementState, TransformAddresses, TransformSpec};
use crate::cancel::{PollClock, StopSignal};
use crate::error::{Error, Result};
use crate::geometry::{Heading, Position, look_at_rotation, turn_direction};
use crate::input::{KeySink, KeyState, VirtualKey};
use crate::memory::{ProcessMemory, ReadMemory};

/// Drives one entity by polling its transform and emulating keys
pub struct MovementController<M: ReadMemory, K: KeySink> {
    memory: M,
    keys: K,
    addresses: TransformAddresses,
    config: ControllerConfig,
    state: MovementState,
    held: Vec<VirtualKey>,
}

impl<M: ProcessMemory, K: KeySink> MovementController<M, K> {
    /// Resolve `spec` once against `process` and bind the result
    pub fn from_spec(
        process: M,
        keys: K,
        spec: &TransformSpec,
        config: ControllerConfig,
    ) -> Result<Self> {
        let addresses = spec.resolve(&process)?;
        Ok(Self::new(process, keys, addresses, config))
    }
}

impl<M: ReadMemory, K: KeySink> MovementController<M, K> {
    pub fn new(
        memory: M,
        keys: K,
        addresses: TransformAddresses,
        config: ControllerConfig,
    ) -> Self {
        Self {
            memory,
            keys,
            addresses,
            config,
            state: MovementState::Idle,
            held: Vec::new(),
        }
    }

    pub fn addresses(&self) -> TransformAddresses {
        self.addresses
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    /// Current position, read fresh from memory
    pub fn position(&self) -> Result<Position> {
        Ok(Position::new(
            f64::from(self.read_finite(self.addresses.x)?),
            f64::from(self.read_finite(self.addresses.y)?),
            f64::from(self.read_finite(self.addresses.z)?),
        ))
    }

    /// Current heading in degrees, read fresh from memory
    pub fn heading(&self) -> Result<Heading> {
        let raw = self.read_finite(self.addresses.heading)?;
        Ok(Heading::yaw(self.config.heading_unit.to_degrees(raw)))
    }

    /// NaN or infinity means the address no longer points at the transform
    fn read_finite(&self, address: u64) -> Result<f32> {
        let value = self.memory.read_f32(address)?;
        if !value.is_finite() {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("non-finite value {}", value),
            });
        }
        Ok(value)
    }

    /// Bearing of `target` relative to where the entity faces, in `[0, 360)`
    pub fn relative_bearing(&self, target: Position) -> Result<f64> {
        let position = self.position()?;
        let heading = self.heading()?;
        Ok(look_at_rotation(position, target, heading))
    }

    /// Turn until the entity faces `target`.
    ///
    /// On return the state is [`MovementState::Aligned`]. On error every held
    /// key has been released and the state is [`MovementState::Idle`].
    pub fn look_at(&mut self, target: Position, stop: &StopSignal) -> Result<()> {
        let result = self.align(target, stop);
        if result.is_err() {
            self.abort();
        }
        result
    }

    /// Walk forward, correcting course, until within the stop radius of `target`.
    ///
    /// Only ground-plane distance counts. On return the state is
    /// [`MovementState::Idle`] and the forward key is released.
    pub fn move_to(&mut self, target: Position, stop: &StopSignal) -> Result<()> {
        let result = self.walk(target, stop);
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn align(&mut self, target: Position, stop: &StopSignal) -> Result<()> {
        let mut clock = PollClock::new(stop, self.config.poll_interval, self.config.max_polls);

        'restart: loop {
            let mut bearing = self.sample(target, &mut clock)?;
            let direction = turn_direction(bearing);
            let key = self.config.keys.turn(direction);

            self.set_state(MovementState::Turning(direction));
            self.press(key)?;

            for threshold in self.config.thresholds(direction) {
                while ControllerConfig::keep_turning(direction, bearing, threshold) {
                    bearing = self.sample(target, &mut clock)?;

                    if turn_direction(bearing) != direction {
                        debug!(
                            "Overshot while turning {} (bearing {:.2}), restarting",
                            direction, bearing
                        );
                        self.release(key)?;
                        continue 'restart;
                    }
                }
            }

            self.release(key)?;
            self.set_state(MovementState::Aligned);
            debug!(
                "Aligned to {} after {} samples (bearing {:.2})",
                target,
                clock.taken(),
                bearing
            );
            return Ok(());
        }
    }

    fn walk(&mut self, target: Position, stop: &StopSignal) -> Result<()> {
        let forward = self.config.keys.forward;
        self.press(forward)?;
        self.set_state(MovementState::MovingForward);

        let mut corrections =
            PollClock::new(stop, Duration::ZERO, self.config.max_course_corrections);
        loop {
            stop.check()?;

            let distance = self.position()?.planar_distance(target);
            if distance <= self.config.stop_radius {
                break;
            }

            corrections.tick()?;
            trace!("{:.2} units from {}, correcting course", distance, target);

            self.look_at(target, stop)?;
            self.set_state(MovementState::MovingForward);
        }

        self.release(forward)?;
        self.set_state(MovementState::Idle);
        debug!(
            "Arrived at {} after {} course corrections",
            target,
            corrections.taken()
        );
        Ok(())
    }

    /// Wait one poll interval, then compute a fresh relative bearing
    fn sample(&self, target: Position, clock: &mut PollClock<'_>) -> Result<f64> {
        let sample = clock.tick()?;
        let bearing = self.relative_bearing(target)?;
        trace!("Sample {}: bearing {:.2}", sample, bearing);
        Ok(bearing)
    }

    fn press(&mut self, key: VirtualKey) -> Result<()> {
        self.keys.send_key(KeyState::Down, key)?;
        if !self.held.contains(&key) {
            self.held.push(key);
        }
        Ok(())
    }

    fn release(&mut self, key: VirtualKey) -> Result<()> {
        self.held.retain(|held| *held != key);
        self.keys.send_key(KeyState::Up, key)
    }

    /// Best-effort release of everything still held, then back to idle
    fn abort(&mut self) {
        for key in std::mem::take(&mut self.held) {
            if let Err(e) = self.keys.send_key(KeyState::Up, key) {
                warn!("Failed to release {}: {}", key, e);
            }
        }
        self.set_state(MovementState::Idle);
    }

    fn set_state(&mut self, state: MovementState) {
        if self.state != state {
            debug!("Movement state: {} -> {}", self.state, state);
            self.state = state;
        }
    }
}

impl<M: ReadMemory, K: KeySink> Drop for MovementController<M, K> {
    fn drop(&mut self) {
        if !self.held.is_empty() {
            self.abort();
        }
    }
}
