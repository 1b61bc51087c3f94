//! In-memory stand-ins for a target process, used by tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{MemoryRegion, ModuleDescriptor, ProcessMemory, Protection, ReadMemory};
use crate::error::{Error, Result};
use crate::geometry::Position;
use crate::input::{KeySink, KeyState, VirtualKey};

/// Page granularity of the mock's protection map
pub const PAGE_SIZE: u64 = 0x1000;

fn pages(address: u64, size: usize) -> impl Iterator<Item = u64> {
    let end = address.saturating_add(size as u64);
    let first = if size == 0 {
        end
    } else {
        address / PAGE_SIZE * PAGE_SIZE
    };
    (first..end).step_by(PAGE_SIZE as usize)
}

/// Builder for a sparse mock address space
#[derive(Default)]
pub struct MockMemoryBuilder {
    bytes: BTreeMap<u64, u8>,
    modules: Vec<ModuleDescriptor>,
    pages: BTreeMap<u64, Protection>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(mut self, address: u64, data: &[u8]) -> Self {
        for (i, byte) in data.iter().enumerate() {
            self.bytes.insert(address + i as u64, *byte);
        }
        self
    }

    pub fn with_u64(self, address: u64, value: u64) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_i32(self, address: u64, value: i32) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_f32(self, address: u64, value: f32) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    /// Map a module image at `base`; its size is the image length.
    ///
    /// The image's pages start out execute-read.
    pub fn with_module(mut self, name: &str, base: u64, image: &[u8]) -> Self {
        self.modules.push(ModuleDescriptor {
            name: name.to_string(),
            base_address: base,
            size: image.len(),
        });
        self.with_bytes(base, image)
            .with_protection(base, image.len(), Protection::ExecuteRead)
    }

    /// Set the protection of every page touching the range
    pub fn with_protection(mut self, address: u64, size: usize, protection: Protection) -> Self {
        for page in pages(address, size) {
            self.pages.insert(page, protection);
        }
        self
    }

    pub fn build(self) -> MockProcess {
        MockProcess {
            bytes: RwLock::new(self.bytes),
            modules: self.modules,
            pages: Mutex::new(self.pages),
            protection_calls: Mutex::new(Vec::new()),
            deny_protection: false,
        }
    }
}

/// Mock process backed by a sparse byte map
pub struct MockProcess {
    bytes: RwLock<BTreeMap<u64, u8>>,
    modules: Vec<ModuleDescriptor>,
    pages: Mutex<BTreeMap<u64, Protection>>,
    protection_calls: Mutex<Vec<(u64, usize, Protection)>>,
    deny_protection: bool,
}

impl MockProcess {
    /// Make every `set_protection` call fail
    pub fn deny_protection(mut self) -> Self {
        self.deny_protection = true;
        self
    }

    pub fn write_u64(&self, address: u64, value: u64) {
        let mut bytes = self.bytes.write();
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            bytes.insert(address + i as u64, *byte);
        }
    }

    /// Every protection change requested so far
    pub fn protection_calls(&self) -> Vec<(u64, usize, Protection)> {
        self.protection_calls.lock().clone()
    }
}

impl ReadMemory for MockProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let bytes = self.bytes.read();
        (0..size as u64)
            .map(|i| {
                bytes
                    .get(&address.wrapping_add(i))
                    .copied()
                    .ok_or_else(|| Error::MemoryReadFailed {
                        address,
                        message: format!("byte {} of {} is not mapped", i, size),
                    })
            })
            .collect()
    }
}

impl ProcessMemory for MockProcess {
    fn module(&self, name: &str) -> Result<ModuleDescriptor> {
        self.modules
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }

    fn set_protection(
        &self,
        address: u64,
        size: usize,
        protection: Protection,
    ) -> Result<Protection> {
        if self.deny_protection {
            return Err(Error::AccessDenied(format!(
                "protection change at 0x{:X} refused",
                address
            )));
        }
        let mut pages = self.pages.lock();
        let previous = pages
            .get(&(address / PAGE_SIZE * PAGE_SIZE))
            .copied()
            .unwrap_or(Protection::ExecuteRead);
        for page in self::pages(address, size) {
            pages.insert(page, protection);
        }
        self.protection_calls.lock().push((address, size, protection));
        Ok(previous)
    }

    fn regions(&self, address: u64, size: usize) -> Result<Vec<MemoryRegion>> {
        let pages = self.pages.lock();
        let end = address.saturating_add(size as u64);
        let mut regions: Vec<MemoryRegion> = Vec::new();

        for page in self::pages(address, size) {
            let protection = pages.get(&page).copied().ok_or_else(|| Error::MemoryReadFailed {
                address: page,
                message: "page is not mapped".to_string(),
            })?;
            let start = page.max(address);
            let len = ((page + PAGE_SIZE).min(end) - start) as usize;
            match regions.last_mut() {
                Some(last) if last.protection == protection => last.size += len,
                _ => regions.push(MemoryRegion {
                    base_address: start,
                    size: len,
                    protection,
                }),
            }
        }

        Ok(regions)
    }
}

/// Fixed layout of the simulated entity's fields
pub mod entity_layout {
    pub const X: u64 = 0x1000;
    pub const Y: u64 = 0x1004;
    pub const Z: u64 = 0x1008;
    pub const HEADING: u64 = 0x2000;
}

#[derive(Debug)]
struct EntityState {
    position: Position,
    heading_degrees: f64,
    turn_rate: f64,
    speed: f64,
    held: HashSet<VirtualKey>,
    events: Vec<(KeyState, VirtualKey)>,
    samples: u32,
}

/// A walking entity that reacts to key events.
///
/// Each heading read counts as one simulation tick: held turn keys rotate the
/// entity by `turn_rate` degrees and a held forward key moves it `speed` units
/// along its heading. The heading is exposed as radians, like the real target.
#[derive(Clone)]
pub struct SimulatedEntity {
    state: Arc<Mutex<EntityState>>,
}

impl SimulatedEntity {
    pub fn new(position: Position, heading_degrees: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(EntityState {
                position,
                heading_degrees,
                turn_rate: 1.0,
                speed: 0.0,
                held: HashSet::new(),
                events: Vec::new(),
                samples: 0,
            })),
        }
    }

    pub fn with_turn_rate(self, degrees_per_tick: f64) -> Self {
        self.state.lock().turn_rate = degrees_per_tick;
        self
    }

    pub fn with_speed(self, units_per_tick: f64) -> Self {
        self.state.lock().speed = units_per_tick;
        self
    }

    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    pub fn heading_degrees(&self) -> f64 {
        self.state.lock().heading_degrees
    }

    pub fn events(&self) -> Vec<(KeyState, VirtualKey)> {
        self.state.lock().events.clone()
    }

    pub fn held_keys(&self) -> HashSet<VirtualKey> {
        self.state.lock().held.clone()
    }

    pub fn samples(&self) -> u32 {
        self.state.lock().samples
    }

    fn tick(state: &mut EntityState) {
        state.samples += 1;
        if state.held.contains(&VirtualKey::D) {
            state.heading_degrees -= state.turn_rate;
        }
        if state.held.contains(&VirtualKey::A) {
            state.heading_degrees += state.turn_rate;
        }
        if state.held.contains(&VirtualKey::W) {
            let radians = state.heading_degrees.to_radians();
            state.position.x += state.speed * radians.sin();
            state.position.z += state.speed * radians.cos();
        }
    }
}

impl ReadMemory for SimulatedEntity {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut state = self.state.lock();
        let value = match (address, size) {
            (entity_layout::X, 4) => state.position.x as f32,
            (entity_layout::Y, 4) => state.position.y as f32,
            (entity_layout::Z, 4) => state.position.z as f32,
            (entity_layout::HEADING, 4) => {
                Self::tick(&mut state);
                state.heading_degrees.to_radians() as f32
            }
            _ => return Err(Error::InvalidAddress(address)),
        };
        Ok(value.to_le_bytes().to_vec())
    }
}

impl KeySink for SimulatedEntity {
    fn send_key(&self, state: KeyState, key: VirtualKey) -> Result<()> {
        let mut entity = self.state.lock();
        entity.events.push((state, key));
        match state {
            KeyState::Down => entity.held.insert(key),
            KeyState::Up => entity.held.remove(&key),
        };
        Ok(())
    }
}

/// Key sink that records events without simulating anything
#[derive(Default)]
pub struct RecordingKeySink {
    events: Mutex<Vec<(KeyState, VirtualKey)>>,
}

impl RecordingKeySink {
    pub fn events(&self) -> Vec<(KeyState, VirtualKey)> {
        self.events.lock().clone()
    }
}

impl KeySink for RecordingKeySink {
    fn send_key(&self, state: KeyState, key: VirtualKey) -> Result<()> {
        self.events.lock().push((state, key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_process_reads_across_writes() {
        let process = MockMemoryBuilder::new()
            .with_bytes(0x1000, &[0x01, 0x02, 0x03, 0x04, 0x05])
            .build();

        assert_eq!(process.read_bytes(0x1000, 5).unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(process.read_bytes(0x1002, 2).unwrap(), vec![3, 4]);
        assert!(process.read_bytes(0x1003, 4).is_err());

        process.write_u64(0x1000, 7);
        assert_eq!(process.read_u64(0x1000).unwrap(), 7);
    }

    #[test]
    fn test_regions_merge_equal_pages_and_clip_to_range() {
        let process = MockMemoryBuilder::new()
            .with_protection(0x10000, 0x2000, Protection::ReadOnly)
            .with_protection(0x12000, 0x1000, Protection::ReadWrite)
            .build();

        let regions = process.regions(0x10800, 0x2000).unwrap();
        assert_eq!(
            regions,
            vec![
                MemoryRegion {
                    base_address: 0x10800,
                    size: 0x1800,
                    protection: Protection::ReadOnly,
                },
                MemoryRegion {
                    base_address: 0x12000,
                    size: 0x800,
                    protection: Protection::ReadWrite,
                },
            ]
        );
        assert!(process.regions(0x12000, 0x1001).is_err());
    }

    #[test]
    fn test_set_protection_reports_first_page_and_covers_range() {
        let process = MockMemoryBuilder::new()
            .with_protection(0x10000, 0x1000, Protection::ReadOnly)
            .with_protection(0x11000, 0x1000, Protection::ReadWrite)
            .build();

        let previous = process
            .set_protection(0x10000, 0x2000, Protection::ExecuteReadWrite)
            .unwrap();

        assert_eq!(previous, Protection::ReadOnly);
        assert_eq!(
            process.regions(0x10000, 0x2000).unwrap(),
            vec![MemoryRegion {
                base_address: 0x10000,
                size: 0x2000,
                protection: Protection::ExecuteReadWrite,
            }]
        );
    }

    #[test]
    fn test_simulated_entity_turns_while_key_held() {
        let entity = SimulatedEntity::new(Position::ZERO, 0.0).with_turn_rate(2.0);

        entity.send_key(KeyState::Down, VirtualKey::A).unwrap();
        entity.read_f32(entity_layout::HEADING).unwrap();
        entity.read_f32(entity_layout::HEADING).unwrap();
        entity.send_key(KeyState::Up, VirtualKey::A).unwrap();
        let radians = entity.read_f32(entity_layout::HEADING).unwrap();

        assert!((entity.heading_degrees() - 4.0).abs() < 1e-9);
        assert!((f64::from(radians).to_degrees() - 4.0).abs() < 1e-4);
        assert!(entity.held_keys().is_empty());
    }

    #[test]
    fn test_simulated_entity_walks_along_heading() {
        let entity = SimulatedEntity::new(Position::ZERO, 90.0).with_speed(1.0);

        entity.send_key(KeyState::Down, VirtualKey::W).unwrap();
        for _ in 0..3 {
            entity.read_f32(entity_layout::HEADING).unwrap();
        }

        let position = entity.position();
        assert!((position.x - 3.0).abs() < 1e-9);
        assert!(position.z.abs() < 1e-9);
    }
}
