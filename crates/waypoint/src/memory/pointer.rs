//! Multi-level pointer chains.
//!
//! A chain starts at a stable base address and walks through several levels
//! of indirection to reach a value whose address changes between runs.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::ReadMemory;
use crate::error::Result;

/// What a chain resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// Dereference every step, including the last
    Value,
    /// Stop before the final dereference and return the address it would read
    Address,
}

/// Read a pointer-sized value at `address`
pub fn read_pointer<R: ReadMemory>(reader: &R, address: u64) -> Result<u64> {
    reader.read_u64(address)
}

/// Walk `offsets` starting at `base`.
///
/// The first step reads the pointer at `base` itself. Each later step reads the
/// pointer at `previous + offset`. In [`Resolve::Address`] mode the last offset
/// is added without reading, which yields an address that can be read or
/// written. An empty chain yields the value at `base` (value mode) or `base`
/// itself (address mode).
pub fn resolve<R: ReadMemory>(
    reader: &R,
    base: u64,
    offsets: &[i64],
    mode: Resolve,
) -> Result<u64> {
    if offsets.is_empty() && mode == Resolve::Address {
        return Ok(base);
    }

    let mut value = read_pointer(reader, base)?;
    trace!("[0x{:X}] -> 0x{:X}", base, value);

    for (index, &offset) in offsets.iter().enumerate() {
        let address = value.wrapping_add_signed(offset);
        if mode == Resolve::Address && index == offsets.len() - 1 {
            return Ok(address);
        }
        value = read_pointer(reader, address)?;
        trace!("[0x{:X}] -> 0x{:X}", address, value);
    }

    Ok(value)
}

/// A base address and the offsets leading from it to a value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointerChain {
    pub base: u64,
    #[serde(default)]
    pub offsets: Vec<i64>,
}

impl PointerChain {
    pub fn new(base: u64, offsets: impl Into<Vec<i64>>) -> Self {
        Self {
            base,
            offsets: offsets.into(),
        }
    }

    /// Resolve to the final address (last offset is not dereferenced)
    pub fn address<R: ReadMemory>(&self, reader: &R) -> Result<u64> {
        resolve(reader, self.base, &self.offsets, Resolve::Address)
    }

    /// Resolve to the final pointer-sized value
    pub fn value<R: ReadMemory>(&self, reader: &R) -> Result<u64> {
        resolve(reader, self.base, &self.offsets, Resolve::Value)
    }
}

impl std::fmt::Display for PointerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:X}", self.base)?;
        for offset in &self.offsets {
            if *offset < 0 {
                write!(f, " -> -0x{:X}", offset.unsigned_abs())?;
            } else {
                write!(f, " -> +0x{:X}", offset)?;
            }
        }
        Ok(())
    }
}
