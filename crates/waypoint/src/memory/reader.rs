//! Collaborator traits for reading a foreign process.
//!
//! Implementations must never hand back zero-filled or stale bytes: a read
//! either yields exactly the requested length or fails.

use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr, IntoStaticStr};

use crate::error::{Error, Result};

/// Raw byte access into another process's address space
pub trait ReadMemory {
    /// Read exactly `size` bytes starting at `address`
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_array::<8>(address)?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_array::<4>(address)?;
        Ok(i32::from_le_bytes(bytes))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        let bytes = self.read_array::<4>(address)?;
        Ok(f32::from_le_bytes(bytes))
    }

    /// Read a fixed-size array, rejecting short reads
    fn read_array<const N: usize>(&self, address: u64) -> Result<[u8; N]> {
        let bytes = self.read_bytes(address, N)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::MemoryReadFailed {
                address,
                message: format!("expected {} bytes, got {}", N, bytes.len()),
            })
    }
}

impl<T: ReadMemory> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

impl<T: ReadMemory> ReadMemory for std::sync::Arc<T> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

/// Module lookup and page protection on top of raw reads
pub trait ProcessMemory: ReadMemory {
    /// Find a loaded module by name (ASCII case-insensitive)
    fn module(&self, name: &str) -> Result<ModuleDescriptor>;

    /// Change the protection of a range, returning the previous protection.
    ///
    /// Like `VirtualProtectEx`, the returned value is that of the first page
    /// only. Use [`regions`](Self::regions) to capture a mixed range.
    fn set_protection(&self, address: u64, size: usize, protection: Protection)
    -> Result<Protection>;

    /// Split `[address, address + size)` into runs of equal protection
    fn regions(&self, address: u64, size: usize) -> Result<Vec<MemoryRegion>>;
}

impl<T: ProcessMemory> ProcessMemory for &T {
    fn module(&self, name: &str) -> Result<ModuleDescriptor> {
        (**self).module(name)
    }

    fn set_protection(
        &self,
        address: u64,
        size: usize,
        protection: Protection,
    ) -> Result<Protection> {
        (**self).set_protection(address, size, protection)
    }

    fn regions(&self, address: u64, size: usize) -> Result<Vec<MemoryRegion>> {
        (**self).regions(address, size)
    }
}

/// A module mapped into the target process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub base_address: u64,
    pub size: usize,
}

impl ModuleDescriptor {
    /// One past the last byte of the module image
    pub fn end_address(&self) -> u64 {
        self.base_address.wrapping_add(self.size as u64)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base_address && address < self.end_address()
    }
}

/// A run of pages sharing one protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub base_address: u64,
    pub size: usize,
    pub protection: Protection,
}

/// Page protection flags (values match the Win32 `PAGE_*` constants)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    IntoStaticStr,
    Display,
)]
#[repr(u32)]
pub enum Protection {
    NoAccess = 0x01,
    ReadOnly = 0x02,
    ReadWrite = 0x04,
    WriteCopy = 0x08,
    Execute = 0x10,
    ExecuteRead = 0x20,
    ExecuteReadWrite = 0x40,
    ExecuteWriteCopy = 0x80,
    Guard = 0x100,
    NoCache = 0x200,
    WriteCombine = 0x400,
}

impl Protection {
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Map raw flags back to a protection.
    ///
    /// Modifier bits (guard, no-cache, write-combine) are dropped when a base
    /// protection is also present.
    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::from_repr(bits).or_else(|| Self::from_repr(bits & 0xFF))
    }

    pub fn is_readable(self) -> bool {
        matches!(
            self,
            Self::ReadOnly
                | Self::ReadWrite
                | Self::WriteCopy
                | Self::ExecuteRead
                | Self::ExecuteReadWrite
                | Self::ExecuteWriteCopy
        )
    }
}
