//! Win32 backend for the process collaborator traits.

use std::ffi::c_void;
use std::mem;

use tracing::{debug, warn};
use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, TH32CS_SNAPMODULE,
    TH32CS_SNAPMODULE32,
};
use windows::Win32::System::Memory::{
    MEMORY_BASIC_INFORMATION, PAGE_PROTECTION_FLAGS, VirtualProtectEx, VirtualQueryEx,
};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
};

use super::{MemoryRegion, ModuleDescriptor, ProcessMemory, Protection, ReadMemory};
use crate::error::{Error, Result};

/// An opened handle to another process
pub struct WindowsProcess {
    handle: HANDLE,
    pid: u32,
}

// SAFETY: the handle is only passed to thread-safe Win32 calls and is closed
// exactly once in Drop.
unsafe impl Send for WindowsProcess {}
unsafe impl Sync for WindowsProcess {}

impl WindowsProcess {
    /// Open `pid` with the rights needed for reads and protection changes
    pub fn attach(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess has no preconditions; failure is reported via Result.
        let handle = unsafe {
            OpenProcess(
                PROCESS_VM_READ | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION,
                BOOL::from(false),
                pid,
            )
        }
        .map_err(|e| Error::AccessDenied(format!("failed to open process {}: {}", pid, e)))?;

        debug!("Attached to process {}", pid);
        Ok(Self { handle, pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Protection runs over a range as reported by `VirtualQueryEx`, clipped
    /// to the range
    fn raw_regions(&self, address: u64, size: usize) -> Result<Vec<(u64, usize, u32)>> {
        let end = address.wrapping_add(size as u64);
        let mut regions = Vec::new();
        let mut cursor = address;

        while cursor < end {
            let mut info = MEMORY_BASIC_INFORMATION::default();
            // SAFETY: info is a writable MEMORY_BASIC_INFORMATION of the size passed.
            let written = unsafe {
                VirtualQueryEx(
                    self.handle,
                    Some(cursor as *const c_void),
                    &mut info,
                    mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                return Err(Error::MemoryReadFailed {
                    address: cursor,
                    message: "VirtualQueryEx failed".to_string(),
                });
            }

            let region_end = (info.BaseAddress as u64)
                .wrapping_add(info.RegionSize as u64)
                .min(end);
            if region_end <= cursor {
                break;
            }
            regions.push((cursor, (region_end - cursor) as usize, info.Protect.0));
            cursor = region_end;
        }

        Ok(regions)
    }

    fn protect(&self, address: u64, size: usize, flags: u32) -> Result<u32> {
        let mut previous = PAGE_PROTECTION_FLAGS(0);

        // SAFETY: only changes page flags in the target; no local memory is touched.
        unsafe {
            VirtualProtectEx(
                self.handle,
                address as *const c_void,
                size,
                PAGE_PROTECTION_FLAGS(flags),
                &mut previous,
            )
        }
        .map_err(|e| Error::ProtectionChangeFailed {
            address,
            message: e.to_string(),
        })?;

        Ok(previous.0)
    }
}

impl Drop for WindowsProcess {
    fn drop(&mut self) {
        // SAFETY: the handle came from OpenProcess and is not used after this.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

impl ReadMemory for WindowsProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if address == 0 {
            return Err(Error::InvalidAddress(address));
        }

        let mut buffer = vec![0u8; size];
        let mut bytes_read: usize = 0;

        // SAFETY: buffer is valid for `size` writable bytes.
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut bytes_read),
            )
        }
        .map_err(|e| Error::MemoryReadFailed {
            address,
            message: e.to_string(),
        })?;

        if bytes_read != size {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("partial read: {} of {} bytes", bytes_read, size),
            });
        }

        Ok(buffer)
    }
}

impl ProcessMemory for WindowsProcess {
    fn module(&self, name: &str) -> Result<ModuleDescriptor> {
        // SAFETY: the snapshot handle is closed on every path below.
        let snapshot = unsafe {
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, self.pid)
        }
        .map_err(|e| Error::AccessDenied(format!("module snapshot failed: {}", e)))?;

        let mut entry = MODULEENTRY32W {
            dwSize: mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        // SAFETY: entry.dwSize is initialized as the ToolHelp API requires.
        let mut more = unsafe { Module32FirstW(snapshot, &mut entry) }.is_ok();
        while more {
            let len = entry
                .szModule
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szModule.len());
            let module_name = String::from_utf16_lossy(&entry.szModule[..len]);

            if module_name.eq_ignore_ascii_case(name) {
                found = Some(ModuleDescriptor {
                    name: module_name,
                    base_address: entry.modBaseAddr as u64,
                    size: entry.modBaseSize as usize,
                });
                break;
            }

            // SAFETY: same entry buffer, same snapshot.
            more = unsafe { Module32NextW(snapshot, &mut entry) }.is_ok();
        }

        // SAFETY: snapshot came from CreateToolhelp32Snapshot.
        unsafe {
            let _ = CloseHandle(snapshot);
        }

        found.ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }

    fn set_protection(
        &self,
        address: u64,
        size: usize,
        protection: Protection,
    ) -> Result<Protection> {
        let before = self.raw_regions(address, size)?;
        let previous = self.protect(address, size, protection.bits())?;

        match Protection::from_bits(previous) {
            Some(previous) => Ok(previous),
            None => {
                // Put the raw flags back region by region before reporting
                for (base, len, flags) in before {
                    if let Err(e) = self.protect(base, len, flags) {
                        warn!("Failed to restore protection at 0x{:X}: {}", base, e);
                    }
                }
                Err(Error::ProtectionChangeFailed {
                    address,
                    message: format!("unrecognized previous protection 0x{:X}", previous),
                })
            }
        }
    }

    fn regions(&self, address: u64, size: usize) -> Result<Vec<MemoryRegion>> {
        self.raw_regions(address, size)?
            .into_iter()
            .map(|(base_address, size, flags)| {
                // Exact match only, so a restore never drops modifier bits
                let protection =
                    Protection::from_repr(flags).ok_or_else(|| Error::MemoryReadFailed {
                        address: base_address,
                        message: format!("unrecognized protection 0x{:X}", flags),
                    })?;
                Ok(MemoryRegion {
                    base_address,
                    size,
                    protection,
                })
            })
            .collect()
    }
}
