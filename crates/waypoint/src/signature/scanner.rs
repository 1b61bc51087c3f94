use tracing::{debug, warn};

use super::Signature;
use crate::error::{Error, Result};
use crate::memory::{ModuleDescriptor, ProcessMemory, Protection};

/// Locates signatures inside the modules of one process
pub struct SignatureScanner<'a, P: ProcessMemory> {
    process: &'a P,
}

impl<'a, P: ProcessMemory> SignatureScanner<'a, P> {
    pub fn new(process: &'a P) -> Self {
        Self { process }
    }

    /// Absolute address of the first match of `signature` in `module_name`,
    /// adjusted by the signature's extra offset
    pub fn scan(&self, module_name: &str, signature: &Signature) -> Result<u64> {
        let module = self.process.module(module_name)?;
        debug!(
            "Scanning {} (0x{:X}, {} bytes) for {}",
            module.name, module.base_address, module.size, signature
        );

        let image = self.snapshot(&module)?;
        self.scan_module(&module, &image, signature)
    }

    /// Match `signature` against an image already read from `module`
    pub fn scan_module(
        &self,
        module: &ModuleDescriptor,
        image: &[u8],
        signature: &Signature,
    ) -> Result<u64> {
        let offset = signature
            .find_in(image)
            .ok_or_else(|| Error::PatternNotFound {
                module: module.name.clone(),
                pattern: signature.to_string(),
            })?;

        let address = module
            .base_address
            .wrapping_add(offset as u64)
            .wrapping_add_signed(signature.extra_offset);
        debug!(
            "Found {} in {} at +0x{:X} -> 0x{:X}",
            signature, module.name, offset, address
        );
        Ok(address)
    }

    /// Read the whole module in one pass.
    ///
    /// The range is made readable for the duration of the read. Afterwards each
    /// region gets its own previous protection back.
    pub fn snapshot(&self, module: &ModuleDescriptor) -> Result<Vec<u8>> {
        let regions = self.process.regions(module.base_address, module.size)?;
        self.process.set_protection(
            module.base_address,
            module.size,
            Protection::ExecuteReadWrite,
        )?;

        let image = self
            .process
            .read_bytes(module.base_address, module.size);

        let mut restored = Ok(());
        for region in &regions {
            if let Err(e) =
                self.process
                    .set_protection(region.base_address, region.size, region.protection)
            {
                warn!(
                    "Failed to restore {} at 0x{:X} in {}: {}",
                    region.protection, region.base_address, module.name, e
                );
                if restored.is_ok() {
                    restored = Err(e);
                }
            }
        }

        let image = image?;
        restored?;
        Ok(image)
    }
}
