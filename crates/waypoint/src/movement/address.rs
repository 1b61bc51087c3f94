use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::memory::{PointerChain, ProcessMemory, Resolve, resolve};
use crate::signature::{Signature, SignatureScanner};

/// How to obtain one of the controller's addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressSpec {
    /// Use the address as given
    Fixed(u64),
    /// Follow a pointer chain; the last offset is not dereferenced
    Chain(PointerChain),
    /// Scan `module` for `signature`, then follow `offsets` from the hit
    Pattern {
        module: String,
        signature: Signature,
        #[serde(default)]
        offsets: Vec<i64>,
    },
}

impl AddressSpec {
    pub fn resolve<P: ProcessMemory>(&self, process: &P) -> Result<u64> {
        match self {
            Self::Fixed(address) => Ok(*address),
            Self::Chain(chain) => chain.address(process),
            Self::Pattern {
                module,
                signature,
                offsets,
            } => {
                let hit = SignatureScanner::new(process).scan(module, signature)?;
                resolve(process, hit, offsets, Resolve::Address)
            }
        }
    }
}

/// Where each tracked field lives, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub x: AddressSpec,
    pub y: AddressSpec,
    pub z: AddressSpec,
    pub heading: AddressSpec,
}

impl TransformSpec {
    /// Resolve all four addresses against a live process
    pub fn resolve<P: ProcessMemory>(&self, process: &P) -> Result<TransformAddresses> {
        let addresses = TransformAddresses {
            x: self.x.resolve(process)?,
            y: self.y.resolve(process)?,
            z: self.z.resolve(process)?,
            heading: self.heading.resolve(process)?,
        };
        debug!("Resolved transform: {}", addresses);
        Ok(addresses)
    }
}

/// Resolved addresses of the position components and the heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformAddresses {
    pub x: u64,
    pub y: u64,
    pub z: u64,
    pub heading: u64,
}

impl std::fmt::Display for TransformAddresses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x=0x{:X} y=0x{:X} z=0x{:X} heading=0x{:X}",
            self.x, self.y, self.z, self.heading
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::memory::MockMemoryBuilder;

    const MODULE_BASE: u64 = 0x1_4000_0000;

    fn module_image() -> Vec<u8> {
        let mut image = vec![0xCCu8; 0x200];
        image[0x100..0x104].copy_from_slice(&[0x48, 0x8B, 0x05, 0x90]);
        image
    }

    #[test]
    fn test_fixed_address() {
        let process = MockMemoryBuilder::new().build();
        assert_eq!(AddressSpec::Fixed(0xDEAD).resolve(&process).unwrap(), 0xDEAD);
    }

    #[test]
    fn test_chain_address() {
        let process = MockMemoryBuilder::new()
            .with_u64(0x5000, 0x6000)
            .with_u64(0x6010, 0x2000)
            .build();
        let spec = AddressSpec::Chain(PointerChain::new(0x5000, [0x10, 0x20]));

        assert_eq!(spec.resolve(&process).unwrap(), 0x2020);
    }

    #[test]
    fn test_pattern_without_offsets_is_the_hit() {
        let process = MockMemoryBuilder::new()
            .with_module("game.exe", MODULE_BASE, &module_image())
            .build();
        let spec = AddressSpec::Pattern {
            module: "game.exe".to_string(),
            signature: Signature::parse("48 8B 05 ??", 7).unwrap(),
            offsets: Vec::new(),
        };

        assert_eq!(spec.resolve(&process).unwrap(), MODULE_BASE + 0x107);
    }

    #[test]
    fn test_pattern_hit_is_chain_base() {
        // The first read happens at the hit itself, so the pattern bytes plus
        // the padding after them form the first pointer.
        let first = u64::from_le_bytes([0x48, 0x8B, 0x05, 0x90, 0xCC, 0xCC, 0xCC, 0xCC]);
        let process = MockMemoryBuilder::new()
            .with_module("game.exe", MODULE_BASE, &module_image())
            .with_u64(first.wrapping_add(0x18), 0x2_0000_0000)
            .with_u64(0x2_0000_0000, 0x3_0000_0000)
            .build();

        let spec = AddressSpec::Pattern {
            module: "game.exe".to_string(),
            signature: Signature::parse("48 8B 05", 0).unwrap(),
            offsets: vec![0x18, 0x0, 0x2C],
        };

        assert_eq!(spec.resolve(&process).unwrap(), 0x3_0000_002C);
    }

    #[test]
    fn test_transform_spec_resolves_all_fields() {
        let process = MockMemoryBuilder::new()
            .with_module("game.exe", MODULE_BASE, &module_image())
            .with_u64(0x5000, 0x7000)
            .build();
        let spec = TransformSpec {
            x: AddressSpec::Chain(PointerChain::new(0x5000, [0x44])),
            y: AddressSpec::Chain(PointerChain::new(0x5000, [0x48])),
            z: AddressSpec::Chain(PointerChain::new(0x5000, [0x40])),
            heading: AddressSpec::Pattern {
                module: "game.exe".to_string(),
                signature: Signature::parse("48 8B 05", 22).unwrap(),
                offsets: Vec::new(),
            },
        };

        let addresses = spec.resolve(&process).unwrap();
        assert_eq!(
            addresses,
            TransformAddresses {
                x: 0x7044,
                y: 0x7048,
                z: 0x7040,
                heading: MODULE_BASE + 0x100 + 22,
            }
        );
    }

    #[test]
    fn test_transform_spec_propagates_errors() {
        let process = MockMemoryBuilder::new().build();
        let spec = TransformSpec {
            x: AddressSpec::Fixed(0x10),
            y: AddressSpec::Fixed(0x14),
            z: AddressSpec::Fixed(0x18),
            heading: AddressSpec::Pattern {
                module: "missing.dll".to_string(),
                signature: Signature::parse("AA", 0).unwrap(),
                offsets: Vec::new(),
            },
        };

        assert!(matches!(
            spec.resolve(&process),
            Err(Error::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_spec_json_roundtrip() {
        let spec = AddressSpec::Pattern {
            module: "game.exe".to_string(),
            signature: Signature::parse("48 ?? 05", 3).unwrap(),
            offsets: vec![0x10, -0x8],
        };
        let json = serde_json::to_string(&spec).unwrap();
        let parsed: AddressSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, spec);
    }
}
