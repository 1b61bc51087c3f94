mod pointer;
#[cfg(target_os = "windows")]
mod process;
mod reader;

#[cfg(test)]
pub mod mock;

pub use pointer::{PointerChain, Resolve, read_pointer, resolve};
#[cfg(target_os = "windows")]
pub use process::WindowsProcess;
pub use reader::{MemoryRegion, ModuleDescriptor, ProcessMemory, Protection, ReadMemory};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockProcess};
