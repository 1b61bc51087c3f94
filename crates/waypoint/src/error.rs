use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid memory address: {0:#x}")]
    InvalidAddress(u64),

    #[error("Failed to change page protection at address {address:#x}: {message}")]
    ProtectionChangeFailed { address: u64, message: String },

    #[error("Pattern [{pattern}] not found in module {module}")]
    PatternNotFound { module: String, pattern: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to send key event: {0}")]
    InputFailed(String),

    #[error("No key mapping for character {0:?}")]
    UnmappedCharacter(char),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Gave up after {polls} polls without reaching the target")]
    PollLimitExceeded { polls: u32 },

    #[error("Not supported on this platform: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error means a module or pattern could not be located
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ModuleNotFound(_) | Error::PatternNotFound { .. }
        )
    }

    /// Check if this error came from a failed memory access
    pub fn is_memory_access(&self) -> bool {
        matches!(
            self,
            Error::MemoryReadFailed { .. }
                | Error::AccessDenied(_)
                | Error::InvalidAddress(_)
                | Error::ProtectionChangeFailed { .. }
        )
    }
}
