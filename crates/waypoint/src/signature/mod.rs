//! Byte-signature scanning over module images.
//!
//! A [`Signature`] is a byte pattern with optional wildcards plus an offset
//! added to the match. [`SignatureScanner`] snapshots a module through
//! [`ProcessMemory`](crate::memory::ProcessMemory) and returns the absolute
//! address of the first match.

mod pattern;
mod scanner;

pub use pattern::{Signature, find_pattern, format_pattern, parse_pattern};
pub use scanner::SignatureScanner;
