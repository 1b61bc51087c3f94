use std::fmt;
use std::str::FromStr;

use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Byte pattern to locate inside a module, plus an adjustment applied to the hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// `None` matches any byte
    pub pattern: Vec<Option<u8>>,
    #[serde(default)]
    pub extra_offset: i64,
}

impl Signature {
    pub fn new(pattern: Vec<Option<u8>>, extra_offset: i64) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
        }
        Ok(Self {
            pattern,
            extra_offset,
        })
    }

    /// Parse `"48 8B ?? ?? 05"` style text
    pub fn parse(text: &str, extra_offset: i64) -> Result<Self> {
        Self::new(parse_pattern(text)?, extra_offset)
    }

    /// Pattern length in bytes
    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn has_wildcards(&self) -> bool {
        self.pattern.iter().any(Option::is_none)
    }

    /// Offset of the first match inside `buffer`
    pub fn find_in(&self, buffer: &[u8]) -> Option<usize> {
        find_pattern(buffer, &self.pattern)
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, 0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_pattern(&self.pattern))?;
        match self.extra_offset {
            0 => {}
            offset if offset < 0 => write!(f, " -0x{:X}", offset.unsigned_abs())?,
            offset => write!(f, " +0x{:X}", offset)?,
        }
        Ok(())
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidPattern(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[Option<u8>]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            Some(value) => format!("{:02X}", value),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the first offset in `buffer` where `pattern` matches.
///
/// Exact patterns go through `memmem`; masked ones are compared byte by byte.
pub fn find_pattern(buffer: &[u8], pattern: &[Option<u8>]) -> Option<usize> {
    if pattern.is_empty() || buffer.len() < pattern.len() {
        return None;
    }

    if let Some(exact) = pattern.iter().copied().collect::<Option<Vec<u8>>>() {
        return memmem::find(buffer, &exact);
    }

    let last = buffer.len() - pattern.len();
    'outer: for i in 0..=last {
        for (j, byte) in pattern.iter().enumerate() {
            if let Some(value) = byte
                && buffer[i + j] != *value
            {
                continue 'outer;
            }
        }
        return Some(i);
    }

    None
}
