//! Size ceilings and the counting reader that enforces them on streams

use std::fmt;
use std::io::{self, Read};

use contracts::{LimitsConfig, SourceKind};

/// Per-kind size ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// CSV ceiling, enforced while streaming
    pub delimited_max_bytes: u64,

    /// Spreadsheet ceiling, enforced before materialization
    pub spreadsheet_max_bytes: u64,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for ParseLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            delimited_max_bytes: config.delimited_max_bytes,
            spreadsheet_max_bytes: config.spreadsheet_max_bytes,
        }
    }
}

impl ParseLimits {
    /// Ceiling for a content kind
    pub fn for_kind(&self, kind: SourceKind) -> u64 {
        match kind {
            SourceKind::DelimitedText => self.delimited_max_bytes,
            SourceKind::Spreadsheet => self.spreadsheet_max_bytes,
        }
    }
}

/// Marker error carried inside `io::Error` when a stream crosses its ceiling
#[derive(Debug)]
pub(crate) struct LimitExceeded {
    pub limit: u64,
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream exceeded {} bytes", self.limit)
    }
}

impl std::error::Error for LimitExceeded {}

impl LimitExceeded {
    /// Recover the marker from an `io::Error`
    pub fn find(err: &io::Error) -> Option<u64> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<LimitExceeded>())
            .map(|e| e.limit)
    }
}

/// Reader that fails as soon as more than `limit` bytes have been read
pub(crate) struct LimitedReader<R> {
    inner: R,
    limit: u64,
    consumed: u64,
}

impl<R: Read> LimitedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            limit,
            consumed: 0,
        }
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        if self.consumed > self.limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                LimitExceeded { limit: self.limit },
            ));
        }
        Ok(n)
    }
}

/// Human-readable byte count (binary units)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    if value.fract() == 0.0 {
        format!("{value:.0} {unit}")
    } else {
        format!("{value:.1} {unit}")
    }
}
