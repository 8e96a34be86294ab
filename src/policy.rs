use crate::format::Format;
use std::str::FromStr;
use thiserror::Error;

/// What to do with byte sequences that are malformed for the configured encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorPolicy {
    /// Stop the pass with a decode error.
    Strict,
    /// Substitute U+FFFD and continue.
    Replace,
    /// Drop the malformed bytes and continue.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown decode error policy: {0:?}")]
pub struct UnknownPolicy(pub String);

impl FromStr for DecodeErrorPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            "ignore" => Ok(Self::Ignore),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Bytes per read; `None` uses the per-format default.
    pub chunk_size: Option<usize>,
    /// Encoding label, e.g. `utf-8`, `utf-16le`, `windows-1252`.
    pub encoding: String,
    pub decode_errors: DecodeErrorPolicy,
    /// Force a format instead of detecting it from the path.
    pub format: Option<Format>,
    /// Log pass start/end and timings at debug level.
    pub debug: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            chunk_size: None,
            encoding: "utf-8".to_string(),
            decode_errors: DecodeErrorPolicy::Replace,
            format: None,
            debug: false,
        }
    }
}

impl ReaderOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    pub fn with_decode_errors(mut self, policy: DecodeErrorPolicy) -> Self {
        self.decode_errors = policy;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
