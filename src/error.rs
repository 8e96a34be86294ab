use crate::format::Format;
use std::io;
use thiserror::Error;

/// Position of a failure within the current pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoContext {
    /// Raw (decompressed) bytes consumed before the failure.
    pub byte_pos: u64,
    /// Lines yielded before the failure.
    pub line_num: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("stream must be opened in binary mode (got mode {mode:?})")]
    NotBinary { mode: String },
    #[error("{format} reading requires a file path, not an open stream")]
    PathRequired { format: Format },
    #[error("unsupported compression format: {0} (codec feature not enabled)")]
    UnsupportedFormat(Format),
    #[error("unknown text encoding: {0:?}")]
    UnknownEncoding(String),
    #[error("chunk size must be at least one byte")]
    InvalidChunkSize,
    #[error("stream source was already consumed by an earlier pass")]
    StreamConsumed,
    #[error("reader is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum LineReaderError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error at {ctx:?}: {source}")]
    Io {
        #[source]
        source: io::Error,
        ctx: IoContext,
    },
    #[error("malformed {encoding} input at {ctx:?}")]
    Decode {
        encoding: &'static str,
        ctx: IoContext,
    },
}

impl LineReaderError {
    pub(crate) fn io_err(source: io::Error, ctx: IoContext) -> Self {
        Self::Io { source, ctx }
    }

    pub(crate) fn decode_err(encoding: &'static str, ctx: IoContext) -> Self {
        Self::Decode { encoding, ctx }
    }

    /// True for errors raised while setting up a pass, before any data was read.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
