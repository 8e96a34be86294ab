//! Streaming line reader for large text files.
//!
//! - Plain, `.gz`, `.bz2`, `.xz` and `.lzma` (detected by extension).
//! - Reads fixed-size chunks; never loads the whole file.
//! - Plain sources are read ahead by a background thread through a bounded
//!   queue of 8 chunks, so memory stays at `8 * chunk_size` at most.
//! - Incremental decoding: multi-byte characters split across chunks decode
//!   correctly, with a strict / replace / ignore policy for malformed input.
//! - Same lines for any chunk size and any compression format.
//! - Optional `mmap` for plain files; `zlib` feature for the system zlib backend.
//!
//! ```no_run
//! use chunked_line_reader::{LineReader, ReaderOptions};
//!
//! # fn main() -> Result<(), chunked_line_reader::LineReaderError> {
//! let mut rdr = LineReader::from_path("access.log.gz", ReaderOptions::default())?;
//! let mut n = 0;
//! for line in rdr.lines()? {
//!     let line = line?;
//!     n += line.len();
//! }
//! println!("{n} chars, {}", rdr.stats());
//! # Ok(())
//! # }
//! ```

mod chunk;
mod decode;
pub mod error;
pub mod format;
pub mod policy;
pub mod reader;
pub mod stats;
mod util;

pub use crate::chunk::QUEUE_CAPACITY;
pub use crate::error::{ConfigError, IoContext, LineReaderError};
pub use crate::format::{Format, UnknownFormat, default_chunk_size, detect};
pub use crate::policy::{DecodeErrorPolicy, ReaderOptions, UnknownPolicy};
pub use crate::reader::{LineReader, Lines, Source, StreamSource};
pub use crate::stats::{ReadMode, ReaderStats};
