//! Compression format detection by file extension.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

const MIB: usize = 1024 * 1024;

/// Compression container of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    None,
    Gzip,
    Bzip2,
    Xz,
    Lzma,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::None,
        Format::Gzip,
        Format::Bzip2,
        Format::Xz,
        Format::Lzma,
    ];

    /// Short tag, also the canonical file extension without the dot.
    pub fn tag(self) -> &'static str {
        match self {
            Format::None => "none",
            Format::Gzip => "gz",
            Format::Bzip2 => "bz2",
            Format::Xz => "xz",
            Format::Lzma => "lzma",
        }
    }

    #[inline]
    pub fn is_compressed(self) -> bool {
        self != Format::None
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown format tag {0:?}")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Format::None),
            "gz" | "gzip" => Ok(Format::Gzip),
            "bz2" | "bzip2" => Ok(Format::Bzip2),
            "xz" => Ok(Format::Xz),
            "lzma" => Ok(Format::Lzma),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Classify a source by its path suffix. Streams (`None`) and unknown
/// suffixes are uncompressed.
pub fn detect(path: Option<&Path>) -> Format {
    let Some(path) = path else {
        return Format::None;
    };
    let name = path.to_string_lossy().to_ascii_lowercase();
    Format::ALL
        .into_iter()
        .filter(|f| f.is_compressed())
        .find(|f| {
            name.strip_suffix(f.tag())
                .is_some_and(|stem| stem.ends_with('.'))
        })
        .unwrap_or(Format::None)
}

/// Bytes per read. Plain files get the largest chunks since no decompressor
/// sits in the read path; bzip2 decodes slowest so it gets the smallest.
pub fn default_chunk_size(format: Format) -> usize {
    match format {
        Format::None => 128 * MIB,
        Format::Gzip => 32 * MIB,
        Format::Bzip2 => 16 * MIB,
        Format::Xz => 32 * MIB,
        Format::Lzma => 32 * MIB,
    }
}
