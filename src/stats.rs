use std::fmt;
use std::time::Duration;

/// Strategy used for the most recent pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Plain source read by a background thread through a bounded queue.
    Buffered,
    /// Synchronous reads through a decompression stream.
    Compressed,
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReadMode::Buffered => "buffered",
            ReadMode::Compressed => "compressed",
        })
    }
}

/// Snapshot of a reader's counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderStats {
    pub file: String,
    pub mode: Option<ReadMode>,
    pub lines: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl ReaderStats {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Whole lines per second; zero when no time has elapsed.
    pub fn lines_per_sec(&self) -> u64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            (self.lines as f64 / secs) as u64
        } else {
            0
        }
    }

    /// MiB per second; zero when no time has elapsed.
    pub fn mb_per_sec(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            self.bytes as f64 / (1024.0 * 1024.0) / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for ReaderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = self.mode.map_or("-".to_string(), |m| m.to_string());
        write!(
            f,
            "{}: mode={} lines={} bytes={} time={:.2}s lines/s={} MB/s={:.2}",
            self.file,
            mode,
            self.lines,
            self.bytes,
            self.elapsed_secs(),
            self.lines_per_sec(),
            self.mb_per_sec()
        )
    }
}
