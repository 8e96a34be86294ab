use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::{Duration, Instant};

/// Upper bound on the up-front allocation for one chunk; larger chunks grow as
/// they fill so a tiny file never reserves the full chunk size.
const INITIAL_CHUNK_CAPACITY: usize = 4 * 1024 * 1024;

pub fn open_file(path: &Path) -> io::Result<File> {
    std::fs::File::open(path)
}

/// Open an uncompressed file as a byte source for the producer thread.
#[cfg(not(feature = "mmap"))]
pub fn open_plain(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    Ok(Box::new(open_file(path)?))
}

#[cfg(feature = "mmap")]
pub fn open_plain(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    use memmap2::Mmap;
    let f = open_file(path)?;
    // Own the Mmap inside Cursor so it can move to the producer thread.
    // The file must not be truncated while mapped.
    let mmap = unsafe { Mmap::map(&f) }?;
    Ok(Box::new(io::Cursor::new(mmap)))
}

/// Read until `size` bytes are collected or the source ends. An empty
/// result means end of stream.
pub fn read_chunk<R: Read + ?Sized>(r: &mut R, size: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(size.min(INITIAL_CHUNK_CAPACITY));
    r.take(size as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Start/stop markers for one iteration pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassTimer {
    started: Option<Instant>,
    elapsed: Duration,
}

impl PassTimer {
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.elapsed = Duration::ZERO;
    }

    /// Freeze the elapsed time. Later calls are no-ops.
    pub fn stop(&mut self) {
        if let Some(t) = self.started.take() {
            self.elapsed = t.elapsed();
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(t) => t.elapsed(),
            None => self.elapsed,
        }
    }
}
