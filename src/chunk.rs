//! Raw byte chunk sources.
//!
//! Compressed files are decompressed and read synchronously on the caller's
//! thread. Plain sources are read by a producer thread that hands chunks to
//! the consumer through a bounded queue, so at most
//! `QUEUE_CAPACITY * chunk_size` unconsumed bytes are ever buffered.

use crate::error::{ConfigError, IoContext, LineReaderError};
use crate::format::Format;
use crate::util::{open_file, read_chunk};

use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::{self, Read};
use std::path::Path;
use std::thread::{self, JoinHandle};

/// Chunks the producer may run ahead of the consumer.
pub const QUEUE_CAPACITY: usize = 8;

/// What the producer hands across the queue.
enum ChunkMsg {
    Chunk(Vec<u8>),
    Eof,
    Failed(io::Error),
}

/// Ordered sequence of non-empty raw chunks.
pub(crate) enum ChunkSource {
    Compressed(CompressedChunks),
    Threaded(ThreadedChunks),
}

impl Iterator for ChunkSource {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ChunkSource::Compressed(c) => c.next(),
            ChunkSource::Threaded(t) => t.next(),
        }
    }
}

/// Synchronous reads through a decompression stream.
pub(crate) struct CompressedChunks {
    inner: Option<Box<dyn Read + Send>>,
    chunk_size: usize,
}

impl CompressedChunks {
    pub(crate) fn open(
        format: Format,
        path: &Path,
        chunk_size: usize,
    ) -> Result<Self, LineReaderError> {
        let f = open_file(path).map_err(|e| LineReaderError::io_err(e, IoContext::default()))?;
        let inner = decompressor(format, f)?;
        Ok(Self {
            inner: Some(inner),
            chunk_size,
        })
    }
}

impl Iterator for CompressedChunks {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let rdr = self.inner.as_mut()?;
        match read_chunk(rdr, self.chunk_size) {
            Ok(chunk) if chunk.is_empty() => {
                // dropping the decoder closes the file
                self.inner = None;
                None
            }
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => {
                self.inner = None;
                Some(Err(e))
            }
        }
    }
}

#[allow(unused_variables)]
fn decompressor(format: Format, f: std::fs::File) -> Result<Box<dyn Read + Send>, LineReaderError> {
    match format {
        #[cfg(feature = "gzip")]
        Format::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(f))),
        #[cfg(feature = "bzip2")]
        Format::Bzip2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(f))),
        #[cfg(feature = "xz")]
        Format::Xz => Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(f))),
        #[cfg(feature = "xz")]
        Format::Lzma => {
            let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX).map_err(|e| {
                LineReaderError::io_err(io::Error::other(e), IoContext::default())
            })?;
            Ok(Box::new(xz2::read::XzDecoder::new_stream(f, stream)))
        }
        other => Err(ConfigError::UnsupportedFormat(other).into()),
    }
}

/// Consumer side of the read-ahead thread.
pub(crate) struct ThreadedChunks {
    rx: Receiver<ChunkMsg>,
    producer: Option<JoinHandle<()>>,
    done: bool,
}

impl ThreadedChunks {
    /// Move `src` into a new producer thread and start reading.
    pub(crate) fn spawn(
        src: Box<dyn Read + Send>,
        chunk_size: usize,
    ) -> Result<Self, LineReaderError> {
        let (tx, rx) = bounded(QUEUE_CAPACITY);
        let producer = thread::Builder::new()
            .name("line-reader-producer".to_string())
            .spawn(move || produce(src, chunk_size, tx))
            .map_err(|e| LineReaderError::io_err(e, IoContext::default()))?;
        Ok(Self {
            rx,
            producer: Some(producer),
            done: false,
        })
    }

    fn finish(&mut self) {
        self.done = true;
        // The producer has already sent its last message and is returning.
        if let Some(handle) = self.producer.take() {
            if handle.join().is_err() {
                log::warn!("chunk producer panicked after end of stream");
            }
        }
    }
}

impl Iterator for ThreadedChunks {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.rx.recv() {
            Ok(ChunkMsg::Chunk(chunk)) => Some(Ok(chunk)),
            Ok(ChunkMsg::Eof) => {
                self.finish();
                None
            }
            Ok(ChunkMsg::Failed(e)) => {
                self.finish();
                Some(Err(e))
            }
            Err(_) => {
                self.done = true;
                self.producer = None;
                Some(Err(io::Error::other("chunk producer exited without end of stream")))
            }
        }
    }
}

impl Drop for ThreadedChunks {
    fn drop(&mut self) {
        if !self.done {
            // Detach: once `rx` is gone the producer's next send fails and it
            // exits on its own, releasing the source.
            self.producer.take();
            log::trace!("abandoning chunk producer before end of stream");
        }
    }
}

fn produce(mut src: Box<dyn Read + Send>, chunk_size: usize, tx: Sender<ChunkMsg>) {
    loop {
        let msg = match read_chunk(&mut src, chunk_size) {
            Ok(chunk) if chunk.is_empty() => ChunkMsg::Eof,
            Ok(chunk) => ChunkMsg::Chunk(chunk),
            Err(e) => ChunkMsg::Failed(e),
        };
        let last = !matches!(msg, ChunkMsg::Chunk(_));
        if tx.send(msg).is_err() {
            log::warn!("chunk consumer went away before end of stream; stopping producer");
            return;
        }
        if last {
            return;
        }
    }
}
