use crate::chunk::{ChunkSource, CompressedChunks, ThreadedChunks};
use crate::decode::{LineSplitter, Malformed};
use crate::error::{ConfigError, IoContext, LineReaderError};
use crate::format::{self, Format, default_chunk_size};
use crate::policy::ReaderOptions;
use crate::stats::{ReadMode, ReaderStats};
use crate::util::{PassTimer, open_plain};

use encoding_rs::Encoding;
use std::collections::VecDeque;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Identity of the byte source behind a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    /// An already-open stream, with its name if one was given.
    Stream(Option<String>),
}

/// An already-open byte stream plus what is known about how it was opened.
pub struct StreamSource {
    reader: Box<dyn Read + Send>,
    name: Option<String>,
    mode: Option<String>,
}

impl StreamSource {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            name: None,
            mode: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Open mode string (e.g. `"rb"`). A mode without `b` is rejected.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

/// Line reader over a plain or compressed file, or an open byte stream.
///
/// Call [`LineReader::lines`] to run one pass. The pass releases its source
/// when it ends, fails, or is dropped part way. Path sources are reopened by
/// the next pass; stream sources can only be read once.
pub struct LineReader {
    src: Source,
    stream: Option<Box<dyn Read + Send>>,
    opts: ReaderOptions,
    encoding: &'static Encoding,
    format: Format,
    mode: Option<ReadMode>,
    line_num: u64,
    byte_pos: u64,
    timer: PassTimer,
    closed: bool,
}

impl LineReader {
    /// Reader over a file path. The format is detected from the extension
    /// unless `opts.format` is set. The file is opened when a pass starts.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        opts: ReaderOptions,
    ) -> Result<Self, LineReaderError> {
        let path = path.as_ref();
        let encoding = validate(&opts)?;
        let format = opts.format.unwrap_or_else(|| format::detect(Some(path)));
        Ok(Self::build(Source::Path(path.to_path_buf()), None, opts, encoding, format))
    }

    /// Reader over an open stream. Streams are uncompressed.
    pub fn from_stream(
        stream: StreamSource,
        opts: ReaderOptions,
    ) -> Result<Self, LineReaderError> {
        if let Some(mode) = &stream.mode {
            if !mode.contains('b') {
                return Err(ConfigError::NotBinary { mode: mode.clone() }.into());
            }
        }
        let encoding = validate(&opts)?;
        let format = opts.format.unwrap_or_else(|| format::detect(None));
        Ok(Self::build(
            Source::Stream(stream.name),
            Some(stream.reader),
            opts,
            encoding,
            format,
        ))
    }

    /// Wrap any `Read` (stdin, sockets, in-memory buffers).
    pub fn from_reader<R: Read + Send + 'static>(
        reader: R,
        opts: ReaderOptions,
    ) -> Result<Self, LineReaderError> {
        Self::from_stream(StreamSource::new(reader), opts)
    }

    fn build(
        src: Source,
        stream: Option<Box<dyn Read + Send>>,
        opts: ReaderOptions,
        encoding: &'static Encoding,
        format: Format,
    ) -> Self {
        Self {
            src,
            stream,
            opts,
            encoding,
            format,
            mode: None,
            line_num: 0,
            byte_pos: 0,
            timer: PassTimer::default(),
            closed: false,
        }
    }

    #[inline]
    pub fn source(&self) -> &Source {
        &self.src
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn encoding(&self) -> &'static str {
        self.encoding.name()
    }

    /// Bytes per read for this reader.
    pub fn chunk_size(&self) -> usize {
        self.opts.chunk_size.unwrap_or_else(|| default_chunk_size(self.format))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start a pass. Counters restart from zero.
    ///
    /// Configuration problems (stream where a path is needed, disabled codec,
    /// consumed stream) and open failures are returned here, before any data
    /// is read.
    pub fn lines(&mut self) -> Result<Lines<'_>, LineReaderError> {
        if self.closed {
            return Err(ConfigError::Closed.into());
        }
        let chunk_size = self.chunk_size();
        self.line_num = 0;
        self.byte_pos = 0;
        self.timer.start();

        let chunks = match self.open_chunks(chunk_size) {
            Ok(c) => c,
            Err(e) => {
                self.timer.stop();
                return Err(e);
            }
        };
        if self.opts.debug {
            log::debug!(
                "pass start: file={} format={} mode={} chunk_size={} encoding={}",
                self.display_name(),
                self.format,
                self.mode.map_or("-".to_string(), |m| m.to_string()),
                chunk_size,
                self.encoding.name()
            );
        }

        let splitter = LineSplitter::new(self.encoding, self.opts.decode_errors);
        Ok(Lines {
            reader: self,
            chunks: Some(chunks),
            splitter,
            ready: VecDeque::new(),
            failed: None,
            finished: false,
        })
    }

    fn open_chunks(&mut self, chunk_size: usize) -> Result<ChunkSource, LineReaderError> {
        if self.format.is_compressed() {
            let Source::Path(path) = &self.src else {
                return Err(ConfigError::PathRequired { format: self.format }.into());
            };
            let chunks = CompressedChunks::open(self.format, path, chunk_size)?;
            self.mode = Some(ReadMode::Compressed);
            return Ok(ChunkSource::Compressed(chunks));
        }

        let src = match &self.src {
            Source::Path(path) => {
                open_plain(path).map_err(|e| LineReaderError::io_err(e, IoContext::default()))?
            }
            Source::Stream(_) => self.stream.take().ok_or(ConfigError::StreamConsumed)?,
        };
        let chunks = ThreadedChunks::spawn(src, chunk_size)?;
        self.mode = Some(ReadMode::Buffered);
        Ok(ChunkSource::Threaded(chunks))
    }

    /// Release the source and refuse further passes. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.stream = None;
        self.timer.stop();
        self.closed = true;
    }

    /// Counters of the current or most recent pass.
    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            file: self.display_name(),
            mode: self.mode,
            lines: self.line_num,
            bytes: self.byte_pos,
            elapsed: self.timer.elapsed(),
        }
    }

    fn display_name(&self) -> String {
        let name = match &self.src {
            Source::Path(p) => p.as_path(),
            Source::Stream(Some(n)) => Path::new(n),
            Source::Stream(None) => return "<stream>".to_string(),
        };
        name.file_name()
            .unwrap_or(name.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    #[inline]
    fn ctx(&self) -> IoContext {
        IoContext {
            byte_pos: self.byte_pos,
            line_num: self.line_num,
        }
    }
}

fn validate(opts: &ReaderOptions) -> Result<&'static Encoding, ConfigError> {
    if opts.chunk_size == Some(0) {
        return Err(ConfigError::InvalidChunkSize);
    }
    Encoding::for_label(opts.encoding.as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(opts.encoding.clone()))
}

/// One pass over a reader's lines, terminators removed.
///
/// Yields `Err` at most once; the pass is over after that.
pub struct Lines<'a> {
    reader: &'a mut LineReader,
    chunks: Option<ChunkSource>,
    splitter: LineSplitter,
    /// Lines decoded but not yet handed out.
    ready: VecDeque<String>,
    failed: Option<LineReaderError>,
    finished: bool,
}

impl Lines<'_> {
    /// Counters so far in this pass.
    pub fn stats(&self) -> ReaderStats {
        self.reader.stats()
    }

    fn fail_decode(&mut self, m: Malformed) {
        self.chunks = None;
        let ctx = IoContext {
            byte_pos: m.byte_pos,
            line_num: self.reader.line_num + self.ready.len() as u64,
        };
        self.failed = Some(LineReaderError::decode_err(self.reader.encoding.name(), ctx));
    }

    fn end_pass(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.chunks = None;
        self.reader.timer.stop();
        if self.reader.opts.debug {
            let st = self.reader.stats();
            log::debug!(
                "pass end: file={} lines={} bytes={} elapsed={:.2} ms",
                st.file,
                st.lines,
                st.bytes,
                st.elapsed.as_secs_f64() * 1000.0
            );
        }
    }
}

impl Iterator for Lines<'_> {
    type Item = Result<String, LineReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                self.reader.line_num += 1;
                return Some(Ok(line));
            }
            if let Some(err) = self.failed.take() {
                self.end_pass();
                return Some(Err(err));
            }
            let Some(chunks) = self.chunks.as_mut() else {
                self.end_pass();
                return None;
            };
            match chunks.next() {
                Some(Ok(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    self.reader.byte_pos += chunk.len() as u64;
                    log::trace!("chunk of {} bytes (total {})", chunk.len(), self.reader.byte_pos);
                    if let Err(m) = self.splitter.push(&chunk, &mut self.ready) {
                        self.fail_decode(m);
                    }
                }
                Some(Err(e)) => {
                    self.chunks = None;
                    self.failed = Some(LineReaderError::io_err(e, self.reader.ctx()));
                }
                None => {
                    self.chunks = None;
                    if let Err(m) = self.splitter.finish(&mut self.ready) {
                        self.fail_decode(m);
                    }
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Lines<'_> {}

impl Drop for Lines<'_> {
    fn drop(&mut self) {
        self.end_pass();
    }
}
