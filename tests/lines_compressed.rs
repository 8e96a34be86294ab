use chunked_line_reader::{
    Format, LineReader, LineReaderError, ReadMode, ReaderOptions, default_chunk_size, detect,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn read_all(path: &Path, chunk_size: usize) -> Vec<String> {
    let opts = ReaderOptions::default().with_chunk_size(chunk_size);
    let mut rdr = LineReader::from_path(path, opts).expect("open");
    let lines = rdr
        .lines()
        .expect("start pass")
        .collect::<Result<Vec<_>, _>>()
        .expect("read lines");
    assert_eq!(rdr.stats().mode, Some(ReadMode::Compressed));
    lines
}

fn sample_text() -> String {
    let mut s = String::new();
    for i in 0..500 {
        s.push_str(&format!("{i}: naïve café ✓ {}\n", "z".repeat(i % 13)));
    }
    s.push_str("no newline at the end");
    s
}

fn expected_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_owned).collect()
}

#[test]
fn detect_by_extension() {
    assert_eq!(detect(Some(Path::new("a/b/log.txt.gz"))), Format::Gzip);
    assert_eq!(detect(Some(Path::new("LOG.BZ2"))), Format::Bzip2);
    assert_eq!(detect(Some(Path::new("x.xz"))), Format::Xz);
    assert_eq!(detect(Some(Path::new("x.lzma"))), Format::Lzma);
    assert_eq!(detect(Some(Path::new("x.tgz"))), Format::None);
    assert_eq!(detect(Some(Path::new("x.txt"))), Format::None);
    assert_eq!(detect(None), Format::None);
    assert_eq!("bz2".parse::<Format>().unwrap(), Format::Bzip2);
    assert_eq!(Format::Lzma.to_string(), "lzma");
    assert!(default_chunk_size(Format::None) > default_chunk_size(Format::Bzip2));
}

#[cfg(feature = "gzip")]
#[test]
fn gzip_trailing_newline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("xy.txt.gz");
    {
        let f = File::create(&path).unwrap();
        let mut enc = flate2::write::GzEncoder::new(f, flate2::Compression::fast());
        enc.write_all(b"x\ny\n").unwrap();
        enc.finish().unwrap();
    }
    assert_eq!(read_all(&path, 1), ["x", "y"]);
    assert_eq!(read_all(&path, 1024), ["x", "y"]);
}

#[cfg(feature = "gzip")]
#[test]
fn gzip_multi_member() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("multi.gz");
    {
        let mut f = File::create(&path).unwrap();
        for part in [&b"one\ntw"[..], &b"o\nthree\n"[..]] {
            let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(part).unwrap();
            f.write_all(&enc.finish().unwrap()).unwrap();
        }
    }
    assert_eq!(read_all(&path, 3), ["one", "two", "three"]);
}

#[cfg(feature = "gzip")]
#[test]
fn gzip_matches_plain_for_any_chunk_size() {
    let text = sample_text();
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.log.gz");
    {
        let f = File::create(&path).unwrap();
        let mut enc = flate2::write::GzEncoder::new(f, flate2::Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap();
    }
    for size in [1, 7, 4096] {
        assert_eq!(read_all(&path, size), expected_lines(&text), "chunk size {size}");
    }
}

#[cfg(feature = "gzip")]
#[test]
fn truncated_gzip_fails_after_earlier_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cut.log.gz");
    {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        for i in 0..2000 {
            writeln!(enc, "record {i} with some padding text").unwrap();
        }
        let full = enc.finish().unwrap();
        File::create(&path)
            .unwrap()
            .write_all(&full[..full.len() / 2])
            .unwrap();
    }

    let opts = ReaderOptions::default().with_chunk_size(64);
    let mut rdr = LineReader::from_path(&path, opts).unwrap();
    let mut yielded = 0u64;
    {
        let mut lines = rdr.lines().unwrap();
        loop {
            match lines.next() {
                Some(Ok(line)) => {
                    assert_eq!(line, format!("record {yielded} with some padding text"));
                    yielded += 1;
                }
                Some(Err(LineReaderError::Io { source, ctx })) => {
                    assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof);
                    assert_eq!(ctx.line_num, yielded);
                    break;
                }
                other => panic!("expected a line or an I/O error, got {other:?}"),
            }
        }
        assert!(yielded > 0 && yielded < 2000);
        assert!(lines.next().is_none());
    }
    assert_eq!(rdr.stats().lines, yielded);
}

#[cfg(feature = "gzip")]
#[test]
fn non_gzip_bytes_behind_gz_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fake.gz");
    File::create(&path).unwrap().write_all(b"plain text\n").unwrap();
    let mut rdr = LineReader::from_path(&path, ReaderOptions::default()).unwrap();
    let got: Vec<_> = rdr.lines().unwrap().collect();
    assert_eq!(got.len(), 1);
    assert!(matches!(got[0], Err(LineReaderError::Io { .. })));
    assert_eq!(rdr.stats().lines, 0);
}

#[cfg(feature = "bzip2")]
#[test]
fn bzip2_matches_plain() {
    let text = sample_text();
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.log.bz2");
    {
        let f = File::create(&path).unwrap();
        let mut enc = bzip2::write::BzEncoder::new(f, bzip2::Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap();
    }
    assert_eq!(read_all(&path, 5), expected_lines(&text));
}

#[cfg(feature = "xz")]
#[test]
fn xz_matches_plain() {
    let text = sample_text();
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.log.xz");
    {
        let f = File::create(&path).unwrap();
        let mut enc = xz2::write::XzEncoder::new(f, 6);
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap();
    }
    assert_eq!(read_all(&path, 11), expected_lines(&text));
}

#[cfg(feature = "xz")]
#[test]
fn lzma_alone_matches_plain() {
    use xz2::stream::{LzmaOptions, Stream};

    let text = sample_text();
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.log.lzma");
    {
        let f = File::create(&path).unwrap();
        let opts = LzmaOptions::new_preset(6).unwrap();
        let stream = Stream::new_lzma_encoder(&opts).unwrap();
        let mut enc = xz2::write::XzEncoder::new_stream(f, stream);
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap();
    }
    assert_eq!(read_all(&path, 2), expected_lines(&text));
}

#[test]
fn missing_compressed_file_fails_before_reading() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.gz");
    let mut rdr = LineReader::from_path(path, ReaderOptions::default()).unwrap();
    assert_eq!(rdr.format(), Format::Gzip);
    assert!(rdr.lines().is_err());
    assert_eq!(rdr.stats().lines, 0);
}
