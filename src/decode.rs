//! Incremental decode and line split.
//!
//! Bytes go through one streaming `encoding_rs::Decoder` per pass. The decoder
//! keeps an incomplete multi-byte sequence at the end of a chunk and completes
//! it from the next chunk, so no chunk is ever decoded in isolation.

use crate::policy::DecodeErrorPolicy;

use encoding_rs::{CoderResult, Decoder, DecoderResult, Encoding};
use std::collections::VecDeque;

/// A malformed sequence under `DecodeErrorPolicy::Strict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Malformed {
    /// Offset of the first bad byte in the raw stream.
    pub byte_pos: u64,
}

pub(crate) struct LineSplitter {
    decoder: Decoder,
    policy: DecodeErrorPolicy,
    /// Decoded text not yet terminated by a newline.
    pending: String,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    /// Raw bytes handed to the decoder so far.
    byte_pos: u64,
}

impl LineSplitter {
    pub(crate) fn new(encoding: &'static Encoding, policy: DecodeErrorPolicy) -> Self {
        Self {
            decoder: encoding.new_decoder_without_bom_handling(),
            policy,
            pending: String::new(),
            scanned: 0,
            byte_pos: 0,
        }
    }

    /// Decode `chunk` and move every completed line into `out`.
    ///
    /// On a strict-policy failure, lines completed before the bad bytes are
    /// still delivered to `out`.
    pub(crate) fn push(
        &mut self,
        chunk: &[u8],
        out: &mut VecDeque<String>,
    ) -> Result<(), Malformed> {
        let res = self.decode(chunk, false);
        self.drain_lines(out);
        res
    }

    /// Flush the decoder and emit the trailing unterminated fragment, if any.
    pub(crate) fn finish(&mut self, out: &mut VecDeque<String>) -> Result<(), Malformed> {
        let res = self.decode(&[], true);
        self.drain_lines(out);
        res?;
        if !self.pending.is_empty() {
            self.scanned = 0;
            out.push_back(std::mem::take(&mut self.pending));
        }
        Ok(())
    }

    fn decode(&mut self, mut src: &[u8], last: bool) -> Result<(), Malformed> {
        if self.policy == DecodeErrorPolicy::Replace {
            loop {
                let want = self.decoder.max_utf8_buffer_length(src.len());
                self.pending.reserve(want.unwrap_or(src.len() * 3 + 16));
                let (res, read, _) = self.decoder.decode_to_string(src, &mut self.pending, last);
                src = &src[read..];
                self.byte_pos += read as u64;
                match res {
                    CoderResult::InputEmpty => return Ok(()),
                    CoderResult::OutputFull => continue,
                }
            }
        }

        loop {
            let want = self.decoder.max_utf8_buffer_length_without_replacement(src.len());
            self.pending.reserve(want.unwrap_or(src.len() * 3 + 16));
            let (res, read) = self.decoder.decode_to_string_without_replacement(
                src,
                &mut self.pending,
                last,
            );
            src = &src[read..];
            self.byte_pos += read as u64;
            match res {
                DecoderResult::InputEmpty => return Ok(()),
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(bad, extra) => {
                    if self.policy == DecodeErrorPolicy::Strict {
                        let skipped = u64::from(bad) + u64::from(extra);
                        return Err(Malformed {
                            byte_pos: self.byte_pos.saturating_sub(skipped),
                        });
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self, out: &mut VecDeque<String>) {
        let Some(rel) = self.pending[self.scanned..].rfind('\n') else {
            self.scanned = self.pending.len();
            return;
        };
        let cut = self.scanned + rel;
        let rest = self.pending.split_off(cut + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        self.scanned = self.pending.len();
        out.extend(complete[..cut].split('\n').map(str::to_owned));
    }
}
