// Copyright 2025 Dustin McAfee
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Connection-scoped zlib stream for ZRLE rectangles.
//!
//! RFC 6143 requires a single zlib stream per connection: every ZRLE
//! rectangle's payload is a continuation of the same deflate stream, and
//! back-references may reach into data from earlier rectangles. The
//! inflater here is therefore created once, lazily, and reused until the
//! connection closes. Destroying it mid-session corrupts every subsequent
//! ZRLE rectangle.
//!
//! Compressed input is appended with [`ZlibStream::feed`]; decompressed
//! output is pulled through the [`std::io::Read`] implementation, which the
//! tile readers drive one sub-encoding at a time.

use bytes::{Buf, BytesMut};
use flate2::{Decompress, FlushDecompress, Status};
use std::io::{self, Read};

/// A persistent zlib inflater with a tail-appendable compressed-input
/// buffer.
#[derive(Default)]
pub struct ZlibStream {
    inflater: Option<Decompress>,
    input: BytesMut,
}

impl ZlibStream {
    /// Creates an empty stream. The inflater itself is initialised on first
    /// use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends compressed bytes to the input buffer.
    ///
    /// Never blocks and never inflates; output is produced on demand by the
    /// `Read` implementation.
    pub fn feed(&mut self, data: &[u8]) {
        self.input.extend_from_slice(data);
    }

    /// Number of compressed bytes buffered but not yet consumed by the
    /// inflater.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl Read for ZlibStream {
    /// Inflates buffered input into `out`.
    ///
    /// Returns `Ok(0)` once no further output can be produced from the
    /// buffered input; `read_exact` callers observe that as an unexpected
    /// EOF, which the decoders surface as a truncation error. Corrupt
    /// compressed data and an unexpected end of the deflate stream surface
    /// as `InvalidData`.
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let inflater = self.inflater.get_or_insert_with(|| Decompress::new(true));

        loop {
            let in_before = inflater.total_in();
            let out_before = inflater.total_out();

            let status = inflater
                .decompress(&self.input, out, FlushDecompress::None)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            #[allow(clippy::cast_possible_truncation)] // bounded by the buffer sizes
            let consumed = (inflater.total_in() - in_before) as usize;
            #[allow(clippy::cast_possible_truncation)]
            let produced = (inflater.total_out() - out_before) as usize;
            self.input.advance(consumed);

            if let Status::StreamEnd = status {
                // A conforming server never finishes the per-connection
                // stream; it only ever sync-flushes.
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "unexpected end of the per-connection zlib stream",
                ));
            }

            // Retry only when input was consumed without any output yet;
            // otherwise report what we have (possibly zero, meaning the
            // buffered input is exhausted).
            if produced > 0 || consumed == 0 || self.input.is_empty() {
                return Ok(produced);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compress, Compression, FlushCompress};

    /// Compresses `data` on a persistent compressor with a sync flush, the
    /// way a VNC server emits ZRLE payloads.
    fn compress_sync(compressor: &mut Compress, data: &[u8]) -> Vec<u8> {
        let mut output = vec![0u8; data.len() * 2 + 128];
        let before_out = compressor.total_out();
        compressor
            .compress(data, &mut output, FlushCompress::Sync)
            .unwrap();
        let produced = (compressor.total_out() - before_out) as usize;
        output.truncate(produced);
        output
    }

    #[test]
    fn test_feed_then_read_exact() {
        let mut compressor = Compress::new(Compression::default(), true);
        let payload: Vec<u8> = (0u8..=255).cycle().take(1000).collect();

        let mut stream = ZlibStream::new();
        stream.feed(&compress_sync(&mut compressor, &payload));

        let mut decoded = vec![0u8; payload.len()];
        stream.read_exact(&mut decoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_state_survives_across_feeds() {
        // Two sync-flushed chunks of one deflate stream; the second only
        // decodes if the inflater kept its state from the first.
        let mut compressor = Compress::new(Compression::default(), true);
        let first = b"the quick brown fox jumps over the lazy dog".to_vec();
        let second = b"the quick brown fox naps under the lazy dog".to_vec();

        let mut stream = ZlibStream::new();
        stream.feed(&compress_sync(&mut compressor, &first));

        let mut decoded = vec![0u8; first.len()];
        stream.read_exact(&mut decoded).unwrap();
        assert_eq!(decoded, first);

        stream.feed(&compress_sync(&mut compressor, &second));
        let mut decoded = vec![0u8; second.len()];
        stream.read_exact(&mut decoded).unwrap();
        assert_eq!(decoded, second);
    }

    #[test]
    fn test_reading_past_input_is_eof() {
        let mut compressor = Compress::new(Compression::default(), true);
        let mut stream = ZlibStream::new();
        stream.feed(&compress_sync(&mut compressor, b"short"));

        let mut decoded = vec![0u8; 5];
        stream.read_exact(&mut decoded).unwrap();

        let mut more = [0u8; 1];
        let err = stream.read_exact(&mut more).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_corrupt_input_is_invalid_data() {
        let mut stream = ZlibStream::new();
        stream.feed(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let mut out = [0u8; 16];
        let err = stream.read(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
