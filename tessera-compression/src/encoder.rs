//! Incremental gzip encoding
//!
//! Compresses a body chunk by chunk as it is produced, rather than
//! buffering the whole response. Output is drained from the encoder after
//! every call, so nothing accumulates beyond deflate's own window.
//!
//! ```
//! use tessera_compression::GzipEncoder;
//!
//! let mut encoder = GzipEncoder::new(6).unwrap();
//! let mut out = Vec::new();
//! out.extend_from_slice(&encoder.compress_chunk(b"Hello, ").unwrap());
//! out.extend_from_slice(&encoder.compress_chunk(b"world!").unwrap());
//! out.extend_from_slice(&encoder.finish().unwrap());
//! assert_eq!(&out[..2], &[0x1f, 0x8b]);
//! ```

use crate::config::{MAX_LEVEL, MIN_LEVEL};
use crate::{CompressionError, Result};
use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

/// Streaming gzip encoder over an in-memory buffer
pub struct GzipEncoder {
    encoder: GzEncoder<Vec<u8>>,
    bytes_in: u64,
    bytes_out: u64,
}

impl GzipEncoder {
    /// Create an encoder at `level`, which must be within 1..=9
    pub fn new(level: u32) -> Result<Self> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(CompressionError::InvalidLevel(level, MIN_LEVEL, MAX_LEVEL));
        }
        Ok(Self {
            encoder: GzEncoder::new(Vec::with_capacity(8192), Compression::new(level)),
            bytes_in: 0,
            bytes_out: 0,
        })
    }

    /// Feed plaintext and return whatever compressed output is ready.
    ///
    /// The result is often empty: deflate holds input back until it has
    /// enough to emit a block.
    pub fn compress_chunk(&mut self, data: &[u8]) -> Result<Bytes> {
        if data.is_empty() {
            return Ok(Bytes::new());
        }
        self.encoder
            .write_all(data)
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
        self.bytes_in += data.len() as u64;
        Ok(self.drain())
    }

    /// Sync-flush so that everything fed so far can be decoded by the client
    pub fn flush(&mut self) -> Result<Bytes> {
        self.encoder
            .flush()
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
        Ok(self.drain())
    }

    /// Terminate the stream and return the remaining output and trailer
    pub fn finish(mut self) -> Result<Bytes> {
        self.encoder
            .try_finish()
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
        Ok(self.drain())
    }

    pub fn stats(&self) -> CompressionStats {
        CompressionStats {
            bytes_in: self.bytes_in,
            bytes_out: self.bytes_out,
            ratio: if self.bytes_in > 0 {
                self.bytes_out as f64 / self.bytes_in as f64
            } else {
                1.0
            },
        }
    }

    fn drain(&mut self) -> Bytes {
        let output = std::mem::take(self.encoder.get_mut());
        self.bytes_out += output.len() as u64;
        Bytes::from(output)
    }
}

/// Byte counts for one encoded body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionStats {
    /// Plaintext bytes fed in
    pub bytes_in: u64,
    /// Gzip bytes produced
    pub bytes_out: u64,
    /// Out/in, lower is better
    pub ratio: f64,
}

impl CompressionStats {
    /// Space saved as a percentage (0-100)
    pub fn savings_percent(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        (1.0 - self.ratio) * 100.0
    }
}
