//! Error types for the RFB decoding library.

use std::io;
use thiserror::Error;

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while decoding framebuffer updates.
///
/// Every kind is fatal to the enclosing rectangle. Errors raised inside a
/// ZRLE rectangle are also fatal to the connection, because the persistent
/// inflater state can no longer be trusted; callers must close the transport
/// rather than attempt to resynchronise.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// I/O error on the byte transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transport or the inflater ran out of bytes before the encoding
    /// was complete.
    #[error("stream truncated mid-rectangle")]
    Truncated,

    /// The rectangle header named an encoding this library does not know.
    #[error("unknown encoding type {0}")]
    UnknownEncoding(i32),

    /// A ZRLE tile used a reserved sub-encoding value (17..=127 or 129).
    #[error("invalid ZRLE sub-encoding {0}")]
    InvalidSubencoding(u8),

    /// A ZRLE tile referenced a palette entry that was never transmitted.
    #[error("palette index {index} out of bounds for palette of size {palette_size}")]
    PaletteIndexOob {
        /// The offending index as it appeared on the wire.
        index: u8,
        /// Number of entries the tile's palette actually carries.
        palette_size: usize,
    },

    /// A run-length code was not terminated within the tile's area.
    #[error("unterminated run length")]
    RunUnterminated,

    /// A run extended past the end of its tile.
    #[error("run of {run} pixels overruns tile with {remaining} pixels remaining")]
    RunOverrun {
        /// Decoded run length.
        run: usize,
        /// Pixels left unfilled in the tile.
        remaining: usize,
    },

    /// Pixel bytes inconsistent with the negotiated pixel format, or a
    /// colour-mapped pixel without a colour map.
    #[error("malformed pixel: {0}")]
    MalformedPixel(String),

    /// The inflater reported corrupt compressed data.
    #[error("zlib error: {0}")]
    Zlib(String),
}
