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

//! Wire-level types shared by every rectangle decoder.
//!
//! This module holds the pieces of RFC 6143 the decoders agree on: the
//! encoding identifiers, the negotiated [`PixelFormat`], the [`ColourMap`]
//! for palette-colour sessions, the per-rectangle header, and the body of
//! the client's `SetEncodings` message.
//!
//! During normal operation the server streams framebuffer updates, each a
//! sequence of rectangles. A rectangle opens with a 12-byte big-endian
//! header naming its target region and the encoding of the payload behind
//! it; the session parses the header with [`Rectangle::read_header`] and
//! hands it to [`crate::decode_rectangle`] along with the format fixed at
//! `ServerInit`.

use crate::pixel::Color;
use bytes::{BufMut, BytesMut};
use std::io::{self, Read};

/// Raw encoding: uncompressed pixels in row-major order.
pub const ENCODING_RAW: i32 = 0;

/// CopyRect encoding: the region is copied from elsewhere in the client's
/// own framebuffer; only the source position travels on the wire.
pub const ENCODING_COPYRECT: i32 = 1;

/// RRE encoding: a background colour and a list of solid subrectangles.
pub const ENCODING_RRE: i32 = 2;

/// ZRLE encoding: 64x64 tiles with palettised and run-length
/// sub-encodings, deflated through a connection-scoped zlib stream.
pub const ENCODING_ZRLE: i32 = 16;

/// Cursor pseudo-encoding: carries the pointer shape and its visibility
/// mask instead of framebuffer pixels.
pub const ENCODING_CURSOR: i32 = -239;

/// DesktopSize pseudo-encoding: announces new framebuffer dimensions.
pub const ENCODING_DESKTOP_SIZE: i32 = -223;

/// How the server lays out one pixel on the wire.
///
/// Negotiated once during initialisation and fixed for the lifetime of the
/// session. True-colour formats embed each channel in the pixel value,
/// positioned by its shift and bounded by its max; colour-mapped formats
/// instead carry an index into the session's [`ColourMap`].
#[derive(Debug, Clone)]
pub struct PixelFormat {
    /// Wire size of one pixel, in bits. The protocol defines 8, 16 and 32.
    pub bits_per_pixel: u8,
    /// How many of those bits carry colour information.
    pub depth: u8,
    /// Multi-byte pixel values arrive big-endian when set.
    pub big_endian: bool,
    /// Channel extraction applies when set; otherwise pixel values index
    /// the colour map.
    pub true_colour: bool,
    /// Largest red value a pixel can carry, e.g. 255 for an 8-bit channel.
    pub red_max: u16,
    /// Right-shift that brings the red channel down to the low bits.
    pub red_shift: u8,
    /// Largest green value.
    pub green_max: u16,
    /// Right-shift that brings the green channel down to the low bits.
    pub green_shift: u8,
    /// Largest blue value.
    pub blue_max: u16,
    /// Right-shift that brings the blue channel down to the low bits.
    pub blue_shift: u8,
}

impl PixelFormat {
    /// Little-endian true-colour format with the given channel geometry,
    /// maxes and shifts in red, green, blue order.
    fn truecolour(
        bits_per_pixel: u8,
        depth: u8,
        maxes: (u16, u16, u16),
        shifts: (u8, u8, u8),
    ) -> Self {
        Self {
            bits_per_pixel,
            depth,
            big_endian: false,
            true_colour: true,
            red_max: maxes.0,
            red_shift: shifts.0,
            green_max: maxes.1,
            green_shift: shifts.1,
            blue_max: maxes.2,
            blue_shift: shifts.2,
        }
    }

    /// The common 32-bit format: 8 bits per channel, red in the lowest
    /// byte, one always-zero padding byte.
    #[must_use]
    pub fn rgba32() -> Self {
        Self::truecolour(32, 24, (255, 255, 255), (0, 8, 16))
    }

    /// 16-bit RGB565, the usual choice of embedded displays and
    /// bandwidth-constrained clients.
    #[must_use]
    pub fn rgb565() -> Self {
        Self::truecolour(16, 16, (31, 63, 31), (11, 5, 0))
    }

    /// 16-bit RGB555: five bits per channel with the top bit unused.
    #[must_use]
    pub fn rgb555() -> Self {
        Self::truecolour(16, 15, (31, 31, 31), (10, 5, 0))
    }

    /// 8-bit BGR233, seen on very low bandwidth sessions and legacy
    /// servers.
    #[must_use]
    pub fn bgr233() -> Self {
        Self::truecolour(8, 8, (7, 7, 3), (0, 3, 6))
    }

    /// Number of bytes one PIXEL occupies on the wire.
    #[must_use]
    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }

    /// Number of bytes one CPIXEL (compact pixel) occupies inside ZRLE
    /// tiles.
    ///
    /// CPIXEL is the same as PIXEL except when the format is true colour
    /// with 32 bits per pixel and a depth of 24 or less; then the
    /// always-zero byte is dropped and only the 3 significant bytes travel
    /// on the wire.
    #[must_use]
    pub fn bytes_per_cpixel(&self) -> usize {
        if self.true_colour && self.bits_per_pixel == 32 && self.depth <= 24 {
            3
        } else {
            self.bytes_per_pixel()
        }
    }

    /// Whether the decoder can work with this format.
    ///
    /// Rejects pixel sizes the protocol does not define, depths wider than
    /// the pixel, colour maps at anything but 8bpp, and true-colour
    /// channel layouts that spill outside the depth or the pixel value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if !matches!(self.bits_per_pixel, 8 | 16 | 32) {
            return false;
        }
        if self.depth == 0 || self.depth > self.bits_per_pixel {
            return false;
        }
        if !self.true_colour {
            return self.bits_per_pixel == 8;
        }

        // The channel widths together must fit in the depth, and each
        // shifted channel must stay inside the pixel value.
        let width = |max: u16| 16 - max.leading_zeros();
        let total = width(self.red_max) + width(self.green_max) + width(self.blue_max);
        if total > u32::from(self.depth) {
            return false;
        }

        let fits = |max: u16, shift: u8| {
            shift < 32 && (u64::from(max) << shift) < (1u64 << self.bits_per_pixel)
        };
        fits(self.red_max, self.red_shift)
            && fits(self.green_max, self.green_shift)
            && fits(self.blue_max, self.blue_shift)
    }

    /// Serialises the 16-byte wire form carried inside `ServerInit` and
    /// `SetPixelFormat` (the last three bytes are padding).
    pub fn write_to(&self, buf: &mut BytesMut) {
        let mut wire = [0u8; 16];
        wire[0] = self.bits_per_pixel;
        wire[1] = self.depth;
        wire[2] = u8::from(self.big_endian);
        wire[3] = u8::from(self.true_colour);
        wire[4..6].copy_from_slice(&self.red_max.to_be_bytes());
        wire[6..8].copy_from_slice(&self.green_max.to_be_bytes());
        wire[8..10].copy_from_slice(&self.blue_max.to_be_bytes());
        wire[10] = self.red_shift;
        wire[11] = self.green_shift;
        wire[12] = self.blue_shift;
        buf.extend_from_slice(&wire);
    }

    /// Reads the 16-byte wire form.
    ///
    /// No validity check is applied here; sessions accepting a format from
    /// the network should gate on [`PixelFormat::is_valid`] before
    /// decoding with it.
    ///
    /// # Errors
    ///
    /// Fails with an `io::Error` when the reader cannot supply all 16
    /// bytes.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut wire = [0u8; 16];
        reader.read_exact(&mut wire)?;
        Ok(Self {
            bits_per_pixel: wire[0],
            depth: wire[1],
            big_endian: wire[2] != 0,
            true_colour: wire[3] != 0,
            red_max: u16::from_be_bytes([wire[4], wire[5]]),
            red_shift: wire[10],
            green_max: u16::from_be_bytes([wire[6], wire[7]]),
            green_shift: wire[11],
            blue_max: u16::from_be_bytes([wire[8], wire[9]]),
            blue_shift: wire[12],
        })
    }
}

/// The colour map used by palette-colour pixel formats.
///
/// Maps on-wire pixel values to decoded colours. Populated by the session
/// layer from `SetColourMapEntries` messages; the decoder only reads it.
#[derive(Debug, Clone, Default)]
pub struct ColourMap {
    entries: Vec<Color>,
}

impl ColourMap {
    /// Creates a colour map from its entries, indexed from zero.
    #[must_use]
    pub fn new(entries: Vec<Color>) -> Self {
        Self { entries }
    }

    /// Looks up the colour for a pixel value.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Color> {
        self.entries.get(index).copied()
    }

    /// Number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Header of one rectangle within a framebuffer update.
///
/// Names the target region and the encoding of the payload that follows
/// it. The session reads one of these per rectangle and passes it to
/// [`crate::decode_rectangle`] unchanged.
#[derive(Debug, Clone)]
pub struct Rectangle {
    /// Left edge of the target region.
    pub x: u16,
    /// Top edge of the target region.
    pub y: u16,
    /// Region width in pixels.
    pub width: u16,
    /// Region height in pixels.
    pub height: u16,
    /// Signed identifier of the encoding used for the payload.
    pub encoding: i32,
}

impl Rectangle {
    /// Reads the 12-byte big-endian header: x, y, width, height, then the
    /// encoding identifier.
    ///
    /// # Errors
    ///
    /// Fails with an `io::Error` when the transport cannot supply 12
    /// bytes.
    pub fn read_header<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut header = [0u8; 12];
        reader.read_exact(&mut header)?;
        Ok(Self {
            x: u16::from_be_bytes([header[0], header[1]]),
            y: u16::from_be_bytes([header[2], header[3]]),
            width: u16::from_be_bytes([header[4], header[5]]),
            height: u16::from_be_bytes([header[6], header[7]]),
            encoding: i32::from_be_bytes([header[8], header[9], header[10], header[11]]),
        })
    }

    /// Writes the 12-byte header; the exact inverse of
    /// [`Rectangle::read_header`]. Useful for building test streams and
    /// server-bound traffic.
    pub fn write_header(&self, buf: &mut BytesMut) {
        let mut header = [0u8; 12];
        header[0..2].copy_from_slice(&self.x.to_be_bytes());
        header[2..4].copy_from_slice(&self.y.to_be_bytes());
        header[4..6].copy_from_slice(&self.width.to_be_bytes());
        header[6..8].copy_from_slice(&self.height.to_be_bytes());
        header[8..12].copy_from_slice(&self.encoding.to_be_bytes());
        buf.extend_from_slice(&header);
    }
}

/// Serialises the client's preferred-encodings list.
///
/// Produces the body of a `SetEncodings` message: consecutive big-endian
/// `i32` encoding identifiers in the caller's order. The order is observable
/// by the server, which picks the first mutually supported encoding.
#[must_use]
pub fn marshal_encodings(encodings: &[i32]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(encodings.len() * 4);
    for &encoding in encodings {
        buf.put_i32(encoding);
    }
    buf
}

/// Parses a marshalled encoding list back into identifiers.
///
/// The exact inverse of [`marshal_encodings`]. Trailing bytes that do not
/// form a whole identifier are ignored.
#[must_use]
pub fn parse_encodings(data: &[u8]) -> Vec<i32> {
    data.chunks_exact(4)
        .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
