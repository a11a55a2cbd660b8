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

//! VNC decoding implementations.
//!
//! This module provides the decoders for all supported rectangle encodings
//! and the dispatcher that selects one from the rectangle header. The
//! session layer owns the transport, the negotiated pixel format, and the
//! connection's zlib stream; decoders borrow them for one rectangle and
//! hand back an owned [`DecodedRectangle`].

use crate::error::{DecodeError, Result};
use crate::pixel::{Color, Cpixel};
use crate::protocol::{
    ColourMap, PixelFormat, Rectangle, ENCODING_COPYRECT, ENCODING_CURSOR, ENCODING_DESKTOP_SIZE,
    ENCODING_RAW, ENCODING_RRE, ENCODING_ZRLE,
};
use crate::zlib::ZlibStream;
use log::{debug, error, trace};
use std::io::Read;

mod common;
pub mod copyrect;
pub mod cursor;
pub mod raw;
pub mod rre;
pub mod zrle;

pub use rre::RreSubrect;

/// One decoded framebuffer update rectangle, in the form its encoding
/// naturally produces.
#[derive(Debug)]
pub enum DecodedRectangle {
    /// Raw pixels, decoded to colours in row-major order.
    Raw {
        /// `height` rows of `width` colours.
        pixels: Vec<Vec<Color>>,
    },
    /// Copy from another region of the consumer's framebuffer.
    CopyRect {
        /// Source X coordinate in the existing framebuffer.
        src_x: u16,
        /// Source Y coordinate in the existing framebuffer.
        src_y: u16,
    },
    /// Background colour plus solid subrectangles, painted in order.
    Rre {
        /// The colour the whole rectangle is painted first.
        background: Color,
        /// Subrectangles painted over the background, in wire order.
        subrects: Vec<RreSubrect>,
    },
    /// ZRLE pixels, still in compact form; the session expands them with
    /// the pixel format it negotiated.
    Zrle {
        /// `height` rows of `width` compact pixels.
        pixels: Vec<Vec<Cpixel>>,
    },
    /// A cursor shape update. The image is opaque bytes in the negotiated
    /// pixel format; this library does not render cursors.
    Cursor {
        /// `width * height` PIXELs of cursor image data.
        pixels: Vec<u8>,
        /// MSB-first visibility bitmask, one row per `ceil(width / 8)` bytes.
        mask: Vec<u8>,
    },
    /// The server resized the framebuffer; prior contents are invalid.
    DesktopSize {
        /// New framebuffer width.
        width: u16,
        /// New framebuffer height.
        height: u16,
    },
}

/// Decodes one rectangle's payload using the encoding named in its header.
///
/// `reader` is the session's byte transport positioned just past the
/// rectangle header; `zlib` is the connection's persistent inflater, only
/// touched by ZRLE rectangles. `colour_map` is required for colour-mapped
/// pixel formats and ignored otherwise.
///
/// # Errors
///
/// Any [`DecodeError`] is fatal to the rectangle, and the framing cannot be
/// recovered mid-stream: the session must close the transport. Unknown
/// encoding identifiers fail with [`DecodeError::UnknownEncoding`].
pub fn decode_rectangle<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    colour_map: Option<&ColourMap>,
    zlib: &mut ZlibStream,
    rect: &Rectangle,
) -> Result<DecodedRectangle> {
    trace!(
        "decoding {}x{} rectangle at ({}, {}), encoding {}",
        rect.width,
        rect.height,
        rect.x,
        rect.y,
        rect.encoding
    );

    match rect.encoding {
        ENCODING_RAW => Ok(DecodedRectangle::Raw {
            pixels: raw::decode(reader, format, colour_map, rect)?,
        }),
        ENCODING_COPYRECT => {
            let (src_x, src_y) = copyrect::decode(reader)?;
            Ok(DecodedRectangle::CopyRect { src_x, src_y })
        }
        ENCODING_RRE => {
            let (background, subrects) = rre::decode(reader, format, colour_map)?;
            Ok(DecodedRectangle::Rre {
                background,
                subrects,
            })
        }
        ENCODING_ZRLE => Ok(DecodedRectangle::Zrle {
            pixels: zrle::decode(reader, format, zlib, rect)?,
        }),
        ENCODING_CURSOR => {
            let (pixels, mask) = cursor::decode(reader, format, rect)?;
            Ok(DecodedRectangle::Cursor { pixels, mask })
        }
        ENCODING_DESKTOP_SIZE => {
            debug!("desktop resized to {}x{}", rect.width, rect.height);
            Ok(DecodedRectangle::DesktopSize {
                width: rect.width,
                height: rect.height,
            })
        }
        unknown => {
            error!("unknown encoding type {unknown}, cannot resynchronise");
            Err(DecodeError::UnknownEncoding(unknown))
        }
    }
}
