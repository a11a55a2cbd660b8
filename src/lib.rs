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


//! # rfb-decodings
//!
//! Client-side decoding of VNC (RFB protocol, RFC 6143) framebuffer
//! updates.
//!
//! This library is the pixel-update decoding core of a VNC client. Given a
//! byte transport, the pixel format negotiated at `ServerInit`, and a
//! rectangle header, it reconstructs the rectangle's pixels with the
//! encoding named on the wire. The session layer — handshake,
//! authentication, message framing, input events — stays outside this
//! crate and drives it rectangle by rectangle.
//!
//! ## Features
//!
//! - **6 encodings**: Raw, CopyRect, RRE, ZRLE, and the Cursor and
//!   DesktopSize pseudo-encodings
//! - **All pixel formats**: 8/16/32-bit true colour and 8-bit colour maps
//! - **ZRLE**: full tile decoder with packed-palette, plain-RLE and
//!   palette-RLE sub-encodings over a connection-scoped zlib stream
//! - **Synchronous**: no runtime dependency; the decoder blocks only on
//!   the caller's transport reads
//!
//! ## Quick Start
//!
//! ```no_run
//! use rfb_decodings::{decode_rectangle, PixelFormat, Rectangle, ZlibStream};
//! use std::net::TcpStream;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The session layer performs the handshake and ServerInit exchange,
//!     // then loops over framebuffer update rectangles.
//!     let mut stream = TcpStream::connect("127.0.0.1:5900")?;
//!     let format = PixelFormat::rgba32();
//!     let mut zlib = ZlibStream::new();
//!
//!     let rect = Rectangle::read_header(&mut stream)?;
//!     let decoded = decode_rectangle(&mut stream, &format, None, &mut zlib, &rect)?;
//!     // ...composite `decoded` into the framebuffer...
//!     # let _ = decoded;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! session read loop
//!       │  Rectangle header (12 bytes, big-endian)
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │        decode_rectangle (dispatch)      │
//! └──┬──────┬───────┬───────┬───────┬───────┘
//!    ▼      ▼       ▼       ▼       ▼
//!   Raw  CopyRect  RRE    ZRLE   pseudo (Cursor, DesktopSize)
//!                          │
//!                          ▼
//!                 ZlibStream (one per connection)
//!                          │
//!                          ▼
//!                 64x64 tiles → sub-encodings → CPIXEL grid
//! ```
//!
//! Error handling is deliberately strict: rectangle framing cannot be
//! resynchronised mid-stream, and the ZRLE inflater state is shared by the
//! whole connection, so every [`DecodeError`] means the session should
//! close the transport.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoding;
pub mod error;
pub mod pixel;
pub mod protocol;
pub mod zlib;

// Re-exports
pub use decoding::{decode_rectangle, DecodedRectangle, RreSubrect};
pub use error::{DecodeError, Result};
pub use pixel::{decode_pixel, Color, Cpixel};
pub use protocol::{
    marshal_encodings, parse_encodings, ColourMap, PixelFormat, Rectangle, ENCODING_COPYRECT,
    ENCODING_CURSOR, ENCODING_DESKTOP_SIZE, ENCODING_RAW, ENCODING_RRE, ENCODING_ZRLE,
};
pub use zlib::ZlibStream;
