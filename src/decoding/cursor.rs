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

//! Rich Cursor pseudo-encoding decoder.
//!
//! Carries the cursor shape: `width * height` PIXELs followed by a bitmask
//! of `height * ceil(width / 8)` bytes, MSB-first, where a set bit marks a
//! visible pixel. The rectangle's x and y carry the hotspot. The image is
//! surfaced as opaque bytes; rendering is the consumer's concern.

use super::common;
use crate::error::Result;
use crate::protocol::{PixelFormat, Rectangle};
use std::io::Read;

/// Decodes a cursor shape update into its raw pixel block and mask.
///
/// Zero dimensions yield an empty cursor: both buffers come back empty.
pub fn decode<R: Read>(
    reader: &mut R,
    format: &PixelFormat,
    rect: &Rectangle,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let width = rect.width as usize;
    let height = rect.height as usize;

    let pixels = common::read_vec(reader, width * height * format.bytes_per_pixel())?;
    let mask = common::read_vec(reader, height * width.div_ceil(8))?;
    Ok((pixels, mask))
}
