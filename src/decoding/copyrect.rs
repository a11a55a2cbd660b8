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

//! VNC CopyRect encoding decoder.
//!
//! Carries no pixel data at all: just the source position from which the
//! consumer copies the rectangle out of its own framebuffer. Highly
//! efficient for scrolling operations.

use super::common;
use crate::error::Result;
use std::io::Read;

/// Decodes a CopyRect payload: the big-endian source coordinates.
pub fn decode<R: Read>(reader: &mut R) -> Result<(u16, u16)> {
    let src_x = common::read_u16_be(reader)?;
    let src_y = common::read_u16_be(reader)?;
    Ok((src_x, src_y))
}
