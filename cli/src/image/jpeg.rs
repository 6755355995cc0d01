// Copyright (c) 2018-2021 Jan Solanti <jhs@psonet.com>
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to	deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
// CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE
// SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use jpeg_decoder::{Decoder, PixelFormat};
use tracing::debug;

use super::{expand_to_rgba, RawImage};
use crate::error::{CliError, Result};

pub fn read(path: &Path) -> Result<RawImage> {
    let file = File::open(path).map_err(|e| CliError::io(path, e))?;
    let mut decoder = Decoder::new(BufReader::new(file));
    let buf = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| CliError::Unsupported("JPEG without a frame header".into()))?;

    let channels = match info.pixel_format {
        PixelFormat::L8 => 1,
        PixelFormat::RGB24 => 3,
        _ => {
            return Err(CliError::Unsupported(
                "only greyscale and RGB JPEG images are supported".into(),
            ))
        }
    };
    debug!(width = info.width, height = info.height, channels, "decoded JPEG");

    Ok(RawImage {
        width: info.width as usize,
        height: info.height as usize,
        data: expand_to_rgba(&buf, channels),
    })
}
