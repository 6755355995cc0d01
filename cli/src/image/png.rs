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
use std::io::BufWriter;
use std::path::Path;

use png::{BitDepth, ColorType, Transformations};
use tracing::debug;

use super::{expand_to_rgba, RawImage};
use crate::error::{CliError, Result};

pub fn read(path: &Path) -> Result<RawImage> {
    let file = File::open(path).map_err(|e| CliError::io(path, e))?;
    let mut decoder = png::Decoder::new(file);
    // palettes and low bit depths are expanded to 8 bits per channel
    decoder.set_transformations(Transformations::EXPAND);

    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    buf.truncate(frame.buffer_size());

    if frame.bit_depth != BitDepth::Eight {
        return Err(CliError::Unsupported(
            "only PNG images with 8 bits per channel are supported".into(),
        ));
    }

    let channels = match frame.color_type {
        ColorType::Grayscale => 1,
        ColorType::GrayscaleAlpha => 2,
        ColorType::Rgb => 3,
        ColorType::Rgba => 4,
        ColorType::Indexed => {
            return Err(CliError::Unsupported("unexpanded indexed PNG".into()))
        }
    };
    debug!(
        width = frame.width,
        height = frame.height,
        channels,
        "decoded PNG"
    );

    Ok(RawImage {
        width: frame.width as usize,
        height: frame.height as usize,
        data: expand_to_rgba(&buf, channels),
    })
}

pub fn write(path: &Path, width: u32, height: u32, data: &[u8]) -> Result<()> {
    let file = File::create(path).map_err(|e| CliError::io(path, e))?;
    let w = &mut BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;

    Ok(())
}
