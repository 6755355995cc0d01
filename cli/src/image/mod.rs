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

use std::path::Path;

use blockfit::Channel;

use crate::error::{CliError, Result};

pub mod jpeg;
pub mod png;

/// An RGBA8 image
pub struct RawImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RawImage {
    /// Rearranges the channels of every pixel
    pub fn swizzle(&mut self, channels: [Channel; 4]) {
        for pixel in self.data.chunks_exact_mut(4) {
            let source = [pixel[0], pixel[1], pixel[2], pixel[3]];
            pixel.copy_from_slice(&Channel::swizzle(channels, &source));
        }
    }
}

/// Reads a PNG or JPEG file, picking the decoder by extension
pub fn read(path: &Path) -> Result<RawImage> {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .ok_or_else(|| {
            CliError::Unsupported(format!(
                "{} has no extension, can't guess type",
                path.display()
            ))
        })?;

    match ext.as_str() {
        "jpg" | "jpeg" => jpeg::read(path),
        "png" => png::read(path),
        _ => Err(CliError::Unsupported(format!(
            "unrecognized image format '{}'. Supported formats are PNG and JPEG",
            ext
        ))),
    }
}

/// Expands grey, grey+alpha or RGB pixels to RGBA
pub(crate) fn expand_to_rgba(buf: &[u8], channels: usize) -> Vec<u8> {
    match channels {
        1 => buf.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        2 => buf
            .chunks_exact(2)
            .flat_map(|la| [la[0], la[0], la[0], la[1]])
            .collect(),
        3 => buf
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        _ => buf.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_to_rgba() {
        assert_eq!(expand_to_rgba(&[7, 9], 1), vec![7, 7, 7, 255, 9, 9, 9, 255]);
        assert_eq!(expand_to_rgba(&[7, 9], 2), vec![7, 7, 7, 9]);
        assert_eq!(expand_to_rgba(&[1, 2, 3], 3), vec![1, 2, 3, 255]);
    }

    #[test]
    fn swizzle_reorders_channels() {
        let mut image = RawImage {
            width: 1,
            height: 1,
            data: vec![10, 20, 30, 40],
        };
        image.swizzle([Channel::Alpha, Channel::Blue, Channel::Zero, Channel::One]);
        assert_eq!(image.data, vec![40, 30, 0, 255]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            read(Path::new("picture.bmp")),
            Err(CliError::Unsupported(_))
        ));
        assert!(matches!(
            read(Path::new("picture")),
            Err(CliError::Unsupported(_))
        ));
    }
}
