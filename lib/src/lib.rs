// Copyright (c) 2006 Simon Brown <si@sjbrown.co.uk>
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

//! A pure Rust BC1-BC5 block compressor and decompressor descended from Simon
//! Brown's **libsquish**.
//!
//! Every 4x4 block is fitted independently. Colour endpoints come from a
//! choice of fits, picked by [`Quality`], and the one that decodes closest to
//! the source wins. Alpha and the BC4/BC5 channels use interpolated ramps.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

mod alpha;
mod block;
mod colourblock;
mod colourfit;
mod colourset;
mod math;
pub mod palette;

#[cfg(test)]
mod test_data;

pub use crate::alpha::{AlphaBlock, ExplicitAlphaBlock};
pub use crate::block::{Channel, ColourBlock};
pub use crate::colourblock::Bc1Block;
pub use crate::colourfit::{optimal_endpoints_5, optimal_endpoints_6};
pub use crate::colourset::BC1_ALPHA_THRESHOLD;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Defines a compression format
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// RGB with optional 1-bit alpha
    Bc1,
    /// RGB with explicit 4-bit alpha
    Bc2,
    /// RGB with interpolated alpha
    Bc3,
    /// A single interpolated channel (red)
    Bc4,
    /// Two interpolated channels (red and green)
    Bc5,
}

/// How hard the compressor searches for good endpoints
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Quality {
    /// Bounding-box fit with one refinement pass
    Fastest,

    /// Cluster fit along the principal axis
    Normal,

    /// Iterative cluster fit; optimal search for alpha ramps
    Production,

    /// As `Production`, plus the exhaustive endpoint searches
    Highest,
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Normal
    }
}

/// How alpha affects colour fitting
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlphaMode {
    /// Colour is fitted regardless of alpha
    None,

    /// Colour error is weighed by alpha, so barely visible pixels matter less
    Transparency,
}

impl Default for AlphaMode {
    fn default() -> Self {
        AlphaMode::None
    }
}

/// RGB colour channel weights for use in block fitting
pub type ColourWeights = [f32; 3];

/// Uniform weights for each colour channel
pub const COLOUR_WEIGHTS_UNIFORM: ColourWeights = [1.0, 1.0, 1.0];

/// Weights based on the perceived brightness of each colour channel
pub const COLOUR_WEIGHTS_PERCEPTUAL: ColourWeights = [0.2126, 0.7152, 0.0722];

#[derive(Clone, Copy, Debug)]
pub struct Params {
    /// How hard to search (defaults to `Normal`)
    pub quality: Quality,

    /// Weigh the relative importance of each colour channel when fitting
    /// (defaults to perceptual weights)
    pub weights: ColourWeights,

    /// Whether colour fitting takes alpha into account (defaults to `None`)
    ///
    /// `Transparency` can significantly increase perceived quality for images
    /// that are rendered using alpha blending.
    pub alpha_mode: AlphaMode,

    /// Allow BC1 blocks in three-colour mode for opaque pixels (defaults to
    /// true). Blocks with punch-through alpha always use it.
    pub three_colour: bool,

    /// Upper bound on the endpoint pairs the exhaustive search at
    /// `Quality::Highest` may try per block; larger boxes are skipped
    pub search_budget: u32,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            quality: Quality::default(),
            weights: COLOUR_WEIGHTS_PERCEPTUAL,
            alpha_mode: AlphaMode::default(),
            three_colour: true,
            search_budget: 1 << 16,
        }
    }
}

/// A compressed 4x4 block in any of the supported formats
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressedBlock {
    Bc1(Bc1Block),
    Bc2(ExplicitAlphaBlock, Bc1Block),
    Bc3(AlphaBlock, Bc1Block),
    Bc4(AlphaBlock),
    Bc5(AlphaBlock, AlphaBlock),
}

impl CompressedBlock {
    pub fn format(&self) -> Format {
        match self {
            CompressedBlock::Bc1(..) => Format::Bc1,
            CompressedBlock::Bc2(..) => Format::Bc2,
            CompressedBlock::Bc3(..) => Format::Bc3,
            CompressedBlock::Bc4(..) => Format::Bc4,
            CompressedBlock::Bc5(..) => Format::Bc5,
        }
    }

    /// Writes the block in its storage layout
    ///
    /// * `output` - At least `format().block_size()` bytes
    pub fn write_to(&self, output: &mut [u8]) {
        assert!(output.len() >= self.format().block_size());

        match self {
            CompressedBlock::Bc1(colour) => {
                output[..8].copy_from_slice(&colour.to_bytes());
            }
            CompressedBlock::Bc2(alpha, colour) => {
                output[..8].copy_from_slice(&alpha.to_bytes());
                output[8..16].copy_from_slice(&colour.to_bytes());
            }
            CompressedBlock::Bc3(alpha, colour) => {
                output[..8].copy_from_slice(&alpha.to_bytes());
                output[8..16].copy_from_slice(&colour.to_bytes());
            }
            CompressedBlock::Bc4(red) => {
                output[..8].copy_from_slice(&red.to_bytes());
            }
            CompressedBlock::Bc5(red, green) => {
                output[..8].copy_from_slice(&red.to_bytes());
                output[8..16].copy_from_slice(&green.to_bytes());
            }
        }
    }
}

/// Returns number of blocks needed for an image of given dimension
pub fn num_blocks(size: usize) -> usize {
    (size + 3) / 4
}

impl Format {
    /// Decompresses an image in memory
    ///
    /// * `data`   - The compressed image data
    /// * `width`  - The width of the source image
    /// * `height` - The height of the source image
    /// * `output` - Space to store the decompressed RGBA8 image
    pub fn decompress(self, data: &[u8], width: usize, height: usize, output: &mut [u8]) {
        assert!(data.len() >= self.compressed_size(width, height));
        assert!(output.len() >= 4 * width * height);

        if width == 0 || height == 0 {
            return;
        }

        let blocks_wide = num_blocks(width);
        let block_size = self.block_size();
        let output = &mut output[..4 * width * height];

        #[cfg(feature = "rayon")]
        let output_rows = output.par_chunks_mut(width * 4 * 4);
        #[cfg(not(feature = "rayon"))]
        let output_rows = output.chunks_mut(width * 4 * 4);

        // loop over block rows
        output_rows.enumerate().for_each(|(y, output_row)| {
            let rows = output_row.len() / (4 * width);

            for x in 0..blocks_wide {
                // decompress the block
                let bidx = (x + y * blocks_wide) * block_size;
                let rgba = self.decompress_block(&data[bidx..bidx + block_size]);

                // write the pixels that lie inside the image
                for py in 0..rows {
                    for px in 0..4 {
                        let sx = 4 * x + px;
                        if sx < width {
                            let offset = 4 * (sx + py * width);
                            output_row[offset..offset + 4].copy_from_slice(&rgba[px + py * 4]);
                        }
                    }
                }
            }
        });
    }

    /// Returns how many bytes a 4x4 block of pixels will compress into
    pub fn block_size(self) -> usize {
        match self {
            Format::Bc1 | Format::Bc4 => 8,
            Format::Bc2 | Format::Bc3 | Format::Bc5 => 16,
        }
    }

    /// Computes the amount of space in bytes needed for an image of given size,
    /// accounting for padding to a multiple of 4x4 pixels
    ///
    /// * `width`  - Width of the uncompressed image
    /// * `height` - Height of the uncompressed image
    pub fn compressed_size(self, width: usize, height: usize) -> usize {
        // Number of blocks required for image of given dimensions
        let blocks = num_blocks(width) * num_blocks(height);
        blocks * self.block_size()
    }

    /// Compresses a single block
    pub fn compress_block(self, block: &ColourBlock, params: Params) -> CompressedBlock {
        let quality = params.quality;
        match self {
            Format::Bc1 => CompressedBlock::Bc1(colourfit::compress(block, self, &params)),
            Format::Bc2 => CompressedBlock::Bc2(
                ExplicitAlphaBlock::compress(block),
                colourfit::compress(block, self, &params),
            ),
            Format::Bc3 => CompressedBlock::Bc3(
                alpha::compress_ramp(block, 3, quality),
                colourfit::compress(block, self, &params),
            ),
            Format::Bc4 => CompressedBlock::Bc4(alpha::compress_ramp(block, 0, quality)),
            Format::Bc5 => CompressedBlock::Bc5(
                alpha::compress_ramp(block, 0, quality),
                alpha::compress_ramp(block, 1, quality),
            ),
        }
    }

    /// Compresses a 4x4 block of pixels, masking out some pixels e.g. for padding the
    /// image to a multiple of the block size.
    ///
    /// * `rgba`   - The uncompressed block of pixels
    /// * `mask`   - The valid pixel mask
    /// * `params` - Additional compressor parameters
    /// * `output` - Storage for the compressed block
    pub fn compress_block_masked(
        self,
        rgba: [[u8; 4]; 16],
        mask: u32,
        params: Params,
        output: &mut [u8],
    ) {
        let block = ColourBlock::with_mask(rgba, mask);
        self.compress_block(&block, params).write_to(output);
    }

    /// Decompresses a 4x4 block of pixels
    ///
    /// * `block` - The compressed block of pixels
    pub fn decompress_block(self, block: &[u8]) -> [[u8; 4]; 16] {
        debug_assert!(block.len() >= self.block_size());

        match self {
            Format::Bc1 => Bc1Block::from_bytes(&block[..8]).decode(true),
            Format::Bc2 => {
                let mut rgba = Bc1Block::from_bytes(&block[8..16]).decode(false);
                let alpha = ExplicitAlphaBlock::from_bytes(&block[..8]).decode();
                for (pixel, a) in rgba.iter_mut().zip(alpha) {
                    pixel[3] = a;
                }
                rgba
            }
            Format::Bc3 => {
                let mut rgba = Bc1Block::from_bytes(&block[8..16]).decode(false);
                let alpha = AlphaBlock::from_bytes(&block[..8]).decode();
                for (pixel, a) in rgba.iter_mut().zip(alpha) {
                    pixel[3] = a;
                }
                rgba
            }
            Format::Bc4 => {
                let red = AlphaBlock::from_bytes(&block[..8]).decode();
                red.map(|r| [r, r, r, u8::MAX])
            }
            Format::Bc5 => {
                let red = AlphaBlock::from_bytes(&block[..8]).decode();
                let green = AlphaBlock::from_bytes(&block[8..16]).decode();
                let mut rgba = [[0, 0, 0, u8::MAX]; 16];
                for (pixel, (r, g)) in rgba.iter_mut().zip(red.iter().zip(green.iter())) {
                    pixel[0] = *r;
                    pixel[1] = *g;
                }
                rgba
            }
        }
    }

    /// Compresses an image in memory
    ///
    /// * `rgba`   - The uncompressed pixel data
    /// * `width`  - The width of the source image
    /// * `height` - The height of the source image
    /// * `params` - Additional compressor parameters
    /// * `output` - Output buffer for the compressed image. Ensure that this has
    /// at least as much space available as `compressed_size` suggests.
    ///
    /// Blocks along the right and bottom edges repeat their existing pixels.
    pub fn compress(
        self,
        rgba: &[u8],
        width: usize,
        height: usize,
        params: Params,
        output: &mut [u8],
    ) {
        assert!(rgba.len() >= 4 * width * height);
        assert!(output.len() >= self.compressed_size(width, height));

        if width == 0 || height == 0 {
            return;
        }

        let block_size = self.block_size();
        let blocks_wide = num_blocks(width);
        let output = &mut output[..self.compressed_size(width, height)];

        #[cfg(feature = "rayon")]
        let output_rows = output.par_chunks_mut(blocks_wide * block_size);
        #[cfg(not(feature = "rayon"))]
        let output_rows = output.chunks_mut(blocks_wide * block_size);

        output_rows.enumerate().for_each(|(y, output_row)| {
            let output_blocks = output_row.chunks_mut(block_size);

            output_blocks.enumerate().for_each(|(x, output_block)| {
                let block = ColourBlock::from_image(rgba, width, height, x, y);
                self.compress_block(&block, params).write_to(output_block);
            });
        });
    }
}

//--------------------------------------------------------------------------------
// Unit tests
//--------------------------------------------------------------------------------
