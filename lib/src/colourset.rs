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

use crate::block::ColourBlock;
use crate::colourblock::Bc1Block;
use crate::math::Vec3;
use crate::palette::{colour_distance, PaletteMode};
use crate::Format;

/// BC1 pixels with alpha below this are encoded as punch-through transparent
pub const BC1_ALPHA_THRESHOLD: u8 = 128;

/// The distinct colours of a block with their summed weights
pub struct ColourSet {
    count: usize,
    points: [Vec3; 16],
    colours: [[u8; 4]; 16],
    weights: [f32; 16],
    remap: [i8; 16],
    first: [u8; 16],
    transparent: bool,
}

impl ColourSet {
    pub fn new(block: &ColourBlock, format: Format, weigh_by_alpha: bool) -> ColourSet {
        let rgba = block.colours();

        let mut set = ColourSet {
            count: 0,
            points: [Vec3::ZERO; 16],
            colours: [[0u8; 4]; 16],
            weights: [0f32; 16],
            remap: [-1i8; 16],
            first: [0u8; 16],
            transparent: false,
        };

        // create the minimal set
        for i in 0..rgba.len() {
            // unweighted pixels are ignored
            let weight = block.weight(i);
            if weight <= 0.0 {
                continue;
            }

            // BC1 uses binary alpha
            if format == Format::Bc1 && rgba[i][3] < BC1_ALPHA_THRESHOLD {
                set.transparent = true;
                continue;
            }

            let weight = if weigh_by_alpha {
                // ensure weight is always nonzero even when alpha is not
                weight * (i32::from(rgba[i][3]) + 1) as f32 / 256f32
            } else {
                weight
            };

            // merge with a previous point of the same colour
            let duplicate = (0..set.count).find(|&j| {
                let c = &set.colours[j];
                c[0] == rgba[i][0] && c[1] == rgba[i][1] && c[2] == rgba[i][2]
            });

            match duplicate {
                Some(j) => {
                    set.weights[j] += weight;
                    set.remap[i] = j as i8;
                }
                None => {
                    let j = set.count;
                    set.points[j] = Vec3::from_rgb([rgba[i][0], rgba[i][1], rgba[i][2]]);
                    set.colours[j] = rgba[i];
                    set.weights[j] = weight;
                    set.first[j] = i as u8;
                    set.remap[i] = j as i8;
                    set.count += 1;
                }
            }
        }

        debug_assert!(set.count <= 16);
        set
    }

    /// True if some pixels must decode as punch-through transparent
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points[..self.count]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights[..self.count]
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total_weight(&self) -> f32 {
        self.weights().iter().sum()
    }

    /// Weighted mean of all points
    pub fn mean(&self) -> Vec3 {
        let total = self.total_weight();
        if total <= 0.0 {
            return Vec3::ZERO;
        }
        let sum: Vec3 = self
            .points()
            .iter()
            .zip(self.weights())
            .map(|(p, &w)| p * w)
            .sum();
        sum / total
    }

    /// True if every point has equal red, green and blue
    pub fn is_greyscale(&self) -> bool {
        self.colours[..self.count]
            .iter()
            .all(|c| c[0] == c[1] && c[1] == c[2])
    }

    pub fn colour(&self, index: usize) -> [u8; 4] {
        debug_assert!(index < self.count);
        self.colours[index]
    }

    /// Expands per-point indices to per-pixel indices. Pixels outside the set
    /// get index 3, which is transparent black in three-colour mode.
    pub fn remap_indices(&self, source: &[u8; 16], target: &mut [u8; 16]) {
        for (i, target) in target.iter_mut().enumerate() {
            let j = self.remap[i];

            if j == -1 {
                // palette has 4 elements, last one is transparent black if transparency is used
                *target = 3;
            } else {
                *target = source[j as usize];
            }
        }
    }

    /// Weighted squared error of the set as a decoder would reconstruct it
    /// from `block`, in 8-bit units.
    ///
    /// Blocks that would make punch-through pixels opaque score infinity.
    pub fn error(&self, block: &Bc1Block, is_bc1: bool, weights: &[f32; 3]) -> f32 {
        let palette = block.palette(is_bc1);
        let indices = block.index_array();
        let three_colour = is_bc1 && block.mode() == PaletteMode::ThreeColour;

        if self.transparent {
            let opaque_leak = self
                .remap
                .iter()
                .zip(indices.iter())
                .any(|(&j, &index)| j == -1 && (!three_colour || index != 3));
            if opaque_leak {
                return f32::INFINITY;
            }
        }

        let mut error = 0.0;
        for j in 0..self.count {
            let index = indices[self.first[j] as usize];
            if three_colour && index == 3 {
                // opaque pixel decoded as transparent
                return f32::INFINITY;
            }
            error += self.weights[j] * colour_distance(&palette[index as usize], &self.colours[j], weights);
        }
        error
    }
}
