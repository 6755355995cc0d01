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

use crate::colourblock::{self, Bc1Block};
use crate::colourset::ColourSet;
use crate::math::{f32_to_i32_clamped, Vec3};

use super::single_lut::*;
use super::ColourFitImpl;

/// Encodes one colour for the whole set using the single-colour tables.
///
/// Exact up to the table error when the set holds a single colour; for larger
/// sets it encodes their weighted mean, which makes it the baseline every
/// other fit has to beat.
pub struct SingleColourFit<'a> {
    colourset: &'a ColourSet,
    colour: [u8; 3],
    weights: [f32; 3],
    start: Vec3,
    end: Vec3,
    index: u8,
    error: f32,
}

impl<'a> SingleColourFit<'a> {
    pub fn new(colourset: &'a ColourSet, weights: [f32; 3]) -> Self {
        let c = if colourset.count() > 0 {
            colourset.colour(0)
        } else {
            [0; 4]
        };
        Self::with_colour(colourset, [c[0], c[1], c[2]], weights)
    }

    /// Fits the weighted mean colour of the set
    pub fn mean(colourset: &'a ColourSet, weights: [f32; 3]) -> Self {
        let mean = colourset.mean();
        let colour = [
            f32_to_i32_clamped(mean.x() * 255.0, 255) as u8,
            f32_to_i32_clamped(mean.y() * 255.0, 255) as u8,
            f32_to_i32_clamped(mean.z() * 255.0, 255) as u8,
        ];
        Self::with_colour(colourset, colour, weights)
    }

    fn with_colour(colourset: &'a ColourSet, colour: [u8; 3], weights: [f32; 3]) -> Self {
        SingleColourFit {
            colourset,
            colour,
            weights,
            start: Vec3::ZERO,
            end: Vec3::ZERO,
            index: 0,
            error: f32::MAX,
        }
    }

    fn compute_endpoints(&mut self, lut: [&[SingleColourLookup; 256]; 3]) {
        // check each index combination (endpoint and intermediate)
        self.error = f32::MAX;
        for index in 0..2 {
            // check the error for this codebook index
            let mut error = 0f32;
            let mut sources = [&lut[0][0].sources[0]; 3];

            for channel in 0..3 {
                // store a reference to the source for this channel
                let target = self.colour[channel];
                sources[channel] = &lut[channel][target as usize].sources[index];

                // accumulate the error
                let diff = f32::from(sources[channel].error);
                error += self.weights[channel] * diff * diff;
            }

            // keep these if the error is lower
            if error < self.error {
                self.start = Vec3::new(
                    f32::from(sources[0].start) / 31.0,
                    f32::from(sources[1].start) / 63.0,
                    f32::from(sources[2].start) / 31.0,
                );
                self.end = Vec3::new(
                    f32::from(sources[0].end) / 31.0,
                    f32::from(sources[1].end) / 63.0,
                    f32::from(sources[2].end) / 31.0,
                );
                self.index = 2 * index as u8;
                self.error = error;
            }
        }
    }

    fn indices(&self) -> [u8; 16] {
        let mut indices = [0u8; 16];
        self.colourset
            .remap_indices(&[self.index; 16], &mut indices);
        indices
    }
}

impl<'a> ColourFitImpl<'a> for SingleColourFit<'a> {
    fn colourset(&self) -> &'a ColourSet {
        self.colourset
    }

    fn compress3(&mut self) -> Option<Bc1Block> {
        self.compute_endpoints([&LOOKUP_5_3, &LOOKUP_6_3, &LOOKUP_5_3]);
        Some(colourblock::write3(&self.start, &self.end, &self.indices()))
    }

    fn compress4(&mut self) -> Option<Bc1Block> {
        self.compute_endpoints([&LOOKUP_5_4, &LOOKUP_6_4, &LOOKUP_5_4]);
        Some(colourblock::write4(&self.start, &self.end, &self.indices()))
    }
}
