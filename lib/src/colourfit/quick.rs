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

use core::f32;

use crate::colourblock::{self, pack_565, Bc1Block};
use crate::colourset::ColourSet;
use crate::math::Vec3;
use crate::palette::{colour_distance, colour_palette, nearest_colour, select_index4};

use super::ColourFitImpl;

const BASIS4: [f32; 4] = [1.0, 0.0, 2.0 / 3.0, 1.0 / 3.0];
const BASIS3: [f32; 3] = [1.0, 0.0, 0.5];

/// Bounding-box colour fit.
///
/// Takes the diagonal of the colour bounding box that best follows the data,
/// insets it slightly, assigns indices and refines the endpoints with a single
/// least-squares pass.
pub struct QuickFit<'a> {
    colourset: &'a ColourSet,
    weights: [f32; 3],
    start: Vec3,
    end: Vec3,
}

impl<'a> QuickFit<'a> {
    pub fn new(colourset: &'a ColourSet, weights: [f32; 3]) -> Self {
        let points = colourset.points();

        let mut max = Vec3::ZERO;
        let mut min = Vec3::ZERO;
        if let Some(&first) = points.first() {
            max = first;
            min = first;
            for p in &points[1..] {
                max = max.max(*p);
                min = min.min(*p);
            }
        }

        // pick the diagonal that matches the sign of the covariance
        let centre = (max + min) * 0.5;
        let mut cov_xz = 0f32;
        let mut cov_yz = 0f32;
        for p in points {
            let t = p - &centre;
            cov_xz += t.x() * t.z();
            cov_yz += t.y() * t.z();
        }

        let mut start = max.to_array();
        let mut end = min.to_array();
        if cov_xz < 0.0 {
            core::mem::swap(&mut start[0], &mut end[0]);
        }
        if cov_yz < 0.0 {
            core::mem::swap(&mut start[1], &mut end[1]);
        }
        let start = Vec3::new(start[0], start[1], start[2]);
        let end = Vec3::new(end[0], end[1], end[2]);

        // inset the diagonal by a sixteenth of its extent, less half an 8-bit step
        let inset = (&start - &end) * (1.0 / 16.0);
        let bias = (8.0 / 255.0) / 16.0;
        let inset = Vec3::new(
            shrink(inset.x(), bias),
            shrink(inset.y(), bias),
            shrink(inset.z(), bias),
        );

        QuickFit {
            colourset,
            weights,
            start: (start - inset).clamp_unit(),
            end: (end + inset).clamp_unit(),
        }
    }

    /// Assigns every point to its nearest palette entry, returning the
    /// per-point indices and the weighted error.
    fn assign(&self, col0: u16, col1: u16, codes: usize) -> ([u8; 16], f32) {
        let (palette, _) = colour_palette(col0, col1, codes == 3);
        let mut closest = [0u8; 16];
        let mut error = 0f32;

        for (j, &weight) in self.colourset.weights().iter().enumerate() {
            let colour = self.colourset.colour(j);
            let (index, d) = if codes == 4 {
                let mut d = [0f32; 4];
                for (d, entry) in d.iter_mut().zip(palette.iter()) {
                    *d = colour_distance(entry, &colour, &self.weights);
                }
                let index = select_index4(d);
                (index, d[index as usize])
            } else {
                nearest_colour(&palette, 3, &colour, &self.weights)
            };
            closest[j] = index;
            error += weight * d;
        }

        (closest, error)
    }

    /// Weighted least-squares endpoints for a fixed index assignment
    fn refine(&self, closest: &[u8; 16], basis: &[f32]) -> Option<(Vec3, Vec3)> {
        let mut alpha2_sum = 0f32;
        let mut beta2_sum = 0f32;
        let mut alphabeta_sum = 0f32;
        let mut alphax_sum = Vec3::ZERO;
        let mut betax_sum = Vec3::ZERO;

        let points = self.colourset.points();
        for (j, &weight) in self.colourset.weights().iter().enumerate() {
            let alpha = basis[closest[j] as usize];
            let beta = 1.0 - alpha;

            alpha2_sum += weight * alpha * alpha;
            beta2_sum += weight * beta * beta;
            alphabeta_sum += weight * alpha * beta;
            alphax_sum += points[j] * (weight * alpha);
            betax_sum += points[j] * (weight * beta);
        }

        let denom = alpha2_sum * beta2_sum - alphabeta_sum * alphabeta_sum;
        if libm::fabsf(denom) <= f32::EPSILON {
            return None;
        }
        let factor = 1.0 / denom;

        let start = (alphax_sum * beta2_sum - betax_sum * alphabeta_sum) * factor;
        let end = (betax_sum * alpha2_sum - alphax_sum * alphabeta_sum) * factor;

        Some((start.clamp_unit(), end.clamp_unit()))
    }

    fn fit(&self, codes: usize) -> ([u8; 16], u16, u16) {
        let basis: &[f32] = if codes == 4 { &BASIS4 } else { &BASIS3 };

        let mut col0 = pack_565(&self.start);
        let mut col1 = pack_565(&self.end);
        if codes == 3 && col0 > col1 {
            core::mem::swap(&mut col0, &mut col1);
        }
        let (mut closest, error) = self.assign(col0, col1, codes);

        // one refinement pass, kept only if it helps
        if let Some((start, end)) = self.refine(&closest, basis) {
            let mut a = pack_565(&start);
            let mut b = pack_565(&end);
            if codes == 3 && a > b {
                core::mem::swap(&mut a, &mut b);
            }
            let (refined, refined_error) = self.assign(a, b, codes);
            if refined_error < error {
                col0 = a;
                col1 = b;
                closest = refined;
            }
        }

        let mut indices = [0u8; 16];
        self.colourset.remap_indices(&closest, &mut indices);
        (indices, col0, col1)
    }
}

fn shrink(extent: f32, bias: f32) -> f32 {
    if extent >= 0.0 {
        (extent - bias).max(0.0)
    } else {
        (extent + bias).min(0.0)
    }
}

impl<'a> ColourFitImpl<'a> for QuickFit<'a> {
    fn colourset(&self) -> &'a ColourSet {
        self.colourset
    }

    fn compress3(&mut self) -> Option<Bc1Block> {
        let (indices, col0, col1) = self.fit(3);
        Some(colourblock::write3_packed(col0, col1, &indices))
    }

    fn compress4(&mut self) -> Option<Bc1Block> {
        let (indices, col0, col1) = self.fit(4);
        Some(colourblock::write4_packed(col0, col1, &indices))
    }
}
