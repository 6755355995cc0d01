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

use core::cmp::Ordering;
use core::f32;

use crate::colourblock::{self, Bc1Block};
use crate::colourset::ColourSet;
use crate::math::{Sym3x3, Vec3, Vec4};

use super::ColourFitImpl;

const MAX_ITERATIONS: usize = 8;

/// Which implementation solves and scores each candidate partition.
///
/// Both run the same float operations in the same order, so they select the
/// same partition for the same input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kernel {
    /// Four lanes at once, the point weight riding in the w lane
    Vector,
    /// One channel at a time
    Scalar,
}

impl Default for Kernel {
    fn default() -> Self {
        if cfg!(feature = "scalar-fit") {
            Kernel::Scalar
        } else {
            Kernel::Vector
        }
    }
}

/// Least-squares endpoints and error for one partition, given its weighted
/// sums. The constant term of the error is left out.
trait Solver {
    fn solve(
        alphax_sum: Vec4,
        betax_sum: Vec4,
        alphabeta_sum: Vec4,
        weights: &Vec4,
    ) -> (Vec3, Vec3, f32);
}

struct VectorSolver;

impl Solver for VectorSolver {
    #[inline]
    fn solve(
        alphax_sum: Vec4,
        betax_sum: Vec4,
        alphabeta_sum: Vec4,
        weights: &Vec4,
    ) -> (Vec3, Vec3, f32) {
        let two = Vec4::splat(2.0);
        let one = Vec4::splat(1.0);
        let zero = Vec4::ZERO;
        let half = Vec4::splat(0.5);
        let grid = Vec4::new(31.0, 63.0, 31.0, 0.0);
        let gridrcp = Vec4::new(1.0 / 31.0, 1.0 / 63.0, 1.0 / 31.0, 0.0);

        let alpha2_sum = alphax_sum.splat_w();
        let beta2_sum = betax_sum.splat_w();

        // compute the least-squares optimal points
        let factor = ((alpha2_sum * beta2_sum) - alphabeta_sum * alphabeta_sum).reciprocal();
        let a = ((alphax_sum * beta2_sum) - betax_sum * alphabeta_sum) * factor;
        let b = ((betax_sum * alpha2_sum) - alphax_sum * alphabeta_sum) * factor;

        // clamp to the grid
        let a = one.min(zero.max(a));
        let b = one.min(zero.max(b));
        let a = (grid * a + half).truncate() * gridrcp;
        let b = (grid * b + half).truncate() * gridrcp;

        // compute the error (we skip the constant xxsum)
        let e1 = (a * a) * alpha2_sum + (b * b * beta2_sum);
        let e2 = (a * b * alphabeta_sum) - a * alphax_sum;
        let e3 = e2 - b * betax_sum;
        let e4 = two * e3 + e1;

        // apply the channel weights to the error term
        let e5 = e4 * *weights;
        let error = e5.splat_x() + e5.splat_y() + e5.splat_z();

        (a.to_vec3(), b.to_vec3(), error.x())
    }
}

struct ScalarSolver;

impl Solver for ScalarSolver {
    #[inline]
    fn solve(
        alphax_sum: Vec4,
        betax_sum: Vec4,
        alphabeta_sum: Vec4,
        weights: &Vec4,
    ) -> (Vec3, Vec3, f32) {
        const GRID: [f32; 3] = [31.0, 63.0, 31.0];
        const GRIDRCP: [f32; 3] = [1.0 / 31.0, 1.0 / 63.0, 1.0 / 31.0];

        let alphax = [alphax_sum.x(), alphax_sum.y(), alphax_sum.z()];
        let betax = [betax_sum.x(), betax_sum.y(), betax_sum.z()];
        let channel_weights = [weights.x(), weights.y(), weights.z()];
        let alpha2 = alphax_sum.w();
        let beta2 = betax_sum.w();
        let alphabeta = alphabeta_sum.w();

        let factor = 1.0 / ((alpha2 * beta2) - alphabeta * alphabeta);

        let mut start = [0f32; 3];
        let mut end = [0f32; 3];
        let mut terms = [0f32; 3];
        for c in 0..3 {
            let a = ((alphax[c] * beta2) - betax[c] * alphabeta) * factor;
            let b = ((betax[c] * alpha2) - alphax[c] * alphabeta) * factor;

            let a = 1f32.min(0f32.max(a));
            let b = 1f32.min(0f32.max(b));
            let a = libm::truncf(GRID[c] * a + 0.5) * GRIDRCP[c];
            let b = libm::truncf(GRID[c] * b + 0.5) * GRIDRCP[c];

            let e1 = (a * a) * alpha2 + (b * b * beta2);
            let e2 = (a * b * alphabeta) - a * alphax[c];
            let e3 = e2 - b * betax[c];
            let e4 = 2.0 * e3 + e1;

            start[c] = a;
            end[c] = b;
            terms[c] = e4 * channel_weights[c];
        }

        (
            Vec3::new(start[0], start[1], start[2]),
            Vec3::new(end[0], end[1], end[2]),
            terms[0] + terms[1] + terms[2],
        )
    }
}

/// The best partition of the ordered points found by a search
#[derive(Clone, Copy, Debug, PartialEq)]
struct Split {
    start: Vec3,
    end: Vec3,
    error: f32,
    iteration: usize,
    i: usize,
    j: usize,
    k: usize,
}

/// Colour fit that orders the points along the principal axis and tries every
/// partition of that ordering into contiguous clusters, solving for the
/// optimal endpoints of each one.
pub struct ClusterFit<'a> {
    colourset: &'a ColourSet,
    weights: Vec4,
    kernel: Kernel,
    num_iterations: usize,
    principle: Vec3,
    order: [[u8; 16]; MAX_ITERATIONS],
    points_weights: [Vec4; 16],
    xsum_wsum: Vec4,
}

impl<'a> ClusterFit<'a> {
    /// With `iterate`, the ordering is refined along the best endpoint axis
    /// until it stops improving or repeats.
    pub fn new(colourset: &'a ColourSet, weights: [f32; 3], iterate: bool) -> Self {
        Self::with_kernel(colourset, weights, iterate, Kernel::default())
    }

    pub fn with_kernel(
        colourset: &'a ColourSet,
        weights: [f32; 3],
        iterate: bool,
        kernel: Kernel,
    ) -> Self {
        // get the covariance matrix
        let covariance = Sym3x3::weighted_covariance(colourset.points(), colourset.weights());

        ClusterFit {
            colourset,
            weights: Vec4::new(weights[0], weights[1], weights[2], 1.0),
            kernel,
            num_iterations: if iterate { MAX_ITERATIONS } else { 1 },
            principle: covariance.principle_component(),
            order: [[0u8; 16]; MAX_ITERATIONS],
            points_weights: [Vec4::ZERO; 16],
            xsum_wsum: Vec4::ZERO,
        }
    }

    fn construct_ordering(&mut self, axis: &Vec3, iteration: usize) -> bool {
        // cache some values
        let count = self.colourset.count();
        let values = self.colourset.points();

        // build list of dot products
        let mut dps = [(0usize, 0f32); 16];
        for i in 0..count {
            dps[i] = (i, values[i].dot(axis));
        }

        // sort fn for floats - NaN & Inf are pushed to the end of the list
        fn fcmp(a: f32, b: f32) -> Ordering {
            match (a, b) {
                (x, y) if !x.is_finite() && !y.is_finite() => Ordering::Equal,
                (x, _) if !x.is_finite() => Ordering::Greater,
                (_, y) if !y.is_finite() => Ordering::Less,
                (_, _) => a.total_cmp(&b),
            }
        }

        // sort numbered list based on dot product value, equal products keep
        // their set order
        dps[..count].sort_unstable_by(|a, b| fcmp(a.1, b.1).then(a.0.cmp(&b.0)));

        // this is our ordering now
        for (a, b) in self.order[iteration].iter_mut().zip(dps[..count].iter()) {
            *a = b.0 as u8;
        }

        // check if this ordering is unique (does not run on iteration 0)
        let current = &self.order[iteration][..count];
        if self.order[..iteration]
            .iter()
            .any(|previous| &previous[..count] == current)
        {
            return false;
        }

        // copy the ordering and weigh all the points
        let weights = self.colourset.weights();
        self.xsum_wsum = Vec4::ZERO;
        for i in 0..count {
            let j = self.order[iteration][i] as usize;
            let p = Vec4::from_vec3(&values[j], 1.0);
            let x = p * Vec4::splat(weights[j]);
            self.points_weights[i] = x;
            self.xsum_wsum += x;
        }

        true
    }

    fn search3<S: Solver>(&mut self) -> Option<Split> {
        let count = self.colourset.count();
        let half_half2 = Vec4::new(0.5, 0.5, 0.5, 0.25);
        let zero = Vec4::ZERO;

        let mut best: Option<Split> = None;

        // inital ordering is computed using principle axis
        let mut axis = self.principle;

        for iteration in 0..self.num_iterations {
            // generate new unique ordering, if possible
            if !self.construct_ordering(&axis, iteration) {
                break;
            }

            // first cluster [0,i) is at the start
            let mut part0 = zero;
            for i in 0..count {
                // second cluster [i,j) is halfway along
                let mut part1 = if i == 0 { self.points_weights[0] } else { zero };
                let jmin = if i == 0 { 1 } else { i };

                for j in jmin..=count {
                    // last cluster [j,count) is at the end
                    let part2 = self.xsum_wsum - part1 - part0;

                    // compute least squares term directly
                    let alphax_sum = part1 * half_half2 + part0;
                    let betax_sum = part1 * half_half2 + part2;
                    let alphabeta_sum = (part1 * half_half2).splat_w();

                    let (start, end, error) =
                        S::solve(alphax_sum, betax_sum, alphabeta_sum, &self.weights);

                    // keep the solution if it wins
                    if best.map_or(true, |best| error < best.error) {
                        best = Some(Split {
                            start,
                            end,
                            error,
                            iteration,
                            i,
                            j,
                            k: count,
                        });
                    }

                    // advance
                    if j < count {
                        part1 += self.points_weights[j];
                    }
                }

                // advance
                part0 += self.points_weights[i];
            }

            match best {
                // compute new axis for next iteration
                Some(split) if split.iteration == iteration => axis = split.end - split.start,
                // stop if we didn't improve in this iteration
                _ => break,
            }
        }

        best
    }

    fn search4<S: Solver>(&mut self) -> Option<Split> {
        let count = self.colourset.count();
        let onethird_onethird2 = Vec4::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 9.0);
        let twothirds_twothirds2 = Vec4::new(2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0, 4.0 / 9.0);
        let twoninths = Vec4::splat(2.0 / 9.0);
        let zero = Vec4::ZERO;

        let mut best: Option<Split> = None;

        // inital ordering is computed using principle axis
        let mut axis = self.principle;

        for iteration in 0..self.num_iterations {
            // generate new unique ordering, if possible
            if !self.construct_ordering(&axis, iteration) {
                break;
            }

            // first cluster [0,i) is at the start
            let mut part0 = zero;
            for i in 0..count {
                // second cluster [i,j) is one third along
                let mut part1 = zero;

                for j in i..=count {
                    // third cluster [j, k) is two thirds along
                    let mut part2 = if j == 0 { self.points_weights[0] } else { zero };
                    let kmin = if j == 0 { 1 } else { j };

                    for k in kmin..=count {
                        // last cluster [k, count) is at the end
                        let part3 = self.xsum_wsum - part2 - part1 - part0;

                        // compute least squares terms directly
                        let alphax_sum =
                            part2 * onethird_onethird2 + (part1 * twothirds_twothirds2 + part0);
                        let betax_sum =
                            part1 * onethird_onethird2 + (part2 * twothirds_twothirds2 + part3);
                        let alphabeta_sum = twoninths * (part1 + part2).splat_w();

                        let (start, end, error) =
                            S::solve(alphax_sum, betax_sum, alphabeta_sum, &self.weights);

                        // keep the solution if it wins
                        if best.map_or(true, |best| error < best.error) {
                            best = Some(Split {
                                start,
                                end,
                                error,
                                iteration,
                                i,
                                j,
                                k,
                            });
                        }

                        // advance
                        if k < count {
                            part2 += self.points_weights[k];
                        }
                    }

                    // advance
                    if j < count {
                        part1 += self.points_weights[j];
                    }
                }

                // advance
                part0 += self.points_weights[i];
            }

            match best {
                // compute new axis for next iteration
                Some(split) if split.iteration == iteration => axis = split.end - split.start,
                // stop if we didn't improve in this iteration
                _ => break,
            }
        }

        best
    }

    /// Per-pixel indices for a split, clusters in `order` getting `codes`
    fn indices(&self, split: &Split, codes: [u8; 4]) -> [u8; 16] {
        let count = self.colourset.count();
        let order = &self.order[split.iteration];

        let mut unordered = [0u8; 16];
        for (m, &j) in order.iter().enumerate().take(count) {
            unordered[j as usize] = if m < split.i {
                codes[0]
            } else if m < split.j {
                codes[1]
            } else if m < split.k {
                codes[2]
            } else {
                codes[3]
            };
        }

        let mut indices = [0u8; 16];
        self.colourset.remap_indices(&unordered, &mut indices);
        indices
    }
}

impl<'a> ColourFitImpl<'a> for ClusterFit<'a> {
    fn colourset(&self) -> &'a ColourSet {
        self.colourset
    }

    fn compress3(&mut self) -> Option<Bc1Block> {
        let split = match self.kernel {
            Kernel::Vector => self.search3::<VectorSolver>(),
            Kernel::Scalar => self.search3::<ScalarSolver>(),
        }?;

        // start, halfway, end; k is always count
        let indices = self.indices(&split, [0, 2, 1, 1]);
        Some(colourblock::write3(&split.start, &split.end, &indices))
    }

    fn compress4(&mut self) -> Option<Bc1Block> {
        let split = match self.kernel {
            Kernel::Vector => self.search4::<VectorSolver>(),
            Kernel::Scalar => self.search4::<ScalarSolver>(),
        }?;

        // start, one third, two thirds, end
        let indices = self.indices(&split, [0, 2, 3, 1]);
        Some(colourblock::write4(&split.start, &split.end, &indices))
    }
}
