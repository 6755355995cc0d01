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

//! Tables of the best endpoint pair for reproducing a single 8-bit value with
//! a 5- or 6-bit channel, generated at compile time.
//!
//! `sources[0]` reproduces the value with palette index 0 (both endpoints
//! equal). `sources[1]` reproduces it with the interpolated index: the colour
//! 1/3 of the way from start to end in four-colour mode, the midpoint in
//! three-colour mode. Errors are measured against the decoder's truncating
//! interpolation.

use crate::math::expand;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceBlock {
    pub start: u8,
    pub end: u8,
    pub error: u8,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SingleColourLookup {
    pub sources: [SourceBlock; 2],
}

pub static LOOKUP_5_3: [SingleColourLookup; 256] = build_lookup(5, true);
pub static LOOKUP_6_3: [SingleColourLookup; 256] = build_lookup(6, true);
pub static LOOKUP_5_4: [SingleColourLookup; 256] = build_lookup(5, false);
pub static LOOKUP_6_4: [SingleColourLookup; 256] = build_lookup(6, false);

const fn interpolate(start: i32, end: i32, three_colour: bool) -> i32 {
    if three_colour {
        (start + end) / 2
    } else {
        (2 * start + end) / 3
    }
}

const fn abs_diff(a: i32, b: i32) -> i32 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

const fn build_lookup(bits: u32, three_colour: bool) -> [SingleColourLookup; 256] {
    const EMPTY: SourceBlock = SourceBlock {
        start: 0,
        end: 0,
        error: u8::MAX,
    };

    let max = (1i32 << bits) - 1;
    let mut table = [SingleColourLookup {
        sources: [EMPTY, EMPTY],
    }; 256];

    let mut value = 0i32;
    while value < 256 {
        // exact endpoint: nearest expanded code
        let mut best = EMPTY;
        let mut q = 0i32;
        while q <= max {
            let error = abs_diff(expand(q as u8, bits) as i32, value);
            if error < best.error as i32 {
                best = SourceBlock {
                    start: q as u8,
                    end: q as u8,
                    error: error as u8,
                };
            }
            q += 1;
        }
        table[value as usize].sources[0] = best;

        // interpolated: for every start, only ends expanding next to the
        // ideal end value can win
        let mut best = EMPTY;
        let mut start = 0i32;
        while start <= max {
            let s = expand(start as u8, bits) as i32;
            let ideal = if three_colour {
                2 * value - s
            } else {
                3 * value - 2 * s
            };
            let ideal = if ideal < 0 {
                0
            } else if ideal > 255 {
                255
            } else {
                ideal
            };

            let centre = ideal * max / 255;
            let mut end = centre - 1;
            while end <= centre + 1 {
                if end >= 0 && end <= max {
                    let e = expand(end as u8, bits) as i32;
                    let error = abs_diff(interpolate(s, e, three_colour), value);
                    if error < best.error as i32 {
                        best = SourceBlock {
                            start: start as u8,
                            end: end as u8,
                            error: error as u8,
                        };
                    }
                }
                end += 1;
            }
            start += 1;
        }
        table[value as usize].sources[1] = best;

        value += 1;
    }

    table
}

fn optimal_endpoints(lut: &[SingleColourLookup; 256], value: u8) -> (u8, u8) {
    let [exact, interpolated] = lut[value as usize].sources;
    if exact.error <= interpolated.error {
        (exact.start, exact.end)
    } else {
        (interpolated.start, interpolated.end)
    }
}

/// Best four-colour 5-bit endpoint pair for a single value; palette index 2
/// (or any index, when both endpoints are equal) reproduces it.
pub fn optimal_endpoints_5(value: u8) -> (u8, u8) {
    optimal_endpoints(&LOOKUP_5_4, value)
}

/// Best four-colour 6-bit endpoint pair for a single value; palette index 2
/// (or any index, when both endpoints are equal) reproduces it.
pub fn optimal_endpoints_6(value: u8) -> (u8, u8) {
    optimal_endpoints(&LOOKUP_6_4, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(bits: u32, three_colour: bool, value: i32) -> i32 {
        let max = (1i32 << bits) - 1;
        let mut best = i32::MAX;
        for a in 0..=max {
            for b in 0..=max {
                let s = expand(a as u8, bits) as i32;
                let e = expand(b as u8, bits) as i32;
                best = best.min(abs_diff(interpolate(s, e, three_colour), value));
            }
        }
        best
    }

    #[test]
    fn interpolated_sources_are_optimal() {
        for (bits, three_colour, lut) in [
            (5, false, &LOOKUP_5_4),
            (6, false, &LOOKUP_6_4),
            (5, true, &LOOKUP_5_3),
            (6, true, &LOOKUP_6_3),
        ] {
            for value in (0..256).step_by(7).chain([255]) {
                let source = lut[value as usize].sources[1];
                assert_eq!(
                    i32::from(source.error),
                    brute_force(bits, three_colour, value),
                    "bits {} three {} value {}",
                    bits,
                    three_colour,
                    value
                );

                // the stored error is the one the decoder will produce
                let s = expand(source.start, bits) as i32;
                let e = expand(source.end, bits) as i32;
                assert_eq!(
                    abs_diff(interpolate(s, e, three_colour), value),
                    i32::from(source.error)
                );
            }
        }
    }

    #[test]
    fn six_bit_tables_are_exact_away_from_the_extremes() {
        for value in 0..=255u8 {
            let (start, end) = optimal_endpoints_6(value);
            let s = expand(start, 6) as i32;
            let e = expand(end, 6) as i32;
            let reproduced = if start == end { s } else { interpolate(s, e, false) };
            let error = abs_diff(reproduced, i32::from(value));
            if (20..=233).contains(&value) {
                assert_eq!(error, 0, "value {}", value);
            } else {
                assert!(error <= 1, "value {}", value);
            }
        }
    }

    #[test]
    fn five_bit_error_is_small() {
        for value in 0..=255u8 {
            let (start, end) = optimal_endpoints_5(value);
            let s = expand(start, 5) as i32;
            let e = expand(end, 5) as i32;
            let reproduced = if start == end { s } else { interpolate(s, e, false) };
            assert!(abs_diff(reproduced, i32::from(value)) <= 1, "value {}", value);
        }
    }

    #[test]
    fn exact_sources_are_nearest_codes() {
        assert_eq!(LOOKUP_5_4[0].sources[0], SourceBlock { start: 0, end: 0, error: 0 });
        assert_eq!(LOOKUP_5_4[255].sources[0], SourceBlock { start: 31, end: 31, error: 0 });
        assert_eq!(LOOKUP_6_4[130].sources[0].start, 32);
    }
}
