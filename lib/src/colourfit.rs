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

//! Colour endpoint fitting for the BC1 colour block shared by BC1, BC2 and
//! BC3.

mod bounds;
mod cluster;
mod green;
mod quick;
mod single;
mod single_lut;

pub use self::bounds::BoxFit;
pub use self::cluster::ClusterFit;
pub use self::green::GreenFit;
pub use self::quick::QuickFit;
pub use self::single::SingleColourFit;
pub use self::single_lut::{optimal_endpoints_5, optimal_endpoints_6};

use crate::block::ColourBlock;
use crate::colourblock::Bc1Block;
use crate::colourset::ColourSet;
use crate::palette::{colour_palette, nearest_colour, PaletteMode};
use crate::{AlphaMode, Format, Params, Quality};

/// A strategy for choosing colour endpoints
pub trait ColourFit<'a> {
    /// Offers every block this fit can make to `best`, four-colour first
    fn compress(&mut self, three_colour: bool, best: &mut BestFit);
}

pub trait ColourFitImpl<'a> {
    fn colourset(&self) -> &'a ColourSet;
    fn compress3(&mut self) -> Option<Bc1Block>;
    fn compress4(&mut self) -> Option<Bc1Block>;
}

impl<'a, T> ColourFit<'a> for T
where
    T: ColourFitImpl<'a>,
{
    fn compress(&mut self, three_colour: bool, best: &mut BestFit) {
        // punch-through pixels need the three-colour palette
        if !self.colourset().is_transparent() {
            if let Some(block) = self.compress4() {
                best.consider(block);
            }
        }

        if three_colour || self.colourset().is_transparent() {
            if let Some(block) = self.compress3() {
                best.consider(block);
            }
        }
    }
}

/// Keeps the candidate block with the lowest error as the decoder would see
/// it. Earlier candidates win ties.
pub struct BestFit<'a> {
    colourset: &'a ColourSet,
    is_bc1: bool,
    weights: [f32; 3],
    best: Option<(Bc1Block, f32)>,
}

impl<'a> BestFit<'a> {
    pub fn new(colourset: &'a ColourSet, is_bc1: bool, weights: [f32; 3]) -> Self {
        BestFit {
            colourset,
            is_bc1,
            weights,
            best: None,
        }
    }

    pub fn consider(&mut self, block: Bc1Block) {
        let error = self.colourset.error(&block, self.is_bc1, &self.weights);
        if !error.is_finite() {
            return;
        }

        match self.best {
            Some((_, best)) if best <= error => {}
            _ => self.best = Some((block, error)),
        }
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<f32> {
        self.best.map(|(_, error)| error)
    }

    pub fn block(&self) -> Option<Bc1Block> {
        self.best.map(|(block, _)| block)
    }
}

/// Weighted error of the set against the palette of `col0` and `col1`, or
/// `None` once it reaches `limit`. Fills `closest` with the chosen index of
/// each point.
pub(crate) fn score_endpoints(
    colourset: &ColourSet,
    weights: &[f32; 3],
    col0: u16,
    col1: u16,
    limit: f32,
    closest: &mut [u8; 16],
) -> Option<f32> {
    let (palette, mode) = colour_palette(col0, col1, true);
    let codes = match mode {
        PaletteMode::FourColour => 4,
        PaletteMode::ThreeColour => 3,
    };

    let mut error = 0f32;
    for (j, &weight) in colourset.weights().iter().enumerate() {
        let (index, d) = nearest_colour(&palette, codes, &colourset.colour(j), weights);
        closest[j] = index;
        error += weight * d;
        if error >= limit {
            return None;
        }
    }
    Some(error)
}

/// A BC1 block whose pixels all decode as transparent black
pub const TRANSPARENT_BLOCK: Bc1Block = Bc1Block {
    col0: 0,
    col1: 0,
    indices: u32::MAX,
};

/// Compresses the colour of a block, trying the fits `params.quality` asks
/// for and keeping the one that reconstructs best.
pub fn compress(block: &ColourBlock, format: Format, params: &Params) -> Bc1Block {
    let is_bc1 = format == Format::Bc1;
    let weigh_by_alpha = params.alpha_mode == AlphaMode::Transparency;
    let colourset = ColourSet::new(block, format, weigh_by_alpha);

    if colourset.count() == 0 {
        return if colourset.is_transparent() {
            TRANSPARENT_BLOCK
        } else {
            Bc1Block::default()
        };
    }

    let three_colour = is_bc1 && params.three_colour;
    let weights = params.weights;
    let mut best = BestFit::new(&colourset, is_bc1, weights);

    if colourset.count() == 1 {
        SingleColourFit::new(&colourset, weights).compress(three_colour, &mut best);
    } else {
        match params.quality {
            Quality::Fastest => {
                QuickFit::new(&colourset, weights).compress(three_colour, &mut best);
            }
            Quality::Normal => {
                ClusterFit::new(&colourset, weights, false).compress(three_colour, &mut best);
            }
            Quality::Production | Quality::Highest => {
                ClusterFit::new(&colourset, weights, true).compress(three_colour, &mut best);
            }
        }

        if params.quality == Quality::Highest {
            if let Some(mut fit) = BoxFit::new(&colourset, weights, params.search_budget) {
                fit.compress(three_colour, &mut best);
            }
            if colourset.is_greyscale() {
                GreenFit::new(&colourset, weights).compress(three_colour, &mut best);
            }
        }

        SingleColourFit::mean(&colourset, weights).compress(three_colour, &mut best);
    }

    best.block().unwrap_or(if colourset.is_transparent() {
        TRANSPARENT_BLOCK
    } else {
        Bc1Block::default()
    })
}
