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

use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use blockfit::{
    AlphaMode, Channel, Format, Params, Quality, COLOUR_WEIGHTS_PERCEPTUAL,
    COLOUR_WEIGHTS_UNIFORM,
};
use clap::{Parser, ValueEnum};
use ddsfile::{D3D10ResourceDimension, D3DFormat, Dds, DxgiFormat};
use tracing::{debug, error, info};

use crate::error::{CliError, Result};

mod error;
mod image;
mod logging;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliQuality {
    Fastest,
    Normal,
    Production,
    Highest,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliAlphaMode {
    None,
    Transparency,
}

#[derive(Parser)]
#[command(version, about)]
enum Opt {
    /// Compress a PNG or JPEG file to DDS
    #[command(name = "compress")]
    Compress {
        /// Output file (DDS)
        #[arg(short = 'o', long = "output")]
        outfile: Option<PathBuf>,

        /// Input file (PNG, JPG)
        #[arg(value_name = "INFILE")]
        infile: PathBuf,

        /// Compression format
        #[arg(short = 'f', long = "format")]
        format: CliFormat,

        /// How hard to search for good endpoints
        #[arg(short = 'q', long = "quality", default_value = "normal")]
        quality: CliQuality,

        /// Whether colour error is weighed by alpha
        #[arg(short = 'a', long = "alpha-mode", default_value = "none")]
        alpha_mode: CliAlphaMode,

        /// Never emit BC1 blocks in three-colour mode
        #[arg(long = "no-three-colour")]
        no_three_colour: bool,

        /// Use equal weights for red, green and blue instead of perceptual ones
        #[arg(long = "uniform", conflicts_with = "weights")]
        uniform: bool,

        /// Colour weights (red, green, blue) used for matching colours during fitting
        #[arg(short = 'w', long = "weights", num_args = 3, value_names = ["R", "G", "B"])]
        weights: Option<Vec<f32>>,

        /// Maximum number of endpoint pairs the exhaustive search may visit
        #[arg(long = "search-budget")]
        search_budget: Option<u32>,

        /// Channel source for each output channel, e.g. "rgb1" or "rrr1".
        /// Valid sources are r, g, b, a, 0 and 1.
        #[arg(short = 's', long = "swizzle", value_parser = parse_swizzle)]
        swizzle: Option<[Channel; 4]>,
    },

    /// Decompress a DDS file to PNG
    #[command(name = "decompress")]
    Decompress {
        /// Output file (PNG)
        #[arg(short = 'o', long = "output")]
        outfile: Option<PathBuf>,

        /// Input file (DDS)
        #[arg(value_name = "INFILE")]
        infile: PathBuf,
    },
}

fn main() -> ExitCode {
    logging::init();

    let result = match Opt::parse() {
        Opt::Compress {
            outfile,
            infile,
            format,
            quality,
            alpha_mode,
            no_three_colour,
            uniform,
            weights,
            search_budget,
            swizzle,
        } => {
            let mut params = Params {
                quality: quality.into(),
                alpha_mode: alpha_mode.into(),
                three_colour: !no_three_colour,
                weights: COLOUR_WEIGHTS_PERCEPTUAL,
                ..Params::default()
            };
            if uniform {
                params.weights = COLOUR_WEIGHTS_UNIFORM;
            }
            if let Some(w) = weights {
                params.weights = [w[0], w[1], w[2]];
            }
            if let Some(budget) = search_budget {
                params.search_budget = budget;
            }
            compress_file(outfile, &infile, format.into(), params, swizzle)
        }
        Opt::Decompress { outfile, infile } => decompress_file(outfile, &infile),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn default_output(infile: &Path, extension: &str) -> PathBuf {
    PathBuf::new()
        .with_file_name(infile.file_name().unwrap_or_else(|| OsStr::new("output")))
        .with_extension(extension)
}

fn compress_file(
    outfile: Option<PathBuf>,
    infile: &Path,
    format: Format,
    params: Params,
    swizzle: Option<[Channel; 4]>,
) -> Result<()> {
    let outfile = outfile.unwrap_or_else(|| default_output(infile, "dds"));

    let mut image = image::read(infile)?;
    if let Some(channels) = swizzle {
        image.swizzle(channels);
    }
    info!(
        input = %infile.display(),
        width = image.width,
        height = image.height,
        ?format,
        quality = ?params.quality,
        "compressing"
    );

    let start = Instant::now();
    let mut buf = vec![0u8; format.compressed_size(image.width, image.height)];
    format.compress(&image.data, image.width, image.height, params, &mut buf);
    info!(elapsed = ?start.elapsed(), bytes = buf.len(), "compressed");

    let alpha_mode = if format == Format::Bc1 {
        ddsfile::AlphaMode::PreMultiplied
    } else {
        ddsfile::AlphaMode::Straight
    };
    let mut dds = Dds::new_dxgi(ddsfile::NewDxgiParams {
        height: image.height as u32,
        width: image.width as u32,
        depth: None,
        format: format_to_dxgiformat(format),
        mipmap_levels: None,
        array_layers: None,
        caps2: None,
        is_cubemap: false,
        resource_dimension: D3D10ResourceDimension::Texture2D,
        alpha_mode,
    })?;
    dds.data = buf;

    let mut file = File::create(&outfile).map_err(|e| CliError::io(&outfile, e))?;
    dds.write(&mut file)?;
    info!(output = %outfile.display(), "wrote DDS");

    Ok(())
}

fn decompress_file(outfile: Option<PathBuf>, infile: &Path) -> Result<()> {
    let outfile = outfile.unwrap_or_else(|| default_output(infile, "png"));

    let mut file = File::open(infile).map_err(|e| CliError::io(infile, e))?;
    let dds = Dds::read(&mut file)?;

    let format = match dds.header10 {
        Some(ref header10) => {
            if header10.resource_dimension != D3D10ResourceDimension::Texture2D {
                return Err(CliError::Unsupported(
                    "only images with resource dimension Texture2D are supported".into(),
                ));
            }
            dxgiformat_to_format(header10.dxgi_format)?
        }
        None => {
            let d3dformat = D3DFormat::try_from_pixel_format(&dds.header.spf).ok_or_else(
                || CliError::Unsupported("DDS pixel format is not a known D3D format".into()),
            )?;
            d3dformat_to_format(d3dformat)?
        }
    };

    let width = dds.header.width as usize;
    let height = dds.header.height as usize;
    if dds.data.len() < format.compressed_size(width, height) {
        return Err(CliError::Unsupported(format!(
            "DDS data is too short for a {}x{} {:?} image",
            width, height, format
        )));
    }
    debug!(width, height, ?format, "decompressing");

    let start = Instant::now();
    let mut decompressed = vec![0u8; 4 * width * height];
    format.decompress(&dds.data, width, height, &mut decompressed);
    info!(elapsed = ?start.elapsed(), "decompressed");

    image::png::write(&outfile, width as u32, height as u32, &decompressed)?;
    info!(output = %outfile.display(), "wrote PNG");

    Ok(())
}

fn parse_swizzle(s: &str) -> std::result::Result<[Channel; 4], String> {
    let channels = s
        .chars()
        .map(|c| match c.to_ascii_lowercase() {
            'r' => Ok(Channel::Red),
            'g' => Ok(Channel::Green),
            'b' => Ok(Channel::Blue),
            'a' => Ok(Channel::Alpha),
            '0' => Ok(Channel::Zero),
            '1' => Ok(Channel::One),
            other => Err(format!("invalid channel source '{}'", other)),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    channels
        .try_into()
        .map_err(|_| String::from("swizzle must name exactly four channels"))
}

impl From<CliQuality> for Quality {
    fn from(q: CliQuality) -> Self {
        match q {
            CliQuality::Fastest => Quality::Fastest,
            CliQuality::Normal => Quality::Normal,
            CliQuality::Production => Quality::Production,
            CliQuality::Highest => Quality::Highest,
        }
    }
}

impl From<CliAlphaMode> for AlphaMode {
    fn from(m: CliAlphaMode) -> Self {
        match m {
            CliAlphaMode::None => AlphaMode::None,
            CliAlphaMode::Transparency => AlphaMode::Transparency,
        }
    }
}

impl From<CliFormat> for Format {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Bc1 => Format::Bc1,
            CliFormat::Bc2 => Format::Bc2,
            CliFormat::Bc3 => Format::Bc3,
            CliFormat::Bc4 => Format::Bc4,
            CliFormat::Bc5 => Format::Bc5,
        }
    }
}

fn format_to_dxgiformat(f: Format) -> DxgiFormat {
    match f {
        Format::Bc1 => DxgiFormat::BC1_UNorm_sRGB,
        Format::Bc2 => DxgiFormat::BC2_UNorm_sRGB,
        Format::Bc3 => DxgiFormat::BC3_UNorm_sRGB,
        Format::Bc4 => DxgiFormat::BC4_UNorm,
        Format::Bc5 => DxgiFormat::BC5_UNorm,
    }
}

fn dxgiformat_to_format(d: DxgiFormat) -> Result<Format> {
    match d {
        DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => Ok(Format::Bc1),
        DxgiFormat::BC2_UNorm | DxgiFormat::BC2_UNorm_sRGB => Ok(Format::Bc2),
        DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => Ok(Format::Bc3),
        DxgiFormat::BC4_UNorm => Ok(Format::Bc4),
        DxgiFormat::BC5_UNorm => Ok(Format::Bc5),
        other => Err(CliError::Unsupported(format!(
            "unsupported DXGI format {:?}",
            other
        ))),
    }
}

fn d3dformat_to_format(d: D3DFormat) -> Result<Format> {
    match d {
        D3DFormat::DXT1 => Ok(Format::Bc1),
        D3DFormat::DXT2 | D3DFormat::DXT3 => Ok(Format::Bc2),
        D3DFormat::DXT4 | D3DFormat::DXT5 => Ok(Format::Bc3),
        other => Err(CliError::Unsupported(format!(
            "unsupported D3D format {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Opt::command().debug_assert();
    }

    #[test]
    fn swizzle_parsing() {
        assert_eq!(
            parse_swizzle("RG01").unwrap(),
            [Channel::Red, Channel::Green, Channel::Zero, Channel::One]
        );
        assert!(parse_swizzle("rgb").is_err());
        assert!(parse_swizzle("rgbx").is_err());
    }

    #[test]
    fn compress_options_map_to_params() {
        let opt = Opt::try_parse_from([
            "blockfit", "compress", "in.png", "-f", "bc3", "-q", "highest", "-w", "1", "2", "3",
        ])
        .unwrap();
        match opt {
            Opt::Compress {
                format,
                quality,
                weights,
                ..
            } => {
                assert_eq!(Format::from(format), Format::Bc3);
                assert_eq!(Quality::from(quality), Quality::Highest);
                assert_eq!(weights, Some(vec![1.0, 2.0, 3.0]));
            }
            Opt::Decompress { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn default_output_replaces_extension() {
        assert_eq!(
            default_output(Path::new("dir/picture.png"), "dds"),
            PathBuf::from("picture.dds")
        );
    }
}
