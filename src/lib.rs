#![warn(clippy::all)]

//! Packing of ASTC color endpoint pairs into quantized integer vectors.
//!
//! Given two endpoint colors, a requested endpoint format and a
//! quantization level, [`pack_color_endpoints`] emits the codeword indices
//! from which the decoder reconstructs the endpoints, substituting a delta
//! representation when one fits. The per-level codebooks are supplied by
//! the caller as [`QuantTables`]; building them, selecting formats and
//! packing block bits are all outside this crate.

mod color;
mod hdr;
mod ldr;
mod quant;

pub use color::ColorF32;
pub use quant::{QuantTables, QUANT_LEVEL_COUNT};

/// Endpoint encoding formats.
///
/// The delta variants are chosen by the packer itself when the endpoints
/// fit; requesting one behaves like requesting its base format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointFormat {
    Luminance,
    LuminanceAlpha,
    LuminanceAlphaDelta,
    Rgb,
    RgbDelta,
    RgbScale,
    RgbScaleAlpha,
    Rgba,
    RgbaDelta,
    HdrRgbScale,
    HdrRgb,
    HdrRgbLdrAlpha,
    HdrRgba,
    HdrLuminanceSmallRange,
    HdrLuminanceLargeRange,
}

impl EndpointFormat {
    /// Number of codeword indices the format stores.
    pub fn value_count(self) -> usize {
        use EndpointFormat::*;
        match self {
            Luminance | HdrLuminanceSmallRange | HdrLuminanceLargeRange => 2,
            LuminanceAlpha | LuminanceAlphaDelta | RgbScale | HdrRgbScale => 4,
            Rgb | RgbDelta | RgbScaleAlpha | HdrRgb => 6,
            Rgba | RgbaDelta | HdrRgbLdrAlpha | HdrRgba => 8,
        }
    }
}

/// Deltas only exist at levels where the offset byte keeps enough
/// resolution to survive the codebook round trip.
const MAX_DELTA_LEVEL: usize = 18;

/// Pack a pair of color endpoints into quantized codeword indices.
///
/// Tries the candidate encodings for `format` in order, writes the winning
/// vector into `output` and returns the format actually emitted (e.g.
/// [`EndpointFormat::RgbDelta`] for an [`EndpointFormat::Rgb`] request
/// whose offsets fit). Slots past the emitted vector's length are left
/// untouched. `rgbs_color` is only consulted by the RGB-scale formats and
/// `rgbo_color` by the HDR RGB-scale format.
///
/// Negative components of `color0` and `color1` are clamped to zero before
/// packing.
///
/// # Panics
///
/// Panics if `level >= QUANT_LEVEL_COUNT`.
#[allow(clippy::too_many_arguments)]
pub fn pack_color_endpoints(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    rgbs_color: ColorF32,
    rgbo_color: ColorF32,
    format: EndpointFormat,
    output: &mut [u8; 8],
    level: usize,
) -> EndpointFormat {
    assert!(
        level < QUANT_LEVEL_COUNT,
        "quantization level out of range: {}",
        level
    );

    let color0 = color0.max_zero();
    let color1 = color1.max_zero();

    use EndpointFormat::*;
    match format {
        Rgb | RgbDelta => {
            if level <= MAX_DELTA_LEVEL {
                if ldr::try_quantize_rgb_delta_blue_contract(tables, color0, color1, output, level)
                    || ldr::try_quantize_rgb_delta(tables, color0, color1, output, level)
                {
                    return RgbDelta;
                }
            }
            if ldr::try_quantize_rgb_blue_contract(tables, color0, color1, output, level) {
                return Rgb;
            }
            ldr::quantize_rgb(tables, color0, color1, output, level);
            Rgb
        }

        Rgba | RgbaDelta => {
            if level <= MAX_DELTA_LEVEL {
                if ldr::try_quantize_rgba_delta_blue_contract(tables, color0, color1, output, level)
                    || ldr::try_quantize_rgba_delta(tables, color0, color1, output, level)
                {
                    return RgbaDelta;
                }
            }
            if ldr::try_quantize_rgba_blue_contract(tables, color0, color1, output, level) {
                return Rgba;
            }
            ldr::quantize_rgba(tables, color0, color1, output, level);
            Rgba
        }

        RgbScale => {
            ldr::quantize_rgb_scale(tables, rgbs_color, output, level);
            RgbScale
        }

        RgbScaleAlpha => {
            ldr::quantize_rgb_scale_alpha(tables, color0, color1, rgbs_color, output, level);
            RgbScaleAlpha
        }

        Luminance => {
            ldr::quantize_luminance(tables, color0, color1, output, level);
            Luminance
        }

        LuminanceAlpha | LuminanceAlphaDelta => {
            if level <= MAX_DELTA_LEVEL
                && ldr::try_quantize_luminance_alpha_delta(tables, color0, color1, output, level)
            {
                return LuminanceAlphaDelta;
            }
            ldr::quantize_luminance_alpha(tables, color0, color1, output, level);
            LuminanceAlpha
        }

        HdrRgbScale => {
            hdr::quantize_hdr_rgb_offset(tables, rgbo_color, output, level);
            HdrRgbScale
        }

        HdrRgb => {
            hdr::quantize_hdr_rgb(tables, color0, color1, output, level);
            HdrRgb
        }

        HdrRgbLdrAlpha => {
            hdr::quantize_hdr_rgb_ldr_alpha(tables, color0, color1, output, level);
            HdrRgbLdrAlpha
        }

        HdrRgba => {
            hdr::quantize_hdr_rgba(tables, color0, color1, output, level);
            HdrRgba
        }

        HdrLuminanceSmallRange | HdrLuminanceLargeRange => {
            if hdr::try_quantize_hdr_luminance_small_range(tables, color0, color1, output, level) {
                return HdrLuminanceSmallRange;
            }
            hdr::quantize_hdr_luminance_large_range(tables, color0, color1, output, level);
            HdrLuminanceLargeRange
        }
    }
}
