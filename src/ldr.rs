use crate::color::{floor_i32, round_i32, ColorF32};
use crate::quant::QuantTables;

/// Inputs arrive in `[0, 65535]`; LDR packing works in `[0, 255]`.
pub(crate) const LDR_SCALE: f32 = 1.0 / 257.0;

/// Bias retries before `quantize_rgb` gives up on reordering the pair.
const ORDER_RETRY_LIMIT: usize = 32;

/// Quantize a pair of LDR RGB endpoints into `output[0..6]`.
///
/// This is the fall-back encoding and cannot fail. The decoded sum of
/// endpoint 0 must not exceed that of endpoint 1, so the endpoints are
/// biased apart and requantized until the order holds.
pub(crate) fn quantize_rgb(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let r0 = (color0.r * LDR_SCALE).clamp(0.0, 255.0);
    let g0 = (color0.g * LDR_SCALE).clamp(0.0, 255.0);
    let b0 = (color0.b * LDR_SCALE).clamp(0.0, 255.0);

    let r1 = (color1.r * LDR_SCALE).clamp(0.0, 255.0);
    let g1 = (color1.g * LDR_SCALE).clamp(0.0, 255.0);
    let b1 = (color1.b * LDR_SCALE).clamp(0.0, 255.0);

    let mut addon0 = 0.5f32;
    let mut addon1 = 0.5f32;

    for _ in 0..ORDER_RETRY_LIMIT {
        let ri0 = tables.quant_clamped(level, floor_i32(r0 + addon0));
        let gi0 = tables.quant_clamped(level, floor_i32(g0 + addon0));
        let bi0 = tables.quant_clamped(level, floor_i32(b0 + addon0));
        let ri1 = tables.quant_clamped(level, floor_i32(r1 + addon1));
        let gi1 = tables.quant_clamped(level, floor_i32(g1 + addon1));
        let bi1 = tables.quant_clamped(level, floor_i32(b1 + addon1));

        let sum0 = tables.unquant_i32(level, ri0)
            + tables.unquant_i32(level, gi0)
            + tables.unquant_i32(level, bi0);
        let sum1 = tables.unquant_i32(level, ri1)
            + tables.unquant_i32(level, gi1)
            + tables.unquant_i32(level, bi1);

        if sum0 <= sum1 {
            output[0] = ri0 as u8;
            output[1] = ri1 as u8;
            output[2] = gi0 as u8;
            output[3] = gi1 as u8;
            output[4] = bi0 as u8;
            output[5] = bi1 as u8;
            return;
        }

        addon0 -= 0.2;
        addon1 += 0.2;
    }

    // The bias ran out; pin the pair to the darkest and brightest codewords.
    let lo = tables.quant_i32(level, 0) as u8;
    let hi = tables.quant_i32(level, 255) as u8;
    output[..6].copy_from_slice(&[lo, hi, lo, hi, lo, hi]);
}

/// Quantize a pair of LDR RGBA endpoints into `output[0..8]`.
pub(crate) fn quantize_rgba(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let a0 = (color0.a * LDR_SCALE).clamp(0.0, 255.0);
    let a1 = (color1.a * LDR_SCALE).clamp(0.0, 255.0);

    output[6] = tables.quant_i32(level, round_i32(a0)) as u8;
    output[7] = tables.quant_i32(level, round_i32(a1)) as u8;

    quantize_rgb(tables, color0, color1, output, level);
}

/// Attempt to quantize RGB endpoints with blue-contraction.
///
/// The endpoints are stored swapped so that the decoder's forward
/// blue-contraction recovers the original pair.
pub(crate) fn try_quantize_rgb_blue_contract(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    let mut r0 = color0.r * LDR_SCALE;
    let mut g0 = color0.g * LDR_SCALE;
    let b0 = color0.b * LDR_SCALE;

    let mut r1 = color1.r * LDR_SCALE;
    let mut g1 = color1.g * LDR_SCALE;
    let b1 = color1.b * LDR_SCALE;

    // Inverse blue-contraction can overflow the byte range; bail out if so.
    r0 += r0 - b0;
    g0 += g0 - b0;
    r1 += r1 - b1;
    g1 += g1 - b1;

    let contracted = [r0, g0, b0, r1, g1, b1];
    if contracted.iter().any(|v| !(0.0..=255.0).contains(v)) {
        return false;
    }

    let ri0 = tables.quant_i32(level, round_i32(r0));
    let gi0 = tables.quant_i32(level, round_i32(g0));
    let bi0 = tables.quant_i32(level, round_i32(b0));
    let ri1 = tables.quant_i32(level, round_i32(r1));
    let gi1 = tables.quant_i32(level, round_i32(g1));
    let bi1 = tables.quant_i32(level, round_i32(b1));

    let sum0 = tables.unquant_i32(level, ri0)
        + tables.unquant_i32(level, gi0)
        + tables.unquant_i32(level, bi0);
    let sum1 = tables.unquant_i32(level, ri1)
        + tables.unquant_i32(level, gi1)
        + tables.unquant_i32(level, bi1);

    // Contraction and quantization may themselves reorder the endpoints,
    // so the order is only tested after both.
    if sum1 <= sum0 {
        return false;
    }

    output[0] = ri1 as u8;
    output[1] = ri0 as u8;
    output[2] = gi1 as u8;
    output[3] = gi0 as u8;
    output[4] = bi1 as u8;
    output[5] = bi0 as u8;

    true
}

/// Attempt to quantize RGBA endpoints with blue-contraction.
pub(crate) fn try_quantize_rgba_blue_contract(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    let a0 = (color0.a * LDR_SCALE).clamp(0.0, 255.0);
    let a1 = (color1.a * LDR_SCALE).clamp(0.0, 255.0);

    // Alpha follows the swapped storage order of the contracted RGB pair.
    output[7] = tables.quant_i32(level, round_i32(a0)) as u8;
    output[6] = tables.quant_i32(level, round_i32(a1)) as u8;

    try_quantize_rgb_blue_contract(tables, color0, color1, output, level)
}

struct DeltaChannel {
    /// Codeword for the low eight bits of the unorm9 base.
    base_index: i32,
    /// Codeword for the packed offset byte.
    offset_index: i32,
    /// Sign-extended offset after the codebook round trip.
    decoded_offset: i32,
}

/// Quantize one channel of a delta pair: endpoint 0 becomes a nine-bit base
/// whose top bit is borrowed into the offset byte, endpoint 1 a signed
/// seven-bit offset from the round-tripped base.
fn try_quantize_delta_channel(
    tables: &QuantTables,
    v0: f32,
    v1: f32,
    level: usize,
) -> Option<DeltaChannel> {
    let v0a = round_i32(v0) << 1;

    let base_index = tables.quant_i32(level, v0a & 0xFF);
    // Round trip the base so the offset is taken against what the decoder
    // reconstructs.
    let base = tables.unquant_i32(level, base_index) | (v0a & 0x100);

    let mut diff = (round_i32(v1) << 1) - base;
    if !(-64..=63).contains(&diff) {
        return None;
    }

    // Low seven bits of the offset, with the base's ninth bit above them.
    diff &= 0x7F;
    diff |= (base & 0x100) >> 1;

    let offset_index = tables.quant_i32(level, diff);
    let unquant = tables.unquant_i32(level, offset_index);
    // Bits 7:6 carry the base's top bit and the offset sign; a flip there
    // corrupts the decode.
    if (diff ^ unquant) & 0xC0 != 0 {
        return None;
    }

    let mut decoded_offset = unquant & 0x7F;
    if decoded_offset & 0x40 != 0 {
        decoded_offset -= 0x80;
    }

    let decoded = base + decoded_offset;
    if !(0..=0x1FF).contains(&decoded) {
        return None;
    }

    Some(DeltaChannel {
        base_index,
        offset_index,
        decoded_offset,
    })
}

/// Attempt to quantize RGB endpoints with delta-encoding.
pub(crate) fn try_quantize_rgb_delta(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    let r0 = (color0.r * LDR_SCALE).clamp(0.0, 255.0);
    let g0 = (color0.g * LDR_SCALE).clamp(0.0, 255.0);
    let b0 = (color0.b * LDR_SCALE).clamp(0.0, 255.0);

    let r1 = (color1.r * LDR_SCALE).clamp(0.0, 255.0);
    let g1 = (color1.g * LDR_SCALE).clamp(0.0, 255.0);
    let b1 = (color1.b * LDR_SCALE).clamp(0.0, 255.0);

    let Some(r) = try_quantize_delta_channel(tables, r0, r1, level) else {
        return false;
    };
    let Some(g) = try_quantize_delta_channel(tables, g0, g1, level) else {
        return false;
    };
    let Some(b) = try_quantize_delta_channel(tables, b0, b1, level) else {
        return false;
    };

    // A negative offset sum belongs to the blue-contracted variant.
    if r.decoded_offset + g.decoded_offset + b.decoded_offset < 0 {
        return false;
    }

    output[0] = r.base_index as u8;
    output[1] = r.offset_index as u8;
    output[2] = g.base_index as u8;
    output[3] = g.offset_index as u8;
    output[4] = b.base_index as u8;
    output[5] = b.offset_index as u8;

    true
}

/// Attempt to quantize RGB endpoints with delta-encoding and
/// blue-contraction.
pub(crate) fn try_quantize_rgb_delta_blue_contract(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    // The decoder ties blue-contraction to swapped endpoint order.
    let (color0, color1) = (color1, color0);

    let mut r0 = color0.r * LDR_SCALE;
    let mut g0 = color0.g * LDR_SCALE;
    let b0 = color0.b * LDR_SCALE;

    let mut r1 = color1.r * LDR_SCALE;
    let mut g1 = color1.g * LDR_SCALE;
    let b1 = color1.b * LDR_SCALE;

    r0 += r0 - b0;
    g0 += g0 - b0;
    r1 += r1 - b1;
    g1 += g1 - b1;

    let contracted = [r0, g0, b0, r1, g1, b1];
    if contracted.iter().any(|v| !(0.0..=255.0).contains(v)) {
        return false;
    }

    let Some(r) = try_quantize_delta_channel(tables, r0, r1, level) else {
        return false;
    };
    let Some(g) = try_quantize_delta_channel(tables, g0, g1, level) else {
        return false;
    };
    let Some(b) = try_quantize_delta_channel(tables, b0, b1, level) else {
        return false;
    };

    // Inverse of the plain delta rule: a nonnegative sum means the decoder
    // would not contract.
    if r.decoded_offset + g.decoded_offset + b.decoded_offset >= 0 {
        return false;
    }

    output[0] = r.base_index as u8;
    output[1] = r.offset_index as u8;
    output[2] = g.base_index as u8;
    output[3] = g.offset_index as u8;
    output[4] = b.base_index as u8;
    output[5] = b.offset_index as u8;

    true
}

/// Attempt to quantize the alpha pair with delta-encoding into
/// `output[6..8]`.
pub(crate) fn try_quantize_alpha_delta(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    let a0 = (color0.a * LDR_SCALE).clamp(0.0, 255.0);
    let a1 = (color1.a * LDR_SCALE).clamp(0.0, 255.0);

    let Some(a) = try_quantize_delta_channel(tables, a0, a1, level) else {
        return false;
    };

    output[6] = a.base_index as u8;
    output[7] = a.offset_index as u8;

    true
}

/// Attempt to quantize luminance and alpha pairs with delta-encoding into
/// `output[0..4]`.
pub(crate) fn try_quantize_luminance_alpha_delta(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    let l0 = ((color0.r + color0.g + color0.b) * (LDR_SCALE / 3.0)).clamp(0.0, 255.0);
    let l1 = ((color1.r + color1.g + color1.b) * (LDR_SCALE / 3.0)).clamp(0.0, 255.0);
    let a0 = (color0.a * LDR_SCALE).clamp(0.0, 255.0);
    let a1 = (color1.a * LDR_SCALE).clamp(0.0, 255.0);

    let Some(l) = try_quantize_delta_channel(tables, l0, l1, level) else {
        return false;
    };
    let Some(a) = try_quantize_delta_channel(tables, a0, a1, level) else {
        return false;
    };

    output[0] = l.base_index as u8;
    output[1] = l.offset_index as u8;
    output[2] = a.base_index as u8;
    output[3] = a.offset_index as u8;

    true
}

/// Attempt to quantize RGBA endpoints with delta-encoding.
pub(crate) fn try_quantize_rgba_delta(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    try_quantize_alpha_delta(tables, color0, color1, output, level)
        && try_quantize_rgb_delta(tables, color0, color1, output, level)
}

/// Attempt to quantize RGBA endpoints with delta-encoding and
/// blue-contraction.
pub(crate) fn try_quantize_rgba_delta_blue_contract(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    // Alpha swaps endpoints along with the contracted RGB pair.
    try_quantize_alpha_delta(tables, color1, color0, output, level)
        && try_quantize_rgb_delta_blue_contract(tables, color0, color1, output, level)
}

/// Quantize an RGB color with a shared scale factor into `output[0..4]`;
/// `rgbs_color.a` holds the desired scale in `[0, 1]`.
pub(crate) fn quantize_rgb_scale(
    tables: &QuantTables,
    rgbs_color: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let r = (rgbs_color.r * LDR_SCALE).clamp(0.0, 255.0);
    let g = (rgbs_color.g * LDR_SCALE).clamp(0.0, 255.0);
    let b = (rgbs_color.b * LDR_SCALE).clamp(0.0, 255.0);

    let ri = tables.quant_i32(level, round_i32(r));
    let gi = tables.quant_i32(level, round_i32(g));
    let bi = tables.quant_i32(level, round_i32(b));

    let old_sum = (rgbs_color.r + rgbs_color.g + rgbs_color.b) * LDR_SCALE;
    let new_sum =
        (tables.unquant_i32(level, ri) + tables.unquant_i32(level, gi)
            + tables.unquant_i32(level, bi)) as f32;

    // Rebalance the scale against what quantization did to the color sum.
    let scale = (rgbs_color.a * (old_sum + 1e-10) / (new_sum + 1e-10)).clamp(0.0, 1.0);
    let scale_idx = round_i32(scale * 256.0).clamp(0, 255);

    output[0] = ri as u8;
    output[1] = gi as u8;
    output[2] = bi as u8;
    output[3] = tables.quant_i32(level, scale_idx) as u8;
}

/// Quantize an RGB-scale color plus an alpha pair into `output[0..6]`.
pub(crate) fn quantize_rgb_scale_alpha(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    rgbs_color: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let a0 = (color0.a * LDR_SCALE).clamp(0.0, 255.0);
    let a1 = (color1.a * LDR_SCALE).clamp(0.0, 255.0);

    output[4] = tables.quant_i32(level, round_i32(a0)) as u8;
    output[5] = tables.quant_i32(level, round_i32(a1)) as u8;

    quantize_rgb_scale(tables, rgbs_color, output, level);
}

/// Quantize a luminance pair into `output[0..2]`.
pub(crate) fn quantize_luminance(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let mut lum0 = ((color0.r + color0.g + color0.b) * (LDR_SCALE / 3.0)).clamp(0.0, 255.0);
    let mut lum1 = ((color1.r + color1.g + color1.b) * (LDR_SCALE / 3.0)).clamp(0.0, 255.0);

    if lum0 > lum1 {
        let avg = (lum0 + lum1) * 0.5;
        lum0 = avg;
        lum1 = avg;
    }

    output[0] = tables.quant_i32(level, round_i32(lum0)) as u8;
    output[1] = tables.quant_i32(level, round_i32(lum1)) as u8;
}

/// Quantize luminance and alpha pairs into `output[0..4]`.
pub(crate) fn quantize_luminance_alpha(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let mut lum0 = ((color0.r + color0.g + color0.b) * (LDR_SCALE / 3.0)).clamp(0.0, 255.0);
    let mut lum1 = ((color1.r + color1.g + color1.b) * (LDR_SCALE / 3.0)).clamp(0.0, 255.0);
    let mut a0 = (color0.a * LDR_SCALE).clamp(0.0, 255.0);
    let mut a1 = (color1.a * LDR_SCALE).clamp(0.0, 255.0);

    // Endpoints this close collapse to one codeword at the top levels;
    // pulling them slightly apart keeps >8 bits of precision for normal
    // maps.
    if level > 18 && (lum0 - lum1).abs() < 3.0 {
        if lum0 < lum1 {
            lum0 -= 0.5;
            lum1 += 0.5;
        } else {
            lum0 += 0.5;
            lum1 -= 0.5;
        }
        lum0 = lum0.clamp(0.0, 255.0);
        lum1 = lum1.clamp(0.0, 255.0);
    }
    if level > 18 && (a0 - a1).abs() < 3.0 {
        if a0 < a1 {
            a0 -= 0.5;
            a1 += 0.5;
        } else {
            a0 += 0.5;
            a1 -= 0.5;
        }
        a0 = a0.clamp(0.0, 255.0);
        a1 = a1.clamp(0.0, 255.0);
    }

    output[0] = tables.quant_i32(level, round_i32(lum0)) as u8;
    output[1] = tables.quant_i32(level, round_i32(lum1)) as u8;
    output[2] = tables.quant_i32(level, round_i32(a0)) as u8;
    output[3] = tables.quant_i32(level, round_i32(a1)) as u8;
}
