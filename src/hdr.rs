use crate::color::{round_i32, ColorF32};
use crate::ldr::LDR_SCALE;
use crate::quant::QuantTables;

/// Source field for a scatter bit in the offset-scale encoding.
#[derive(Clone, Copy)]
enum RgboSrc {
    R,
    G,
    B,
    S,
}

#[derive(Clone, Copy)]
struct RgboBit {
    src: RgboSrc,
    shift: u32,
}

/// One mode of the HDR RGB offset-scale encoding.
///
/// `gb_scatter` holds the four high bits packed into the G and B bytes
/// (bits 6 and 5 of each); `s_scatter` the three packed into bits 7:5 of
/// the scale byte.
struct RgboMode {
    gb_bits: u32,
    s_bits: u32,
    gb_cutoff: f32,
    s_cutoff: f32,
    scale: f32,
    rscale: f32,
    gb_scatter: [RgboBit; 4],
    s_scatter: [RgboBit; 3],
}

const fn rgbo_bit(src: RgboSrc, shift: u32) -> RgboBit {
    RgboBit { src, shift }
}

static RGBO_MODES: [RgboMode; 5] = [
    RgboMode {
        gb_bits: 5,
        s_bits: 7,
        gb_cutoff: 1024.0,
        s_cutoff: 4096.0,
        scale: 1.0 / 32.0,
        rscale: 32.0,
        gb_scatter: [
            rgbo_bit(RgboSrc::R, 9),
            rgbo_bit(RgboSrc::R, 8),
            rgbo_bit(RgboSrc::R, 7),
            rgbo_bit(RgboSrc::R, 10),
        ],
        s_scatter: [
            rgbo_bit(RgboSrc::R, 6),
            rgbo_bit(RgboSrc::S, 6),
            rgbo_bit(RgboSrc::S, 5),
        ],
    },
    RgboMode {
        gb_bits: 6,
        s_bits: 5,
        gb_cutoff: 2048.0,
        s_cutoff: 1024.0,
        scale: 1.0 / 32.0,
        rscale: 32.0,
        gb_scatter: [
            rgbo_bit(RgboSrc::R, 8),
            rgbo_bit(RgboSrc::G, 5),
            rgbo_bit(RgboSrc::R, 7),
            rgbo_bit(RgboSrc::B, 5),
        ],
        s_scatter: [
            rgbo_bit(RgboSrc::R, 6),
            rgbo_bit(RgboSrc::R, 10),
            rgbo_bit(RgboSrc::R, 9),
        ],
    },
    RgboMode {
        gb_bits: 5,
        s_bits: 8,
        gb_cutoff: 2048.0,
        s_cutoff: 16384.0,
        scale: 1.0 / 64.0,
        rscale: 64.0,
        gb_scatter: [
            rgbo_bit(RgboSrc::R, 9),
            rgbo_bit(RgboSrc::R, 8),
            rgbo_bit(RgboSrc::R, 7),
            rgbo_bit(RgboSrc::R, 6),
        ],
        s_scatter: [
            rgbo_bit(RgboSrc::S, 7),
            rgbo_bit(RgboSrc::S, 6),
            rgbo_bit(RgboSrc::S, 5),
        ],
    },
    RgboMode {
        gb_bits: 6,
        s_bits: 7,
        gb_cutoff: 8192.0,
        s_cutoff: 16384.0,
        scale: 1.0 / 128.0,
        rscale: 128.0,
        gb_scatter: [
            rgbo_bit(RgboSrc::R, 8),
            rgbo_bit(RgboSrc::G, 5),
            rgbo_bit(RgboSrc::R, 7),
            rgbo_bit(RgboSrc::B, 5),
        ],
        s_scatter: [
            rgbo_bit(RgboSrc::R, 6),
            rgbo_bit(RgboSrc::S, 6),
            rgbo_bit(RgboSrc::S, 5),
        ],
    },
    RgboMode {
        gb_bits: 7,
        s_bits: 6,
        gb_cutoff: 32768.0,
        s_cutoff: 16384.0,
        scale: 1.0 / 256.0,
        rscale: 256.0,
        gb_scatter: [
            rgbo_bit(RgboSrc::G, 6),
            rgbo_bit(RgboSrc::G, 5),
            rgbo_bit(RgboSrc::B, 6),
            rgbo_bit(RgboSrc::B, 5),
        ],
        s_scatter: [
            rgbo_bit(RgboSrc::R, 6),
            rgbo_bit(RgboSrc::R, 7),
            rgbo_bit(RgboSrc::S, 5),
        ],
    },
];

fn rgbo_scatter_bit(bit: RgboBit, r: i32, g: i32, b: i32, s: i32) -> i32 {
    let v = match bit.src {
        RgboSrc::R => r,
        RgboSrc::G => g,
        RgboSrc::B => b,
        RgboSrc::S => s,
    };
    (v >> bit.shift) & 1
}

/// Quantize an HDR RGB color sharing one scale offset into `output[0..4]`;
/// `color.a` carries the offset.
pub(crate) fn quantize_hdr_rgb_offset(
    tables: &QuantTables,
    color: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let r = (color.r + color.a).clamp(0.0, 65535.0);
    let g = (color.g + color.a).clamp(0.0, 65535.0);
    let b = (color.b + color.a).clamp(0.0, 65535.0);
    let s = color.a.clamp(0.0, 65535.0);

    // Kept unswizzled for the flat fallback.
    let backup = [r, g, b, s];

    let majcomp = if r > g && r > b {
        0
    } else if g > b {
        1
    } else {
        2
    };

    // Swap the major component into the red slot.
    let (r, g, b) = match majcomp {
        1 => (g, r, b),
        2 => (b, g, r),
        _ => (r, g, b),
    };

    let r_base = r;
    let g_base = r - g;
    let b_base = r - b;
    let s_base = s;

    for (mode, params) in RGBO_MODES.iter().enumerate() {
        if g_base > params.gb_cutoff || b_base > params.gb_cutoff || s_base > params.s_cutoff {
            continue;
        }

        // Four mode bits: the low two ride on R, the high two on G and B.
        let mode_enc = if mode < 4 {
            mode as i32 | (majcomp << 2)
        } else {
            majcomp | 0xC
        };

        let gb_intcutoff = 1 << params.gb_bits;
        let s_intcutoff = 1 << params.s_bits;

        let mut r_intval = round_i32(r_base * params.scale);
        let r_lowbits = (r_intval & 0x3F) | ((mode_enc & 3) << 6);
        let (r_quantval, r_uquantval) = tables.round_trip_retain_top_two_bits(level, r_lowbits);
        r_intval = (r_intval & !0x3F) | (r_uquantval & 0x3F);
        let r_fval = r_intval as f32 * params.rscale;

        // G and B store distances below the major component, recomputed
        // against the rounded R.
        let g_fval = (r_fval - g).clamp(0.0, 65535.0);
        let b_fval = (r_fval - b).clamp(0.0, 65535.0);
        let mut g_intval = round_i32(g_fval * params.scale);
        let mut b_intval = round_i32(b_fval * params.scale);
        if g_intval >= gb_intcutoff || b_intval >= gb_intcutoff {
            continue;
        }

        let mut g_lowbits = g_intval & 0x1F;
        let mut b_lowbits = b_intval & 0x1F;
        g_lowbits |= (mode_enc & 0x4) << 5;
        b_lowbits |= (mode_enc & 0x8) << 4;
        g_lowbits |= rgbo_scatter_bit(params.gb_scatter[0], r_intval, g_intval, b_intval, 0) << 6;
        g_lowbits |= rgbo_scatter_bit(params.gb_scatter[1], r_intval, g_intval, b_intval, 0) << 5;
        b_lowbits |= rgbo_scatter_bit(params.gb_scatter[2], r_intval, g_intval, b_intval, 0) << 6;
        b_lowbits |= rgbo_scatter_bit(params.gb_scatter[3], r_intval, g_intval, b_intval, 0) << 5;

        let (g_quantval, g_uquantval) = tables.round_trip_retain_top_four_bits(level, g_lowbits);
        let (b_quantval, b_uquantval) = tables.round_trip_retain_top_four_bits(level, b_lowbits);
        g_intval = (g_intval & !0x1F) | (g_uquantval & 0x1F);
        b_intval = (b_intval & !0x1F) | (b_uquantval & 0x1F);
        let g_fval = g_intval as f32 * params.rscale;
        let b_fval = b_intval as f32 * params.rscale;

        // Fold the quantization error of R, G and B back into the scale: a
        // positive error raised the color overall, so the scale rises too.
        let rgb_errorsum = (r_fval - r) + (r_fval - g_fval - g) + (r_fval - b_fval - b);
        let s_fval = (s_base + rgb_errorsum * (1.0 / 3.0)).clamp(0.0, 1e9);
        let s_intval = round_i32(s_fval * params.scale);
        if s_intval >= s_intcutoff {
            continue;
        }

        let mut s_lowbits = s_intval & 0x1F;
        s_lowbits |= rgbo_scatter_bit(params.s_scatter[0], r_intval, 0, 0, s_intval) << 7;
        s_lowbits |= rgbo_scatter_bit(params.s_scatter[1], r_intval, 0, 0, s_intval) << 6;
        s_lowbits |= rgbo_scatter_bit(params.s_scatter[2], r_intval, 0, 0, s_intval) << 5;

        let (s_quantval, _) = tables.round_trip_retain_top_four_bits(level, s_lowbits);

        output[0] = r_quantval as u8;
        output[1] = g_quantval as u8;
        output[2] = b_quantval as u8;
        output[3] = s_quantval as u8;
        return;
    }

    // No mode fits; encode flat at 1/512 with the mode bits forced.
    let mut vals = backup;
    let mut ivals = [0i32; 4];
    let mut cvals = [0.0f32; 3];

    for i in 0..3 {
        vals[i] = vals[i].clamp(0.0, 65020.0);
        ivals[i] = round_i32(vals[i] * (1.0 / 512.0));
        cvals[i] = ivals[i] as f32 * 512.0;
    }

    let rgb_errorsum = (cvals[0] - vals[0]) + (cvals[1] - vals[1]) + (cvals[2] - vals[2]);
    vals[3] = (vals[3] + rgb_errorsum * (1.0 / 3.0)).clamp(0.0, 65020.0);
    ivals[3] = round_i32(vals[3] * (1.0 / 512.0));

    let encvals = [
        (ivals[0] & 0x3F) | 0xC0,
        (ivals[1] & 0x7F) | 0x80,
        (ivals[2] & 0x7F) | 0x80,
        (ivals[3] & 0x7F) | ((ivals[0] & 0x40) << 1),
    ];

    for (out, &enc) in output[..4].iter_mut().zip(encvals.iter()) {
        let (quantval, _) = tables.round_trip_retain_top_four_bits(level, enc);
        *out = quantval as u8;
    }
}

/// Source field for a scatter bit in the base-plus-offsets encoding.
#[derive(Clone, Copy)]
enum RgbSrc {
    A,
    B0,
    B1,
    C,
    D0,
    D1,
}

#[derive(Clone, Copy)]
struct RgbBit {
    src: RgbSrc,
    shift: u32,
}

/// One mode of the HDR RGB base-plus-offsets encoding.
///
/// `b0_bit`/`b1_bit` land in bit 6 of the packed B bytes; `d0_bits` and
/// `d1_bits` in bits 6 and 5 of the packed D bytes.
struct RgbMode {
    b_bits: u32,
    c_bits: u32,
    d_bits: u32,
    b_cutoff: f32,
    c_cutoff: f32,
    d_cutoff: f32,
    scale: f32,
    rscale: f32,
    b0_bit: RgbBit,
    b1_bit: RgbBit,
    d0_bits: [RgbBit; 2],
    d1_bits: [RgbBit; 2],
}

const fn rgb_bit(src: RgbSrc, shift: u32) -> RgbBit {
    RgbBit { src, shift }
}

static RGB_MODES: [RgbMode; 8] = [
    RgbMode {
        b_bits: 7,
        c_bits: 6,
        d_bits: 7,
        b_cutoff: 16384.0,
        c_cutoff: 8192.0,
        d_cutoff: 8192.0,
        scale: 1.0 / 128.0,
        rscale: 128.0,
        b0_bit: rgb_bit(RgbSrc::B0, 6),
        b1_bit: rgb_bit(RgbSrc::B1, 6),
        d0_bits: [rgb_bit(RgbSrc::D0, 6), rgb_bit(RgbSrc::D0, 5)],
        d1_bits: [rgb_bit(RgbSrc::D1, 6), rgb_bit(RgbSrc::D1, 5)],
    },
    RgbMode {
        b_bits: 8,
        c_bits: 6,
        d_bits: 6,
        b_cutoff: 32768.0,
        c_cutoff: 8192.0,
        d_cutoff: 4096.0,
        scale: 1.0 / 128.0,
        rscale: 128.0,
        b0_bit: rgb_bit(RgbSrc::B0, 6),
        b1_bit: rgb_bit(RgbSrc::B1, 6),
        d0_bits: [rgb_bit(RgbSrc::B0, 7), rgb_bit(RgbSrc::D0, 5)],
        d1_bits: [rgb_bit(RgbSrc::B1, 7), rgb_bit(RgbSrc::D1, 5)],
    },
    RgbMode {
        b_bits: 6,
        c_bits: 7,
        d_bits: 7,
        b_cutoff: 4096.0,
        c_cutoff: 8192.0,
        d_cutoff: 4096.0,
        scale: 1.0 / 64.0,
        rscale: 64.0,
        b0_bit: rgb_bit(RgbSrc::A, 9),
        b1_bit: rgb_bit(RgbSrc::C, 6),
        d0_bits: [rgb_bit(RgbSrc::D0, 6), rgb_bit(RgbSrc::D0, 5)],
        d1_bits: [rgb_bit(RgbSrc::D1, 6), rgb_bit(RgbSrc::D1, 5)],
    },
    RgbMode {
        b_bits: 7,
        c_bits: 7,
        d_bits: 6,
        b_cutoff: 8192.0,
        c_cutoff: 8192.0,
        d_cutoff: 2048.0,
        scale: 1.0 / 64.0,
        rscale: 64.0,
        b0_bit: rgb_bit(RgbSrc::B0, 6),
        b1_bit: rgb_bit(RgbSrc::B1, 6),
        d0_bits: [rgb_bit(RgbSrc::A, 9), rgb_bit(RgbSrc::D0, 5)],
        d1_bits: [rgb_bit(RgbSrc::C, 6), rgb_bit(RgbSrc::D1, 5)],
    },
    RgbMode {
        b_bits: 8,
        c_bits: 6,
        d_bits: 5,
        b_cutoff: 8192.0,
        c_cutoff: 2048.0,
        d_cutoff: 512.0,
        scale: 1.0 / 32.0,
        rscale: 32.0,
        b0_bit: rgb_bit(RgbSrc::B0, 6),
        b1_bit: rgb_bit(RgbSrc::B1, 6),
        d0_bits: [rgb_bit(RgbSrc::B0, 7), rgb_bit(RgbSrc::A, 9)],
        d1_bits: [rgb_bit(RgbSrc::B1, 7), rgb_bit(RgbSrc::A, 10)],
    },
    RgbMode {
        b_bits: 6,
        c_bits: 8,
        d_bits: 6,
        b_cutoff: 2048.0,
        c_cutoff: 8192.0,
        d_cutoff: 1024.0,
        scale: 1.0 / 32.0,
        rscale: 32.0,
        b0_bit: rgb_bit(RgbSrc::A, 9),
        b1_bit: rgb_bit(RgbSrc::A, 10),
        d0_bits: [rgb_bit(RgbSrc::C, 7), rgb_bit(RgbSrc::D0, 5)],
        d1_bits: [rgb_bit(RgbSrc::C, 6), rgb_bit(RgbSrc::D1, 5)],
    },
    RgbMode {
        b_bits: 7,
        c_bits: 7,
        d_bits: 5,
        b_cutoff: 2048.0,
        c_cutoff: 2048.0,
        d_cutoff: 256.0,
        scale: 1.0 / 16.0,
        rscale: 16.0,
        b0_bit: rgb_bit(RgbSrc::B0, 6),
        b1_bit: rgb_bit(RgbSrc::B1, 6),
        d0_bits: [rgb_bit(RgbSrc::A, 11), rgb_bit(RgbSrc::A, 9)],
        d1_bits: [rgb_bit(RgbSrc::C, 6), rgb_bit(RgbSrc::A, 10)],
    },
    RgbMode {
        b_bits: 6,
        c_bits: 7,
        d_bits: 6,
        b_cutoff: 1024.0,
        c_cutoff: 2048.0,
        d_cutoff: 512.0,
        scale: 1.0 / 16.0,
        rscale: 16.0,
        b0_bit: rgb_bit(RgbSrc::A, 9),
        b1_bit: rgb_bit(RgbSrc::A, 10),
        d0_bits: [rgb_bit(RgbSrc::A, 11), rgb_bit(RgbSrc::D0, 5)],
        d1_bits: [rgb_bit(RgbSrc::C, 6), rgb_bit(RgbSrc::D1, 5)],
    },
];

#[allow(clippy::too_many_arguments)]
fn rgb_scatter_bit(bit: RgbBit, a: i32, b0: i32, b1: i32, c: i32, d0: i32, d1: i32) -> i32 {
    let v = match bit.src {
        RgbSrc::A => a,
        RgbSrc::B0 => b0,
        RgbSrc::B1 => b1,
        RgbSrc::C => c,
        RgbSrc::D0 => d0,
        RgbSrc::D1 => d1,
    };
    (v >> bit.shift) & 1
}

/// Quantize a pair of HDR RGB endpoints into `output[0..6]`.
///
/// The bright endpoint becomes the base A with per-channel offsets B; the
/// dark endpoint is reached through the further offsets C and D.
pub(crate) fn quantize_hdr_rgb(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let c0 = ColorF32::new(
        color0.r.clamp(0.0, 65535.0),
        color0.g.clamp(0.0, 65535.0),
        color0.b.clamp(0.0, 65535.0),
        color0.a,
    );
    let c1 = ColorF32::new(
        color1.r.clamp(0.0, 65535.0),
        color1.g.clamp(0.0, 65535.0),
        color1.b.clamp(0.0, 65535.0),
        color1.a,
    );

    // Kept unswizzled for the flat fallback.
    let backup0 = c0;
    let backup1 = c1;

    let majcomp = if c1.r > c1.g && c1.r > c1.b {
        0
    } else if c1.g > c1.b {
        1
    } else {
        2
    };

    let (c0, c1) = match majcomp {
        1 => (
            ColorF32::new(c0.g, c0.r, c0.b, c0.a),
            ColorF32::new(c1.g, c1.r, c1.b, c1.a),
        ),
        2 => (
            ColorF32::new(c0.b, c0.g, c0.r, c0.a),
            ColorF32::new(c1.b, c1.g, c1.r, c1.a),
        ),
        _ => (c0, c1),
    };

    let a_base = c1.r;
    let b0_base = a_base - c1.g;
    let b1_base = a_base - c1.b;
    let c_base = a_base - c0.r;
    let d0_base = a_base - b0_base - c_base - c0.g;
    let d1_base = a_base - b1_base - c_base - c0.b;

    // Highest-precision mode first.
    for (mode, params) in RGB_MODES.iter().enumerate().rev() {
        if b0_base > params.b_cutoff
            || b1_base > params.b_cutoff
            || c_base > params.c_cutoff
            || d0_base.abs() > params.d_cutoff
            || d1_base.abs() > params.d_cutoff
        {
            continue;
        }

        let mode = mode as i32;
        let b_intcutoff = 1 << params.b_bits;
        let c_intcutoff = 1 << params.c_bits;
        let d_intcutoff = 1 << (params.d_bits - 1);

        // A's top bits travel inside the other fields, so its low byte
        // quantizes unguarded.
        let mut a_intval = round_i32(a_base * params.scale);
        let a_quantval = tables.quant_i32(level, a_intval & 0xFF);
        let a_uquantval = tables.unquant_i32(level, a_quantval);
        a_intval = (a_intval & !0xFF) | a_uquantval;
        let a_fval = a_intval as f32 * params.rscale;

        // C, recomputed against the rounded A.
        let c_fval = (a_fval - c0.r).clamp(0.0, 65535.0);
        let mut c_intval = round_i32(c_fval * params.scale);
        if c_intval >= c_intcutoff {
            continue;
        }

        let mut c_lowbits = c_intval & 0x3F;
        c_lowbits |= (mode & 1) << 7;
        c_lowbits |= (a_intval & 0x100) >> 2;
        let (c_quantval, c_uquantval) = tables.round_trip_retain_top_two_bits(level, c_lowbits);
        c_intval = (c_intval & !0x3F) | (c_uquantval & 0x3F);
        let c_fval = c_intval as f32 * params.rscale;

        // B0 and B1, against the rounded A.
        let b0_fval = (a_fval - c1.g).clamp(0.0, 65535.0);
        let b1_fval = (a_fval - c1.b).clamp(0.0, 65535.0);
        let mut b0_intval = round_i32(b0_fval * params.scale);
        let mut b1_intval = round_i32(b1_fval * params.scale);
        if b0_intval >= b_intcutoff || b1_intval >= b_intcutoff {
            continue;
        }

        let mut b0_lowbits = b0_intval & 0x3F;
        let mut b1_lowbits = b1_intval & 0x3F;
        b0_lowbits |=
            rgb_scatter_bit(params.b0_bit, a_intval, b0_intval, b1_intval, c_intval, 0, 0) << 6;
        b1_lowbits |=
            rgb_scatter_bit(params.b1_bit, a_intval, b0_intval, b1_intval, c_intval, 0, 0) << 6;
        b0_lowbits |= ((mode >> 1) & 1) << 7;
        b1_lowbits |= ((mode >> 2) & 1) << 7;
        let (b0_quantval, b0_uquantval) = tables.round_trip_retain_top_two_bits(level, b0_lowbits);
        let (b1_quantval, b1_uquantval) = tables.round_trip_retain_top_two_bits(level, b1_lowbits);
        b0_intval = (b0_intval & !0x3F) | (b0_uquantval & 0x3F);
        b1_intval = (b1_intval & !0x3F) | (b1_uquantval & 0x3F);
        let b0_fval = b0_intval as f32 * params.rscale;
        let b1_fval = b1_intval as f32 * params.rscale;

        // D0 and D1 absorb what is left of the dark endpoint.
        let d0_fval = (a_fval - b0_fval - c_fval - c0.g).clamp(-65535.0, 65535.0);
        let d1_fval = (a_fval - b1_fval - c_fval - c0.b).clamp(-65535.0, 65535.0);
        let d0_intval = round_i32(d0_fval * params.scale);
        let d1_intval = round_i32(d1_fval * params.scale);
        if d0_intval.abs() >= d_intcutoff || d1_intval.abs() >= d_intcutoff {
            continue;
        }

        let mut d0_lowbits = d0_intval & 0x1F;
        let mut d1_lowbits = d1_intval & 0x1F;
        d0_lowbits |= rgb_scatter_bit(
            params.d0_bits[0],
            a_intval,
            b0_intval,
            b1_intval,
            c_intval,
            d0_intval,
            d1_intval,
        ) << 6;
        d0_lowbits |= rgb_scatter_bit(
            params.d0_bits[1],
            a_intval,
            b0_intval,
            b1_intval,
            c_intval,
            d0_intval,
            d1_intval,
        ) << 5;
        d1_lowbits |= rgb_scatter_bit(
            params.d1_bits[0],
            a_intval,
            b0_intval,
            b1_intval,
            c_intval,
            d0_intval,
            d1_intval,
        ) << 6;
        d1_lowbits |= rgb_scatter_bit(
            params.d1_bits[1],
            a_intval,
            b0_intval,
            b1_intval,
            c_intval,
            d0_intval,
            d1_intval,
        ) << 5;
        d0_lowbits |= (majcomp & 1) << 7;
        d1_lowbits |= ((majcomp >> 1) & 1) << 7;

        let (d0_quantval, _) = tables.round_trip_retain_top_four_bits(level, d0_lowbits);
        let (d1_quantval, _) = tables.round_trip_retain_top_four_bits(level, d1_lowbits);

        output[0] = a_quantval as u8;
        output[1] = c_quantval as u8;
        output[2] = b0_quantval as u8;
        output[3] = b1_quantval as u8;
        output[4] = d0_quantval as u8;
        output[5] = d1_quantval as u8;
        return;
    }

    // No mode accommodates the pair; fall back to a flat 8-8-7
    // representation, roughly LDR 4:4:3 accuracy.
    let vals = [
        backup0.r, backup1.r, backup0.g, backup1.g, backup0.b, backup1.b,
    ]
    .map(|v| v.clamp(0.0, 65020.0));

    for i in 0..4 {
        output[i] = tables.quant_i32(level, round_i32(vals[i] * (1.0 / 256.0))) as u8;
    }
    for i in 4..6 {
        let idx = round_i32(vals[i] * (1.0 / 512.0)) + 128;
        let (quantval, _) = tables.round_trip_retain_top_two_bits(level, idx);
        output[i] = quantval as u8;
    }
}

/// Quantize HDR RGB endpoints plus an LDR alpha pair into `output[0..8]`.
pub(crate) fn quantize_hdr_rgb_ldr_alpha(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    quantize_hdr_rgb(tables, color0, color1, output, level);

    let a0 = (color0.a * LDR_SCALE).clamp(0.0, 255.0);
    let a1 = (color1.a * LDR_SCALE).clamp(0.0, 255.0);
    output[6] = tables.quant_i32(level, round_i32(a0)) as u8;
    output[7] = tables.quant_i32(level, round_i32(a1)) as u8;
}

/// Quantize HDR RGB endpoints plus an HDR alpha pair into `output[0..8]`.
pub(crate) fn quantize_hdr_rgba(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    quantize_hdr_rgb(tables, color0, color1, output, level);
    quantize_hdr_alpha(tables, color0.a, color1.a, output, level);
}

/// Attempt to quantize an HDR luminance pair whose endpoints are within a
/// factor of two of each other into `output[0..2]`.
pub(crate) fn try_quantize_hdr_luminance_small_range(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) -> bool {
    let mut lum0 = (color0.r + color0.g + color0.b) * (1.0 / 3.0);
    let mut lum1 = (color1.r + color1.g + color1.b) * (1.0 / 3.0);

    if lum1 < lum0 {
        let avg = (lum0 + lum1) * 0.5;
        lum0 = avg;
        lum1 = avg;
    }

    let ilum0 = round_i32(lum0);
    let ilum1 = round_i32(lum1);

    if ilum1 - ilum0 > 2048 {
        return false;
    }

    // High-precision submode: eleven-bit base, four-bit difference.
    let mut lowval = ((ilum0 + 16) >> 5).clamp(0, 2047);
    let highval = ((ilum1 + 16) >> 5).clamp(0, 2047);

    let v0 = lowval & 0x7F;
    let v0e = tables.quant_i32(level, v0);
    let v0d = tables.unquant_i32(level, v0e);
    // A set bit 7 after the round trip means the decoder reads the
    // low-precision submode.
    if v0d & 0x80 == 0 {
        lowval = (lowval & !0x7F) | (v0d & 0x7F);
        let diffval = highval - lowval;
        if (0..=15).contains(&diffval) {
            let v1 = ((lowval >> 3) & 0xF0) | diffval;
            let v1e = tables.quant_i32(level, v1);
            let v1d = tables.unquant_i32(level, v1e);
            if v1d & 0xF0 == v1 & 0xF0 {
                output[0] = v0e as u8;
                output[1] = v1e as u8;
                return true;
            }
        }
    }

    // Low-precision submode: ten-bit base, five-bit difference, marked by
    // bit 7 of the first byte.
    let mut lowval = ((ilum0 + 32) >> 6).clamp(0, 1023);
    let highval = ((ilum1 + 32) >> 6).clamp(0, 1023);

    let v0 = (lowval & 0x7F) | 0x80;
    let v0e = tables.quant_i32(level, v0);
    let v0d = tables.unquant_i32(level, v0e);
    if v0d & 0x80 == 0 {
        return false;
    }

    lowval = (lowval & !0x7F) | (v0d & 0x7F);
    let diffval = highval - lowval;
    if !(0..=31).contains(&diffval) {
        return false;
    }

    let v1 = ((lowval >> 2) & 0xE0) | diffval;
    let v1e = tables.quant_i32(level, v1);
    let v1d = tables.unquant_i32(level, v1e);
    if v1d & 0xE0 != v1 & 0xE0 {
        return false;
    }

    output[0] = v0e as u8;
    output[1] = v1e as u8;
    true
}

/// Quantize an HDR luminance pair of arbitrary range into `output[0..2]`.
pub(crate) fn quantize_hdr_luminance_large_range(
    tables: &QuantTables,
    color0: ColorF32,
    color1: ColorF32,
    output: &mut [u8; 8],
    level: usize,
) {
    let mut lum0 = (color0.r + color0.g + color0.b) * (1.0 / 3.0);
    let mut lum1 = (color1.r + color1.g + color1.b) * (1.0 / 3.0);

    if lum1 < lum0 {
        let avg = (lum0 + lum1) * 0.5;
        lum0 = avg;
        lum1 = avg;
    }

    let ilum0 = round_i32(lum0);
    let ilum1 = round_i32(lum1);

    // Closest encodable points in the upper and lower halves of the
    // code-point space; the lower half stores the pair swapped with a
    // half-step offset.
    let upper_v0 = ((ilum0 + 128) >> 8).clamp(0, 255);
    let upper_v1 = ((ilum1 + 128) >> 8).clamp(0, 255);
    let lower_v0 = ((ilum1 + 256) >> 8).clamp(0, 255);
    let lower_v1 = (ilum0 >> 8).clamp(0, 255);

    let upper0_diff = (upper_v0 << 8) - ilum0;
    let upper1_diff = (upper_v1 << 8) - ilum1;
    let lower0_diff = (lower_v1 << 8) + 128 - ilum0;
    let lower1_diff = (lower_v0 << 8) - 128 - ilum1;

    let upper_error = upper0_diff * upper0_diff + upper1_diff * upper1_diff;
    let lower_error = lower0_diff * lower0_diff + lower1_diff * lower1_diff;

    let (v0, v1) = if upper_error < lower_error {
        (upper_v0, upper_v1)
    } else {
        (lower_v0, lower_v1)
    };

    output[0] = tables.quant_i32(level, v0) as u8;
    output[1] = tables.quant_i32(level, v1) as u8;
}

/// Round-trip masks for the three HDR alpha delta submodes.
const HDR_ALPHA_TESTBITS: [i32; 3] = [0xE0, 0xF0, 0xF8];

/// Quantize an HDR alpha pair into `output[6..8]`.
pub(crate) fn quantize_hdr_alpha(
    tables: &QuantTables,
    alpha0: f32,
    alpha1: f32,
    output: &mut [u8; 8],
    level: usize,
) {
    let alpha0 = alpha0.clamp(0.0, 65280.0);
    let alpha1 = alpha1.clamp(0.0, 65280.0);

    let ialpha0 = round_i32(alpha0);
    let ialpha1 = round_i32(alpha1);

    // Delta submodes in decreasing-precision order.
    for i in (0..3i32).rev() {
        let mut val0 = (ialpha0 + (128 >> i)) >> (8 - i);
        let val1 = (ialpha1 + (128 >> i)) >> (8 - i);

        let v6 = (val0 & 0x7F) | ((i & 1) << 7);
        let v6e = tables.quant_i32(level, v6);
        let v6d = tables.unquant_i32(level, v6e);
        if (v6 ^ v6d) & 0x80 != 0 {
            continue;
        }

        val0 = (val0 & !0x7F) | (v6d & 0x7F);
        let diffval = val1 - val0;
        let cutoff = 32 >> i;
        let mask = 2 * cutoff - 1;
        if diffval < -cutoff || diffval >= cutoff {
            continue;
        }

        let v7 = ((i & 2) << 6) | ((val0 >> 7) << (6 - i)) | (diffval & mask);
        let v7e = tables.quant_i32(level, v7);
        let v7d = tables.unquant_i32(level, v7e);
        if (v7 ^ v7d) & HDR_ALPHA_TESTBITS[i as usize] != 0 {
            continue;
        }

        output[6] = v6e as u8;
        output[7] = v7e as u8;
        return;
    }

    // No delta submode fits; encode flat, marked by bit 7 of both bytes.
    let val0 = (ialpha0 + 256) >> 9;
    let val1 = (ialpha1 + 256) >> 9;
    output[6] = tables.quant_i32(level, val0 | 0x80) as u8;
    output[7] = tables.quant_i32(level, val1 | 0x80) as u8;
}
