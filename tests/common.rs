use astc_endpoints::{QuantTables, QUANT_LEVEL_COUNT};

/// Codebook sizes of the 21 ASTC quantization levels.
pub const LEVEL_SIZES: [usize; QUANT_LEVEL_COUNT] = [
    2, 3, 4, 5, 6, 8, 10, 12, 16, 20, 24, 32, 40, 48, 64, 80, 96, 128, 160, 192, 256,
];

/// Tables where every level keeps all 256 byte values; codeword indices
/// equal the bytes they decode to.
pub fn identity_tables() -> QuantTables {
    let mut table = [[0u8; 256]; QUANT_LEVEL_COUNT];
    for level in table.iter_mut() {
        for (v, entry) in level.iter_mut().enumerate() {
            *entry = v as u8;
        }
    }
    QuantTables::new(table, table)
}

/// Uniform codebooks with the real per-level sizes: codeword `q` decodes to
/// `round(q * 255 / (n - 1))` and each byte maps to its nearest codeword.
pub fn astc_sized_tables() -> QuantTables {
    let mut quant = [[0u8; 256]; QUANT_LEVEL_COUNT];
    let mut unquant = [[0u8; 256]; QUANT_LEVEL_COUNT];
    for (level, &n) in LEVEL_SIZES.iter().enumerate() {
        for v in 0..256 {
            quant[level][v] = (v as f32 * (n - 1) as f32 / 255.0).round() as u8;
        }
        for q in 0..256 {
            let q = q.min(n - 1);
            unquant[level][q] = (q as f32 * 255.0 / (n - 1) as f32).round() as u8;
        }
    }
    QuantTables::new(quant, unquant)
}
