/// Number of quantization levels; each level selects a codebook of between
/// 2 and 256 representable endpoint bytes.
pub const QUANT_LEVEL_COUNT: usize = 21;

/// Per-level endpoint codebooks, built elsewhere and only read here.
///
/// `quant[L][v]` maps a byte to its codeword index at level `L`, and
/// `unquant[L][q]` maps a codeword index back to the nearest representable
/// byte. The pair must round-trip: `unquant[L][quant[L][v]]` is the closest
/// codebook byte to `v`.
pub struct QuantTables {
    quant: [[u8; 256]; QUANT_LEVEL_COUNT],
    unquant: [[u8; 256]; QUANT_LEVEL_COUNT],
}

impl QuantTables {
    pub fn new(
        quant: [[u8; 256]; QUANT_LEVEL_COUNT],
        unquant: [[u8; 256]; QUANT_LEVEL_COUNT],
    ) -> Self {
        Self { quant, unquant }
    }

    /// Codeword index of the codebook byte nearest to `value`.
    pub fn quantize(&self, level: usize, value: u8) -> u8 {
        self.quant[level][value as usize]
    }

    /// Codebook byte for a codeword index.
    pub fn unquantize(&self, level: usize, index: u8) -> u8 {
        self.unquant[level][index as usize]
    }

    pub(crate) fn quant_i32(&self, level: usize, value: i32) -> i32 {
        debug_assert!((0..256).contains(&value));
        self.quant[level][value as usize] as i32
    }

    pub(crate) fn unquant_i32(&self, level: usize, index: i32) -> i32 {
        debug_assert!((0..256).contains(&index));
        self.unquant[level][index as usize] as i32
    }

    /// Lookup for intermediate values that may fall outside the byte range.
    pub(crate) fn quant_clamped(&self, level: usize, value: i32) -> i32 {
        self.quant[level][value.clamp(0, 255) as usize] as i32
    }

    /// Round trip a packed byte whose top two bits carry mode or sign
    /// information and must survive quantization unchanged.
    pub(crate) fn round_trip_retain_top_two_bits(&self, level: usize, value: i32) -> (i32, i32) {
        self.round_trip_retain(level, value, 0xC0)
    }

    /// Round trip a packed byte whose top nibble must survive quantization
    /// unchanged.
    pub(crate) fn round_trip_retain_top_four_bits(&self, level: usize, value: i32) -> (i32, i32) {
        self.round_trip_retain(level, value, 0xF0)
    }

    // Walk downward from the requested value: lowering it moves the byte
    // into a different codebook bucket whichever way the previous round
    // trip rounded, and 0 survives any top-bit mask in a well-formed table.
    fn round_trip_retain(&self, level: usize, value: i32, mask: i32) -> (i32, i32) {
        debug_assert!((0..256).contains(&value));
        for v in (0..=value).rev() {
            let q = self.quant_i32(level, v);
            let u = self.unquant_i32(level, q);
            if (v ^ u) & mask == 0 {
                return (q, u);
            }
        }
        let q = self.quant_i32(level, 0);
        (q, self.unquant_i32(level, q))
    }
}
