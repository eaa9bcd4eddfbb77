//! IEEE binary16 round-tripping for 16-bit float literal normalisation.
//!
//! Only the f64 -> f16 -> f64 round trip is needed: the IR stores every float
//! literal as an f64, rounded so that equal values under the declared type
//! have identical stored representations.

/// Round an f64 to the nearest representable binary16 value (ties to even)
/// and widen it back to f64.
pub fn round_trip(value: f64) -> f64 {
    to_f64(from_f64(value))
}

/// Convert an f64 to its binary16 bit pattern, round-to-nearest-even.
pub fn from_f64(value: f64) -> u16 {
    // Go through f32 first; f64 -> f32 -> f16 double rounding is exact here
    // because f32 keeps more than 2 * 11 + 2 mantissa bits.
    let x = value as f32;
    let bits = x.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let man = bits & 0x007f_ffff;

    if exp == 0xff {
        // Inf or NaN. Keep a quiet-NaN payload bit so NaN stays NaN.
        let nan = if man != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | nan;
    }

    // Re-bias from f32 (127) to f16 (15).
    let unbiased = exp - 127;
    if unbiased > 15 {
        // Overflows to infinity.
        return sign | 0x7c00;
    }

    if unbiased >= -14 {
        // Normal range: 10 explicit mantissa bits survive.
        let half_exp = ((unbiased + 15) as u16) << 10;
        let half_man = (man >> 13) as u16;
        let rounded = sign | half_exp | half_man;
        // Round to nearest even on the 13 dropped bits.
        let round_bits = man & 0x1fff;
        if round_bits > 0x1000 || (round_bits == 0x1000 && (half_man & 1) == 1) {
            return rounded + 1; // carries into the exponent correctly
        }
        return rounded;
    }

    if unbiased < -25 {
        // Too small for even a subnormal; flush to signed zero.
        return sign;
    }

    // Subnormal range: shift the implicit leading 1 into the mantissa.
    let man = man | 0x0080_0000;
    let shift = (-14 - unbiased) as u32 + 13;
    let half_man = (man >> shift) as u16;
    let round_mask = 1u32 << (shift - 1);
    let round_bits = man & ((round_mask << 1) - 1);
    if round_bits > round_mask || (round_bits == round_mask && (half_man & 1) == 1) {
        return sign | (half_man + 1);
    }
    sign | half_man
}

/// Widen a binary16 bit pattern to f64.
pub fn to_f64(bits: u16) -> f64 {
    let sign = ((bits & 0x8000) as u32) << 16;
    let exp = ((bits >> 10) & 0x1f) as u32;
    let man = (bits & 0x03ff) as u32;

    let f32_bits = if exp == 0x1f {
        // Inf / NaN.
        sign | 0x7f80_0000 | (man << 13)
    } else if exp == 0 {
        if man == 0 {
            sign
        } else {
            // Subnormal: normalise into f32. A subnormal half is
            // man * 2^-24; after shifting the leading 1 up to bit 10 the
            // f32 exponent field is 113 - shifts.
            let mut exp = 113u32;
            let mut man = man;
            while man & 0x0400 == 0 {
                man <<= 1;
                exp -= 1;
            }
            sign | (exp << 23) | ((man & 0x03ff) << 13)
        }
    } else {
        sign | ((exp + 127 - 15) << 23) | (man << 13)
    };

    f32::from_bits(f32_bits) as f64
}
