//! VP8 inverse transforms (IDCT and WHT)
//!
//! This module contains the 4x4 inverse DCT used to turn dequantized
//! residual coefficients back into pixel deltas, and the inverse
//! Walsh-Hadamard transform that redistributes a macroblock's luma DC
//! coefficients. All kernels merge their result straight into the caller's
//! pixel plane (or coefficient array, for the WHT) with saturation.

/// Constants for the inverse DCT
const C1: i64 = 20091; // cos(pi/8) * sqrt(2) * 65536, minus one
const C2: i64 = 35468; // sin(pi/8) * sqrt(2) * 65536

#[inline]
fn mult1(a: i64) -> i64 {
    a + ((a * C1) >> 16)
}

#[inline]
fn mult2(a: i64) -> i64 {
    (a * C2) >> 16
}

/// Add a residual delta to a sample and clamp to [0, 255]
#[inline]
fn add_clamped(sample: u8, delta: i32) -> u8 {
    (sample as i32 + delta).clamp(0, 255) as u8
}

/// 4x4 inverse DCT of one coefficient block, merged into the plane
///
/// Runs the 1-D butterfly over the four columns, then over the four rows of
/// the intermediate, rounding with `(x + 4) >> 3` in the second pass. Each
/// rounded delta is added to the existing sample at
/// `plane[offset + y * stride + x]` and saturated.
///
/// The 1-D passes widen to i64 so that even adversarial coefficient values
/// cannot overflow before the final rounding shift.
pub fn transform_one(coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize) {
    assert!(coeffs.len() >= 16);
    let mut tmp = [0i32; 16];

    // 1D IDCT on columns
    for j in 0..4 {
        let a = coeffs[j] as i64;
        let b = coeffs[4 + j] as i64;
        let c = coeffs[8 + j] as i64;
        let d = coeffs[12 + j] as i64;

        let a1 = a + c;
        let b1 = a - c;
        let c1 = mult2(b) - mult1(d);
        let d1 = mult1(b) + mult2(d);

        tmp[j] = (a1 + d1) as i32;
        tmp[4 + j] = (b1 + c1) as i32;
        tmp[8 + j] = (b1 - c1) as i32;
        tmp[12 + j] = (a1 - d1) as i32;
    }

    // 1D IDCT on rows, then round, add to the prediction and saturate
    for i in 0..4 {
        let row = i * 4;
        let a = tmp[row] as i64;
        let b = tmp[row + 1] as i64;
        let c = tmp[row + 2] as i64;
        let d = tmp[row + 3] as i64;

        let a1 = a + c;
        let b1 = a - c;
        let c1 = mult2(b) - mult1(d);
        let d1 = mult1(b) + mult2(d);

        let deltas = [a1 + d1, b1 + c1, b1 - c1, a1 - d1];
        for (x, &v) in deltas.iter().enumerate() {
            let idx = offset + i * stride + x;
            plane[idx] = add_clamped(plane[idx], ((v + 4) >> 3) as i32);
        }
    }
}

/// Inverse DCT of one or two horizontally adjacent coefficient blocks
///
/// When `do_two` is set the second block occupies coefficients 16..32 and
/// lands 4 samples to the right of the first.
pub fn transform_two(coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize, do_two: bool) {
    transform_one(coeffs, plane, offset, stride);
    if do_two {
        transform_one(&coeffs[16..], plane, offset + 4, stride);
    }
}

/// Simplified inverse DCT for DC-only blocks
///
/// Bit-identical to [`transform_one`] when every AC coefficient is zero.
pub fn transform_dc(coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize) {
    let dc = (coeffs[0] as i32 + 4) >> 3;
    for y in 0..4 {
        for x in 0..4 {
            let idx = offset + y * stride + x;
            plane[idx] = add_clamped(plane[idx], dc);
        }
    }
}

/// Simplified inverse DCT for blocks with only coefficients 0, 1 and 4
///
/// The butterfly collapses to four per-row base values and four per-column
/// deltas. Bit-identical to [`transform_one`] for this coefficient pattern.
pub fn transform_ac3(coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize) {
    assert!(coeffs.len() >= 16);
    let a = coeffs[0] as i64 + 4;
    let c4 = mult2(coeffs[4] as i64);
    let d4 = mult1(coeffs[4] as i64);
    let c1 = mult2(coeffs[1] as i64);
    let d1 = mult1(coeffs[1] as i64);

    let bases = [a + d4, a + c4, a - c4, a - d4];
    let deltas = [d1, c1, -c1, -d1];
    for (y, &base) in bases.iter().enumerate() {
        for (x, &delta) in deltas.iter().enumerate() {
            let idx = offset + y * stride + x;
            plane[idx] = add_clamped(plane[idx], ((base + delta) >> 3) as i32);
        }
    }
}

/// 4x4 inverse Walsh-Hadamard transform of a macroblock's luma DC values
///
/// `input` holds the 16 gathered DC coefficients as a 4x4 grid. Output `k`
/// (row-major) becomes the DC coefficient of sub-block `k`, i.e. it is
/// written to `out[k * 16]`; the remaining entries of `out` are untouched.
pub fn transform_wht(input: &[i16; 16], out: &mut [i16; 256]) {
    let mut tmp = [0i32; 16];

    // vertical pass
    for i in 0..4 {
        let a0 = input[i] as i32 + input[12 + i] as i32;
        let a1 = input[4 + i] as i32 + input[8 + i] as i32;
        let a2 = input[4 + i] as i32 - input[8 + i] as i32;
        let a3 = input[i] as i32 - input[12 + i] as i32;
        tmp[i] = a0 + a1;
        tmp[8 + i] = a0 - a1;
        tmp[4 + i] = a3 + a2;
        tmp[12 + i] = a3 - a2;
    }

    // horizontal pass, scattering into the DC slot of each sub-block
    for i in 0..4 {
        let dc = tmp[4 * i] + 3;
        let a0 = dc + tmp[4 * i + 3];
        let a1 = tmp[4 * i + 1] + tmp[4 * i + 2];
        let a2 = tmp[4 * i + 1] - tmp[4 * i + 2];
        let a3 = dc - tmp[4 * i + 3];
        out[(4 * i) * 16] = ((a0 + a1) >> 3) as i16;
        out[(4 * i + 1) * 16] = ((a3 + a2) >> 3) as i16;
        out[(4 * i + 2) * 16] = ((a0 - a1) >> 3) as i16;
        out[(4 * i + 3) * 16] = ((a3 - a2) >> 3) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRIDE: usize = 32;

    fn plane_filled(value: u8) -> Vec<u8> {
        vec![value; STRIDE * 8]
    }

    fn block_4x4(plane: &[u8], offset: usize) -> [u8; 16] {
        let mut out = [0u8; 16];
        for y in 0..4 {
            for x in 0..4 {
                out[y * 4 + x] = plane[offset + y * STRIDE + x];
            }
        }
        out
    }

    #[test]
    fn test_dc_only_matches_full_transform() {
        for dc in [-4096i16, -255, -9, -1, 0, 1, 8, 32, 255, 4095] {
            let mut coeffs = [0i16; 16];
            coeffs[0] = dc;

            let mut full = plane_filled(100);
            let mut shortcut = plane_filled(100);
            transform_one(&coeffs, &mut full, 0, STRIDE);
            transform_dc(&coeffs, &mut shortcut, 0, STRIDE);

            assert_eq!(
                block_4x4(&full, 0),
                block_4x4(&shortcut, 0),
                "Mismatch for DC {}",
                dc
            );
        }
    }

    #[test]
    fn test_dc_32_reconstructs_uniform_104() {
        let mut coeffs = [0i16; 16];
        coeffs[0] = 32;
        let mut plane = plane_filled(100);
        transform_one(&coeffs, &mut plane, 0, STRIDE);
        assert_eq!(block_4x4(&plane, 0), [104u8; 16]);
    }

    #[test]
    fn test_ac3_matches_full_transform() {
        let patterns: &[(i16, i16, i16)] = &[
            (0, 0, 0),
            (32, 0, 0),
            (100, -50, 25),
            (-300, 120, -77),
            (2047, -2048, 1024),
            (i16::MAX, i16::MIN, i16::MAX),
        ];
        for &(dc, ac1, ac4) in patterns {
            let mut coeffs = [0i16; 16];
            coeffs[0] = dc;
            coeffs[1] = ac1;
            coeffs[4] = ac4;

            let mut full = plane_filled(128);
            let mut shortcut = plane_filled(128);
            transform_one(&coeffs, &mut full, STRIDE + 2, STRIDE);
            transform_ac3(&coeffs, &mut shortcut, STRIDE + 2, STRIDE);

            assert_eq!(
                block_4x4(&full, STRIDE + 2),
                block_4x4(&shortcut, STRIDE + 2),
                "Mismatch for coefficients ({}, {}, {})",
                dc,
                ac1,
                ac4
            );
        }
    }

    #[test]
    fn test_output_saturates_for_adversarial_coefficients() {
        // Completing without an arithmetic overflow panic is most of the
        // point; samples are u8 so the range invariant holds by type.
        let mut plane = plane_filled(200);
        transform_one(&[i16::MAX; 16], &mut plane, 0, STRIDE);
        let block = block_4x4(&plane, 0);
        assert!(block.contains(&0) && block.contains(&255));

        transform_one(&[i16::MIN; 16], &mut plane, 4, STRIDE);
        transform_ac3(&[i16::MIN; 16], &mut plane, 8, STRIDE);
        transform_dc(&[i16::MIN; 16], &mut plane, 12, STRIDE);
        assert_eq!(block_4x4(&plane, 12), [0u8; 16]);
    }

    #[test]
    fn test_transform_two_offsets_second_block() {
        let mut coeffs = [0i16; 32];
        coeffs[0] = 32; // first block: +4
        coeffs[16] = 64; // second block: (64 + 4) >> 3 = +8
        let mut plane = plane_filled(100);
        transform_two(&coeffs, &mut plane, 0, STRIDE, true);
        assert_eq!(block_4x4(&plane, 0), [104u8; 16]);
        assert_eq!(block_4x4(&plane, 4), [108u8; 16]);

        // without the flag the second block is ignored
        let mut plane = plane_filled(100);
        transform_two(&coeffs, &mut plane, 0, STRIDE, false);
        assert_eq!(block_4x4(&plane, 4), [100u8; 16]);
    }

    #[test]
    fn test_wht_uniform_input_scatters_to_dc_slots() {
        // A lone DC of 8 spreads (8 + 3) >> 3 = 1 to every sub-block.
        let mut input = [0i16; 16];
        input[0] = 8;
        let mut out = [0i16; 256];
        transform_wht(&input, &mut out);
        for k in 0..16 {
            assert_eq!(out[k * 16], 1, "sub-block {}", k);
        }
        // nothing outside the DC slots is written
        for (i, &v) in out.iter().enumerate() {
            if i % 16 != 0 {
                assert_eq!(v, 0);
            }
        }
    }

    #[test]
    fn test_wht_known_vector() {
        // A single hot input at (row 1, col 2) of the DC grid produces a
        // sign pattern: the vertical pass puts +-80 into column 2 of every
        // intermediate row, and the horizontal pass turns each row into
        // (3 +- 80) >> 3 = +-10 (the +3 rounding bias leans the negative
        // outputs toward -10).
        let mut input = [0i16; 16];
        input[6] = 80; // row 1, col 2
        let mut out = [0i16; 256];
        transform_wht(&input, &mut out);

        let expect: [i16; 16] = [
            10, -10, -10, 10, // row 0
            10, -10, -10, 10, // row 1
            -10, 10, 10, -10, // row 2
            -10, 10, 10, -10, // row 3
        ];
        for k in 0..16 {
            assert_eq!(out[k * 16], expect[k], "sub-block {}", k);
        }
    }
}
