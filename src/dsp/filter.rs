//! VP8 in-loop deblocking filter
//!
//! The loop filter removes blocking artifacts left at macroblock and
//! sub-block boundaries after residual reconstruction. Each edge position
//! looks at up to four samples on either side (`p3..p0`, `q0..q3`), decides
//! from the per-edge thresholds whether the discontinuity is an artifact or
//! a real image edge, and nudges a narrow band of samples accordingly.
//!
//! All arithmetic runs in a centered signed domain: samples are biased from
//! [0,255] to [-128,127], filtered with saturating i8 operations, and
//! re-biased on write. The per-position kernels here are shared by both
//! backends, which differ only in traversal and batching.

/// Per-edge filter thresholds
///
/// All three are non-negative by construction; the decode loop derives them
/// from the frame filter level and sharpness once per macroblock.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterParams {
    /// Bound on overall pixel activity across the edge
    pub edge_limit: u8,
    /// Bound on sample-to-sample variation on either side of the edge
    pub interior_limit: u8,
    /// High edge variance threshold; above it the edge is treated as real
    /// image content and only lightly filtered
    pub hev_threshold: u8,
}

/// Map an unsigned sample into the centered signed domain (bias by -128)
#[inline]
fn to_signed(v: u8) -> i8 {
    (v ^ 0x80) as i8
}

/// Map a centered signed value back to the unsigned sample domain
#[inline]
fn to_unsigned(v: i8) -> u8 {
    (v as u8) ^ 0x80
}

/// Filter-needed predicate for one edge position
///
/// `w` holds `[p3, p2, p1, p0, q0, q1, q2, q3]`. The edge activity sum is
/// accumulated with saturating u8 adds, so a step of 128 or more pins it at
/// 255; interior variation is compared exactly.
#[inline]
fn needs_filter(w: &[u8; 8], params: FilterParams) -> bool {
    let [p3, p2, p1, p0, q0, q1, q2, q3] = *w;
    let d0 = p0
        .abs_diff(q0)
        .saturating_add(p0.abs_diff(q0))
        .saturating_add(p1.abs_diff(q1) >> 1);
    d0 <= params.edge_limit
        && p3.abs_diff(p2) <= params.interior_limit
        && p2.abs_diff(p1) <= params.interior_limit
        && p1.abs_diff(p0) <= params.interior_limit
        && q1.abs_diff(q0) <= params.interior_limit
        && q2.abs_diff(q1) <= params.interior_limit
        && q3.abs_diff(q2) <= params.interior_limit
}

/// High-edge-variance predicate for one edge position
#[inline]
fn is_high_variance(w: &[u8; 8], params: FilterParams) -> bool {
    w[2].abs_diff(w[3]).max(w[5].abs_diff(w[4])) > params.hev_threshold
}

/// Nudge the two samples adjacent to the edge by the base filter value
///
/// Returns the updated `(p0, q0)` pair and the `f1` correction, which the
/// 4-tap filter reuses for its outer-pixel adjustment.
#[inline]
fn adjust_p0q0(filt: i8, p0: i8, q0: i8) -> (i8, i8, i8) {
    let f1 = filt.saturating_add(4) >> 3;
    let f2 = filt.saturating_add(3) >> 3;
    (p0.saturating_add(f2), q0.saturating_sub(f1), f1)
}

/// Base filter value: 3*(q0 - p0) plus an optional p1 - q1 term, all
/// saturating in i8
#[inline]
fn base_filter_value(seed: i8, p0: i8, q0: i8) -> i8 {
    let d = q0.saturating_sub(p0);
    seed.saturating_add(d).saturating_add(d).saturating_add(d)
}

/// 4-tap filter for one edge position; touches `p1, p0, q0, q1`
#[inline]
fn filter4(w: &mut [u8; 8], hev: bool) {
    let p1 = to_signed(w[2]);
    let p0 = to_signed(w[3]);
    let q0 = to_signed(w[4]);
    let q1 = to_signed(w[5]);

    let seed = if hev { p1.saturating_sub(q1) } else { 0 };
    let filt = base_filter_value(seed, p0, q0);

    let (new_p0, new_q0, f1) = adjust_p0q0(filt, p0, q0);
    w[3] = to_unsigned(new_p0);
    w[4] = to_unsigned(new_q0);

    if !hev {
        // rounded half-strength correction for the outer pair
        let f3 = (f1 + 1) >> 1;
        w[2] = to_unsigned(p1.saturating_add(f3));
        w[5] = to_unsigned(q1.saturating_sub(f3));
    }
}

/// 6-tap macroblock filter for one edge position; touches `p2..q2`
#[inline]
fn filter6(w: &mut [u8; 8], hev: bool) {
    let p2 = to_signed(w[1]);
    let p1 = to_signed(w[2]);
    let p0 = to_signed(w[3]);
    let q0 = to_signed(w[4]);
    let q1 = to_signed(w[5]);
    let q2 = to_signed(w[6]);

    let filt = base_filter_value(p1.saturating_sub(q1), p0, q0);

    if hev {
        let (new_p0, new_q0, _) = adjust_p0q0(filt, p0, q0);
        w[3] = to_unsigned(new_p0);
        w[4] = to_unsigned(new_q0);
    } else {
        // weighted running sum over the three pixel rings: (9f+63)>>7,
        // (18f+63)>>7, (27f+63)>>7 applied outside-in
        let step = 9 * i32::from(filt);
        let mut acc = step + 63;

        let u = ((acc >> 7).clamp(-128, 127)) as i8;
        w[1] = to_unsigned(p2.saturating_add(u));
        w[6] = to_unsigned(q2.saturating_sub(u));

        acc += step;
        let u = ((acc >> 7).clamp(-128, 127)) as i8;
        w[2] = to_unsigned(p1.saturating_add(u));
        w[5] = to_unsigned(q1.saturating_sub(u));

        acc += step;
        let u = ((acc >> 7).clamp(-128, 127)) as i8;
        w[3] = to_unsigned(p0.saturating_add(u));
        w[4] = to_unsigned(q0.saturating_sub(u));
    }
}

#[inline]
fn load_window(plane: &[u8], edge: usize, step: usize) -> [u8; 8] {
    [
        plane[edge - 4 * step],
        plane[edge - 3 * step],
        plane[edge - 2 * step],
        plane[edge - step],
        plane[edge],
        plane[edge + step],
        plane[edge + 2 * step],
        plane[edge + 3 * step],
    ]
}

#[inline]
fn store_band4(plane: &mut [u8], edge: usize, step: usize, w: &[u8; 8]) {
    plane[edge - 2 * step] = w[2];
    plane[edge - step] = w[3];
    plane[edge] = w[4];
    plane[edge + step] = w[5];
}

#[inline]
fn store_band6(plane: &mut [u8], edge: usize, step: usize, w: &[u8; 8]) {
    plane[edge - 3 * step] = w[1];
    plane[edge - 2 * step] = w[2];
    plane[edge - step] = w[3];
    plane[edge] = w[4];
    plane[edge + step] = w[5];
    plane[edge + 2 * step] = w[6];
}

//------------------------------------------------------------------------------
// Strided per-position loops (reference backend)

/// 4-tap filter along one edge of `len` positions
///
/// `edge` indexes the first sample past the edge (`q0`); samples across the
/// edge are `pixel_step` apart and successive positions `lane_step` apart,
/// so the same loop serves both filter orientations.
pub(crate) fn filter_edge4(
    plane: &mut [u8],
    edge: usize,
    pixel_step: usize,
    lane_step: usize,
    len: usize,
    params: FilterParams,
) {
    for lane in 0..len {
        let at = edge + lane * lane_step;
        let mut w = load_window(plane, at, pixel_step);
        if !needs_filter(&w, params) {
            continue;
        }
        let hev = is_high_variance(&w, params);
        filter4(&mut w, hev);
        store_band4(plane, at, pixel_step, &w);
    }
}

/// 6-tap macroblock filter along one edge of `len` positions
pub(crate) fn filter_edge6(
    plane: &mut [u8],
    edge: usize,
    pixel_step: usize,
    lane_step: usize,
    len: usize,
    params: FilterParams,
) {
    for lane in 0..len {
        let at = edge + lane * lane_step;
        let mut w = load_window(plane, at, pixel_step);
        if !needs_filter(&w, params) {
            continue;
        }
        let hev = is_high_variance(&w, params);
        filter6(&mut w, hev);
        store_band6(plane, at, pixel_step, &w);
    }
}

//------------------------------------------------------------------------------
// Lane-batched loops (wide backend)
//
// Vertical edges gather the eight rows straddling the edge into fixed
// 16-lane arrays, filter every lane, and scatter the touched band back in
// whole rows. Horizontal edges work from contiguous 8-sample windows: the
// samples crossing a vertical edge already sit next to each other in
// memory, so the row gather doubles as the transpose.

/// 16-lane 4-tap pass over a horizontal edge (vertical filtering)
pub(crate) fn filter_rows4_wide(plane: &mut [u8], edge: usize, stride: usize, params: FilterParams) {
    debug_assert!(edge >= 4 * stride);
    let base = edge - 4 * stride;
    let mut rows = [[0u8; 16]; 8];
    for (i, row) in rows.iter_mut().enumerate() {
        row.copy_from_slice(&plane[base + i * stride..][..16]);
    }

    for lane in 0..16 {
        let mut w = [0u8; 8];
        for (i, s) in w.iter_mut().enumerate() {
            *s = rows[i][lane];
        }
        if !needs_filter(&w, params) {
            continue;
        }
        let hev = is_high_variance(&w, params);
        filter4(&mut w, hev);
        for i in 2..6 {
            rows[i][lane] = w[i];
        }
    }

    for i in 2..6 {
        plane[base + i * stride..][..16].copy_from_slice(&rows[i]);
    }
}

/// 16-lane 6-tap pass over a horizontal macroblock edge
pub(crate) fn filter_rows6_wide(plane: &mut [u8], edge: usize, stride: usize, params: FilterParams) {
    debug_assert!(edge >= 4 * stride);
    let base = edge - 4 * stride;
    let mut rows = [[0u8; 16]; 8];
    for (i, row) in rows.iter_mut().enumerate() {
        row.copy_from_slice(&plane[base + i * stride..][..16]);
    }

    for lane in 0..16 {
        let mut w = [0u8; 8];
        for (i, s) in w.iter_mut().enumerate() {
            *s = rows[i][lane];
        }
        if !needs_filter(&w, params) {
            continue;
        }
        let hev = is_high_variance(&w, params);
        filter6(&mut w, hev);
        for i in 1..7 {
            rows[i][lane] = w[i];
        }
    }

    for i in 1..7 {
        plane[base + i * stride..][..16].copy_from_slice(&rows[i]);
    }
}

/// 16-lane 4-tap pass over a vertical edge (horizontal filtering)
pub(crate) fn filter_cols4_wide(plane: &mut [u8], edge: usize, stride: usize, params: FilterParams) {
    for lane in 0..16 {
        let at = edge + lane * stride;
        let mut w = [0u8; 8];
        w.copy_from_slice(&plane[at - 4..at + 4]);
        if !needs_filter(&w, params) {
            continue;
        }
        let hev = is_high_variance(&w, params);
        filter4(&mut w, hev);
        plane[at - 2..at + 2].copy_from_slice(&w[2..6]);
    }
}

/// 16-lane 6-tap pass over a vertical macroblock edge
pub(crate) fn filter_cols6_wide(plane: &mut [u8], edge: usize, stride: usize, params: FilterParams) {
    for lane in 0..16 {
        let at = edge + lane * stride;
        let mut w = [0u8; 8];
        w.copy_from_slice(&plane[at - 4..at + 4]);
        if !needs_filter(&w, params) {
            continue;
        }
        let hev = is_high_variance(&w, params);
        filter6(&mut w, hev);
        plane[at - 3..at + 3].copy_from_slice(&w[1..7]);
    }
}
