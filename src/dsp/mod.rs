//! Pixel reconstruction kernels and backend selection
//!
//! The decode loop drives reconstruction through a [`ReconBackend`]: the
//! inverse transforms that merge residuals into the predicted plane, and
//! the deblocking passes that smooth macroblock edges afterwards. Two
//! implementations exist, a portable strided [`Reference`] and a
//! lane-batched [`Wide`], selected once at startup and passed explicitly
//! to the decode loop. Both are bit-exact; they share the per-sample
//! kernels and differ only in traversal and memory movement.
//!
//! ## Edge naming
//!
//! "Vertical" filtering reads samples spaced by the row stride, i.e. it
//! smooths across a horizontal edge (the macroblock's top boundary).
//! "Horizontal" filtering reads samples within a row and smooths across a
//! vertical edge (the left boundary). `offset` always locates the
//! macroblock's top-left sample; outer-edge calls therefore require four
//! valid rows (or columns) before it.

pub mod filter;
pub mod transform;

use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::error::Error;
pub use filter::FilterParams;

/// Strategy interface for the pixel-reconstruction stage
///
/// All operations mutate the caller-supplied plane in place and carry no
/// state between calls; concurrent use on disjoint pixel regions is safe.
pub trait ReconBackend: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Inverse DCT of one 4x4 coefficient block, or two horizontally
    /// adjacent blocks when `do_two` is set (coefficients 16..32, landing
    /// 4 samples to the right)
    fn transform(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize, do_two: bool);

    /// Inverse Walsh-Hadamard transform of 16 gathered DC coefficients,
    /// scattered into the DC slot of each of the 16 sub-blocks of `out`
    fn transform_wht(&self, input: &[i16; 16], out: &mut [i16; 256]);

    /// DC-only shortcut, bit-identical to [`ReconBackend::transform`] for
    /// blocks whose AC coefficients are all zero
    fn transform_dc(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize);

    /// Shortcut for blocks with only coefficients 0, 1 and 4 non-zero
    fn transform_ac3(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize);

    /// 6-tap filter across the macroblock's top edge
    fn filter_outer_edge_v(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams);

    /// 6-tap filter across the macroblock's left edge
    fn filter_outer_edge_h(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams);

    /// 4-tap filter across the three inner horizontal edges (rows +4, +8,
    /// +12 of the macroblock)
    fn filter_inner_edges_v(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams);

    /// 4-tap filter across the three inner vertical edges (columns +4, +8,
    /// +12 of the macroblock)
    fn filter_inner_edges_h(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams);
}

/// Portable reference backend: strided per-position loops
#[derive(Debug, Default, Clone, Copy)]
pub struct Reference;

impl ReconBackend for Reference {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn transform(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize, do_two: bool) {
        transform::transform_two(coeffs, plane, offset, stride, do_two);
    }

    fn transform_wht(&self, input: &[i16; 16], out: &mut [i16; 256]) {
        transform::transform_wht(input, out);
    }

    fn transform_dc(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize) {
        transform::transform_dc(coeffs, plane, offset, stride);
    }

    fn transform_ac3(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize) {
        transform::transform_ac3(coeffs, plane, offset, stride);
    }

    fn filter_outer_edge_v(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        filter::filter_edge6(plane, offset, stride, 1, 16, params);
    }

    fn filter_outer_edge_h(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        filter::filter_edge6(plane, offset, 1, stride, 16, params);
    }

    fn filter_inner_edges_v(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        for k in [4, 8, 12] {
            filter::filter_edge4(plane, offset + k * stride, stride, 1, 16, params);
        }
    }

    fn filter_inner_edges_h(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        for k in [4, 8, 12] {
            filter::filter_edge4(plane, offset + k, 1, stride, 16, params);
        }
    }
}

/// Lane-batched backend: whole 16-lane edges gathered into fixed arrays
///
/// The batched loops only pay off with 128-bit vector support, so this
/// backend is selected just when the host provides it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Wide;

impl ReconBackend for Wide {
    fn name(&self) -> &'static str {
        "wide"
    }

    fn transform(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize, do_two: bool) {
        transform::transform_two(coeffs, plane, offset, stride, do_two);
    }

    fn transform_wht(&self, input: &[i16; 16], out: &mut [i16; 256]) {
        transform::transform_wht(input, out);
    }

    fn transform_dc(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize) {
        transform::transform_dc(coeffs, plane, offset, stride);
    }

    fn transform_ac3(&self, coeffs: &[i16], plane: &mut [u8], offset: usize, stride: usize) {
        transform::transform_ac3(coeffs, plane, offset, stride);
    }

    fn filter_outer_edge_v(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        filter::filter_rows6_wide(plane, offset, stride, params);
    }

    fn filter_outer_edge_h(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        filter::filter_cols6_wide(plane, offset, stride, params);
    }

    fn filter_inner_edges_v(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        for k in [4, 8, 12] {
            filter::filter_rows4_wide(plane, offset + k * stride, stride, params);
        }
    }

    fn filter_inner_edges_h(&self, plane: &mut [u8], offset: usize, stride: usize, params: FilterParams) {
        for k in [4, 8, 12] {
            filter::filter_cols4_wide(plane, offset + k, stride, params);
        }
    }
}

/// Backend override for configuration surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Pick the best backend the host supports
    #[default]
    Auto,
    /// Force the portable reference backend
    Reference,
    /// Force the lane-batched backend
    Wide,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(BackendKind::Auto),
            "reference" => Ok(BackendKind::Reference),
            "wide" => Ok(BackendKind::Wide),
            other => Err(Error::config(format!("unknown backend '{}'", other))),
        }
    }
}

static REFERENCE: Reference = Reference;
static WIDE: Wide = Wide;

static SELECTED: Lazy<&'static (dyn ReconBackend)> = Lazy::new(|| {
    let backend: &'static dyn ReconBackend = if simd128_supported() { &WIDE } else { &REFERENCE };
    tracing::debug!("Using {} reconstruction backend", backend.name());
    backend
});

/// Whether the host provides the 128-bit vector capability the wide
/// backend is tuned for
fn simd128_supported() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("sse2")
    }
    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("neon")
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

/// Namespace for backend selection
pub struct Backend;

impl Backend {
    /// Select the backend for this host
    ///
    /// The choice is made once per process and cached; concurrent first
    /// calls race benignly to the same answer.
    pub fn select() -> &'static dyn ReconBackend {
        *SELECTED
    }

    /// Resolve an explicit override, falling back to [`Backend::select`]
    /// for [`BackendKind::Auto`]
    pub fn with_kind(kind: BackendKind) -> &'static dyn ReconBackend {
        match kind {
            BackendKind::Auto => Self::select(),
            BackendKind::Reference => &REFERENCE,
            BackendKind::Wide => &WIDE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_idempotent() {
        let a = Backend::select();
        let b = Backend::select();
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("auto".parse::<BackendKind>().unwrap(), BackendKind::Auto);
        assert_eq!(
            "reference".parse::<BackendKind>().unwrap(),
            BackendKind::Reference
        );
        assert_eq!("wide".parse::<BackendKind>().unwrap(), BackendKind::Wide);
        assert!("neon".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_with_kind_resolves_overrides() {
        assert_eq!(Backend::with_kind(BackendKind::Reference).name(), "reference");
        assert_eq!(Backend::with_kind(BackendKind::Wide).name(), "wide");
    }
}
