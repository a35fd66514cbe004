//! vp8-recon - VP8 pixel reconstruction primitives written in Rust
//!
//! This crate implements the two numerically hardest stages of a VP8-style
//! block decoder: the inverse transforms that turn quantized residual
//! coefficients back into pixel deltas, and the in-loop deblocking filter
//! that smooths block boundaries after reconstruction. Both are bit-exact
//! with the reference algorithms; the external decode loop supplies
//! coefficient blocks, predicted pixels and filter thresholds, and this
//! crate mutates the caller's pixel plane in place.
//!
//! # Architecture
//!
//! - `dsp`: the reconstruction kernels and the backend strategy that the
//!   decode loop selects once at startup
//! - `error`: error types for the configuration boundary
//!
//! # Example
//!
//! ```
//! use vp8_recon::dsp::Backend;
//!
//! let backend = Backend::select();
//!
//! // A 4x4 prediction block of 100 inside a 16-wide plane, DC residual 32.
//! let mut plane = vec![100u8; 16 * 16];
//! let mut coeffs = [0i16; 16];
//! coeffs[0] = 32;
//! backend.transform(&coeffs, &mut plane, 0, 16, false);
//! assert_eq!(plane[0], 104); // 100 + ((32 + 4) >> 3)
//! ```

pub mod dsp;
pub mod error;

pub use dsp::{Backend, BackendKind, FilterParams, ReconBackend};
pub use error::{Error, Result};

/// vp8-recon version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
