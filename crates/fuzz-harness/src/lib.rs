//! Sky Fuzz Harness
//!
//! Shared property-based testing strategies for the sky widget crates:
//! angles, orbit shapes, demo clock offsets and host entity states.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_fuzz_test(az in azimuth_deg()) {
//!         prop_assert!((0.0..360.0).contains(&az));
//!     }
//! }
//! ```

pub mod generators;

pub mod prelude {
    pub use crate::generators::*;
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;
