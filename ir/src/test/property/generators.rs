//! Generators for property-based testing.
//!
//! Shared with downstream crates through the `proptest` feature.

use proptest::prelude::*;

use crate::{Axis, SInt};

/// Concrete extents, including ones that are not multiples of common tile sizes.
pub fn arb_extent() -> impl Strategy<Value = i64> {
    prop_oneof![1i64..=64, (1i64..=32).prop_map(|k| k * 8), Just(1)]
}

/// Positive split factors.
pub fn arb_factor() -> impl Strategy<Value = i64> {
    prop_oneof![1i64..=16, Just(8), Just(32)]
}

/// Non-positive split factors.
pub fn arb_bad_factor() -> impl Strategy<Value = i64> {
    -16i64..=0
}

/// Spatial axis with a concrete extent.
pub fn arb_spatial_axis() -> impl Strategy<Value = Axis> {
    arb_extent().prop_map(|extent| Axis::spatial("i", extent))
}

/// Bounded symbolic dimension `n` or `n * k`.
pub fn arb_symbolic_extent() -> impl Strategy<Value = SInt> {
    (1i64..=8, 1i64..=256).prop_map(|(k, max)| SInt::var("n", 1, max).mul(&SInt::Const(k)))
}
