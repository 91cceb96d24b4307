//! Split and fuse invariants.

use std::collections::BTreeSet;

use proptest::prelude::*;

use super::generators::*;
use crate::error::Error;
use crate::{Axis, Lineage, SInt, SplitPart, sint::ceil_div_i64};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// outer * factor covers the original extent and never overshoots by a full tile.
    #[test]
    fn split_covers_domain(extent in arb_extent(), factor in arb_factor()) {
        let axis = Axis::spatial("i", extent);
        let (outer, inner) = axis.split(factor).unwrap();

        let outer_extent = outer.extent().as_const().unwrap();
        prop_assert_eq!(inner.extent(), &SInt::Const(factor));
        prop_assert_eq!(outer_extent, ceil_div_i64(extent, factor));
        prop_assert!(outer_extent * factor >= extent);
        prop_assert!(outer_extent * factor - extent < factor);
        prop_assert_eq!(outer_extent * factor == extent, extent % factor == 0);
    }

    /// Rebuilding `outer * factor + inner` enumerates `[0, outer * factor)` exactly once.
    #[test]
    fn split_index_enumerates_superset(extent in 1i64..=40, factor in 1i64..=9) {
        let axis = Axis::spatial("i", extent);
        let (outer, inner) = axis.split(factor).unwrap();
        let index = axis.index_in(&[outer.clone(), inner.clone()]).unwrap();

        let outer_extent = outer.extent().as_const().unwrap();
        let mut seen = BTreeSet::new();
        for o in 0..outer_extent {
            for i in 0..factor {
                let v = index
                    .eval_index(&|a: &Axis| if *a == outer { Some(o) } else if *a == inner { Some(i) } else { None })
                    .unwrap();
                prop_assert!(seen.insert(v));
            }
        }
        prop_assert_eq!(seen, (0..outer_extent * factor).collect::<BTreeSet<_>>());
    }

    /// Splits never touch the axis they were derived from.
    #[test]
    fn split_preserves_parent(axis in arb_spatial_axis(), factor in arb_factor()) {
        let before = axis.extent().clone();
        let (outer, inner) = axis.split(factor).unwrap();
        prop_assert_eq!(axis.extent(), &before);
        let outer_part = matches!(outer.lineage(), Lineage::Split { part: SplitPart::Outer, .. });
        let inner_part = matches!(inner.lineage(), Lineage::Split { part: SplitPart::Inner, .. });
        prop_assert!(outer_part && inner_part);
        prop_assert!(outer.derives_from(&axis) && inner.derives_from(&axis));
    }

    #[test]
    fn split_rejects_non_positive_factor(axis in arb_spatial_axis(), factor in arb_bad_factor()) {
        let is_invalid_factor = matches!(axis.split(factor), Err(Error::InvalidSplitFactor { .. }));
        prop_assert!(is_invalid_factor);
    }

    /// Symbolic extents stay within their bounds after a split.
    #[test]
    fn symbolic_split_bounds(extent in arb_symbolic_extent(), factor in arb_factor()) {
        let axis = Axis::spatial("n", extent.clone());
        let (outer, _) = axis.split(factor).unwrap();
        let (lo, hi) = extent.bounds();
        let (outer_lo, outer_hi) = outer.extent().bounds();
        prop_assert!(outer_lo <= ceil_div_i64(lo, factor));
        prop_assert!(outer_hi >= ceil_div_i64(hi, factor));
    }
}
