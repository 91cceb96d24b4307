use test_case::test_case;

use crate::error::Error;
use crate::{Axis, AxisKind, Lineage, SInt, SplitPart};

// =============================================================================
// Split
// =============================================================================

#[test_case(20, 8 => (3, 8); "ragged")]
#[test_case(24, 8 => (3, 8); "exact")]
#[test_case(5, 8 => (1, 8); "factor larger than extent")]
#[test_case(16, 1 => (16, 1); "unit factor")]
fn split_extents(extent: i64, factor: i64) -> (i64, i64) {
    let axis = Axis::spatial("i", extent);
    let (outer, inner) = axis.split(factor).unwrap();
    (outer.extent().as_const().unwrap(), inner.extent().as_const().unwrap())
}

#[test_case(0; "zero")]
#[test_case(-3; "negative")]
fn split_rejects_factor(factor: i64) {
    let axis = Axis::spatial("i", 16);
    let err = axis.split(factor).unwrap_err();
    assert_eq!(err, Error::InvalidSplitFactor { axis: "i".into(), factor });
}

#[test]
fn split_names_and_lineage() {
    let axis = Axis::spatial("x", 20);
    let (outer, inner) = axis.split(8).unwrap();

    assert_eq!(outer.name(), "x.outer");
    assert_eq!(inner.name(), "x.inner");
    assert_eq!(outer.kind(), AxisKind::Derived);
    assert!(matches!(
        outer.lineage(),
        Lineage::Split { parent, factor: 8, part: SplitPart::Outer } if parent == &axis
    ));
    assert_eq!(outer.roots().as_slice(), std::slice::from_ref(&axis));
    // Parent unchanged.
    assert_eq!(axis.extent(), &SInt::Const(20));
    assert!(matches!(axis.lineage(), Lineage::Root));
}

#[test]
fn split_of_reduction_stays_reduction() {
    let rh = Axis::reduce("rh", 16).unwrap();
    let (outer, inner) = rh.split(4).unwrap();
    assert!(outer.is_reduction());
    assert!(inner.is_reduction());
    assert!(!Axis::spatial("h", 16).split(4).unwrap().0.is_reduction());
}

#[test]
fn split_symbolic_extent_folds_multiple() {
    let n = SInt::var("n", 1, 32);
    let axis = Axis::spatial("i", n.mul(&SInt::Const(16)));
    let (outer, _) = axis.split(8).unwrap();
    assert_eq!(outer.extent(), &n.mul(&SInt::Const(2)));
    assert_eq!(outer.extent().bounds(), (2, 64));
}

// =============================================================================
// Reduction axes
// =============================================================================

#[test_case(0; "zero")]
#[test_case(-1; "negative")]
fn reduce_rejects_empty_domain(extent: i64) {
    let err = Axis::reduce("rk", extent).unwrap_err();
    assert!(matches!(err, Error::InvalidShape { ref axis, .. } if axis == "rk"));
}

#[test]
fn reduce_accepts_symbolic_extent() {
    let axis = Axis::reduce("rk", SInt::var("k", 1, 128)).unwrap();
    assert!(axis.is_reduction());
    assert_eq!(axis.kind(), AxisKind::Reduction);
}

// =============================================================================
// Fuse
// =============================================================================

#[test]
fn fuse_multiplies_extents() {
    let h = Axis::spatial("h", 4);
    let w = Axis::spatial("w", 6);
    let fused = Axis::fuse(&h, &w).unwrap();
    assert_eq!(fused.name(), "h.w.fused");
    assert_eq!(fused.extent(), &SInt::Const(24));
    assert!(fused.derives_from(&h) && fused.derives_from(&w));
    assert_eq!(fused.roots().len(), 2);
}

#[test]
fn fuse_rejects_mixed_kinds() {
    let h = Axis::spatial("h", 4);
    let rk = Axis::reduce("rk", 4).unwrap();
    assert_eq!(
        Axis::fuse(&h, &rk).unwrap_err(),
        Error::FuseKindMismatch { outer: "h".into(), inner: "rk".into() }
    );
}

// =============================================================================
// Index reconstruction
// =============================================================================

fn eval_with(expr: &crate::Expr, bindings: &[(&Axis, i64)]) -> Option<i64> {
    expr.eval_index(&|axis: &Axis| bindings.iter().find(|(a, _)| *a == axis).map(|(_, v)| *v))
}

#[test]
fn index_of_leaf_is_itself() {
    let h = Axis::spatial("h", 4);
    let index = h.index_in(std::slice::from_ref(&h)).unwrap();
    assert_eq!(index.to_string(), "h");
}

#[test]
fn index_of_split_parent() {
    let x = Axis::spatial("x", 20);
    let (outer, inner) = x.split(8).unwrap();
    let index = x.index_in(&[outer.clone(), inner.clone()]).unwrap();

    assert_eq!(index.to_string(), "((x.outer * 8) + x.inner)");
    assert_eq!(eval_with(&index, &[(&outer, 2), (&inner, 3)]), Some(19));
}

#[test]
fn index_of_nested_split() {
    let x = Axis::spatial("x", 64);
    let (outer, inner) = x.split(16).unwrap();
    let (io, ii) = inner.split(4).unwrap();
    let index = x.index_in(&[outer.clone(), io.clone(), ii.clone()]).unwrap();
    assert_eq!(eval_with(&index, &[(&outer, 1), (&io, 2), (&ii, 3)]), Some(16 + 8 + 3));
}

#[test]
fn index_of_fused_halves() {
    let h = Axis::spatial("h", 4);
    let w = Axis::spatial("w", 6);
    let fused = Axis::fuse(&h, &w).unwrap();
    let leaves = [fused.clone()];

    let hi = h.index_in(&leaves).unwrap();
    let wi = w.index_in(&leaves).unwrap();
    assert_eq!(eval_with(&hi, &[(&fused, 17)]), Some(2));
    assert_eq!(eval_with(&wi, &[(&fused, 17)]), Some(5));
}

#[test]
fn index_missing_half_is_none() {
    let x = Axis::spatial("x", 20);
    let (outer, _inner) = x.split(8).unwrap();
    assert!(x.index_in(&[outer]).is_none());
    assert!(x.index_in(&[Axis::spatial("y", 4)]).is_none());
}

#[test]
fn identity_not_structure() {
    let a = Axis::spatial("i", 8);
    let b = Axis::spatial("i", 8);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}
