use test_case::test_case;
use tessera_ir::{AxisKind, SInt, StageTag};

use crate::error::Error;
use crate::nn::instance_norm;
use crate::test::helpers::*;
use crate::{DType, Tensor, placeholder};

// ============================================================================
// Graph structure
// ============================================================================

#[test]
fn builds_four_stages_in_order() {
    let (data, gamma, beta) = nchw_inputs([2, 3, 16, 16]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap();

    let names: Vec<&str> = norm.graph.tensors().iter().map(Tensor::name).collect();
    assert_eq!(names, ["mean", "mean_sq", "var", "instance_norm"]);
    assert_eq!(norm.graph.outputs(), std::slice::from_ref(&norm.out));
    assert_eq!(norm.graph.position(&norm.mean_sq), Some(1));
    assert_eq!(norm.out.shape(), data.shape());
    assert_eq!(norm.mean.shape(), &[SInt::Const(2), SInt::Const(3)]);
}

#[test]
fn statistic_bodies() {
    let (data, gamma, beta) = nchw_inputs([2, 3, 16, 16]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap();

    let body = |t: &Tensor| t.stage().unwrap().body().to_string();
    assert_eq!(body(&norm.mean), "sum((data[b, c, rh, rw] / 256), axis=[rh, rw])");
    assert_eq!(body(&norm.mean_sq), "sum((pow(data[b, c, rh2, rw2], 2.0f) / 256), axis=[rh2, rw2])");
    assert_eq!(body(&norm.var), "(mean_sq[b, c] - pow(mean[b, c], 2.0f))");
}

#[test]
fn reductions_use_independent_axes() {
    let (data, gamma, beta) = nchw_inputs([2, 3, 16, 16]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap();

    let mean = norm.mean.stage().unwrap();
    let mean_sq = norm.mean_sq.stage().unwrap();
    assert_eq!(mean.reduce_axes().len(), 2);
    assert_eq!(mean_sq.reduce_axes().len(), 2);
    for (a, b) in mean.reduce_axes().iter().zip(mean_sq.reduce_axes()) {
        assert_ne!(a, b);
        assert_eq!(a.extent(), b.extent());
        assert_eq!(a.kind(), AxisKind::Reduction);
    }
    assert!(!norm.var.stage().unwrap().is_reduction());
}

#[test]
fn out_stage_runs_batch_and_channel_serially() {
    let (data, gamma, beta) = nchw_inputs([2, 3, 16, 16]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap();
    let out = norm.out.stage().unwrap();

    assert_eq!(out.tag(), StageTag::Broadcast);
    assert_eq!(out.serial_prefix(), 2);
    let grid: Vec<&str> = out.grid_axes().iter().map(|a| a.name()).collect();
    assert_eq!(grid, ["h", "w"]);
    assert!(!out.is_reduction());
}

#[test_case(&[2, 3, 16]; "rank 3")]
#[test_case(&[1, 2, 3, 4, 5]; "rank 5")]
#[test_case(&[]; "scalar")]
fn rejects_non_4d_input(shape: &[i64]) {
    let data = placeholder("data", shape.iter().copied(), DType::Float32);
    let gamma = placeholder("gamma", [3i64], DType::Float32);
    let beta = placeholder("beta", [3i64], DType::Float32);

    let err = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap_err();
    assert_eq!(err, Error::RankMismatch { operation: "instance_norm".into(), expected: 4, actual: shape.len() });
}

#[test]
fn empty_spatial_extent_is_invalid_shape() {
    let (data, gamma, beta) = nchw_inputs([2, 3, 0, 16]);
    let err = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap_err();
    assert!(matches!(err, Error::Ir { source: tessera_ir::Error::InvalidShape { .. } }));
}

#[test]
fn symbolic_batch() {
    let batch = SInt::var("n", 1, 64);
    let data = placeholder("data", [batch.clone(), 3.into(), 8.into(), 8.into()], DType::Float32);
    let gamma = placeholder("gamma", [3i64], DType::Float32);
    let beta = placeholder("beta", [3i64], DType::Float32);

    let norm = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap();
    assert_eq!(norm.mean.shape()[0], batch);
    assert!(norm.out.shape()[0].is_symbolic());
}

#[test]
fn huge_planes_build_without_overflow() {
    let (data, gamma, beta) = nchw_inputs([1, 1, 1 << 32, 1 << 32]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-5, false).unwrap();
    assert_eq!(norm.graph.len(), 4);
    assert!(norm.mean.stage().unwrap().body().to_string().contains("(4294967296 * 4294967296)"));
}

// ============================================================================
// fix_gamma
// ============================================================================

#[test]
fn fix_gamma_never_reads_gamma() {
    let (data, gamma, beta) = nchw_inputs([2, 3, 8, 8]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-3, true).unwrap();

    assert!(!norm.out.input_tensors().contains(&gamma));
    assert!(!norm.graph.placeholders().contains(&gamma));
    assert_eq!(
        norm.out.stage().unwrap().body().to_string(),
        "(((data[b, c, h, w] - mean[b, c]) / sqrt((var[b, c] + 0.001f))) + beta[c])"
    );
}

#[test]
fn fix_gamma_body_independent_of_gamma_tensor() {
    let (data, gamma_a, beta) = nchw_inputs([2, 3, 8, 8]);
    // Wrong shape on purpose: it must not matter.
    let gamma_b = placeholder("other_gamma", [7i64, 7], DType::Float64);

    let a = instance_norm(&data, &gamma_a, &beta, 1e-5, true).unwrap();
    let b = instance_norm(&data, &gamma_b, &beta, 1e-5, true).unwrap();
    for (x, y) in a.graph.tensors().iter().zip(b.graph.tensors()) {
        assert_eq!(x.stage().unwrap().body().to_string(), y.stage().unwrap().body().to_string());
    }
}

#[test]
fn gamma_read_when_not_fixed() {
    let (data, gamma, beta) = nchw_inputs([2, 3, 8, 8]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-3, false).unwrap();

    assert!(norm.out.input_tensors().contains(&gamma));
    assert_eq!(
        norm.out.stage().unwrap().body().to_string(),
        "((((data[b, c, h, w] - mean[b, c]) / sqrt((var[b, c] + 0.001f))) * gamma[c]) + beta[c])"
    );
}

#[test]
fn separate_invocations_render_identically() {
    let build = || {
        let (data, gamma, beta) = nchw_inputs([1, 4, 6, 6]);
        let norm = instance_norm(&data, &gamma, &beta, 1e-3, false).unwrap();
        norm.graph.stages().map(|s| s.body().to_string()).collect::<Vec<_>>()
    };
    assert_eq!(build(), build());
}

// ============================================================================
// Numerics
// ============================================================================

#[test_case(false; "with gamma")]
#[test_case(true; "fixed gamma")]
fn matches_host_reference(fix_gamma: bool) {
    let (data, gamma, beta) = nchw_inputs([2, 3, 4, 5]);
    let norm = instance_norm(&data, &gamma, &beta, 1e-5, fix_gamma).unwrap();

    let x = sample(&[2, 3, 4, 5], 11);
    let g = sample(&[3], 5);
    let b = sample(&[3], 9);
    let mut interp = interpreter_with(&[(&data, x.clone()), (&gamma, g.clone()), (&beta, b.clone())]);
    let actual = interp.realize(&norm.graph, &norm.out).unwrap();

    let expected = reference_instance_norm(&x, (!fix_gamma).then_some(&g), &b, 1e-5);
    assert_close(&actual, &expected, 1e-9);
}

#[test]
fn intermediate_statistics() {
    let (data, gamma, beta) = nchw_inputs([1, 2, 2, 2]);
    let norm = instance_norm(&data, &gamma, &beta, 0.0, false).unwrap();

    let x = ndarray::ArrayD::from_shape_vec(vec![1, 2, 2, 2], vec![1.0, 2.0, 3.0, 4.0, 2.0, 2.0, 2.0, 2.0]).unwrap();
    let mut interp = interpreter_with(&[(&data, x), (&gamma, sample(&[2], 1)), (&beta, sample(&[2], 2))]);
    interp.run(&norm.graph).unwrap();

    let expect = |values: &[f64]| ndarray::ArrayD::from_shape_vec(vec![1, 2], values.to_vec()).unwrap();
    assert_close(interp.get(&norm.mean).unwrap(), &expect(&[2.5, 2.0]), 1e-12);
    assert_close(interp.get(&norm.mean_sq).unwrap(), &expect(&[7.5, 4.0]), 1e-12);
    assert_close(interp.get(&norm.var).unwrap(), &expect(&[1.25, 0.0]), 1e-12);
}
