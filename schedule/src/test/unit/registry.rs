use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use test_case::test_case;
use tessera_ir::Target;

use crate::context::ScheduleContext;
use crate::error::Error;
use crate::registry::{OperatorTag, SCHEDULES, ScheduleEntry, ScheduleOutput, ScheduleRegistry, schedule};
use crate::schedule::Schedule;
use crate::test::helpers::*;

fn empty_schedule(_: &ScheduleContext, outputs: &[tessera_ir::Tensor]) -> crate::Result<ScheduleOutput> {
    Ok(ScheduleOutput::Generic(Schedule::from_outputs(outputs)))
}

#[test_case(OperatorTag::InstanceNorm, "instance_norm")]
#[test_case(OperatorTag::Lrn, "lrn")]
#[test_case(OperatorTag::L2Normalize, "l2_normalize")]
#[test_case(OperatorTag::Custom("softmax".into()), "softmax")]
fn operator_names(tag: OperatorTag, name: &str) {
    assert_eq!(tag.name(), name);
    assert_eq!(tag.to_string(), name);
}

#[test]
fn builtins_cover_cuda_only() {
    let registry = ScheduleRegistry::new();
    assert_eq!(registry.len(), 3);
    for tag in [OperatorTag::InstanceNorm, OperatorTag::Lrn, OperatorTag::L2Normalize] {
        assert!(registry.contains(&tag, &Target::Cuda), "{tag}");
        assert!(!registry.contains(&tag, &Target::Rocm), "{tag}");
    }
    assert!(SCHEDULES.contains(&OperatorTag::InstanceNorm, &Target::Cuda));
}

#[test]
fn resolution_is_exact() {
    let registry = ScheduleRegistry::new();
    let err = registry.resolve(&OperatorTag::InstanceNorm, &Target::Rocm).unwrap_err();
    assert_eq!(err, Error::NoScheduleForTarget { operator: OperatorTag::InstanceNorm, target: Target::Rocm });

    let entry = registry.resolve(&OperatorTag::InstanceNorm, &Target::Cuda).unwrap();
    assert_eq!(entry.name(), "cuda.instance_norm");
}

#[test]
fn register_overwrites() {
    let registry = ScheduleRegistry::empty();
    assert!(registry.is_empty());

    let npu = Target::Custom("npu".into());
    registry.register(OperatorTag::Lrn, npu.clone(), ScheduleEntry::new("first", empty_schedule));
    registry.register(OperatorTag::Lrn, npu.clone(), ScheduleEntry::new("second", empty_schedule));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.resolve(&OperatorTag::Lrn, &npu).unwrap().name(), "second");
    assert_eq!(registry.keys(), [(OperatorTag::Lrn, npu)]);
}

#[test]
fn missing_target_fails_before_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let registry = ScheduleRegistry::empty();
    registry.register(
        OperatorTag::InstanceNorm,
        Target::Cuda,
        ScheduleEntry::new("counting", move |ctx, outputs| {
            counter.fetch_add(1, Ordering::SeqCst);
            empty_schedule(ctx, outputs)
        }),
    );

    let norm = norm([1, 2, 4, 4]);
    let err = registry.schedule(&OperatorTag::InstanceNorm, &ScheduleContext::default(), &[norm.out]).unwrap_err();
    assert_eq!(err, Error::TargetRequired { operation: "instance_norm".into() });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unregistered_target_fails_before_dispatch() {
    let norm = norm([1, 2, 4, 4]);
    let ctx = ScheduleContext::for_target(Target::Metal);
    let err = ScheduleRegistry::new().schedule(&OperatorTag::InstanceNorm, &ctx, &[norm.out]).unwrap_err();
    assert!(matches!(err, Error::NoScheduleForTarget { target: Target::Metal, .. }));
}

#[test]
fn cuda_instance_norm_is_generic_and_bound() {
    let norm = norm([2, 3, 16, 16]);
    let output = schedule(&OperatorTag::InstanceNorm, &ScheduleContext::for_target(Target::Cuda), &[norm.out.clone()])
        .unwrap();

    assert!(output.as_native().is_none());
    let bound = output.into_generic().unwrap();
    assert_eq!(bound.stages().len(), 4);
    assert!(bound.is_fully_bound());
}

#[test]
fn binder_errors_surface_through_registry() {
    let ctx = ScheduleContext::for_target(Target::Cuda);
    let err = schedule(&OperatorTag::InstanceNorm, &ctx, &[square(&[4, 4, 4])]).unwrap_err();
    assert_eq!(err, Error::UnsupportedRank { stage: "sq".into(), rank: 3 });
}
