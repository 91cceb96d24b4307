use tessera_ir::Target;

use crate::config::BinderConfig;
use crate::context::{ScheduleContext, TargetContext};
use crate::error::Error;
use crate::test::helpers::RecordingBackend;

#[test]
fn no_target_by_default() {
    let ctx = ScheduleContext::default();
    assert_eq!(ctx.target().current(), None);
    assert_eq!(ctx.require_target("lrn").unwrap_err(), Error::TargetRequired { operation: "lrn".into() });
    assert!(ctx.native_backend().is_none());
}

#[test]
fn explicit_target() {
    let ctx = ScheduleContext::for_target(Target::Rocm);
    assert_eq!(ctx.require_target("instance_norm").unwrap(), &Target::Rocm);
    assert_eq!(ctx.binder(), &BinderConfig::default());

    assert_eq!(TargetContext::from(Target::Cuda), TargetContext::with_target(Target::Cuda));
    assert_eq!(TargetContext::none().current(), None);
}

#[test]
fn builder_sets_every_part() {
    let backend = RecordingBackend::new([Target::Cuda]);
    let ctx = ScheduleContext::builder()
        .target(Target::Custom("npu".into()))
        .native(backend)
        .binder(BinderConfig::builder().tile(4).build())
        .build();

    assert_eq!(ctx.target().current(), Some(&Target::Custom("npu".into())));
    assert_eq!(ctx.native_backend().map(|b| b.name()), Some("recording"));
    assert_eq!(ctx.binder().tile, 4);
    assert!(format!("{ctx:?}").contains("recording"));
}
