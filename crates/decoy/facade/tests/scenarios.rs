//! End-to-end dispatch and assertion scenarios.

use decoy::{
    ArgumentMatcher, Contract, Fake, FakeError, MethodInfo, ParameterInfo, RepeatConstraint,
    TypeDescriptor,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn service() -> Contract {
    Contract::named("app::Service")
        .with_member(
            MethodInfo::new("method", TypeDescriptor::Integer)
                .with_parameter(ParameterInfo::new("x", TypeDescriptor::Integer)),
        )
        .with_member(
            MethodInfo::new("lookup", TypeDescriptor::Text)
                .with_parameter(ParameterInfo::new("key", TypeDescriptor::Text)),
        )
        .with_member(MethodInfo::new("items", TypeDescriptor::sequence_of(TypeDescriptor::Text)))
        .with_member(MethodInfo::new("enabled", TypeDescriptor::Bool))
        .with_member(MethodInfo::new("reset", TypeDescriptor::Unit))
}

fn exactly(value: serde_json::Value) -> Vec<ArgumentMatcher> {
    vec![ArgumentMatcher::exact(value)]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn fresh_fake_returns_declared_defaults() {
    let fake = Fake::new(service()).unwrap();

    assert_eq!(fake.invoke_as::<i64>("method", vec![json!(3)]).unwrap(), 0);
    assert_eq!(fake.invoke_as::<String>("lookup", vec![json!("k")]).unwrap(), "");
    assert!(fake.invoke_as::<Vec<String>>("items", vec![]).unwrap().is_empty());
    assert!(!fake.invoke_as::<bool>("enabled", vec![]).unwrap());
    fake.invoke_as::<()>("reset", vec![]).unwrap();
}

#[test]
fn assertion_on_unmatched_arguments_fails_with_zero_count() {
    let fake = Fake::new(service()).unwrap();
    fake.call_to("method")
        .unwrap()
        .with_args(exactly(json!(5)))
        .unwrap()
        .returns(1)
        .unwrap();

    fake.invoke("method", vec![json!(6)]).unwrap();

    let err = fake
        .call_to("method")
        .unwrap()
        .with_args(exactly(json!(5)))
        .unwrap()
        .must_have_happened()
        .unwrap_err();
    match err {
        FakeError::Assertion(failure) => {
            assert_eq!(failure.actual, 0);
            assert_eq!(failure.repeat, "at least once");
            assert!(failure.message().contains("Service.method(5)"));
            assert!(failure.message().contains("1: Service.method(6)"));
        }
        other => panic!("expected an assertion failure, got {}", other),
    }
}

#[test]
fn most_recently_configured_rule_wins() {
    let fake = Fake::new(service()).unwrap();
    fake.call_to("lookup")
        .unwrap()
        .with_args(exactly(json!("x")))
        .unwrap()
        .returns("A")
        .unwrap();
    fake.call_to("lookup")
        .unwrap()
        .with_args(exactly(json!("x")))
        .unwrap()
        .returns("B")
        .unwrap();

    let value: String = fake.invoke_as("lookup", vec![json!("x")]).unwrap();
    assert_eq!(value, "B");
}

#[test]
fn exact_repeat_passes_only_at_its_count() {
    let fake = Fake::new(service()).unwrap();
    let twice = || {
        fake.call_to("method")
            .unwrap()
            .must_have_happened_times(RepeatConstraint::exactly(2))
    };

    fake.invoke("method", vec![json!(1)]).unwrap();
    assert!(twice().unwrap_err().is_assertion());

    fake.invoke("method", vec![json!(2)]).unwrap();
    assert!(twice().is_ok());
}

#[test]
fn repeated_assertions_agree() {
    let fake = Fake::new(service()).unwrap();
    fake.invoke("method", vec![json!(1)]).unwrap();
    let builder = fake.call_to("method").unwrap();

    let first = builder.must_have_happened_times(RepeatConstraint::twice()).is_ok();
    let second = builder.must_have_happened_times(RepeatConstraint::twice()).is_ok();
    assert_eq!(first, second);
}

#[test]
fn assertions_do_not_add_rules() {
    let fake = Fake::new(service()).unwrap();
    fake.call_to("method").unwrap().must_not_have_happened().unwrap();
    assert_eq!(fake.manager().rule_count(), 0);
}

#[test]
fn history_keeps_every_call_in_order() {
    let fake = Fake::new(service()).unwrap();
    fake.call_to("method").unwrap().returns(9).unwrap();
    fake.any_call().does_nothing();

    for x in 0..5 {
        fake.invoke("method", vec![json!(x)]).unwrap();
    }

    let calls = fake.recorded_calls();
    assert_eq!(calls.len(), 5);
    for (x, recorded) in calls.iter().enumerate() {
        assert_eq!(recorded.call.arguments().get(0), Some(&json!(x)));
    }
    assert!(calls.windows(2).all(|pair| pair[0].sequence < pair[1].sequence));
}

#[test]
fn failing_predicate_surfaces_but_call_is_recorded() {
    let fake = Fake::new(service()).unwrap();
    fake.call_to("lookup")
        .unwrap()
        .with_args(vec![ArgumentMatcher::that_typed("short key", |key: &i64| *key < 3)])
        .unwrap()
        .returns("never")
        .unwrap();

    let err = fake.invoke("lookup", vec![json!("abc")]).unwrap_err();
    assert!(err.is_dispatch());
    assert_eq!(fake.recorded_calls().len(), 1);
}

#[test]
fn unknown_member_is_reported() {
    let fake = Fake::new(service()).unwrap();
    assert!(matches!(fake.call_to("missing"), Err(FakeError::Types(_))));
    assert!(fake.invoke("missing", vec![]).is_err());
}
