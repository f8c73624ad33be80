//! Rules whose expectations are attached after the fact

use super::{BuildableCallRule, CallRule, RuleBehavior, RuleKind};
use crate::error::{FakeError, Result};
use crate::matcher::{ArgumentMatcher, ArgumentsPredicate};
use crate::repeat::RepeatConstraint;
use crate::specification::CallSpecification;
use decoy_types::{DispatchResult, InterceptedCall, TypeDescriptor};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Rule whose expectations are attached after the fact
///
/// Starts out covering every call with any arguments. It only becomes an
/// assertion once a repeat constraint is attached through
/// [`RecordedCallRule::set_repeat_constraint`]. An assertion with no
/// behaviour of its own takes no part in dispatch: calls it describes get
/// whatever the other rules give them.
#[derive(Debug)]
pub struct RecordedCallRule {
    specification: RwLock<CallSpecification>,
    custom_predicate: RwLock<Option<ArgumentsPredicate>>,
    repeat: RwLock<Option<RepeatConstraint>>,
    is_assertion: AtomicBool,
    behavior: RuleBehavior,
}

impl RecordedCallRule {
    /// Covers every call.
    pub fn new() -> Self {
        Self::for_specification(CallSpecification::any_call())
    }

    /// Covers the calls `specification` describes.
    pub fn for_specification(specification: CallSpecification) -> Self {
        Self {
            specification: RwLock::new(specification),
            custom_predicate: RwLock::new(None),
            repeat: RwLock::new(None),
            is_assertion: AtomicBool::new(false),
            behavior: RuleBehavior::new(),
        }
    }

    /// The predicate arguments are currently validated with.
    ///
    /// Defaults to one accepting every collection.
    pub fn is_applicable_to_arguments(&self) -> ArgumentsPredicate {
        self.custom_predicate
            .read()
            .clone()
            .unwrap_or_else(ArgumentsPredicate::any)
    }

    /// Attach the expectation checked by the assertion.
    pub fn set_repeat_constraint(&self, repeat: RepeatConstraint) {
        *self.repeat.write() = Some(repeat);
    }

    /// Turn the rule into an assertion.
    pub fn mark_as_assertion(&self) {
        self.is_assertion.store(true, Ordering::SeqCst);
    }

    /// Whether dispatch may select this rule.
    fn handles_calls(&self) -> bool {
        !self.is_assertion() || self.behavior.is_configured()
    }
}

impl Default for RecordedCallRule {
    fn default() -> Self {
        Self::new()
    }
}

impl CallRule for RecordedCallRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> Result<bool> {
        if !self.handles_calls() || !self.behavior.has_remaining_uses() {
            return Ok(false);
        }
        self.matches_call(call)
    }

    fn claim_use(&self) -> bool {
        self.behavior.try_consume()
    }

    fn matches_call(&self, call: &InterceptedCall) -> Result<bool> {
        let specification = self.specification.read().clone();
        if !specification.matches_member(call) {
            return Ok(false);
        }
        let predicate = self.custom_predicate.read().clone();
        match predicate {
            Some(predicate) => predicate
                .evaluate(call.arguments())
                .map_err(|err| FakeError::dispatch(call, err.to_string())),
            None => specification.arguments_match(call),
        }
    }

    fn apply(&self, call: &InterceptedCall) -> Result<DispatchResult> {
        self.behavior.execute(call)
    }

    fn description_of_valid_call(&self) -> String {
        let specification = self.specification.read();
        if specification.method().is_none() && self.custom_predicate.read().is_none() {
            return match specification.return_type() {
                Some(_) => specification.describe(),
                None => "Recorded call".to_string(),
            };
        }
        let mut specification = specification.clone();
        if let Some(predicate) = self.custom_predicate.read().clone() {
            specification.use_arguments_predicate(predicate);
        }
        specification.describe()
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Recorded
    }

    fn is_assertion(&self) -> bool {
        self.is_assertion.load(Ordering::SeqCst)
    }

    fn repeat_constraint(&self) -> Option<RepeatConstraint> {
        self.repeat.read().clone()
    }
}

impl BuildableCallRule for RecordedCallRule {
    fn behavior(&self) -> &RuleBehavior {
        &self.behavior
    }

    fn use_predicate_to_validate_arguments(&self, predicate: ArgumentsPredicate) {
        *self.custom_predicate.write() = Some(predicate);
    }

    fn use_argument_matchers(&self, matchers: Vec<ArgumentMatcher>) -> Result<()> {
        self.specification.write().set_argument_matchers(matchers)?;
        *self.custom_predicate.write() = None;
        Ok(())
    }

    fn declared_return_type(&self) -> Option<TypeDescriptor> {
        self.specification.read().return_type().cloned()
    }

    fn assignable_parameter_count(&self) -> Option<usize> {
        self.specification
            .read()
            .method()
            .map(|method| method.assignable_parameter_count())
    }

    fn into_call_rule(self: Arc<Self>) -> Arc<dyn CallRule> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Applicator;
    use decoy_types::{ContractType, FakeId, MethodInfo, ParameterInfo};
    use serde_json::json;

    fn call(value: i64) -> InterceptedCall {
        let method = MethodInfo::new("record", TypeDescriptor::Unit)
            .with_parameter(ParameterInfo::new("value", TypeDescriptor::Integer));
        InterceptedCall::new(
            FakeId::generate(),
            ContractType::new("Ledger"),
            Arc::new(method),
            vec![json!(value)],
        )
        .unwrap()
    }

    #[test]
    fn starts_as_a_match_everything_rule() {
        let rule = RecordedCallRule::new();
        assert!(rule.is_applicable_to(&call(1)).unwrap());
        assert_eq!(rule.description_of_valid_call(), "Recorded call");
        assert!(!rule.is_assertion());
        assert!(rule.repeat_constraint().is_none());
    }

    #[test]
    fn predicate_passed_in_is_the_one_used() {
        let rule = RecordedCallRule::new();
        let predicate = ArgumentsPredicate::from_fn("positive value", |args| {
            args.get_as::<i64>(0).map(|v| v > 0).unwrap_or(false)
        });
        rule.use_predicate_to_validate_arguments(predicate.clone());

        assert!(rule.is_applicable_to_arguments().ptr_eq(&predicate));
        assert!(rule.is_applicable_to(&call(4)).unwrap());
        assert!(!rule.is_applicable_to(&call(-4)).unwrap());
        assert_eq!(rule.description_of_valid_call(), "Any call with arguments matching <positive value>");
    }

    #[test]
    fn bare_assertion_stays_out_of_dispatch() {
        let rule = RecordedCallRule::new();
        rule.set_repeat_constraint(RepeatConstraint::twice());
        rule.mark_as_assertion();

        assert!(rule.is_assertion());
        assert!(!rule.is_applicable_to(&call(1)).unwrap());
        assert!(rule.matches_call(&call(1)).unwrap());
        assert_eq!(
            rule.repeat_constraint().map(|r| r.to_string()),
            Some("exactly twice".to_string())
        );
    }

    #[test]
    fn assertion_with_a_behaviour_still_dispatches() {
        let rule = RecordedCallRule::new();
        rule.behavior().set_applicator(Applicator::DefaultValue);
        rule.mark_as_assertion();

        assert!(rule.is_applicable_to(&call(1)).unwrap());
        assert!(matches!(
            rule.apply(&call(1)).unwrap().outcome,
            decoy_types::CallOutcome::NoValue
        ));
    }
}
