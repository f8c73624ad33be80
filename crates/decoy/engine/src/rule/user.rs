//! Rules configured explicitly through the builder surface

use super::{BuildableCallRule, CallRule, RuleBehavior, RuleKind};
use crate::error::Result;
use crate::matcher::{ArgumentMatcher, ArgumentsPredicate};
use crate::specification::CallSpecification;
use decoy_types::{DispatchResult, InterceptedCall, TypeDescriptor};
use parking_lot::RwLock;
use std::sync::Arc;

/// Rule configured explicitly through the configuration surface
#[derive(Debug)]
pub struct UserConfiguredRule {
    specification: RwLock<CallSpecification>,
    behavior: RuleBehavior,
}

impl UserConfiguredRule {
    /// A rule covering the calls `specification` describes, with no
    /// behaviour configured yet.
    pub fn new(specification: CallSpecification) -> Self {
        Self {
            specification: RwLock::new(specification),
            behavior: RuleBehavior::new(),
        }
    }

    /// Snapshot of the calls this rule covers.
    pub fn specification(&self) -> CallSpecification {
        self.specification.read().clone()
    }
}

impl CallRule for UserConfiguredRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> Result<bool> {
        if !self.behavior.has_remaining_uses() {
            return Ok(false);
        }
        self.matches_call(call)
    }

    fn matches_call(&self, call: &InterceptedCall) -> Result<bool> {
        let specification = self.specification.read().clone();
        specification.is_satisfied_by(call)
    }

    fn claim_use(&self) -> bool {
        self.behavior.try_consume()
    }

    fn apply(&self, call: &InterceptedCall) -> Result<DispatchResult> {
        self.behavior.execute(call)
    }

    fn description_of_valid_call(&self) -> String {
        self.specification.read().describe()
    }

    fn kind(&self) -> RuleKind {
        RuleKind::UserConfigured
    }
}

impl BuildableCallRule for UserConfiguredRule {
    fn behavior(&self) -> &RuleBehavior {
        &self.behavior
    }

    fn use_predicate_to_validate_arguments(&self, predicate: ArgumentsPredicate) {
        self.specification.write().use_arguments_predicate(predicate);
    }

    fn use_argument_matchers(&self, matchers: Vec<ArgumentMatcher>) -> Result<()> {
        self.specification.write().set_argument_matchers(matchers)
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
