//! Recorded expectations, checked after the fact

use crate::builder::{ConfiguredRule, RuleBuilder};
use decoy_engine::{
    ArgumentMatcher, ArgumentsPredicate, BuildableCallRule, FakeManager, RecordedCallRule,
    RepeatConstraint, Result,
};
use decoy_types::{Fault, InterceptedCall, RuleId, Value};
use std::sync::Arc;

/// Builds a [`RecordedCallRule`]
///
/// Behaviour methods delegate to a wrapped [`RuleBuilder`] over the same
/// rule. Expectations attached with the `must_have_happened` family are
/// checked by [`FakeManager::verify_recorded_assertions`].
#[derive(Debug)]
pub struct RecordingRuleBuilder {
    rule: Arc<RecordedCallRule>,
    builder: RuleBuilder,
}

impl RecordingRuleBuilder {
    pub(crate) fn new(manager: Arc<FakeManager>, rule: Arc<RecordedCallRule>) -> Self {
        let buildable: Arc<dyn BuildableCallRule> = rule.clone();
        Self {
            rule,
            builder: RuleBuilder::new(manager, buildable),
        }
    }

    /// The rule being built.
    pub fn rule(&self) -> &Arc<RecordedCallRule> {
        &self.rule
    }

    /// Constrain arguments position by position.
    pub fn with_args(mut self, matchers: Vec<ArgumentMatcher>) -> Result<Self> {
        self.builder = self.builder.with_args(matchers)?;
        Ok(self)
    }

    /// Constrain the arguments as a whole.
    pub fn when_arguments_match(self, predicate: ArgumentsPredicate) -> Self {
        self.rule.use_predicate_to_validate_arguments(predicate);
        self
    }

    /// Run `action` whenever the rule applies.
    pub fn invokes<F>(mut self, action: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Result<()> + Send + Sync + 'static,
    {
        self.builder = self.builder.invokes(action);
        self
    }

    pub fn returns<T: serde::Serialize>(self, value: T) -> Result<ConfiguredRule> {
        self.builder.returns(value)
    }

    pub fn returns_lazily<F>(self, factory: F) -> ConfiguredRule
    where
        F: Fn(&InterceptedCall) -> Result<Value> + Send + Sync + 'static,
    {
        self.builder.returns_lazily(factory)
    }

    pub fn throws(self, fault: Fault) -> ConfiguredRule {
        self.builder.throws(fault)
    }

    /// Give the rule a behaviour that returns the member's default.
    pub fn does_nothing(self) -> ConfiguredRule {
        self.builder.does_nothing()
    }

    pub fn calls_base_method(self) -> ConfiguredRule {
        self.builder.calls_base_method()
    }

    /// Record that the described calls must happen at least once.
    pub fn must_have_happened(self) -> RuleId {
        self.must_have_happened_times(RepeatConstraint::at_least(1))
    }

    /// Record a repeat expectation for the described calls.
    ///
    /// A rule without a behaviour of its own is skipped by dispatch, so
    /// recording an expectation does not change what calls return.
    pub fn must_have_happened_times(mut self, repeat: RepeatConstraint) -> RuleId {
        self.rule.set_repeat_constraint(repeat);
        self.rule.mark_as_assertion();
        self.builder.add_rule_last_if_needed()
    }

    /// Record that the described calls must never happen.
    pub fn must_not_have_happened(self) -> RuleId {
        self.must_have_happened_times(RepeatConstraint::never())
    }

    /// Check the described calls against the history right now.
    pub fn assert_now(&self, repeat: RepeatConstraint) -> Result<()> {
        self.builder.must_have_happened_times(repeat)
    }
}
