//! Rule builders: the fluent surface that turns configuration calls into rules

use decoy_engine::{
    Applicator, ArgumentMatcher, ArgumentsPredicate, BuildableCallRule, CallRule, FakeError,
    FakeManager, OutAndRefValues, RepeatConstraint, Result,
};
use decoy_types::{Fault, InterceptedCall, RuleId, Value};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Configures one rule of one fake
///
/// The rule joins the fake the first time a behaviour is configured. Argument
/// constraints alone do not add it, and neither do the assertion methods,
/// which only use the rule to describe the calls to count.
pub struct RuleBuilder {
    manager: Arc<FakeManager>,
    rule: Arc<dyn BuildableCallRule>,
    added: Option<RuleId>,
}

impl RuleBuilder {
    pub(crate) fn new(manager: Arc<FakeManager>, rule: Arc<dyn BuildableCallRule>) -> Self {
        Self {
            manager,
            rule,
            added: None,
        }
    }

    /// Id of the rule, once it has been added to the fake.
    pub fn rule_id(&self) -> Option<RuleId> {
        self.added
    }

    /// Description of the calls the rule covers.
    pub fn description(&self) -> String {
        self.rule.description_of_valid_call()
    }

    /// Constrain each argument position.
    pub fn with_args(self, matchers: Vec<ArgumentMatcher>) -> Result<Self> {
        self.rule.use_argument_matchers(matchers)?;
        Ok(self)
    }

    /// Constrain the arguments with one predicate over the whole collection.
    ///
    /// Replaces any per-position matchers.
    pub fn when_arguments_match(self, predicate: ArgumentsPredicate) -> Self {
        self.rule.use_predicate_to_validate_arguments(predicate);
        self
    }

    /// Run `action` whenever the rule applies, before its result is produced.
    pub fn invokes<F>(mut self, action: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Result<()> + Send + Sync + 'static,
    {
        self.rule.behavior().add_action(Arc::new(action));
        self.add_rule_if_needed();
        self
    }

    /// Return `value`, which must fit the member's declared return type.
    pub fn returns<T: Serialize>(self, value: T) -> Result<ConfiguredRule> {
        let value = serde_json::to_value(value).map_err(|err| {
            FakeError::configuration(format!("return value cannot be represented: {}", err))
        })?;
        if let Some(return_type) = self.rule.declared_return_type() {
            if return_type.is_unit() {
                return Err(FakeError::configuration(format!(
                    "{} does not return a value",
                    self.rule.description_of_valid_call()
                )));
            }
            if !return_type.accepts(&value) {
                return Err(FakeError::configuration(format!(
                    "{} is not a valid {} returned from {}",
                    value,
                    return_type,
                    self.rule.description_of_valid_call()
                )));
            }
        }
        Ok(self.finish(Applicator::Return(value)))
    }

    /// Compute the return value from each call.
    pub fn returns_lazily<F>(self, factory: F) -> ConfiguredRule
    where
        F: Fn(&InterceptedCall) -> Result<Value> + Send + Sync + 'static,
    {
        self.finish(Applicator::returns_lazily(factory))
    }

    /// Raise `fault` from every call the rule covers.
    pub fn throws(self, fault: Fault) -> ConfiguredRule {
        self.throws_lazily(move |_| fault.clone())
    }

    /// Raise a fault built from each call.
    pub fn throws_lazily<F>(self, factory: F) -> ConfiguredRule
    where
        F: Fn(&InterceptedCall) -> Fault + Send + Sync + 'static,
    {
        self.finish(Applicator::throws(factory))
    }

    /// Return the declared default; unit members return nothing.
    pub fn does_nothing(self) -> ConfiguredRule {
        self.finish(Applicator::DefaultValue)
    }

    /// Let the proxy run the real implementation.
    pub fn calls_base_method(self) -> ConfiguredRule {
        self.finish(Applicator::CallBase)
    }

    /// Assign out and ref parameters, keeping the default return value.
    pub fn assigns_out_and_ref_parameters(self, values: Vec<Value>) -> Result<ConfiguredRule> {
        check_out_and_ref_count(self.rule.as_ref(), values.len())?;
        self.does_nothing().assigns_out_and_ref_parameters(values)
    }

    /// Fails unless the calls this rule describes happened at least once.
    pub fn must_have_happened(&self) -> Result<()> {
        self.must_have_happened_times(RepeatConstraint::at_least(1))
    }

    /// Check the history now against `repeat`.
    pub fn must_have_happened_times(&self, repeat: RepeatConstraint) -> Result<()> {
        let rule: Arc<dyn CallRule> = self.rule.clone().into_call_rule();
        self.manager.assert_happened(rule.as_ref(), &repeat)
    }

    /// Check that no matching call was made.
    pub fn must_not_have_happened(&self) -> Result<()> {
        self.must_have_happened_times(RepeatConstraint::never())
    }

    fn add_rule_if_needed(&mut self) -> RuleId {
        match self.added {
            Some(id) => id,
            None => {
                let id = self.manager.add_rule(self.rule.clone().into_call_rule());
                self.added = Some(id);
                id
            }
        }
    }

    /// Adds the rule below every configured rule unless it is already added.
    pub(crate) fn add_rule_last_if_needed(&mut self) -> RuleId {
        match self.added {
            Some(id) => id,
            None => {
                let id = self.manager.add_rule_last(self.rule.clone().into_call_rule());
                self.added = Some(id);
                id
            }
        }
    }

    fn finish(mut self, applicator: Applicator) -> ConfiguredRule {
        self.rule.behavior().set_applicator(applicator);
        let id = self.add_rule_if_needed();
        debug!(
            fake = %self.manager.id(),
            rule = %id,
            call = %self.rule.description_of_valid_call(),
            "Configured rule"
        );
        ConfiguredRule {
            rule: self.rule,
            id,
        }
    }
}

impl std::fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("fake", &self.manager.id())
            .field("rule", &self.rule)
            .field("added", &self.added)
            .finish()
    }
}

/// A rule whose result is configured
///
/// Further settings change the rule in place.
#[derive(Debug)]
pub struct ConfiguredRule {
    rule: Arc<dyn BuildableCallRule>,
    id: RuleId,
}

impl ConfiguredRule {
    /// Id of the rule in the fake's rule list.
    pub fn rule_id(&self) -> RuleId {
        self.id
    }

    /// Stop applying the rule after `times` calls.
    pub fn number_of_times(self, times: usize) -> Self {
        self.rule.behavior().set_number_of_times(times);
        self
    }

    /// Apply the rule a single time.
    pub fn once(self) -> Self {
        self.number_of_times(1)
    }

    pub fn twice(self) -> Self {
        self.number_of_times(2)
    }

    /// Values for the member's out and ref parameters, in declaration order.
    pub fn assigns_out_and_ref_parameters(self, values: Vec<Value>) -> Result<Self> {
        check_out_and_ref_count(self.rule.as_ref(), values.len())?;
        self.rule
            .behavior()
            .set_out_and_ref_values(OutAndRefValues::Eager(values));
        Ok(self)
    }

    /// Compute out and ref values per call; the count is checked on dispatch.
    pub fn assigns_out_and_ref_parameters_lazily<F>(self, factory: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        self.rule
            .behavior()
            .set_out_and_ref_values(OutAndRefValues::lazy(factory));
        self
    }
}

fn check_out_and_ref_count(rule: &dyn BuildableCallRule, given: usize) -> Result<()> {
    match rule.assignable_parameter_count() {
        Some(expected) if expected != given => Err(FakeError::configuration(format!(
            "{} out and ref value(s) were given but {} has {} out and ref parameter(s)",
            given,
            rule.description_of_valid_call(),
            expected
        ))),
        _ => Ok(()),
    }
}
