//! The fake manager: per-fake rule list, call history and dispatch

use crate::assertion::AssertionEngine;
use crate::config::EngineConfig;
use crate::error::{FakeError, Result};
use crate::history::{CallHistory, RecordedCall};
use crate::registry;
use crate::repeat::RepeatConstraint;
use crate::rule::{CallRule, FallbackRule, PropertyBehaviorRule};
use crate::scope;
use decoy_types::{Contract, DispatchResult, FakeId, InterceptedCall, RuleId, ScopeId, Value};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// A rule as stored in a manager's rule list
#[derive(Clone, Debug)]
pub struct RuleEntry {
    /// Id handed out when the rule was added
    pub id: RuleId,
    pub rule: Arc<dyn CallRule>,
    /// Scope that owns the rule; `None` for rules added outside any scope
    pub scope: Option<ScopeId>,
}

/// Dispatch authority for one fake instance
///
/// Rules are kept in configuration order; dispatch scans them from the most
/// recently added backwards. Rule mutation is meant for configuration phases:
/// adding rules while other threads intercept calls on the same fake is not
/// supported.
pub struct FakeManager {
    id: FakeId,
    contract: Contract,
    config: Arc<EngineConfig>,
    rules: RwLock<Vec<RuleEntry>>,
    property_rule: PropertyBehaviorRule,
    fallback: Arc<dyn CallRule>,
    history: CallHistory,
    weak_self: Weak<FakeManager>,
}

impl FakeManager {
    /// Manager for a fake of `contract` with the default configuration.
    pub fn new(contract: Contract) -> Arc<Self> {
        Self::with_config(contract, Arc::new(EngineConfig::default()))
    }

    /// Manager for a fake of `contract`, registered for lookup by id.
    pub fn with_config(contract: Contract, config: Arc<EngineConfig>) -> Arc<Self> {
        let manager = Arc::new_cyclic(|weak_self| Self {
            id: FakeId::generate(),
            contract,
            config,
            rules: RwLock::new(Vec::new()),
            property_rule: PropertyBehaviorRule::new(),
            fallback: FallbackRule::shared(),
            history: CallHistory::new(),
            weak_self: weak_self.clone(),
        });
        registry::register(&manager);
        debug!(
            fake = %manager.id,
            contract = %manager.contract.contract_type(),
            "Created fake manager"
        );
        manager
    }

    /// Resolve a live fake from its id, e.g. one received as an argument.
    pub fn find(id: FakeId) -> Option<Arc<FakeManager>> {
        registry::find(id)
    }

    /// Identity of the fake this manager dispatches for.
    pub fn id(&self) -> FakeId {
        self.id
    }

    /// The contract the fake implements.
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Configuration shared by dispatch and assertions.
    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    /// Add a rule with priority over every rule added before it.
    ///
    /// A rule added while a scope is current belongs to that scope and is
    /// withdrawn when the scope exits.
    pub fn add_rule(&self, rule: Arc<dyn CallRule>) -> RuleId {
        let entry = self.new_entry(rule);
        let id = entry.id;
        self.rules.write().push(entry);
        id
    }

    /// Add a rule below every configured rule.
    pub fn add_rule_last(&self, rule: Arc<dyn CallRule>) -> RuleId {
        let entry = self.new_entry(rule);
        let id = entry.id;
        self.rules.write().insert(0, entry);
        id
    }

    fn new_entry(&self, rule: Arc<dyn CallRule>) -> RuleEntry {
        let frame = scope::current_frame();
        let owner = if frame.is_root() {
            None
        } else {
            frame.own_rules_of(self.weak_self.clone());
            Some(frame.id())
        };
        let entry = RuleEntry {
            id: RuleId::generate(),
            rule,
            scope: owner,
        };
        debug!(
            fake = %self.id,
            rule = %entry.id,
            kind = ?entry.rule.kind(),
            scope = ?entry.scope,
            "Added rule"
        );
        entry
    }

    /// Configured rules, lowest priority first.
    pub fn rules(&self) -> Vec<RuleEntry> {
        self.rules.read().clone()
    }

    /// Number of configured rules, built-in rules excluded.
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Remove every rule owned by `scope`; returns how many were removed.
    pub(crate) fn withdraw_rules(&self, scope: ScopeId) -> usize {
        let mut rules = self.rules.write();
        let before = rules.len();
        rules.retain(|entry| entry.scope != Some(scope));
        let withdrawn = before - rules.len();
        debug!(fake = %self.id, scope = %scope, withdrawn, "Withdrew scope rules");
        withdrawn
    }

    /// Dispatch one call.
    ///
    /// The call is recorded before any rule is evaluated, so it is part of
    /// the history even when a predicate or behaviour fails.
    pub fn intercept(&self, call: InterceptedCall) -> Result<DispatchResult> {
        if call.fake() != self.id {
            return Err(FakeError::dispatch(
                &call,
                format!("call addressed to fake {} reached fake {}", call.fake(), self.id),
            ));
        }

        let recorded = self
            .history
            .append(call.clone(), scope::active_scope_ids());
        if self.config.dispatch.trace_calls {
            trace!(
                fake = %self.id,
                member = call.member_name(),
                sequence = recorded.sequence,
                "Intercepted call"
            );
        }

        let rules = self.rules.read().clone();
        for entry in rules.iter().rev() {
            if entry.rule.is_applicable_to(&call)? && entry.rule.claim_use() {
                trace!(fake = %self.id, rule = %entry.id, kind = ?entry.rule.kind(), "Rule matched");
                return entry.rule.apply(&call);
            }
        }

        if self.config.dispatch.property_behavior && self.property_rule.is_applicable_to(&call)? {
            return self.property_rule.apply(&call);
        }

        self.fallback.apply(&call)
    }

    /// Build a call to `member` on this fake.
    pub fn build_call(&self, member: &str, values: Vec<Value>) -> Result<InterceptedCall> {
        let method = self.contract.member(member)?;
        Ok(InterceptedCall::new(
            self.id,
            self.contract.contract_type().clone(),
            method,
            values,
        )?)
    }

    /// Build and dispatch a call to `member`.
    pub fn invoke(&self, member: &str, values: Vec<Value>) -> Result<DispatchResult> {
        let call = self.build_call(member, values)?;
        self.intercept(call)
    }

    pub fn history(&self) -> &CallHistory {
        &self.history
    }

    /// Snapshot of every call the fake received, in call order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.history.snapshot()
    }

    /// Calls made while the given scope was active.
    pub fn recorded_calls_within(&self, scope: ScopeId) -> Vec<RecordedCall> {
        self.history.calls_within(scope)
    }

    /// Check that calls `rule` describes happened as often as `repeat` allows.
    pub fn assert_happened(&self, rule: &dyn CallRule, repeat: &RepeatConstraint) -> Result<()> {
        AssertionEngine::new(&self.config.diagnostics).assert(self, rule, repeat)
    }

    /// Evaluate every assertion rule against the history; first failure wins.
    pub fn verify_recorded_assertions(&self) -> Result<()> {
        for entry in self.rules() {
            if !entry.rule.is_assertion() {
                continue;
            }
            let repeat = entry.rule.repeat_constraint().unwrap_or_default();
            self.assert_happened(entry.rule.as_ref(), &repeat)?;
        }
        Ok(())
    }
}

impl Drop for FakeManager {
    fn drop(&mut self) {
        registry::unregister(self.id);
    }
}

impl std::fmt::Debug for FakeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeManager")
            .field("id", &self.id)
            .field("contract", self.contract.contract_type())
            .field("rules", &self.rule_count())
            .field("calls", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ArgumentMatcher;
    use crate::rule::{
        Applicator, BuildableCallRule, CallbackRule, RecordedCallRule, UserConfiguredRule,
    };
    use crate::specification::CallSpecification;
    use decoy_types::{CallOutcome, MethodInfo, ParameterInfo, TypeDescriptor};
    use serde_json::json;

    fn contract() -> Contract {
        Contract::named("app::Greeter")
            .with_member(
                MethodInfo::new("greet", TypeDescriptor::Text)
                    .with_parameter(ParameterInfo::new("name", TypeDescriptor::Text)),
            )
            .with_member(MethodInfo::new("count", TypeDescriptor::Integer))
            .with_property("title", TypeDescriptor::Text)
    }

    fn returning(manager: &FakeManager, member: &str, value: Value) -> Arc<UserConfiguredRule> {
        let method = manager.contract().member(member).unwrap();
        let rule = Arc::new(UserConfiguredRule::new(CallSpecification::for_member(
            manager.contract().contract_type(),
            method,
        )));
        rule.behavior().set_applicator(Applicator::Return(value));
        manager.add_rule(rule.clone().into_call_rule());
        rule
    }

    #[test]
    fn unconfigured_fake_returns_defaults() {
        let manager = FakeManager::new(contract());
        let result = manager.invoke("greet", vec![json!("ada")]).unwrap();
        assert_eq!(result.value(), Some(&json!("")));
        assert_eq!(manager.invoke("count", vec![]).unwrap().value(), Some(&json!(0)));
    }

    #[test]
    fn latest_matching_rule_wins() {
        let manager = FakeManager::new(contract());
        returning(&manager, "greet", json!("A"));
        returning(&manager, "greet", json!("B"));
        let result = manager.invoke("greet", vec![json!("x")]).unwrap();
        assert_eq!(result.value(), Some(&json!("B")));
    }

    #[test]
    fn non_matching_newer_rule_is_skipped() {
        let manager = FakeManager::new(contract());
        returning(&manager, "greet", json!("any"));
        let narrow = returning(&manager, "greet", json!("bob only"));
        narrow
            .use_argument_matchers(vec![ArgumentMatcher::exact(json!("bob"))])
            .unwrap();

        assert_eq!(
            manager.invoke("greet", vec![json!("ada")]).unwrap().value(),
            Some(&json!("any"))
        );
        assert_eq!(
            manager.invoke("greet", vec![json!("bob")]).unwrap().value(),
            Some(&json!("bob only"))
        );
    }

    #[test]
    fn rule_added_last_has_lowest_priority() {
        let manager = FakeManager::new(contract());
        returning(&manager, "count", json!(1));
        let low = Arc::new(UserConfiguredRule::new(CallSpecification::any_call()));
        low.behavior().set_applicator(Applicator::Return(json!(99)));
        let low_id = manager.add_rule_last(low.into_call_rule());

        assert_eq!(manager.invoke("count", vec![]).unwrap().value(), Some(&json!(1)));
        assert_eq!(manager.rules()[0].id, low_id);
    }

    #[test]
    fn history_records_before_a_failing_predicate() {
        let manager = FakeManager::new(contract());
        manager.add_rule(Arc::new(CallbackRule::new(
            "explodes",
            |call| Err(FakeError::dispatch(call, "predicate blew up")),
            |call| Ok(DispatchResult::default_for(call.return_type())),
        )));

        let err = manager.invoke("count", vec![]).unwrap_err();
        assert!(err.is_dispatch());
        assert_eq!(manager.history().len(), 1);
    }

    #[test]
    fn property_values_are_remembered() {
        let manager = FakeManager::new(contract());
        manager.invoke("set_title", vec![json!("Dr")]).unwrap();
        assert_eq!(
            manager.invoke("get_title", vec![]).unwrap().value(),
            Some(&json!("Dr"))
        );
    }

    #[test]
    fn property_behaviour_can_be_disabled() {
        let mut config = EngineConfig::default();
        config.dispatch.property_behavior = false;
        let manager = FakeManager::with_config(contract(), Arc::new(config));
        manager.invoke("set_title", vec![json!("Dr")]).unwrap();
        assert_eq!(
            manager.invoke("get_title", vec![]).unwrap().value(),
            Some(&json!(""))
        );
    }

    #[test]
    fn calls_for_another_fake_are_rejected() {
        let first = FakeManager::new(contract());
        let second = FakeManager::new(contract());
        let call = second.build_call("count", vec![]).unwrap();
        assert!(first.intercept(call).unwrap_err().is_dispatch());
        assert!(first.history().is_empty());
    }

    #[test]
    fn registry_tracks_live_fakes() {
        let manager = FakeManager::new(contract());
        let id = manager.id();
        assert!(FakeManager::find(id).is_some());
        drop(manager);
        assert!(FakeManager::find(id).is_none());
    }

    #[test]
    fn recorded_assertions_are_verified() {
        let manager = FakeManager::new(contract());
        let rule = Arc::new(RecordedCallRule::new());
        rule.set_repeat_constraint(RepeatConstraint::twice());
        rule.mark_as_assertion();
        manager.add_rule(rule.into_call_rule());

        manager.invoke("count", vec![]).unwrap();
        assert!(manager.verify_recorded_assertions().unwrap_err().is_assertion());
        let result = manager.invoke("count", vec![]).unwrap();
        assert!(matches!(result.outcome, CallOutcome::Return(_)));
        assert!(manager.verify_recorded_assertions().is_ok());
    }
}
