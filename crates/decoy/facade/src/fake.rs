//! Fake handles

use crate::builder::RuleBuilder;
use crate::recording::RecordingRuleBuilder;
use decoy_engine::{
    create_fake, BuildableCallRule, CallSpecification, ConstructionContext, EngineConfig,
    FakeError, FakeManager, RecordedCall, RecordedCallRule, Result, UserConfiguredRule,
};
use decoy_types::{CallOutcome, Contract, DispatchResult, FakeId, TypeDescriptor, Value};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Handle to one fake instance
///
/// Cloning the handle shares the fake.
#[derive(Clone, Debug)]
pub struct Fake {
    manager: Arc<FakeManager>,
}

impl Fake {
    /// Create a fake, letting the current scope's container configure it.
    pub fn new(contract: Contract) -> Result<Self> {
        Self::with_config(contract, EngineConfig::default())
    }

    /// Like [`Fake::new`], with an explicit engine configuration.
    pub fn with_config(contract: Contract, config: EngineConfig) -> Result<Self> {
        let created = create_fake(contract, Arc::new(config), |_| Ok(()))?;
        Ok(Self::from_manager(created.manager))
    }

    /// Create a fake whose construction routine runs after the current
    /// scope's container has configured it.
    pub fn create<T, F>(contract: Contract, construct: F) -> Result<(Self, T)>
    where
        F: FnOnce(&ConstructionContext) -> Result<T>,
    {
        let created = create_fake(contract, Arc::new(EngineConfig::default()), construct)?;
        Ok((Self::from_manager(created.manager), created.instance))
    }

    /// Wrap an existing manager.
    pub fn from_manager(manager: Arc<FakeManager>) -> Self {
        Self { manager }
    }

    /// The live fake with this id, if any.
    pub fn find(id: FakeId) -> Option<Self> {
        FakeManager::find(id).map(Self::from_manager)
    }

    pub fn id(&self) -> FakeId {
        self.manager.id()
    }

    pub fn contract(&self) -> &Contract {
        self.manager.contract()
    }

    /// The manager behind this handle.
    pub fn manager(&self) -> &Arc<FakeManager> {
        &self.manager
    }

    /// The value representing this fake when it is passed as an argument.
    pub fn as_value(&self) -> Value {
        self.id().as_value()
    }

    /// Configure calls to `member`.
    pub fn call_to(&self, member: &str) -> Result<RuleBuilder> {
        let method = self.contract().member(member)?;
        let specification =
            CallSpecification::for_member(self.contract().contract_type(), method);
        Ok(self.builder_for(specification))
    }

    /// Configure every call to the fake.
    pub fn any_call(&self) -> RuleBuilder {
        self.builder_for(CallSpecification::any_call())
    }

    /// Configure every member declared to return `ty`.
    pub fn calls_returning(&self, ty: TypeDescriptor) -> RuleBuilder {
        self.builder_for(CallSpecification::with_return_type(ty))
    }

    /// Record an expectation on calls to `member`.
    pub fn record_call_to(&self, member: &str) -> Result<RecordingRuleBuilder> {
        let method = self.contract().member(member)?;
        let specification =
            CallSpecification::for_member(self.contract().contract_type(), method);
        Ok(self.recording_builder_for(RecordedCallRule::for_specification(specification)))
    }

    /// Record an expectation on any call.
    pub fn record_any_call(&self) -> RecordingRuleBuilder {
        self.recording_builder_for(RecordedCallRule::new())
    }

    fn builder_for(&self, specification: CallSpecification) -> RuleBuilder {
        let rule: Arc<dyn BuildableCallRule> = Arc::new(UserConfiguredRule::new(specification));
        RuleBuilder::new(self.manager.clone(), rule)
    }

    fn recording_builder_for(&self, rule: RecordedCallRule) -> RecordingRuleBuilder {
        RecordingRuleBuilder::new(self.manager.clone(), Arc::new(rule))
    }

    /// Dispatch a call to `member` and return the engine's decision.
    pub fn invoke(&self, member: &str, arguments: Vec<Value>) -> Result<DispatchResult> {
        self.manager.invoke(member, arguments)
    }

    /// Dispatch a call and complete it the way a proxy without a base
    /// implementation would.
    ///
    /// A configured fault surfaces as [`FakeError::Faulted`]; a request to call
    /// the base implementation is a dispatch error.
    pub fn invoke_as<T: DeserializeOwned>(&self, member: &str, arguments: Vec<Value>) -> Result<T> {
        self.invoke_with_base(member, arguments, || {
            Err(FakeError::Dispatch {
                call: format!("{}.{}", self.contract().contract_type().short_name(), member),
                reason: "the fake has no base implementation to call".to_string(),
            })
        })
    }

    /// Like [`Fake::invoke_as`], running `base` when the rule asks for the
    /// base implementation.
    pub fn invoke_with_base<T, B>(&self, member: &str, arguments: Vec<Value>, base: B) -> Result<T>
    where
        T: DeserializeOwned,
        B: FnOnce() -> Result<T>,
    {
        let result = self.invoke(member, arguments)?;
        match result.outcome {
            CallOutcome::Return(value) => Ok(decode(value)?),
            CallOutcome::NoValue => Ok(decode(Value::Null)?),
            CallOutcome::Fault(fault) => Err(FakeError::Faulted(fault)),
            CallOutcome::CallBase => base(),
        }
    }

    /// Every call received so far, in call order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.manager.recorded_calls()
    }

    /// Check every expectation recorded with [`Fake::record_call_to`] or [`Fake::record_any_call`].
    pub fn verify_recorded_assertions(&self) -> Result<()> {
        self.manager.verify_recorded_assertions()
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> std::result::Result<T, decoy_types::TypesError> {
    Ok(serde_json::from_value(value)?)
}
