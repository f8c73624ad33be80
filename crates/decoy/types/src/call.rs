//! Intercepted calls and the outcome handed back to the proxy

use crate::{
    ArgumentCollection, ContractType, FakeId, MethodInfo, TypeDescriptor, TypesResult, Value,
};
use std::sync::Arc;

/// One member invocation received by a fake
///
/// Created once per call by the proxy and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct InterceptedCall {
    fake: FakeId,
    contract: ContractType,
    method: Arc<MethodInfo>,
    arguments: ArgumentCollection,
}

impl InterceptedCall {
    /// Build a call, validating `values` against the member signature.
    pub fn new(
        fake: FakeId,
        contract: ContractType,
        method: Arc<MethodInfo>,
        values: Vec<Value>,
    ) -> TypesResult<Self> {
        let arguments = ArgumentCollection::new(&method, values)?;
        Ok(Self {
            fake,
            contract,
            method,
            arguments,
        })
    }

    /// The fake that received the call.
    pub fn fake(&self) -> FakeId {
        self.fake
    }

    pub fn contract(&self) -> &ContractType {
        &self.contract
    }

    /// Signature of the called member.
    pub fn method(&self) -> &Arc<MethodInfo> {
        &self.method
    }

    pub fn member_name(&self) -> &str {
        &self.method.name
    }

    pub fn arguments(&self) -> &ArgumentCollection {
        &self.arguments
    }

    /// Declared return type of the called member.
    pub fn return_type(&self) -> &TypeDescriptor {
        &self.method.return_type
    }
}

impl std::fmt::Display for InterceptedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.contract.short_name(),
            self.method.name,
            self.arguments
        )
    }
}

/// A fault a configured rule asks the proxy to raise
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct Fault {
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Fault {
    /// A fault carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// A fault wrapping `error`, which stays reachable as its source.
    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What the proxy should do to complete a call
#[derive(Clone, Debug)]
pub enum CallOutcome {
    Return(Value),
    /// The member produces no value
    NoValue,
    Fault(Fault),
    /// Run the real implementation the fake derives from
    CallBase,
}

/// Behaviour chosen by the engine for one call
#[derive(Clone, Debug)]
pub struct DispatchResult {
    /// How the proxy completes the call
    pub outcome: CallOutcome,
    /// Values for the member's out and ref parameters, in declaration order
    pub out_and_ref_values: Option<Vec<Value>>,
}

impl DispatchResult {
    /// Return `value`.
    pub fn returning(value: Value) -> Self {
        Self::from_outcome(CallOutcome::Return(value))
    }

    pub fn no_value() -> Self {
        Self::from_outcome(CallOutcome::NoValue)
    }

    pub fn fault(fault: Fault) -> Self {
        Self::from_outcome(CallOutcome::Fault(fault))
    }

    /// Ask the proxy to run the base implementation.
    pub fn call_base() -> Self {
        Self::from_outcome(CallOutcome::CallBase)
    }

    /// The unconfigured result for a member returning `return_type`.
    pub fn default_for(return_type: &TypeDescriptor) -> Self {
        match return_type.default_value() {
            Some(value) => Self::returning(value),
            None => Self::no_value(),
        }
    }

    /// Attach values for the out and ref parameters.
    pub fn with_out_and_ref_values(mut self, values: Vec<Value>) -> Self {
        self.out_and_ref_values = Some(values);
        self
    }

    /// The returned value, if the outcome is a return.
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            CallOutcome::Return(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self.outcome, CallOutcome::Fault(_))
    }

    fn from_outcome(outcome: CallOutcome) -> Self {
        Self {
            outcome,
            out_and_ref_values: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParameterInfo, TypesError};
    use serde_json::json;

    fn greet() -> Arc<MethodInfo> {
        Arc::new(
            MethodInfo::new("greet", TypeDescriptor::Text)
                .with_parameter(ParameterInfo::new("name", TypeDescriptor::Text)),
        )
    }

    #[test]
    fn call_renders_contract_member_and_arguments() {
        let call = InterceptedCall::new(
            FakeId::generate(),
            ContractType::new("app::Greeter"),
            greet(),
            vec![json!("ada")],
        )
        .unwrap();

        assert_eq!(call.to_string(), "Greeter.greet(\"ada\")");
        assert_eq!(call.return_type(), &TypeDescriptor::Text);
    }

    #[test]
    fn call_construction_validates_arity() {
        let result = InterceptedCall::new(
            FakeId::generate(),
            ContractType::new("Greeter"),
            greet(),
            vec![],
        );
        assert!(matches!(result, Err(TypesError::ArityMismatch { .. })));
    }

    #[test]
    fn default_result_depends_on_return_type() {
        assert_eq!(
            DispatchResult::default_for(&TypeDescriptor::Text).value(),
            Some(&json!(""))
        );
        assert!(matches!(
            DispatchResult::default_for(&TypeDescriptor::Unit).outcome,
            CallOutcome::NoValue
        ));
    }

    #[test]
    fn fault_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk unplugged");
        let fault = Fault::from_error(io);
        assert_eq!(fault.message(), "disk unplugged");
        assert_eq!(fault.to_string(), "disk unplugged");
        assert!(std::error::Error::source(&fault).is_some());
        assert!(std::error::Error::source(&Fault::new("plain")).is_none());
    }
}
