//! Built-in rule that makes properties behave like stored fields

use super::{CallRule, RuleKind};
use crate::error::{FakeError, Result};
use decoy_types::{DispatchResult, InterceptedCall, MemberKind, Value};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Remembers property setter values and serves them from the getters
///
/// Getters of properties that were never set are left to the fallback.
#[derive(Debug, Default)]
pub struct PropertyBehaviorRule {
    values: Mutex<HashMap<String, Value>>,
}

impl PropertyBehaviorRule {
    /// A rule with no stored values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value last written through the setter of `property`.
    pub fn stored_value(&self, property: &str) -> Option<Value> {
        self.values.lock().get(property).cloned()
    }
}

impl CallRule for PropertyBehaviorRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> Result<bool> {
        Ok(match &call.method().kind {
            MemberKind::PropertySetter { .. } => true,
            MemberKind::PropertyGetter { property } => self.values.lock().contains_key(property),
            MemberKind::Method => false,
        })
    }

    fn apply(&self, call: &InterceptedCall) -> Result<DispatchResult> {
        match &call.method().kind {
            MemberKind::PropertySetter { property } => {
                let value = call
                    .arguments()
                    .get(0)
                    .cloned()
                    .ok_or_else(|| FakeError::dispatch(call, "property setter without a value"))?;
                self.values.lock().insert(property.clone(), value);
                Ok(DispatchResult::no_value())
            }
            MemberKind::PropertyGetter { property } => match self.stored_value(property) {
                Some(value) => Ok(DispatchResult::returning(value)),
                None => Ok(DispatchResult::default_for(call.return_type())),
            },
            MemberKind::Method => Ok(DispatchResult::default_for(call.return_type())),
        }
    }

    fn description_of_valid_call(&self) -> String {
        "Any property getter or setter".to_string()
    }

    fn kind(&self) -> RuleKind {
        RuleKind::PropertyBehavior
    }
}
