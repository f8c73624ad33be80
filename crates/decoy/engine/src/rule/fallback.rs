//! Last-resort rule answering every call with the member default

use super::{CallRule, RuleKind};
use crate::error::Result;
use decoy_types::{DispatchResult, InterceptedCall};
use std::sync::{Arc, OnceLock};

/// Backstop rule: covers every call and returns the declared default
#[derive(Debug, Default)]
pub struct FallbackRule;

impl FallbackRule {
    /// The process-wide instance every manager falls back to.
    pub fn shared() -> Arc<dyn CallRule> {
        static SHARED: OnceLock<Arc<FallbackRule>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(FallbackRule)).clone()
    }
}

impl CallRule for FallbackRule {
    fn is_applicable_to(&self, _call: &InterceptedCall) -> Result<bool> {
        Ok(true)
    }

    fn apply(&self, call: &InterceptedCall) -> Result<DispatchResult> {
        Ok(DispatchResult::default_for(call.return_type()))
    }

    fn description_of_valid_call(&self) -> String {
        "Any call".to_string()
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Fallback
    }
}
