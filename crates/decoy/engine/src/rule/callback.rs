//! Rules driven entirely by caller-supplied closures

use super::{CallRule, RuleKind};
use crate::error::Result;
use decoy_types::{DispatchResult, InterceptedCall};
use std::sync::Arc;

type Applicability = Arc<dyn Fn(&InterceptedCall) -> Result<bool> + Send + Sync>;
type Behaviour = Arc<dyn Fn(&InterceptedCall) -> Result<DispatchResult> + Send + Sync>;

/// Rule whose applicability and behaviour are both supplied as callbacks
///
/// Containers use this to configure a whole family of members at once.
#[derive(Clone)]
pub struct CallbackRule {
    description: String,
    applicability: Applicability,
    behaviour: Behaviour,
}

impl CallbackRule {
    /// Rule described by `description`, covering calls `applicability` accepts.
    pub fn new<A, B>(description: impl Into<String>, applicability: A, behaviour: B) -> Self
    where
        A: Fn(&InterceptedCall) -> Result<bool> + Send + Sync + 'static,
        B: Fn(&InterceptedCall) -> Result<DispatchResult> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            applicability: Arc::new(applicability),
            behaviour: Arc::new(behaviour),
        }
    }
}

impl CallRule for CallbackRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> Result<bool> {
        (self.applicability)(call)
    }

    fn apply(&self, call: &InterceptedCall) -> Result<DispatchResult> {
        (self.behaviour)(call)
    }

    fn description_of_valid_call(&self) -> String {
        self.description.clone()
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Callback
    }
}

impl std::fmt::Debug for CallbackRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRule")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
