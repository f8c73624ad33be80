//! Call rules
//!
//! A rule pairs an applicability test with a behaviour. The fake manager asks
//! each rule, most recently added first, whether it covers a call and applies
//! the first one that does.
//!
//! - [`UserConfiguredRule`]: explicit return / throw / invoke / base-call behaviour
//! - [`RecordedCallRule`]: behaviour assigned after the fact, used for assertions
//! - [`CallbackRule`]: both halves delegated to a container-supplied configurator
//! - [`PropertyBehaviorRule`]: built-in getter/setter memory
//! - [`FallbackRule`]: the default behaviour when nothing else matches

mod behavior;
mod callback;
mod fallback;
mod property;
mod recorded;
mod user;

pub use behavior::{Applicator, CallAction, OutAndRefValues, RuleBehavior};
pub use callback::CallbackRule;
pub use fallback::FallbackRule;
pub use property::PropertyBehaviorRule;
pub use recorded::RecordedCallRule;
pub use user::UserConfiguredRule;

use crate::error::Result;
use crate::matcher::{ArgumentMatcher, ArgumentsPredicate};
use crate::repeat::RepeatConstraint;
use decoy_types::{DispatchResult, InterceptedCall, TypeDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of a rule, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// [`UserConfiguredRule`]
    UserConfigured,
    Recorded,
    Callback,
    PropertyBehavior,
    Fallback,
}

/// A configured behaviour plus the test deciding which calls it covers
pub trait CallRule: Send + Sync + std::fmt::Debug {
    /// Whether this rule should handle `call` now.
    ///
    /// Errors raised by predicates abort the dispatch of `call`.
    fn is_applicable_to(&self, call: &InterceptedCall) -> Result<bool>;

    /// Produce the behaviour for `call`.
    fn apply(&self, call: &InterceptedCall) -> Result<DispatchResult>;

    /// Human-readable description of a call this rule accepts.
    fn description_of_valid_call(&self) -> String;

    /// Which member of the rule family this is.
    fn kind(&self) -> RuleKind;

    /// Claim one application of a use-limited rule.
    ///
    /// Dispatch calls this after `is_applicable_to` accepted a call and moves
    /// on to the next rule when it returns `false`.
    fn claim_use(&self) -> bool {
        true
    }

    /// Whether `call` is one this rule describes, ignoring use limits.
    ///
    /// Assertions count history entries with this test.
    fn matches_call(&self, call: &InterceptedCall) -> Result<bool> {
        self.is_applicable_to(call)
    }

    /// Whether the rule records an expectation checked by
    /// `verify_recorded_assertions`.
    fn is_assertion(&self) -> bool {
        false
    }

    /// The expectation of an assertion rule.
    fn repeat_constraint(&self) -> Option<RepeatConstraint> {
        None
    }
}

/// A rule whose behaviour is assembled by the configuration surface
pub trait BuildableCallRule: CallRule {
    /// The behaviour the builder methods configure.
    fn behavior(&self) -> &RuleBehavior;

    /// Install a whole-collection argument predicate.
    fn use_predicate_to_validate_arguments(&self, predicate: ArgumentsPredicate);

    /// Install per-position argument matchers.
    fn use_argument_matchers(&self, matchers: Vec<ArgumentMatcher>) -> Result<()>;

    /// Return type of the calls this rule can cover, when it is fixed.
    fn declared_return_type(&self) -> Option<TypeDescriptor>;

    /// Number of out and ref parameters of the covered member, when known.
    fn assignable_parameter_count(&self) -> Option<usize>;

    /// Upcast for insertion into a rule list.
    fn into_call_rule(self: Arc<Self>) -> Arc<dyn CallRule>;
}
