//! The behaviour half of a buildable rule

use crate::error::{FakeError, Result};
use decoy_types::{DispatchResult, Fault, InterceptedCall, Value};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

type ValueFactory = Arc<dyn Fn(&InterceptedCall) -> Result<Value> + Send + Sync>;
type FaultFactory = Arc<dyn Fn(&InterceptedCall) -> Fault + Send + Sync>;
type ValuesFactory = Arc<dyn Fn(&InterceptedCall) -> Result<Vec<Value>> + Send + Sync>;

/// Side effect run before a rule produces its result
pub type CallAction = Arc<dyn Fn(&InterceptedCall) -> Result<()> + Send + Sync>;

/// Produces the outcome of a call
#[derive(Clone)]
pub enum Applicator {
    /// The declared return type's default, or no value for unit members
    DefaultValue,
    Return(Value),
    ReturnLazily(ValueFactory),
    Throw(FaultFactory),
    CallBase,
}

impl Applicator {
    /// Compute the return value from the call.
    pub fn returns_lazily<F>(factory: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Result<Value> + Send + Sync + 'static,
    {
        Self::ReturnLazily(Arc::new(factory))
    }

    /// Build the fault to raise from the call.
    pub fn throws<F>(factory: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Fault + Send + Sync + 'static,
    {
        Self::Throw(Arc::new(factory))
    }

    fn apply(&self, call: &InterceptedCall) -> Result<DispatchResult> {
        match self {
            Self::DefaultValue => Ok(DispatchResult::default_for(call.return_type())),
            Self::Return(value) => Ok(DispatchResult::returning(value.clone())),
            Self::ReturnLazily(factory) => factory(call)
                .map(DispatchResult::returning)
                .map_err(|err| as_dispatch_error(call, err)),
            Self::Throw(factory) => Ok(DispatchResult::fault(factory(call))),
            Self::CallBase => Ok(DispatchResult::call_base()),
        }
    }
}

impl std::fmt::Debug for Applicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DefaultValue => write!(f, "DefaultValue"),
            Self::Return(value) => f.debug_tuple("Return").field(value).finish(),
            Self::ReturnLazily(_) => write!(f, "ReturnLazily(..)"),
            Self::Throw(_) => write!(f, "Throw(..)"),
            Self::CallBase => write!(f, "CallBase"),
        }
    }
}

/// Values assigned to a member's out and ref parameters
#[derive(Clone)]
pub enum OutAndRefValues {
    Eager(Vec<Value>),
    Lazy(ValuesFactory),
}

impl OutAndRefValues {
    /// Compute the values from the call at dispatch time.
    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Self::Lazy(Arc::new(factory))
    }

    fn resolve(&self, call: &InterceptedCall) -> Result<Vec<Value>> {
        match self {
            Self::Eager(values) => Ok(values.clone()),
            Self::Lazy(factory) => factory(call).map_err(|err| as_dispatch_error(call, err)),
        }
    }
}

impl std::fmt::Debug for OutAndRefValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eager(values) => f.debug_tuple("Eager").field(values).finish(),
            Self::Lazy(_) => write!(f, "Lazy(..)"),
        }
    }
}

/// Mutable behaviour of a rule
///
/// Every setter may be called after the rule was added to a fake. Closures
/// are cloned out of their locks before they run, so a behaviour may call
/// back into the same fake.
#[derive(Default)]
pub struct RuleBehavior {
    applicator: RwLock<Option<Applicator>>,
    actions: RwLock<Vec<CallAction>>,
    out_and_ref_values: RwLock<Option<OutAndRefValues>>,
    remaining_uses: Mutex<Option<usize>>,
}

impl RuleBehavior {
    /// A behaviour with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outcome-producing half of the behaviour.
    pub fn set_applicator(&self, applicator: Applicator) {
        *self.applicator.write() = Some(applicator);
    }

    pub fn applicator_is_set(&self) -> bool {
        self.applicator.read().is_some()
    }

    /// Actions run in the order they were added.
    pub fn add_action(&self, action: CallAction) {
        self.actions.write().push(action);
    }

    /// Values assigned to out and ref parameters after the applicator ran.
    pub fn set_out_and_ref_values(&self, values: OutAndRefValues) {
        *self.out_and_ref_values.write() = Some(values);
    }

    /// Whether anything was configured: an applicator, an action or out and
    /// ref values.
    pub fn is_configured(&self) -> bool {
        self.applicator_is_set()
            || !self.actions.read().is_empty()
            || self.out_and_ref_values.read().is_some()
    }

    /// Limit the rule to `times` applications.
    pub fn set_number_of_times(&self, times: usize) {
        *self.remaining_uses.lock() = Some(times);
    }

    /// Whether a use-limited rule still has uses left.
    pub fn has_remaining_uses(&self) -> bool {
        self.remaining_uses.lock().map_or(true, |remaining| remaining > 0)
    }

    /// Take one use, if any is left.
    ///
    /// The check and the decrement happen under one lock, so two callers
    /// racing for the last use cannot both get it.
    pub fn try_consume(&self) -> bool {
        match self.remaining_uses.lock().as_mut() {
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
            None => true,
        }
    }

    /// Run actions, then the applicator, then resolve out and ref values.
    ///
    /// Use limits are not touched here; dispatch claims a use with
    /// [`RuleBehavior::try_consume`] before applying the rule.
    pub fn execute(&self, call: &InterceptedCall) -> Result<DispatchResult> {
        let actions = self.actions.read().clone();
        for action in &actions {
            action(call).map_err(|err| as_dispatch_error(call, err))?;
        }

        let applicator = self
            .applicator
            .read()
            .clone()
            .unwrap_or(Applicator::DefaultValue);
        let result = applicator.apply(call)?;

        let out_and_ref = self.out_and_ref_values.read().clone();
        match out_and_ref {
            Some(values) => {
                let values = values.resolve(call)?;
                let expected = call.method().assignable_parameter_count();
                if values.len() != expected {
                    return Err(FakeError::dispatch(
                        call,
                        format!(
                            "{} out and ref value(s) were given but the member has {} out and ref parameter(s)",
                            values.len(),
                            expected
                        ),
                    ));
                }
                Ok(result.with_out_and_ref_values(values))
            }
            None => Ok(result),
        }
    }
}

impl std::fmt::Debug for RuleBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBehavior")
            .field("applicator", &*self.applicator.read())
            .field("actions", &self.actions.read().len())
            .field("out_and_ref_values", &*self.out_and_ref_values.read())
            .field("remaining_uses", &*self.remaining_uses.lock())
            .finish()
    }
}

/// Errors from user closures surface as dispatch errors for `call`.
fn as_dispatch_error(call: &InterceptedCall, err: FakeError) -> FakeError {
    match err {
        FakeError::Dispatch { .. } => err,
        other => FakeError::dispatch(call, other.to_string()),
    }
}
