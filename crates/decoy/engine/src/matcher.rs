//! Argument matching
//!
//! A rule decides whether it covers a call's arguments in one of two ways:
//! a matcher per parameter position ([`ArgumentMatcher`]) or one predicate
//! over the whole collection ([`ArgumentsPredicate`]). A rule uses exactly
//! one of the two.

use decoy_types::{ArgumentCollection, FakeId, ParameterInfo, TypesError, TypesResult, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

type ValueTest = Arc<dyn Fn(&Value) -> TypesResult<bool> + Send + Sync>;
type CollectionTest = Arc<dyn Fn(&ArgumentCollection) -> TypesResult<bool> + Send + Sync>;

/// Constraint on a single argument value
#[derive(Clone)]
pub enum ArgumentMatcher {
    /// Accepts every value
    Any,
    /// Structural equality with the given value
    Exact(Value),
    Predicate {
        description: String,
        test: ValueTest,
    },
}

impl ArgumentMatcher {
    /// Accepts every value.
    pub fn any() -> Self {
        Self::Any
    }

    /// Accepts values equal to `value`.
    pub fn exact(value: Value) -> Self {
        Self::Exact(value)
    }

    /// Equality with any serializable value.
    pub fn eq<T: Serialize>(value: T) -> TypesResult<Self> {
        Ok(Self::Exact(serde_json::to_value(value)?))
    }

    /// Reference equality with another fake.
    pub fn fake(id: FakeId) -> Self {
        Self::Exact(id.as_value())
    }

    /// Accepts values `test` approves of; `description` names it in diagnostics.
    pub fn that<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate {
            description: description.into(),
            test: Arc::new(move |value| Ok(test(value))),
        }
    }

    /// Predicate over the argument converted to `T`.
    ///
    /// A value that cannot be converted fails the dispatch rather than
    /// counting as a non-match.
    pub fn that_typed<T, F>(description: impl Into<String>, test: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::Predicate {
            description: description.into(),
            test: Arc::new(move |value| {
                let typed: T = serde_json::from_value(value.clone())?;
                Ok(test(&typed))
            }),
        }
    }

    /// Whether `value` satisfies the matcher.
    pub fn matches(&self, value: &Value) -> TypesResult<bool> {
        match self {
            Self::Any => Ok(true),
            Self::Exact(expected) => Ok(values_equal(expected, value)),
            Self::Predicate { test, .. } => test(value),
        }
    }

    /// Checks an exact value against the parameter it will be compared with.
    pub fn validate_against(&self, member: &str, parameter: &ParameterInfo) -> TypesResult<()> {
        match self {
            Self::Exact(expected) if !parameter.ty.accepts(expected) => {
                Err(TypesError::TypeMismatch {
                    member: member.to_string(),
                    parameter: parameter.name.clone(),
                    expected: parameter.ty.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for ArgumentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "<Ignored>"),
            Self::Exact(value) => write!(f, "{}", value),
            Self::Predicate { description, .. } => write!(f, "<{}>", description),
        }
    }
}

impl std::fmt::Debug for ArgumentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Self::Predicate { description, .. } => f
                .debug_struct("Predicate")
                .field("description", description)
                .finish_non_exhaustive(),
        }
    }
}

/// Integers and floats compare numerically; everything else structurally.
fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(left), Value::Number(right)) if left.is_f64() || right.is_f64() => {
            left.as_f64() == right.as_f64()
        }
        _ => expected == actual,
    }
}

/// Predicate over a whole argument collection
///
/// Can relate several arguments to each other. Cloning shares the
/// underlying closure.
#[derive(Clone)]
pub struct ArgumentsPredicate {
    description: String,
    test: CollectionTest,
}

impl ArgumentsPredicate {
    /// Predicate that may fail, e.g. when an argument does not decode.
    pub fn new<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&ArgumentCollection) -> TypesResult<bool> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            test: Arc::new(test),
        }
    }

    /// Predicate that cannot fail.
    pub fn from_fn<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&ArgumentCollection) -> bool + Send + Sync + 'static,
    {
        Self::new(description, move |arguments| Ok(test(arguments)))
    }

    /// Accepts every collection.
    pub fn any() -> Self {
        Self::from_fn("any arguments", |_| true)
    }

    /// Run the predicate against `arguments`.
    pub fn evaluate(&self, arguments: &ArgumentCollection) -> TypesResult<bool> {
        (self.test)(arguments)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether both handles share the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.test, &other.test)
    }
}

impl std::fmt::Debug for ArgumentsPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentsPredicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoy_types::{MethodInfo, TypeDescriptor};
    use serde_json::json;

    #[test]
    fn any_accepts_everything() {
        let matcher = ArgumentMatcher::any();
        assert!(matcher.matches(&json!(null)).unwrap());
        assert!(matcher.matches(&json!({"a": 1})).unwrap());
        assert_eq!(matcher.to_string(), "<Ignored>");
    }

    #[test]
    fn exact_uses_structural_equality() {
        let matcher = ArgumentMatcher::eq(vec!["a", "b"]).unwrap();
        assert!(matcher.matches(&json!(["a", "b"])).unwrap());
        assert!(!matcher.matches(&json!(["b", "a"])).unwrap());
    }

    #[test]
    fn exact_compares_numbers_numerically() {
        let matcher = ArgumentMatcher::exact(json!(5));
        assert!(matcher.matches(&json!(5.0)).unwrap());
        assert!(!matcher.matches(&json!(5.5)).unwrap());
    }

    #[test]
    fn fake_matcher_compares_identity() {
        let id = FakeId::generate();
        let matcher = ArgumentMatcher::fake(id);
        assert!(matcher.matches(&id.as_value()).unwrap());
        assert!(!matcher.matches(&FakeId::generate().as_value()).unwrap());
    }

    #[test]
    fn typed_predicate_reports_unconvertible_values() {
        let matcher = ArgumentMatcher::that_typed("a positive amount", |amount: &i64| *amount > 0);
        assert!(matcher.matches(&json!(10)).unwrap());
        assert!(!matcher.matches(&json!(-3)).unwrap());
        assert!(matches!(
            matcher.matches(&json!("ten")),
            Err(TypesError::Conversion { .. })
        ));
        assert_eq!(matcher.to_string(), "<a positive amount>");
    }

    #[test]
    fn exact_value_must_fit_parameter_type() {
        let parameter = ParameterInfo::new("amount", TypeDescriptor::Integer);
        assert!(ArgumentMatcher::exact(json!(3))
            .validate_against("pay", &parameter)
            .is_ok());
        assert!(ArgumentMatcher::exact(json!("three"))
            .validate_against("pay", &parameter)
            .is_err());
        assert!(ArgumentMatcher::that("anything", |_| true)
            .validate_against("pay", &parameter)
            .is_ok());
    }

    #[test]
    fn collection_predicate_can_relate_arguments() {
        let method = MethodInfo::new("range", TypeDescriptor::Unit)
            .with_parameter(ParameterInfo::new("low", TypeDescriptor::Integer))
            .with_parameter(ParameterInfo::new("high", TypeDescriptor::Integer));
        let ordered = ArgumentsPredicate::new("low below high", |args| {
            Ok(args.get_as::<i64>(0)? < args.get_as::<i64>(1)?)
        });

        let good = ArgumentCollection::new(&method, vec![json!(1), json!(2)]).unwrap();
        let bad = ArgumentCollection::new(&method, vec![json!(3), json!(2)]).unwrap();
        assert!(ordered.evaluate(&good).unwrap());
        assert!(!ordered.evaluate(&bad).unwrap());
        assert!(ordered.ptr_eq(&ordered.clone()));
        assert!(!ordered.ptr_eq(&ArgumentsPredicate::any()));
    }
}
