//! Call specifications: which calls a rule covers
//!
//! A specification combines a member filter with an argument condition.
//! Per-position matchers and a whole-collection predicate are mutually
//! exclusive; installing one replaces the other.

use crate::error::{FakeError, Result};
use crate::matcher::{ArgumentMatcher, ArgumentsPredicate};
use decoy_types::{
    ArgumentCollection, ContractType, InterceptedCall, MethodInfo, TypeDescriptor, TypesResult,
};
use std::sync::Arc;

/// Which members a specification covers
#[derive(Clone, Debug)]
pub enum MemberFilter {
    AnyMember,
    Member(Arc<MethodInfo>),
    /// Any member declared to return this type
    ReturnType(TypeDescriptor),
}

/// How a specification judges a call's arguments
#[derive(Clone, Debug)]
pub enum ArgumentCondition {
    Any,
    PerPosition(Vec<ArgumentMatcher>),
    Predicate(ArgumentsPredicate),
}

/// Member filter plus argument condition
#[derive(Clone, Debug)]
pub struct CallSpecification {
    contract: Option<ContractType>,
    member: MemberFilter,
    arguments: ArgumentCondition,
}

impl CallSpecification {
    /// Every call to the fake.
    pub fn any_call() -> Self {
        Self {
            contract: None,
            member: MemberFilter::AnyMember,
            arguments: ArgumentCondition::Any,
        }
    }

    /// Calls to one member, with any arguments.
    pub fn for_member(contract: &ContractType, method: Arc<MethodInfo>) -> Self {
        Self {
            contract: Some(contract.clone()),
            member: MemberFilter::Member(method),
            arguments: ArgumentCondition::Any,
        }
    }

    /// Calls to any member returning `ty`.
    pub fn with_return_type(ty: TypeDescriptor) -> Self {
        Self {
            contract: None,
            member: MemberFilter::ReturnType(ty),
            arguments: ArgumentCondition::Any,
        }
    }

    pub fn member_filter(&self) -> &MemberFilter {
        &self.member
    }

    pub fn argument_condition(&self) -> &ArgumentCondition {
        &self.arguments
    }

    /// The member signature, when the filter names one member.
    pub fn method(&self) -> Option<&Arc<MethodInfo>> {
        match &self.member {
            MemberFilter::Member(method) => Some(method),
            _ => None,
        }
    }

    /// Declared return type of every call this specification can cover.
    pub fn return_type(&self) -> Option<&TypeDescriptor> {
        match &self.member {
            MemberFilter::AnyMember => None,
            MemberFilter::Member(method) => Some(&method.return_type),
            MemberFilter::ReturnType(ty) => Some(ty),
        }
    }

    /// Install per-position matchers.
    ///
    /// The matcher list must line up with the member signature; a mismatch is
    /// a configuration error.
    pub fn set_argument_matchers(&mut self, matchers: Vec<ArgumentMatcher>) -> Result<()> {
        let method = self.method().ok_or_else(|| {
            FakeError::configuration("argument matchers need a specific member to match against")
        })?;

        if matchers.len() != method.arity() {
            return Err(FakeError::configuration(format!(
                "{} takes {} argument(s) but {} matcher(s) were given",
                method.signature(),
                method.arity(),
                matchers.len()
            )));
        }

        for (matcher, parameter) in matchers.iter().zip(&method.parameters) {
            matcher
                .validate_against(&method.name, parameter)
                .map_err(|err| FakeError::configuration(err.to_string()))?;
        }

        self.arguments = ArgumentCondition::PerPosition(matchers);
        Ok(())
    }

    /// Install a whole-collection predicate, replacing any matchers.
    pub fn use_arguments_predicate(&mut self, predicate: ArgumentsPredicate) {
        self.arguments = ArgumentCondition::Predicate(predicate);
    }

    /// Whether the call targets a member this specification covers.
    pub fn matches_member(&self, call: &InterceptedCall) -> bool {
        match &self.member {
            MemberFilter::AnyMember => true,
            MemberFilter::Member(method) => {
                method.name == call.member_name() && method.arity() == call.method().arity()
            }
            MemberFilter::ReturnType(ty) => call.return_type() == ty,
        }
    }

    /// Whether the call's arguments satisfy the argument condition.
    pub fn arguments_match(&self, call: &InterceptedCall) -> Result<bool> {
        let arguments = call.arguments();
        let outcome = match &self.arguments {
            ArgumentCondition::Any => Ok(true),
            ArgumentCondition::PerPosition(matchers) => all_match(matchers, arguments),
            ArgumentCondition::Predicate(predicate) => predicate.evaluate(arguments),
        };
        outcome.map_err(|err| FakeError::dispatch(call, err.to_string()))
    }

    /// Member filter and argument condition together.
    pub fn is_satisfied_by(&self, call: &InterceptedCall) -> Result<bool> {
        if !self.matches_member(call) {
            return Ok(false);
        }
        self.arguments_match(call)
    }

    /// Human-readable form of a call this specification accepts.
    pub fn describe(&self) -> String {
        match &self.member {
            MemberFilter::AnyMember => self.describe_unnamed("Any call"),
            MemberFilter::ReturnType(ty) => {
                self.describe_unnamed(&format!("Any call with return type {}", ty))
            }
            MemberFilter::Member(method) => {
                let arguments = match &self.arguments {
                    ArgumentCondition::Any => vec!["<Ignored>".to_string(); method.arity()].join(", "),
                    ArgumentCondition::PerPosition(matchers) => matchers
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                    ArgumentCondition::Predicate(predicate) => {
                        format!("<{}>", predicate.description())
                    }
                };
                match &self.contract {
                    Some(contract) => {
                        format!("{}.{}({})", contract.short_name(), method.name, arguments)
                    }
                    None => format!("{}({})", method.name, arguments),
                }
            }
        }
    }

    fn describe_unnamed(&self, head: &str) -> String {
        match &self.arguments {
            ArgumentCondition::Predicate(predicate) => {
                format!("{} with arguments matching <{}>", head, predicate.description())
            }
            _ => head.to_string(),
        }
    }
}

fn all_match(matchers: &[ArgumentMatcher], arguments: &ArgumentCollection) -> TypesResult<bool> {
    for (matcher, value) in matchers.iter().zip(arguments.values()) {
        if !matcher.matches(value)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoy_types::{FakeId, ParameterInfo};
    use serde_json::json;

    fn contract() -> ContractType {
        ContractType::new("shop::Inventory")
    }

    fn reserve() -> Arc<MethodInfo> {
        Arc::new(
            MethodInfo::new("reserve", TypeDescriptor::Bool)
                .with_parameter(ParameterInfo::new("sku", TypeDescriptor::Text))
                .with_parameter(ParameterInfo::new("quantity", TypeDescriptor::Integer)),
        )
    }

    fn call(method: Arc<MethodInfo>, values: Vec<serde_json::Value>) -> InterceptedCall {
        InterceptedCall::new(FakeId::generate(), contract(), method, values).unwrap()
    }

    #[test]
    fn member_with_any_arguments() {
        let spec = CallSpecification::for_member(&contract(), reserve());
        assert!(spec
            .is_satisfied_by(&call(reserve(), vec![json!("a"), json!(1)]))
            .unwrap());
        assert_eq!(spec.describe(), "Inventory.reserve(<Ignored>, <Ignored>)");
    }

    #[test]
    fn per_position_matchers_must_all_accept() {
        let mut spec = CallSpecification::for_member(&contract(), reserve());
        spec.set_argument_matchers(vec![
            ArgumentMatcher::exact(json!("sku-1")),
            ArgumentMatcher::that_typed("more than two", |q: &i64| *q > 2),
        ])
        .unwrap();

        assert!(spec
            .is_satisfied_by(&call(reserve(), vec![json!("sku-1"), json!(3)]))
            .unwrap());
        assert!(!spec
            .is_satisfied_by(&call(reserve(), vec![json!("sku-1"), json!(1)]))
            .unwrap());
        assert!(!spec
            .is_satisfied_by(&call(reserve(), vec![json!("sku-2"), json!(3)]))
            .unwrap());
        assert_eq!(spec.describe(), "Inventory.reserve(\"sku-1\", <more than two>)");
    }

    #[test]
    fn matcher_arity_mismatch_is_a_configuration_error() {
        let mut spec = CallSpecification::for_member(&contract(), reserve());
        let err = spec
            .set_argument_matchers(vec![ArgumentMatcher::any()])
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn mistyped_exact_matcher_is_a_configuration_error() {
        let mut spec = CallSpecification::for_member(&contract(), reserve());
        let err = spec
            .set_argument_matchers(vec![
                ArgumentMatcher::exact(json!("sku-1")),
                ArgumentMatcher::exact(json!("three")),
            ])
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn matchers_need_a_member() {
        let mut spec = CallSpecification::any_call();
        assert!(spec
            .set_argument_matchers(vec![ArgumentMatcher::any()])
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn predicate_replaces_per_position_matchers() {
        let mut spec = CallSpecification::for_member(&contract(), reserve());
        spec.set_argument_matchers(vec![
            ArgumentMatcher::exact(json!("never")),
            ArgumentMatcher::any(),
        ])
        .unwrap();
        spec.use_arguments_predicate(ArgumentsPredicate::from_fn("any sku", |_| true));

        assert!(spec
            .is_satisfied_by(&call(reserve(), vec![json!("sku-1"), json!(3)]))
            .unwrap());
        assert_eq!(spec.describe(), "Inventory.reserve(<any sku>)");
    }

    #[test]
    fn failing_predicate_becomes_a_dispatch_error() {
        let mut spec = CallSpecification::for_member(&contract(), reserve());
        spec.use_arguments_predicate(ArgumentsPredicate::new("quantity as text", |args| {
            args.get_as::<String>(1).map(|_| true)
        }));

        let err = spec
            .is_satisfied_by(&call(reserve(), vec![json!("sku-1"), json!(3)]))
            .unwrap_err();
        assert!(err.is_dispatch());
    }

    #[test]
    fn return_type_filter_ignores_member_names() {
        let spec = CallSpecification::with_return_type(TypeDescriptor::Bool);
        let label = Arc::new(MethodInfo::new("label", TypeDescriptor::Text));
        assert!(spec
            .is_satisfied_by(&call(reserve(), vec![json!("a"), json!(1)]))
            .unwrap());
        assert!(!spec.is_satisfied_by(&call(label, vec![])).unwrap());
        assert_eq!(spec.describe(), "Any call with return type bool");
    }
}
