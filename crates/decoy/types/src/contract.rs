//! Contract descriptions: the members a fake stands in for
//!
//! The engine never discovers signatures itself. Whoever synthesizes the
//! substitute type describes the contract with these values and the engine
//! validates configuration and calls against them.

use crate::{TypesError, TypesResult, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Type identity of a faked contract
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractType(pub String);

impl ContractType {
    /// Contract type with a fully qualified `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Identity derived from a Rust type, typically a trait object.
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Last path segment, used when rendering calls.
    pub fn short_name(&self) -> &str {
        let name = self.0.trim_start_matches("dyn ");
        let path_end = name.find('<').unwrap_or(name.len());
        match name[..path_end].rfind("::") {
            Some(index) => &name[index + 2..],
            None => name,
        }
    }
}

impl std::fmt::Display for ContractType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared type of a parameter or return value
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// No value
    Unit,
    Bool,
    Integer,
    Float,
    Text,
    Sequence(Box<TypeDescriptor>),
    Map,
    Optional(Box<TypeDescriptor>),
    /// Another faked contract, passed by fake id
    Fake(ContractType),
    /// Anything the engine cannot inspect
    Opaque(String),
}

impl TypeDescriptor {
    pub fn sequence_of(element: TypeDescriptor) -> Self {
        Self::Sequence(Box::new(element))
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Whether the type produces no value.
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    /// Value returned by an unconfigured member of this type.
    ///
    /// `None` means the member produces no value at all.
    pub fn default_value(&self) -> Option<Value> {
        match self {
            Self::Unit => None,
            Self::Bool => Some(Value::Bool(false)),
            Self::Integer => Some(Value::from(0)),
            Self::Float => Some(Value::from(0.0)),
            Self::Text => Some(Value::String(String::new())),
            Self::Sequence(_) => Some(Value::Array(Vec::new())),
            Self::Map => Some(Value::Object(serde_json::Map::new())),
            Self::Optional(_) | Self::Fake(_) | Self::Opaque(_) => Some(Value::Null),
        }
    }

    /// Whether `value` has a shape this type can hold.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Unit => value.is_null(),
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Text => value.is_string(),
            Self::Sequence(element) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| element.accepts(item))),
            Self::Map => value.is_object(),
            Self::Optional(inner) => value.is_null() || inner.accepts(value),
            Self::Fake(_) => value.is_null() || crate::FakeId::from_value(value).is_some(),
            Self::Opaque(_) => true,
        }
    }
}

impl std::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit => write!(f, "()"),
            Self::Bool => write!(f, "bool"),
            Self::Integer => write!(f, "i64"),
            Self::Float => write!(f, "f64"),
            Self::Text => write!(f, "String"),
            Self::Sequence(element) => write!(f, "Vec<{}>", element),
            Self::Map => write!(f, "Map"),
            Self::Optional(inner) => write!(f, "Option<{}>", inner),
            Self::Fake(contract) => write!(f, "{}", contract.short_name()),
            Self::Opaque(name) => write!(f, "{}", name),
        }
    }
}

/// How a parameter passes its value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterDirection {
    In,
    /// Written by the callee only
    Out,
    /// Read and written by the callee
    Ref,
}

impl ParameterDirection {
    /// Out and ref parameters can be assigned by a configured rule.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::In)
    }
}

/// A single declared parameter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    pub ty: TypeDescriptor,
    pub direction: ParameterDirection,
}

impl ParameterInfo {
    /// An input parameter.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            direction: ParameterDirection::In,
        }
    }

    /// An out parameter, written by the callee.
    pub fn out(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            direction: ParameterDirection::Out,
            ..Self::new(name, ty)
        }
    }

    /// A ref parameter, read and written by the callee.
    pub fn by_ref(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            direction: ParameterDirection::Ref,
            ..Self::new(name, ty)
        }
    }
}

/// What kind of member a method stands for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Method,
    PropertyGetter { property: String },
    PropertySetter { property: String },
}

/// Signature of one member of a contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterInfo>,
    pub return_type: TypeDescriptor,
    pub kind: MemberKind,
}

impl MethodInfo {
    /// A method called `name` with no parameters yet.
    pub fn new(name: impl Into<String>, return_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            kind: MemberKind::Method,
        }
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// The getter of `property`, named `get_<property>`.
    pub fn property_getter(property: impl Into<String>, ty: TypeDescriptor) -> Self {
        let property = property.into();
        Self {
            name: format!("get_{}", property),
            parameters: Vec::new(),
            return_type: ty,
            kind: MemberKind::PropertyGetter { property },
        }
    }

    /// The setter of `property`, named `set_<property>`.
    pub fn property_setter(property: impl Into<String>, ty: TypeDescriptor) -> Self {
        let property = property.into();
        Self {
            name: format!("set_{}", property),
            parameters: vec![ParameterInfo::new("value", ty)],
            return_type: TypeDescriptor::Unit,
            kind: MemberKind::PropertySetter { property },
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Number of out and ref parameters.
    pub fn assignable_parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction.is_assignable())
            .count()
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters
            .iter()
            .position(|parameter| parameter.name == name)
    }

    /// Rust-like rendering, e.g. `greet(name: String) -> String`.
    pub fn signature(&self) -> String {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| {
                let marker = match parameter.direction {
                    ParameterDirection::In => "",
                    ParameterDirection::Out => "out ",
                    ParameterDirection::Ref => "ref ",
                };
                format!("{}{}: {}", marker, parameter.name, parameter.ty)
            })
            .collect::<Vec<_>>()
            .join(", ");
        if self.return_type.is_unit() {
            format!("{}({})", self.name, parameters)
        } else {
            format!("{}({}) -> {}", self.name, parameters, self.return_type)
        }
    }
}

/// A contract: its type identity plus the members a fake must answer
#[derive(Clone, Debug)]
pub struct Contract {
    ty: ContractType,
    members: Vec<Arc<MethodInfo>>,
}

impl Contract {
    pub fn new(ty: ContractType) -> Self {
        Self {
            ty,
            members: Vec::new(),
        }
    }

    /// An empty contract for a type called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(ContractType::new(name))
    }

    /// Add a member.
    pub fn with_member(mut self, member: MethodInfo) -> Self {
        self.members.push(Arc::new(member));
        self
    }

    /// Adds a getter and setter pair for a read-write property.
    pub fn with_property(self, property: impl Into<String>, ty: TypeDescriptor) -> Self {
        let property = property.into();
        self.with_member(MethodInfo::property_getter(property.clone(), ty.clone()))
            .with_member(MethodInfo::property_setter(property, ty))
    }

    pub fn contract_type(&self) -> &ContractType {
        &self.ty
    }

    pub fn members(&self) -> &[Arc<MethodInfo>] {
        &self.members
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> TypesResult<Arc<MethodInfo>> {
        self.members
            .iter()
            .find(|member| member.name == name)
            .cloned()
            .ok_or_else(|| TypesError::UnknownMember {
                contract: self.ty.to_string(),
                member: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    trait Greeter {}

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(ContractType::new("app::ports::Greeter").short_name(), "Greeter");
        assert_eq!(ContractType::new("Greeter").short_name(), "Greeter");
        assert_eq!(ContractType::of::<dyn Greeter>().short_name(), "Greeter");
        assert_eq!(
            ContractType::new("app::Repo<app::User>").short_name(),
            "Repo<app::User>"
        );
    }

    #[test]
    fn default_values_follow_declared_types() {
        assert_eq!(TypeDescriptor::Unit.default_value(), None);
        assert_eq!(TypeDescriptor::Text.default_value(), Some(json!("")));
        assert_eq!(TypeDescriptor::Integer.default_value(), Some(json!(0)));
        assert_eq!(TypeDescriptor::Bool.default_value(), Some(json!(false)));
        assert_eq!(
            TypeDescriptor::sequence_of(TypeDescriptor::Integer).default_value(),
            Some(json!([]))
        );
        assert_eq!(
            TypeDescriptor::optional(TypeDescriptor::Text).default_value(),
            Some(Value::Null)
        );
    }

    #[test]
    fn accepts_checks_value_shape() {
        assert!(TypeDescriptor::Integer.accepts(&json!(5)));
        assert!(!TypeDescriptor::Integer.accepts(&json!(5.5)));
        assert!(TypeDescriptor::Float.accepts(&json!(5)));
        assert!(TypeDescriptor::sequence_of(TypeDescriptor::Text).accepts(&json!(["a", "b"])));
        assert!(!TypeDescriptor::sequence_of(TypeDescriptor::Text).accepts(&json!(["a", 1])));
        assert!(TypeDescriptor::optional(TypeDescriptor::Bool).accepts(&Value::Null));
        assert!(TypeDescriptor::Opaque("Socket".into()).accepts(&json!({"fd": 3})));
    }

    #[test]
    fn signature_renders_directions_and_return_type() {
        let method = MethodInfo::new("try_parse", TypeDescriptor::Bool)
            .with_parameter(ParameterInfo::new("input", TypeDescriptor::Text))
            .with_parameter(ParameterInfo::out("result", TypeDescriptor::Integer));
        assert_eq!(
            method.signature(),
            "try_parse(input: String, out result: i64) -> bool"
        );
        assert_eq!(method.assignable_parameter_count(), 1);
    }

    #[test]
    fn unknown_member_is_reported() {
        let contract = Contract::named("Greeter")
            .with_member(MethodInfo::new("greet", TypeDescriptor::Text));
        assert!(contract.member("greet").is_ok());
        assert!(matches!(
            contract.member("wave"),
            Err(TypesError::UnknownMember { .. })
        ));
    }

    #[test]
    fn properties_expand_to_getter_and_setter() {
        let contract = Contract::named("Settings").with_property("level", TypeDescriptor::Integer);
        let getter = contract.member("get_level").unwrap();
        let setter = contract.member("set_level").unwrap();
        assert_eq!(
            getter.kind,
            MemberKind::PropertyGetter {
                property: "level".into()
            }
        );
        assert_eq!(setter.arity(), 1);
        assert!(setter.return_type.is_unit());
    }
}
