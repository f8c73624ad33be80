//! Ordered, named snapshot of the arguments of one call

use crate::{MethodInfo, ParameterDirection, TypeDescriptor, TypesError, TypesResult, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One supplied argument together with its declared parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Parameter name
    pub name: String,
    pub value: Value,
    /// Declared type of the parameter
    pub ty: TypeDescriptor,
}

/// Arguments of an intercepted call, in parameter order
///
/// Immutable once built; supports positional and by-name lookup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentCollection {
    arguments: Vec<Argument>,
}

impl ArgumentCollection {
    /// Pair `values` with the parameters of `method`.
    ///
    /// The number of values must equal the member's arity and every value
    /// must fit its declared type.
    pub fn new(method: &MethodInfo, values: Vec<Value>) -> TypesResult<Self> {
        if values.len() != method.arity() {
            return Err(TypesError::ArityMismatch {
                member: method.name.clone(),
                expected: method.arity(),
                actual: values.len(),
            });
        }

        let arguments = method
            .parameters
            .iter()
            .zip(values)
            .map(|(parameter, value)| {
                let unassigned_out =
                    parameter.direction == ParameterDirection::Out && value.is_null();
                if !unassigned_out && !parameter.ty.accepts(&value) {
                    return Err(TypesError::TypeMismatch {
                        member: method.name.clone(),
                        parameter: parameter.name.clone(),
                        expected: parameter.ty.to_string(),
                    });
                }
                Ok(Argument {
                    name: parameter.name.clone(),
                    value,
                    ty: parameter.ty.clone(),
                })
            })
            .collect::<TypesResult<Vec<_>>>()?;

        Ok(Self { arguments })
    }

    /// Arguments of a parameterless member.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index).map(|argument| &argument.value)
    }

    /// Value of the parameter called `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    pub fn argument(&self, index: usize) -> Option<&Argument> {
        self.arguments.get(index)
    }

    /// Positional lookup converted to a concrete type.
    pub fn get_as<T: DeserializeOwned>(&self, index: usize) -> TypesResult<T> {
        let value = self.get(index).ok_or(TypesError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// By-name lookup converted to a concrete type.
    pub fn get_by_name_as<T: DeserializeOwned>(&self, name: &str) -> TypesResult<T> {
        let value = self
            .get_by_name(name)
            .ok_or_else(|| TypesError::UnknownParameter {
                name: name.to_string(),
            })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|argument| argument.name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.arguments.iter().map(|argument| &argument.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.arguments.iter()
    }
}

impl<'a> IntoIterator for &'a ArgumentCollection {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.arguments.iter()
    }
}

impl std::fmt::Display for ArgumentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .values()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", rendered)
    }
}
