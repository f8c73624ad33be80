//! Identifiers for fakes, rules and scopes

use crate::Value;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one fake instance for its whole lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FakeId(pub Uuid);

impl FakeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The representation used when a fake is passed as an argument.
    pub fn as_value(&self) -> Value {
        Value::String(self.0.to_string())
    }

    /// Recover a fake id from an argument value, if it holds one.
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .as_str()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .map(Self)
    }
}

impl std::fmt::Display for FakeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a rule inside a fake's rule list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub Uuid);

impl RuleId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a scope frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub Uuid);

impl ScopeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
