//! Fake object containers: the policy a scope applies to new fakes

use crate::error::Result;
use crate::manager::FakeManager;
use decoy_types::ContractType;
use std::sync::Arc;

/// Configures fakes created while its scope is current
///
/// Configuration happens before the fake's construction routine runs, so
/// calls the fake makes on itself during construction already see it.
pub trait FakeObjectContainer: Send + Sync {
    fn configure_fake(&self, contract: &ContractType, manager: &Arc<FakeManager>) -> Result<()>;
}

impl<F> FakeObjectContainer for F
where
    F: Fn(&ContractType, &Arc<FakeManager>) -> Result<()> + Send + Sync,
{
    fn configure_fake(&self, contract: &ContractType, manager: &Arc<FakeManager>) -> Result<()> {
        self(contract, manager)
    }
}
