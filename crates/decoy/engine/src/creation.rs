//! Fake creation against a scope frame
//!
//! The frame a fake is created in is captured in a [`ConstructionContext`]
//! and passed to the construction routine. The routine and everything it
//! calls resolve against that frame, whichever frame is current on the
//! thread it runs on.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::manager::FakeManager;
use crate::scope::{self, ScopeFrame};
use decoy_types::{Contract, DispatchResult, FakeId, Value};
use std::sync::Arc;
use tracing::debug;

/// What a construction routine knows about the fake it builds
#[derive(Clone, Debug)]
pub struct ConstructionContext {
    manager: Arc<FakeManager>,
    frame: Arc<ScopeFrame>,
}

impl ConstructionContext {
    /// Manager of the fake under construction.
    pub fn manager(&self) -> &Arc<FakeManager> {
        &self.manager
    }

    /// Frame the fake is being created in.
    pub fn frame(&self) -> &Arc<ScopeFrame> {
        &self.frame
    }

    pub fn fake_id(&self) -> FakeId {
        self.manager.id()
    }

    /// Call a member of the fake under construction.
    pub fn invoke(&self, member: &str, values: Vec<Value>) -> Result<DispatchResult> {
        scope::with_frame(&self.frame, || self.manager.invoke(member, values))
    }

    /// Create another fake in the same frame.
    pub fn create_nested<T, F>(&self, contract: Contract, construct: F) -> Result<CreatedFake<T>>
    where
        F: FnOnce(&ConstructionContext) -> Result<T>,
    {
        create_fake_in(&self.frame, contract, self.manager.config().clone(), construct)
    }
}

/// A fake manager plus the instance built around it
#[derive(Debug)]
pub struct CreatedFake<T> {
    /// Manager of the new fake
    pub manager: Arc<FakeManager>,
    /// Whatever the construction routine returned
    pub instance: T,
}

/// Create a fake in the current frame.
pub fn create_fake<T, F>(
    contract: Contract,
    config: Arc<EngineConfig>,
    construct: F,
) -> Result<CreatedFake<T>>
where
    F: FnOnce(&ConstructionContext) -> Result<T>,
{
    create_fake_in(&scope::current_frame(), contract, config, construct)
}

/// Create a fake on behalf of `frame`.
///
/// The frame's container configures the fake first; `construct` runs after
/// that, with `frame` current.
pub fn create_fake_in<T, F>(
    frame: &Arc<ScopeFrame>,
    contract: Contract,
    config: Arc<EngineConfig>,
    construct: F,
) -> Result<CreatedFake<T>>
where
    F: FnOnce(&ConstructionContext) -> Result<T>,
{
    let manager = FakeManager::with_config(contract, config);
    scope::with_frame(frame, || {
        frame.configure(manager.contract().contract_type(), &manager)?;
        let context = ConstructionContext {
            manager: manager.clone(),
            frame: frame.clone(),
        };
        let instance = construct(&context)?;
        debug!(fake = %manager.id(), scope = %frame.id(), "Constructed fake");
        Ok(CreatedFake { manager, instance })
    })
}
