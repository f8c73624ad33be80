//! Process-wide index of live fakes

use crate::manager::FakeManager;
use dashmap::DashMap;
use decoy_types::FakeId;
use std::sync::{Arc, OnceLock, Weak};
use tracing::trace;

fn fakes() -> &'static DashMap<FakeId, Weak<FakeManager>> {
    static FAKES: OnceLock<DashMap<FakeId, Weak<FakeManager>>> = OnceLock::new();
    FAKES.get_or_init(DashMap::new)
}

/// Index `manager` under its fake id.
pub(crate) fn register(manager: &Arc<FakeManager>) {
    trace!(fake = %manager.id(), "Registering fake");
    fakes().insert(manager.id(), Arc::downgrade(manager));
}

pub(crate) fn unregister(id: FakeId) {
    fakes().remove(&id);
}

/// Resolve a live fake by id.
pub fn find(id: FakeId) -> Option<Arc<FakeManager>> {
    let manager = fakes().get(&id)?.upgrade();
    if manager.is_none() {
        fakes().remove(&id);
    }
    manager
}

