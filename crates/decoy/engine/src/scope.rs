//! Fake scopes
//!
//! Each thread carries a stack of scope frames rooted in a frame that is
//! never exited. Entering a [`FakeScope`] pushes a frame, optionally holding
//! a [`FakeObjectContainer`] that configures fakes created while the frame
//! is current. Dropping the guard (or calling [`FakeScope::exit`]) pops it.
//!
//! Rules added while a non-root frame is current belong to that frame and
//! are withdrawn from their fakes when it exits.
//!
//! Frames only reference their parent weakly; the thread's stack owns them.

use crate::container::FakeObjectContainer;
use crate::error::{FakeError, Result};
use crate::history::RecordedCall;
use crate::manager::FakeManager;
use decoy_types::{ContractType, ScopeId};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

thread_local! {
    static ROOT: Arc<ScopeFrame> = Arc::new(ScopeFrame::root());
    static STACK: RefCell<Vec<Arc<ScopeFrame>>> = const { RefCell::new(Vec::new()) };
}

/// One frame of the scope stack
pub struct ScopeFrame {
    id: ScopeId,
    parent: Option<Weak<ScopeFrame>>,
    depth: usize,
    container: Option<Arc<dyn FakeObjectContainer>>,
    owners: Mutex<Vec<Weak<FakeManager>>>,
}

impl ScopeFrame {
    fn root() -> Self {
        Self {
            id: ScopeId::generate(),
            parent: None,
            depth: 0,
            container: None,
            owners: Mutex::new(Vec::new()),
        }
    }

    fn child_of(parent: &Arc<ScopeFrame>, container: Option<Arc<dyn FakeObjectContainer>>) -> Self {
        Self {
            id: ScopeId::generate(),
            parent: Some(Arc::downgrade(parent)),
            depth: parent.depth + 1,
            container,
            owners: Mutex::new(Vec::new()),
        }
    }

    /// Unique id, also used to tag recorded calls.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Distance from the root frame.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this is the thread's root frame.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The enclosing frame, while it is still alive.
    pub fn parent(&self) -> Option<Arc<ScopeFrame>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// The nearest container, starting at this frame and walking outwards.
    pub fn resolve_container(&self) -> Option<Arc<dyn FakeObjectContainer>> {
        if let Some(container) = &self.container {
            return Some(container.clone());
        }
        let mut frame = self.parent();
        while let Some(current) = frame {
            if let Some(container) = &current.container {
                return Some(container.clone());
            }
            frame = current.parent();
        }
        None
    }

    /// Let the resolved container configure a newly created fake.
    pub fn configure(&self, contract: &ContractType, manager: &Arc<FakeManager>) -> Result<()> {
        match self.resolve_container() {
            Some(container) => {
                debug!(
                    scope = %self.id,
                    fake = %manager.id(),
                    contract = %contract,
                    "Configuring fake from scope container"
                );
                container.configure_fake(contract, manager)
            }
            None => Ok(()),
        }
    }

    /// Remember that `manager` holds rules owned by this frame.
    pub(crate) fn own_rules_of(&self, manager: Weak<FakeManager>) {
        let mut owners = self.owners.lock();
        if !owners.iter().any(|owner| owner.ptr_eq(&manager)) {
            owners.push(manager);
        }
    }

    fn withdraw_owned_rules(&self) {
        let owners = std::mem::take(&mut *self.owners.lock());
        for manager in owners.iter().filter_map(Weak::upgrade) {
            manager.withdraw_rules(self.id);
        }
    }

    /// Ids of this frame and its ancestors, outermost first, root excluded.
    fn lineage(&self) -> Vec<ScopeId> {
        let mut ids = Vec::with_capacity(self.depth);
        if !self.is_root() {
            ids.push(self.id);
        }
        let mut frame = self.parent();
        while let Some(current) = frame {
            if !current.is_root() {
                ids.push(current.id);
            }
            frame = current.parent();
        }
        ids.reverse();
        ids
    }
}

impl std::fmt::Debug for ScopeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeFrame")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("has_container", &self.container.is_some())
            .finish()
    }
}

/// The frame current on this thread.
pub fn current_frame() -> Arc<ScopeFrame> {
    STACK
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(|| ROOT.with(Arc::clone))
}

/// Id of the frame current on this thread.
pub fn current_scope_id() -> ScopeId {
    current_frame().id()
}

/// Ids of the scopes active on this thread, outermost first.
pub fn active_scope_ids() -> Vec<ScopeId> {
    current_frame().lineage()
}

/// Run `f` with `frame` as the current frame.
///
/// Used to construct fakes on behalf of a frame that is not current, for
/// example on another thread. The frame is popped again when `f` returns or
/// unwinds.
pub fn with_frame<R>(frame: &Arc<ScopeFrame>, f: impl FnOnce() -> R) -> R {
    if Arc::ptr_eq(&current_frame(), frame) {
        return f();
    }
    STACK.with(|stack| stack.borrow_mut().push(frame.clone()));
    let _pushed = PushedFrame(frame.clone());
    f()
}

struct PushedFrame(Arc<ScopeFrame>);

impl Drop for PushedFrame {
    fn drop(&mut self) {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|frame| Arc::ptr_eq(frame, &self.0)) {
                stack.remove(position);
            }
        });
    }
}

/// Guard for an entered scope
///
/// The scope is exited when the guard is dropped, including during a panic.
/// Guards must be exited in the reverse order they were entered; dropping a
/// guard that is not the current scope panics.
#[must_use = "the scope is exited as soon as the guard is dropped"]
pub struct FakeScope {
    frame: Arc<ScopeFrame>,
    exited: bool,
    _not_send: PhantomData<*const ()>,
}

impl FakeScope {
    /// Enter a scope without a container of its own.
    pub fn enter() -> Self {
        Self::push(None)
    }

    /// Enter a scope whose container configures the fakes created in it.
    pub fn with_container(container: Arc<dyn FakeObjectContainer>) -> Self {
        Self::push(Some(container))
    }

    fn push(container: Option<Arc<dyn FakeObjectContainer>>) -> Self {
        let parent = current_frame();
        let frame = Arc::new(ScopeFrame::child_of(&parent, container));
        STACK.with(|stack| stack.borrow_mut().push(frame.clone()));
        debug!(
            scope = %frame.id,
            depth = frame.depth,
            has_container = frame.container.is_some(),
            "Entered fake scope"
        );
        Self {
            frame,
            exited: false,
            _not_send: PhantomData,
        }
    }

    /// Id of the frame this guard entered.
    pub fn id(&self) -> ScopeId {
        self.frame.id
    }

    pub fn frame(&self) -> &Arc<ScopeFrame> {
        &self.frame
    }

    /// Whether this scope is the innermost one on the thread.
    pub fn is_current(&self) -> bool {
        Arc::ptr_eq(&current_frame(), &self.frame)
    }

    /// Calls to `manager` made while this scope was active.
    pub fn calls_to(&self, manager: &FakeManager) -> Vec<RecordedCall> {
        manager.recorded_calls_within(self.frame.id)
    }

    /// Exit the scope.
    ///
    /// Exiting a scope that is not current is an error and leaves both the
    /// stack and this guard untouched, so the scope can still be exited once
    /// the scopes entered after it are gone. Exiting twice is an error too.
    pub fn exit(&mut self) -> Result<()> {
        if self.exited {
            return Err(FakeError::scope_discipline(format!(
                "scope {} was already exited",
                self.frame.id
            )));
        }
        self.pop()?;
        self.exited = true;
        Ok(())
    }

    fn pop(&self) -> Result<()> {
        let popped = STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.last() {
                Some(top) if Arc::ptr_eq(top, &self.frame) => {
                    stack.pop();
                    true
                }
                _ => false,
            }
        });
        if !popped {
            warn!(scope = %self.frame.id, "Scope exited while it was not the current scope");
            return Err(FakeError::scope_discipline(format!(
                "scope {} exited while it was not the current scope",
                self.frame.id
            )));
        }
        self.frame.withdraw_owned_rules();
        debug!(scope = %self.frame.id, depth = self.frame.depth, "Exited fake scope");
        Ok(())
    }
}

impl Drop for FakeScope {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        self.exited = true;
        if let Err(err) = self.pop() {
            if std::thread::panicking() {
                error!(scope = %self.frame.id, error = %err, "Scope dropped out of order while unwinding");
            } else {
                panic!("{}", err);
            }
        }
    }
}

impl std::fmt::Debug for FakeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeScope")
            .field("frame", &self.frame)
            .field("exited", &self.exited)
            .finish()
    }
}
