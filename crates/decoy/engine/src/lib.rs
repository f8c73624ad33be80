//! # Decoy Engine
//!
//! Call interception and rule dispatch for fake objects.
//!
//! ## Overview
//!
//! Every fake instance is backed by a [`FakeManager`]. A proxy hands the
//! manager an [`InterceptedCall`](decoy_types::InterceptedCall) per member
//! invocation; the manager records it, picks the most recently added rule
//! that covers it, and returns that rule's [`DispatchResult`](decoy_types::DispatchResult).
//!
//! ## Key Components
//!
//! - [`CallRule`]: a behaviour plus the test deciding which calls it covers
//! - [`CallSpecification`]: member filter plus argument condition
//! - [`ArgumentMatcher`] / [`ArgumentsPredicate`]: the argument sublanguage
//! - [`CallHistory`]: append-only, thread-safe call log
//! - [`RepeatConstraint`] / [`AssertionEngine`]: "happened N times" checks
//! - [`FakeScope`]: per-thread stack of scopes with optional containers
//! - [`create_fake`]: creation that lets the current scope configure a fake
//!   before its construction routine runs
//!
//! ## Example
//!
//! ```rust
//! use decoy_engine::{FakeManager, RepeatConstraint, RecordedCallRule};
//! use decoy_types::{Contract, MethodInfo, TypeDescriptor};
//!
//! let contract = Contract::named("Clock")
//!     .with_member(MethodInfo::new("now", TypeDescriptor::Integer));
//! let clock = FakeManager::new(contract);
//!
//! let now = clock.invoke("now", vec![]).unwrap();
//! assert_eq!(now.value(), Some(&serde_json::json!(0)));
//!
//! let any_call = RecordedCallRule::new();
//! assert!(clock.assert_happened(&any_call, &RepeatConstraint::once()).is_ok());
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

pub mod assertion;
pub mod config;
pub mod container;
pub mod creation;
pub mod error;
pub mod history;
pub mod manager;
pub mod matcher;
pub mod registry;
pub mod repeat;
pub mod rule;
pub mod scope;
pub mod specification;

pub use assertion::{AssertionEngine, AssertionFailure};
pub use config::{DiagnosticsConfig, DispatchConfig, EngineConfig};
pub use container::FakeObjectContainer;
pub use creation::{create_fake, create_fake_in, ConstructionContext, CreatedFake};
pub use error::{FakeError, Result};
pub use history::{CallHistory, RecordedCall};
pub use manager::{FakeManager, RuleEntry};
pub use matcher::{ArgumentMatcher, ArgumentsPredicate};
pub use repeat::RepeatConstraint;
pub use rule::{
    Applicator, BuildableCallRule, CallAction, CallRule, CallbackRule, FallbackRule,
    OutAndRefValues, PropertyBehaviorRule, RecordedCallRule, RuleBehavior, RuleKind,
    UserConfiguredRule,
};
pub use scope::{active_scope_ids, current_frame, current_scope_id, with_frame, FakeScope, ScopeFrame};
pub use specification::{ArgumentCondition, CallSpecification, MemberFilter};
