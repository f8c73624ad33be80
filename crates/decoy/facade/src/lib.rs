//! # Decoy
//!
//! Fake objects for tests: configure what their members do, let a proxy
//! dispatch calls to them, and assert on the calls they received.
//!
//! ## Key Components
//!
//! - [`Fake`]: handle to one fake instance
//! - [`RuleBuilder`]: configures a rule and asserts on the calls it describes
//! - [`RecordingRuleBuilder`]: records expectations checked later with
//!   [`Fake::verify_recorded_assertions`]
//! - [`FakeScope`]: limits configuration to a dynamic extent
//!
//! ## Example
//!
//! ```rust
//! use decoy::{ArgumentMatcher, Contract, Fake, MethodInfo, ParameterInfo, TypeDescriptor};
//! use serde_json::json;
//!
//! # fn main() -> decoy::Result<()> {
//! let greeter = Fake::new(
//!     Contract::named("Greeter").with_member(
//!         MethodInfo::new("greet", TypeDescriptor::Text)
//!             .with_parameter(ParameterInfo::new("name", TypeDescriptor::Text)),
//!     ),
//! )?;
//!
//! greeter
//!     .call_to("greet")?
//!     .with_args(vec![ArgumentMatcher::exact(json!("ada"))])?
//!     .returns("hello ada")?;
//!
//! let greeting: String = greeter.invoke_as("greet", vec![json!("ada")])?;
//! assert_eq!(greeting, "hello ada");
//! greeter.call_to("greet")?.must_have_happened()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod builder;
mod fake;
mod recording;

pub use builder::{ConfiguredRule, RuleBuilder};
pub use fake::Fake;
pub use recording::RecordingRuleBuilder;

pub use decoy_engine::{
    active_scope_ids, current_frame, current_scope_id, ArgumentMatcher, ArgumentsPredicate,
    AssertionFailure, CallRule, CallbackRule, ConstructionContext, DiagnosticsConfig,
    DispatchConfig, EngineConfig, FakeError, FakeManager, FakeObjectContainer, FakeScope,
    RecordedCall, RepeatConstraint, Result,
};
pub use decoy_types::{
    ArgumentCollection, CallOutcome, Contract, ContractType, DispatchResult, Fault, FakeId,
    InterceptedCall, MemberKind, MethodInfo, ParameterInfo, TypeDescriptor, Value,
};
