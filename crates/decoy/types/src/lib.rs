//! Decoy Types - values exchanged with the interception engine
//!
//! A proxy hands the engine an [`InterceptedCall`] for every member invocation
//! it receives and gets a [`DispatchResult`] back. This crate defines those
//! values and the contract descriptions they refer to.
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime state. Argument and return
//! values are carried as [`Value`] (`serde_json::Value`); a fake passed as an
//! argument is carried as its [`FakeId`]. IDs use the newtype pattern and
//! implement `Display` and `generate()`.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod arguments;
mod call;
mod contract;
mod errors;
mod ids;

pub use arguments::*;
pub use call::*;
pub use contract::*;
pub use errors::*;
pub use ids::*;

/// Dynamic argument and return value.
pub use serde_json::Value;
