//! Core abstractions for the single-shot application bridge.
//!
//! This crate provides the fundamental types and traits:
//! - `Scope` - Immutable request metadata
//! - `Event` - Tagged protocol messages flowing in and out of an application
//! - `Application` trait - The three-argument entry point (scope, receive, send)
//! - `InvocationObserver` - Lifecycle hook called by the bridge
//! - `BridgeConfig` / `RouteConfig` - Explicit configuration

mod application;
mod config;
mod error;
mod event;
mod lifecycle;
mod scope;

pub use application::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use lifecycle::*;
pub use scope::*;
