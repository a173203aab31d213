//! Drives an application through one request and collects its events.
//!
//! This crate provides:
//! - `wrap` / `Bridge` - The callable produced for an application
//! - `EventLog` - Ordered snapshot of everything the application emitted
//! - `CollectedResponse` - Status, headers and body assembled from a log
//!
//! ```rust,ignore
//! let bridge = bridge_protocol::wrap(MyApp);
//! let log = bridge.invoke(&Scope::http("GET", "/"), Some(b"hello")).await?;
//! assert_eq!(log.response()?.status, 200);
//! ```

mod bridge;
mod log;
mod response;
mod supply;

pub use bridge::*;
pub use log::EventLog;
pub use response::*;
