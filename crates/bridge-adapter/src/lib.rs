//! Adapts plain handler functions into bridged applications.
//!
//! A handler is any async function from [`Request`] to something that
//! implements [`Responder`]. [`adapt`] mounts one at `/` behind a [`Router`]
//! and wraps the router with [`bridge_protocol::wrap`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bridge_adapter::prelude::*;
//!
//! async fn greet(request: Request) -> Json<serde_json::Value> {
//!     let name = request.query("name").unwrap_or("world").to_string();
//!     Json(serde_json::json!({ "greeting": format!("Hello, {name}!") }))
//! }
//!
//! let invoke = adapt(greet, ["GET"])?;
//! let log = invoke.invoke_blocking(&Scope::http("GET", "/").with_query("name=ada"), None)?;
//! assert_eq!(log.response()?.status, 200);
//! ```

pub mod prelude;
mod adapt;
mod app;
mod error;
mod handler;
mod request;
mod response;
mod router;

pub use adapt::*;
pub use app::*;
pub use error::*;
pub use handler::*;
pub use request::*;
pub use response::*;
pub use router::*;
