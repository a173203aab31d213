//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use bridge_adapter::prelude::*;
//! ```

pub use bridge_core::{Application, ApplicationError, Event, Scope};
pub use bridge_protocol::{wrap, Bridge, CollectedResponse, EventLog};
pub use http::{Method, StatusCode};

pub use crate::{
    adapt, sync_handler, AppConfig, ConstructionError, ErrorPolicy, Handler, HandlerError, Json,
    Request, Responder, Response, Router,
};
