//! Single-handler adaptation.

use bridge_protocol::{wrap, Bridge};

use crate::error::ConstructionError;
use crate::handler::Handler;
use crate::router::Router;

/// Serve `handler` at `/` for `methods` and wrap the result for invocation.
///
/// Equivalent to `wrap(Router::new().route("/", methods, handler)?)`.
/// Other paths get `404`, other methods `405`; the handler is only called
/// for requests it accepts.
///
/// # Example
///
/// ```rust,ignore
/// let invoke = adapt(|request: Request| async move { request.body().to_vec() }, ["POST"])?;
/// let log = invoke.invoke_blocking(&Scope::http("POST", "/"), Some(b"ping".as_slice()))?;
/// assert_eq!(log.response()?.body, b"ping");
/// ```
pub fn adapt<H, I>(handler: H, methods: I) -> Result<Bridge<Router>, ConstructionError>
where
    H: Handler,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let router = Router::new().route("/", methods, handler)?;
    Ok(wrap(router))
}
