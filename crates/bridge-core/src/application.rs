//! The application capability and its two callbacks.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApplicationError;
use crate::event::Event;
use crate::scope::Scope;

/// Supplies inbound events to a running application.
#[async_trait]
pub trait Receive: Send {
    /// Wait for the next inbound event.
    async fn receive(&mut self) -> Event;
}

/// Accepts outbound events from a running application.
#[async_trait]
pub trait Emit: Send {
    /// Hand one event to the caller.
    async fn send(&mut self, event: Event);
}

/// Anything that can run one request to completion.
///
/// Implementations must be safe to drive from several invocations at once;
/// all per-request state belongs in the `receive`/`send` callbacks.
///
/// # Example
///
/// ```rust,ignore
/// struct Hello;
///
/// #[async_trait]
/// impl Application for Hello {
///     async fn call(
///         &self,
///         _scope: &Scope,
///         _receive: &mut dyn Receive,
///         send: &mut dyn Emit,
///     ) -> Result<(), ApplicationError> {
///         send.send(Event::response_start(200, vec![])).await;
///         send.send(Event::response_body("hello")).await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Application: Send + Sync {
    /// Run the application for one request.
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Emit,
    ) -> Result<(), ApplicationError>;
}

#[async_trait]
impl<A: Application + ?Sized> Application for Arc<A> {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Emit,
    ) -> Result<(), ApplicationError> {
        (**self).call(scope, receive, send).await
    }
}

#[async_trait]
impl<A: Application + ?Sized> Application for Box<A> {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Emit,
    ) -> Result<(), ApplicationError> {
        (**self).call(scope, receive, send).await
    }
}
