//! Handler functions.

use std::future::Future;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::request::Request;
use crate::response::{Responder, Response};

/// A function that turns a [`Request`] into a [`Response`].
///
/// Implemented for every `Fn(Request) -> impl Future<Output = impl Responder>`.
/// Wrap synchronous functions with [`sync_handler`].
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one request.
    async fn handle(&self, request: Request) -> Result<Response, HandlerError>;
}

#[async_trait]
impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send,
    R: Responder + Send,
{
    async fn handle(&self, request: Request) -> Result<Response, HandlerError> {
        (self)(request).await.respond()
    }
}

/// Handler for a synchronous function.
#[derive(Debug, Clone, Copy)]
pub struct SyncHandler<F>(F);

/// Use a synchronous function as a handler.
pub fn sync_handler<F, R>(f: F) -> SyncHandler<F>
where
    F: Fn(Request) -> R + Send + Sync + 'static,
    R: Responder,
{
    SyncHandler(f)
}

#[async_trait]
impl<F, R> Handler for SyncHandler<F>
where
    F: Fn(Request) -> R + Send + Sync + 'static,
    R: Responder,
{
    async fn handle(&self, request: Request) -> Result<Response, HandlerError> {
        (self.0)(request).respond()
    }
}
