//! A minimal exact-path router.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{
    Application, ApplicationError, Emit, ProtocolError, Receive, RouteConfig, Scope,
};
use http::{Method, StatusCode};

use crate::app::{AppConfig, ErrorPolicy};
use crate::error::ConstructionError;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

struct Route {
    path: String,
    methods: Vec<Method>,
    handler: Arc<dyn Handler>,
}

impl Route {
    fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

/// An [`Application`] dispatching HTTP requests to handlers by exact path
/// and method.
///
/// Unknown paths get `404 Not Found`. Known paths with a disallowed method
/// get `405 Method Not Allowed` with an `allow` header. Neither reads the
/// request body.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    config: AppConfig,
}

impl Router {
    /// An empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `path` and `methods`.
    pub fn route<H, I>(mut self, path: &str, methods: I, handler: H) -> Result<Self, ConstructionError>
    where
        H: Handler,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if !path.starts_with('/') {
            return Err(ConstructionError::InvalidPath(path.to_string()));
        }

        self.routes.push(Route {
            path: path.to_string(),
            methods: parse_methods(methods)?,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Register `handler` for a configured route.
    pub fn mount<H: Handler>(self, route: &RouteConfig, handler: H) -> Result<Self, ConstructionError> {
        self.route(&route.pattern, &route.methods, handler)
    }

    /// Replace the application configuration.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    /// The application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Methods accepted for `path`, in registration order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods = Vec::new();
        for route in self.routes.iter().filter(|r| r.path == path) {
            for method in &route.methods {
                if !methods.contains(method) {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    fn find(&self, path: &str, method: &Method) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.path == path && r.allows(method))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<_> = self
            .routes
            .iter()
            .map(|r| (r.path.as_str(), &r.methods))
            .collect();
        f.debug_struct("Router")
            .field("routes", &routes)
            .field("config", &self.config)
            .finish()
    }
}

/// Validate and normalize a method set: upper-cased, deduplicated.
fn parse_methods<I>(methods: I) -> Result<Vec<Method>, ConstructionError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut parsed = Vec::new();
    for name in methods {
        let name = name.as_ref().trim().to_ascii_uppercase();
        let method = Method::from_bytes(name.as_bytes())
            .map_err(|_| ConstructionError::InvalidMethod(name.clone()))?;
        if !parsed.contains(&method) {
            parsed.push(method);
        }
    }

    if parsed.is_empty() {
        return Err(ConstructionError::NoMethods);
    }
    Ok(parsed)
}

#[async_trait]
impl Application for Router {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Emit,
    ) -> Result<(), ApplicationError> {
        let kind = scope.kind().ok_or(ProtocolError::MissingScopeKey("type"))?;
        if kind != "http" {
            return Err(ProtocolError::UnsupportedScope(kind.to_string()).into());
        }
        let method = scope
            .request_method()
            .ok_or(ProtocolError::MissingScopeKey("method"))?;
        let path = scope.path().ok_or(ProtocolError::MissingScopeKey("path"))?;

        let Some(route) = self.find(path, &method) else {
            let allowed = self.allowed_methods(path);
            let response = if allowed.is_empty() {
                Response::status_text(StatusCode::NOT_FOUND)
            } else {
                let allow: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                Response::status_text(StatusCode::METHOD_NOT_ALLOWED)
                    .with_header("allow", allow.join(", "))
            };
            response.send_to(send).await;
            return Ok(());
        };

        let request = Request::read(method, scope, receive).await?;
        match route.handler.handle(request).await {
            Ok(response) => {
                response.send_to(send).await;
                Ok(())
            }
            Err(err) => {
                Response::status_text(StatusCode::INTERNAL_SERVER_ERROR)
                    .send_to(send)
                    .await;
                match self.config.error_policy {
                    ErrorPolicy::Respond => Ok(()),
                    ErrorPolicy::Propagate => Err(anyhow::Error::new(err).into()),
                }
            }
        }
    }
}
