//! Demo applications served by `invoke` and `replay`.

use anyhow::Result;
use async_trait::async_trait;
use bridge_adapter::{Json, Request, Router};
use bridge_core::{Application, ApplicationError, Emit, Event, ProtocolError, Receive, Scope};
use bridge_protocol::{wrap, Bridge};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{CliConfig, DemoApp};

/// Build the bridge for `demo` from the configuration.
pub fn build(demo: DemoApp, config: &CliConfig) -> Result<Bridge<dyn Application>> {
    let bridge = match demo {
        DemoApp::Echo => wrap(Echo).into_dyn(),
        DemoApp::Greet => {
            let router = Router::new()
                .with_config(config.app.app_config())
                .mount(&config.app.route, greet)?;
            wrap(router).into_dyn()
        }
    };
    Ok(bridge.with_config(config.bridge.clone()))
}

/// Echoes the request body with the request's content type.
pub struct Echo;

#[async_trait]
impl Application for Echo {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Emit,
    ) -> Result<(), ApplicationError> {
        match scope.kind() {
            Some("http") => {}
            Some(other) => return Err(ProtocolError::UnsupportedScope(other.to_string()).into()),
            None => return Err(ProtocolError::MissingScopeKey("type").into()),
        }

        let mut body = Vec::new();
        loop {
            match receive.receive().await {
                Event::Request {
                    body: chunk,
                    more_body,
                } => {
                    body.extend_from_slice(&chunk);
                    if !more_body {
                        break;
                    }
                }
                Event::Disconnect => break,
                other => return Err(ProtocolError::UnexpectedEvent(other.kind().to_string()).into()),
            }
        }

        let content_type = scope
            .header("content-type")
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let headers = vec![
            (b"content-type".to_vec(), content_type.into_bytes()),
            (b"content-length".to_vec(), body.len().to_string().into_bytes()),
        ];

        send.send(Event::response_start(200, headers)).await;
        send.send(Event::response_body(body)).await;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GreetBody {
    name: String,
}

/// Greets `?name=`, a JSON body's `name`, or the world.
async fn greet(request: Request) -> Result<Json<Value>, String> {
    let name = if let Some(name) = request.query("name") {
        name.to_string()
    } else if request.body().is_empty() {
        "world".to_string()
    } else {
        request
            .json::<GreetBody>()
            .map_err(|e| format!("Invalid greet body: {}", e))?
            .name
    };

    Ok(Json(json!({
        "greeting": format!("Hello, {}!", name),
        "method": request.method().as_str(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_adapter::ErrorPolicy;
    use bridge_core::BodyDelivery;

    #[tokio::test]
    async fn test_echo_app() {
        let bridge = build(DemoApp::Echo, &CliConfig::default()).unwrap();
        let scope = Scope::http("POST", "/").with_header("Content-Type", "text/plain");

        let log = bridge.invoke(&scope, Some(b"hello".as_slice())).await.unwrap();

        let response = log.response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.body, b"hello");
    }

    #[tokio::test]
    async fn test_echo_repeat_delivery() {
        let mut config = CliConfig::default();
        config.bridge.body_delivery = BodyDelivery::Repeat;
        let bridge = build(DemoApp::Echo, &config).unwrap();

        let log = bridge
            .invoke(&Scope::http("POST", "/"), Some(b"once".as_slice()))
            .await
            .unwrap();

        assert_eq!(log.response().unwrap().body, b"once");
    }

    #[tokio::test]
    async fn test_greet_query_and_body() {
        let mut config = CliConfig::default();
        config.app.route.methods = vec!["GET".to_string(), "POST".to_string()];
        let bridge = build(DemoApp::Greet, &config).unwrap();

        let by_query = bridge
            .invoke(&Scope::http("GET", "/").with_query("name=ada"), None)
            .await
            .unwrap();
        let by_body = bridge
            .invoke(&Scope::http("POST", "/"), Some(br#"{"name": "grace"}"#.as_slice()))
            .await
            .unwrap();

        let query: Value = by_query.response().unwrap().json().unwrap();
        let body: Value = by_body.response().unwrap().json().unwrap();
        assert_eq!(query["greeting"], "Hello, ada!");
        assert_eq!(body["greeting"], "Hello, grace!");
        assert_eq!(body["method"], "POST");
    }

    #[tokio::test]
    async fn test_greet_bad_body_follows_error_policy() {
        let mut config = CliConfig::default();
        config.app.route.methods = vec!["POST".to_string()];
        let respond = build(DemoApp::Greet, &config).unwrap();
        config.app.error_policy = ErrorPolicy::Propagate;
        let propagate = build(DemoApp::Greet, &config).unwrap();
        let scope = Scope::http("POST", "/");

        let log = respond.invoke(&scope, Some(b"not json".as_slice())).await.unwrap();
        assert_eq!(log.response().unwrap().status, 500);

        assert!(propagate
            .invoke(&scope, Some(b"not json".as_slice()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_greet_rejects_unrouted_method() {
        let bridge = build(DemoApp::Greet, &CliConfig::default()).unwrap();

        let log = bridge.invoke(&Scope::http("DELETE", "/"), None).await.unwrap();

        assert_eq!(log.response().unwrap().status, 405);
    }
}
