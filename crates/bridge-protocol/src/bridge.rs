//! The callable produced for an application.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bridge_core::{
    Application, ApplicationError, BodyDelivery, BridgeConfig, InvocationId, InvocationObserver,
    NoopObserver, Scope,
};

use crate::log::{EventLog, LogSink};
use crate::supply::BodySupplier;

/// Wrap an application into a [`Bridge`].
pub fn wrap<A: Application>(application: A) -> Bridge<A> {
    Bridge::new(application)
}

/// Runs an application once per call and returns what it emitted.
///
/// One call is one application run: the result is either the complete
/// [`EventLog`] or the application's error. Cloning shares the application;
/// every invocation gets its own supplier, sink and log.
pub struct Bridge<A: ?Sized> {
    application: Arc<A>,
    observer: Arc<dyn InvocationObserver>,
    config: BridgeConfig,
}

impl<A: Application> Bridge<A> {
    /// Create a bridge owning `application`.
    pub fn new(application: A) -> Self {
        Self::from_arc(Arc::new(application))
    }
}

impl<A: Application + 'static> Bridge<A> {
    /// Erase the application type.
    pub fn into_dyn(self) -> Bridge<dyn Application> {
        Bridge {
            application: self.application,
            observer: self.observer,
            config: self.config,
        }
    }
}

impl<A: Application + ?Sized> Bridge<A> {
    /// Create a bridge sharing `application`.
    pub fn from_arc(application: Arc<A>) -> Self {
        Self {
            application,
            observer: Arc::new(NoopObserver),
            config: BridgeConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the inbound body delivery mode.
    pub fn with_body_delivery(mut self, delivery: BodyDelivery) -> Self {
        self.config.body_delivery = delivery;
        self
    }

    /// Install an observer. Replaces the previous one.
    pub fn with_observer(self, observer: impl InvocationObserver + 'static) -> Self {
        self.with_shared_observer(Arc::new(observer))
    }

    /// Install a shared observer. Replaces the previous one.
    pub fn with_shared_observer(mut self, observer: Arc<dyn InvocationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Get the wrapped application.
    pub fn application(&self) -> &A {
        &self.application
    }

    /// Run the application for one request.
    ///
    /// The application sees `scope` read-only, receives `body` through the
    /// inbound supplier and appends to a log owned by this call. An error
    /// from the application is returned as-is and the partial log is dropped.
    pub async fn invoke(
        &self,
        scope: &Scope,
        body: Option<&[u8]>,
    ) -> Result<EventLog, ApplicationError> {
        let id = InvocationId::next();
        let started = Instant::now();
        let observer = self.observer.as_ref();

        observer.on_start(id, scope, body);
        let guard = CancelGuard {
            id,
            started,
            observer,
            armed: true,
        };

        let mut receive = BodySupplier::new(id, body, self.config.body_delivery, observer);
        let mut send = LogSink::new(id, observer);

        let result = self.application.call(scope, &mut receive, &mut send).await;
        guard.disarm();

        match result {
            Ok(()) => {
                let log = send.finish();
                observer.on_complete(id, log.len(), started.elapsed());
                Ok(log)
            }
            Err(err) => {
                observer.on_error(id, &err, started.elapsed());
                Err(err)
            }
        }
    }

    /// Run [`invoke`](Self::invoke) to completion on the current thread.
    pub fn invoke_blocking(
        &self,
        scope: &Scope,
        body: Option<&[u8]>,
    ) -> Result<EventLog, ApplicationError> {
        futures::executor::block_on(self.invoke(scope, body))
    }
}

/// Reports `on_cancel` if the invocation future is dropped mid-call.
struct CancelGuard<'a> {
    id: InvocationId,
    started: Instant,
    observer: &'a dyn InvocationObserver,
    armed: bool,
}

impl CancelGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.observer.on_cancel(self.id, self.started.elapsed());
        }
    }
}

impl<A: ?Sized> Clone for Bridge<A> {
    fn clone(&self) -> Self {
        Self {
            application: Arc::clone(&self.application),
            observer: Arc::clone(&self.observer),
            config: self.config.clone(),
        }
    }
}

impl<A: ?Sized> fmt::Debug for Bridge<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use bridge_core::{Emit, Event, Receive};

    /// Emits one body event per entry, in order.
    struct Sequence(Vec<&'static str>);

    #[async_trait]
    impl Application for Sequence {
        async fn call(
            &self,
            _scope: &Scope,
            _receive: &mut dyn Receive,
            send: &mut dyn Emit,
        ) -> Result<(), ApplicationError> {
            for chunk in &self.0 {
                send.send(Event::ResponseBody {
                    body: chunk.as_bytes().to_vec(),
                    more_body: true,
                })
                .await;
            }
            Ok(())
        }
    }

    /// Reads one inbound event and emits its body unchanged.
    struct Echo;

    #[async_trait]
    impl Application for Echo {
        async fn call(
            &self,
            _scope: &Scope,
            receive: &mut dyn Receive,
            send: &mut dyn Emit,
        ) -> Result<(), ApplicationError> {
            let event = receive.receive().await;
            send.send(Event::response_body(event.body().unwrap_or_default()))
                .await;
            Ok(())
        }
    }

    /// Emits the scope path after yielding to the scheduler.
    struct PathEcho;

    #[async_trait]
    impl Application for PathEcho {
        async fn call(
            &self,
            scope: &Scope,
            _receive: &mut dyn Receive,
            send: &mut dyn Emit,
        ) -> Result<(), ApplicationError> {
            let path = scope.path().unwrap_or_default().to_string();
            send.send(Event::response_start(200, vec![])).await;
            tokio::task::yield_now().await;
            send.send(Event::response_body(path)).await;
            Ok(())
        }
    }

    /// Fails, optionally after emitting events.
    struct Failing {
        emit_first: bool,
    }

    #[async_trait]
    impl Application for Failing {
        async fn call(
            &self,
            _scope: &Scope,
            _receive: &mut dyn Receive,
            send: &mut dyn Emit,
        ) -> Result<(), ApplicationError> {
            if self.emit_first {
                send.send(Event::response_start(200, vec![])).await;
            }
            Err(ApplicationError::failed("boom"))
        }
    }

    /// Reads the inbound supplier twice and reports both tags.
    struct ReadTwice;

    #[async_trait]
    impl Application for ReadTwice {
        async fn call(
            &self,
            _scope: &Scope,
            receive: &mut dyn Receive,
            send: &mut dyn Emit,
        ) -> Result<(), ApplicationError> {
            for _ in 0..2 {
                let event = receive.receive().await;
                send.send(Event::response_body(event.kind())).await;
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Trace {
        calls: Mutex<Vec<String>>,
    }

    impl InvocationObserver for Trace {
        fn on_start(&self, _id: InvocationId, scope: &Scope, body: Option<&[u8]>) {
            self.calls.lock().unwrap().push(format!(
                "start {} {}",
                scope.path().unwrap_or("-"),
                body.map_or(0, <[u8]>::len)
            ));
        }

        fn on_receive(&self, _id: InvocationId, event: &Event) {
            self.calls.lock().unwrap().push(format!("receive {}", event.kind()));
        }

        fn on_send(&self, _id: InvocationId, event: &Event) {
            self.calls.lock().unwrap().push(format!("send {}", event.kind()));
        }

        fn on_complete(&self, _id: InvocationId, events: usize, _elapsed: Duration) {
            self.calls.lock().unwrap().push(format!("complete {}", events));
        }

        fn on_error(&self, _id: InvocationId, error: &ApplicationError, _elapsed: Duration) {
            self.calls.lock().unwrap().push(format!("error {}", error));
        }

        fn on_cancel(&self, _id: InvocationId, _elapsed: Duration) {
            self.calls.lock().unwrap().push("cancel".to_string());
        }
    }

    fn bodies(log: &EventLog) -> Vec<String> {
        log.iter()
            .filter_map(Event::body)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    // === Ordering Tests ===

    #[tokio::test]
    async fn test_invoke_preserves_emission_order() {
        let bridge = wrap(Sequence(vec!["e1", "e2", "e3", "e4"]));

        let log = bridge.invoke(&Scope::http("GET", "/"), None).await.unwrap();

        assert_eq!(bodies(&log), vec!["e1", "e2", "e3", "e4"]);
    }

    #[tokio::test]
    async fn test_invoke_with_no_events() {
        let bridge = wrap(Sequence(vec![]));

        let log = bridge.invoke(&Scope::new(), None).await.unwrap();

        assert!(log.is_empty());
    }

    // === Isolation Tests ===

    #[tokio::test]
    async fn test_sequential_invocations_do_not_share_logs() {
        let bridge = wrap(PathEcho);

        let first = bridge.invoke(&Scope::http("GET", "/a"), None).await.unwrap();
        let second = bridge.invoke(&Scope::http("GET", "/b"), None).await.unwrap();

        assert_eq!(bodies(&first), vec!["/a"]);
        assert_eq!(bodies(&second), vec!["/b"]);
    }

    #[tokio::test]
    async fn test_concurrent_invocations_do_not_share_logs() {
        let bridge = wrap(PathEcho);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let bridge = bridge.clone();
                tokio::spawn(async move {
                    let path = format!("/item/{}", i);
                    let log = bridge.invoke(&Scope::http("GET", &path), None).await;
                    (path, log)
                })
            })
            .collect();

        for task in tasks {
            let (path, log) = task.await.unwrap();
            let log = log.unwrap();
            assert_eq!(log.len(), 2);
            assert_eq!(bodies(&log), vec![path]);
        }
    }

    // === Body Tests ===

    #[tokio::test]
    async fn test_body_is_echoed() {
        let bridge = wrap(Echo);

        let log = bridge
            .invoke(&Scope::http("POST", "/"), Some(b"hello".as_slice()))
            .await
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.first().and_then(Event::body), Some(&b"hello"[..]));
    }

    #[tokio::test]
    async fn test_absent_body_echoes_empty() {
        let bridge = wrap(Echo);

        let log = bridge.invoke(&Scope::http("GET", "/"), None).await.unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.first().and_then(Event::body), Some(&b""[..]));
    }

    #[tokio::test]
    async fn test_second_receive_signals_disconnect() {
        let bridge = wrap(ReadTwice);

        let log = bridge.invoke(&Scope::new(), Some(b"x".as_slice())).await.unwrap();

        assert_eq!(bodies(&log), vec!["http.request", "http.disconnect"]);
    }

    #[tokio::test]
    async fn test_repeat_delivery_returns_same_request() {
        let bridge = wrap(ReadTwice).with_body_delivery(BodyDelivery::Repeat);

        let log = bridge.invoke(&Scope::new(), Some(b"x".as_slice())).await.unwrap();

        assert_eq!(bodies(&log), vec!["http.request", "http.request"]);
    }

    // === Error Tests ===

    #[tokio::test]
    async fn test_error_propagates_without_log() {
        let bridge = wrap(Failing { emit_first: false });

        let err = bridge.invoke(&Scope::new(), Some(b"x".as_slice())).await.unwrap_err();

        assert!(matches!(err, ApplicationError::Failed(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn test_error_after_events_discards_partial_log() {
        let bridge = wrap(Failing { emit_first: true });

        let result = bridge.invoke(&Scope::new(), None).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_anyhow_error_propagates_verbatim() {
        struct Broken;

        #[async_trait]
        impl Application for Broken {
            async fn call(
                &self,
                _scope: &Scope,
                _receive: &mut dyn Receive,
                _send: &mut dyn Emit,
            ) -> Result<(), ApplicationError> {
                Err(anyhow::Error::new(std::io::Error::other("disk gone")).into())
            }
        }

        let err = wrap(Broken).invoke(&Scope::new(), None).await.unwrap_err();

        match err {
            ApplicationError::Other(inner) => {
                assert!(inner.downcast_ref::<std::io::Error>().is_some());
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    // === Observer Tests ===

    #[tokio::test]
    async fn test_observer_sees_lifecycle() {
        let trace = Arc::new(Trace::default());
        let bridge = wrap(Echo).with_shared_observer(trace.clone());

        bridge
            .invoke(&Scope::http("POST", "/echo"), Some(b"abc".as_slice()))
            .await
            .unwrap();

        assert_eq!(
            *trace.calls.lock().unwrap(),
            vec![
                "start /echo 3",
                "receive http.request",
                "send http.response.body",
                "complete 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_error() {
        let trace = Arc::new(Trace::default());
        let bridge = wrap(Failing { emit_first: true }).with_shared_observer(trace.clone());

        let _ = bridge.invoke(&Scope::new(), None).await;

        assert_eq!(
            *trace.calls.lock().unwrap(),
            vec![
                "start - 0",
                "send http.response.start",
                "error Application failed: boom",
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_cancel_on_timeout() {
        struct Stalled;

        #[async_trait]
        impl Application for Stalled {
            async fn call(
                &self,
                _scope: &Scope,
                _receive: &mut dyn Receive,
                send: &mut dyn Emit,
            ) -> Result<(), ApplicationError> {
                send.send(Event::response_start(200, vec![])).await;
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let trace = Arc::new(Trace::default());
        let bridge = wrap(Stalled).with_shared_observer(trace.clone());

        let result =
            tokio::time::timeout(Duration::from_millis(5), bridge.invoke(&Scope::new(), None))
                .await;

        assert!(result.is_err());
        assert_eq!(
            *trace.calls.lock().unwrap(),
            vec!["start - 0", "send http.response.start", "cancel"]
        );
    }

    #[tokio::test]
    async fn test_finished_invocation_reports_no_cancel() {
        let trace = Arc::new(Trace::default());
        let bridge = wrap(Failing { emit_first: false }).with_shared_observer(trace.clone());

        let _ = bridge.invoke(&Scope::new(), None).await;

        assert!(!trace.calls.lock().unwrap().iter().any(|c| c == "cancel"));
    }

    // === Construction Tests ===

    #[test]
    fn test_invoke_blocking() {
        let bridge = wrap(Echo);

        let log = bridge
            .invoke_blocking(&Scope::new(), Some(b"sync".as_slice()))
            .unwrap();

        assert_eq!(log.first().and_then(Event::body), Some(&b"sync"[..]));
    }

    #[test]
    fn test_into_dyn_and_from_arc() {
        let shared: Arc<dyn Application> = Arc::new(Echo);
        let from_arc = Bridge::from_arc(shared);
        let erased = wrap(Echo).into_dyn();

        for bridge in [from_arc, erased] {
            let log = bridge.invoke_blocking(&Scope::new(), Some(b"dyn".as_slice())).unwrap();
            assert_eq!(log.len(), 1);
        }
    }

    #[test]
    fn test_config_builders() {
        let bridge = wrap(Echo)
            .with_config(BridgeConfig::new("echo"))
            .with_body_delivery(BodyDelivery::Repeat)
            .with_observer(NoopObserver);

        assert_eq!(bridge.config().name, "echo");
        assert_eq!(bridge.config().body_delivery, BodyDelivery::Repeat);
        assert!(format!("{:?}", bridge).contains("echo"));
    }
}
