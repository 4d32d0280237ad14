//! The allow-listed channel between the privileged host and the content view.
//!
//! The view only ever sees [`ViewBridge`]: `send` and `receive` keyed by
//! channel name, `invoke` keyed by operation name, and a few read-only
//! platform facts. Names outside the registry for their direction are
//! dropped without an error and without a log line, so probing the surface
//! reveals nothing.
//!
//! ```text
//!   view                              host
//!    |-- send(channel, payload) ------>|  OutboundMessage
//!    |-- invoke(op, payload) --------->|  PendingRequest
//!    |<------------- reply ------------|
//!    |<-- InboundPump <-- emit() ------|  InboundMessage
//! ```

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use mack_core::native::{Platform, ThemeSource};
use mack_core::HostError;

use crate::protocol::{InboundChannel, InboundMessage, Operation, OutboundChannel, OutboundMessage};

type Handler = Arc<dyn Fn(Option<Value>) + Send + Sync>;
type HandlerTable = Arc<Mutex<HashMap<InboundChannel, Vec<Handler>>>>;
type Reply = oneshot::Sender<Result<Option<Value>, HostError>>;

/// Create a connected bridge.
///
/// Returns the view's capability surface, the pump that delivers inbound
/// messages to the view's handlers, and the host's end.
pub fn bridge(
    platform: Platform,
    theme: Arc<dyn ThemeSource>,
) -> (ViewBridge, InboundPump, HostBridge) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let handlers: HandlerTable = Arc::new(Mutex::new(HashMap::new()));

    let view = ViewBridge {
        outbound: outbound_tx,
        requests: request_tx,
        handlers: handlers.clone(),
        platform,
        theme,
    };
    let pump = InboundPump {
        rx: inbound_rx,
        handlers,
    };
    let host = HostBridge {
        outbound: outbound_rx,
        requests: request_rx,
        inbound: InboundSender { tx: inbound_tx },
        outbound_open: true,
        requests_open: true,
    };
    (view, pump, host)
}

// ---------------------------------------------------------------------------
// View side
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ViewBridge {
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    requests: mpsc::UnboundedSender<PendingRequest>,
    handlers: HandlerTable,
    platform: Platform,
    theme: Arc<dyn ThemeSource>,
}

impl ViewBridge {
    /// Queue a message for the host. Returns immediately; unknown channels
    /// and a departed host are both ignored.
    pub fn send(&self, channel: &str, payload: Option<Value>) {
        let Ok(channel) = channel.parse::<OutboundChannel>() else {
            return;
        };
        let _ = self.outbound.send(OutboundMessage { channel, payload });
    }

    /// Register `handler` for an inbound channel. Handlers for the same
    /// channel run in registration order and receive only the payload.
    pub fn receive<F>(&self, channel: &str, handler: F)
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        let Ok(channel) = channel.parse::<InboundChannel>() else {
            return;
        };
        self.handlers
            .lock()
            .entry(channel)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Call a host operation and wait for its result.
    ///
    /// Unknown operation names resolve to `Ok(None)` without reaching the
    /// host, which is indistinguishable from a cancelled dialog.
    pub async fn invoke(
        &self,
        operation: &str,
        payload: Option<Value>,
    ) -> Result<Option<Value>, HostError> {
        let Ok(operation) = operation.parse::<Operation>() else {
            return Ok(None);
        };
        let (reply, response) = oneshot::channel();
        let request = PendingRequest {
            operation,
            payload,
            reply,
        };
        if self.requests.send(request).is_err() {
            return Err(HostError::Unavailable);
        }
        response.await.unwrap_or(Err(HostError::Unavailable))
    }

    /// Node-style platform identifier, e.g. `darwin`.
    pub fn platform(&self) -> &'static str {
        self.platform.as_str()
    }

    pub fn is_mac(&self) -> bool {
        self.platform.is_mac()
    }

    /// Only macOS reports its appearance to the view.
    pub fn is_dark_mode(&self) -> bool {
        self.platform.is_mac() && self.theme.shows_dark_colors()
    }
}

/// Delivers inbound messages to the handlers registered through
/// [`ViewBridge::receive`]. Runs on the view's thread of control.
pub struct InboundPump {
    rx: mpsc::UnboundedReceiver<InboundMessage>,
    handlers: HandlerTable,
}

impl InboundPump {
    /// Deliver messages until every [`InboundSender`] is gone.
    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            self.deliver(message);
        }
        log::debug!("Inbound pump stopped");
    }

    /// Deliver whatever is already queued and return how many messages
    /// that was.
    pub fn drain(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.deliver(message);
            delivered += 1;
        }
        delivered
    }

    fn deliver(&self, message: InboundMessage) {
        // Snapshot so handlers can register more handlers.
        let handlers = self
            .handlers
            .lock()
            .get(&message.channel)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            let payload = message.payload.clone();
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "non-string panic payload".to_string()
                };
                log::error!("Handler for '{}' panicked: {}", message.channel, msg);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Host side
// ---------------------------------------------------------------------------

/// A request/response call waiting for the host's answer.
pub struct PendingRequest {
    pub operation: Operation,
    pub payload: Option<Value>,
    reply: Reply,
}

impl PendingRequest {
    /// Answer the view. A view that stopped waiting is ignored.
    pub fn respond(self, result: Result<Option<Value>, HostError>) {
        let _ = self.reply.send(result);
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("operation", &self.operation)
            .field("payload", &self.payload)
            .finish()
    }
}

#[derive(Debug)]
pub enum HostInput {
    Message(OutboundMessage),
    Request(PendingRequest),
}

pub struct HostBridge {
    outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    requests: mpsc::UnboundedReceiver<PendingRequest>,
    inbound: InboundSender,
    outbound_open: bool,
    requests_open: bool,
}

impl HostBridge {
    /// Emitter for menus, shortcuts and touch-bar items.
    pub fn inbound(&self) -> InboundSender {
        self.inbound.clone()
    }

    /// Next message or request from the view; `None` once the view side
    /// has been dropped and both queues are drained.
    ///
    /// When both queues are ready the pick is random, so a stream of
    /// messages cannot hold back a request.
    pub async fn next(&mut self) -> Option<HostInput> {
        loop {
            tokio::select! {
                msg = self.outbound.recv(), if self.outbound_open => match msg {
                    Some(msg) => return Some(HostInput::Message(msg)),
                    None => self.outbound_open = false,
                },
                req = self.requests.recv(), if self.requests_open => match req {
                    Some(req) => return Some(HostInput::Request(req)),
                    None => self.requests_open = false,
                },
                else => return None,
            }
        }
    }

    /// Non-blocking variant of [`HostBridge::next`]. Messages are taken
    /// before requests.
    pub fn try_next(&mut self) -> Option<HostInput> {
        if let Ok(msg) = self.outbound.try_recv() {
            return Some(HostInput::Message(msg));
        }
        self.requests.try_recv().ok().map(HostInput::Request)
    }
}

/// Cloneable host-side handle for pushing inbound messages to the view.
#[derive(Clone)]
pub struct InboundSender {
    tx: mpsc::UnboundedSender<InboundMessage>,
}

impl InboundSender {
    pub fn emit(&self, channel: InboundChannel, payload: Option<Value>) {
        self.emit_message(InboundMessage { channel, payload });
    }

    pub fn emit_message(&self, message: InboundMessage) {
        if self.tx.send(message).is_err() {
            log::debug!("View is gone; inbound message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedTheme(bool);

    impl ThemeSource for FixedTheme {
        fn shows_dark_colors(&self) -> bool {
            self.0
        }
    }

    fn linux_bridge() -> (ViewBridge, InboundPump, HostBridge) {
        bridge(Platform::Linux, Arc::new(FixedTheme(true)))
    }

    fn collected(host: &mut HostBridge) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        while let Some(input) = host.try_next() {
            if let HostInput::Message(msg) = input {
                out.push(msg);
            }
        }
        out
    }

    #[test]
    fn unlisted_outbound_channels_never_reach_host() {
        let (view, _pump, mut host) = linux_bridge();
        for name in ["navigate", "APP-CLOSE", "app-close ", "", "shell-exec", "file-opened"] {
            view.send(name, Some(json!("x")));
        }
        assert!(host.try_next().is_none());
    }

    #[test]
    fn same_channel_order_is_preserved() {
        let (view, _pump, mut host) = linux_bridge();
        for i in 0..20 {
            view.send("save-file", Some(json!({ "content": i.to_string() })));
            if i % 3 == 0 {
                view.send("toggle-voice", None);
            }
        }
        let contents: Vec<String> = collected(&mut host)
            .into_iter()
            .filter(|m| m.channel == OutboundChannel::SaveFile)
            .map(|m| m.payload.unwrap()["content"].as_str().unwrap().to_string())
            .collect();
        let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn unlisted_inbound_registration_is_never_invoked() {
        let (view, mut pump, host) = linux_bridge();
        let hits = Arc::new(Mutex::new(0));
        for name in ["app-close", "open-file", "Navigate", ""] {
            let hits = hits.clone();
            view.receive(name, move |_| *hits.lock() += 1);
        }
        let inbound = host.inbound();
        for channel in InboundChannel::ALL {
            inbound.emit(*channel, None);
        }
        assert_eq!(pump.drain(), InboundChannel::ALL.len());
        assert_eq!(*hits.lock(), 0);
    }

    #[test]
    fn handlers_run_in_registration_order_with_payload_only() {
        let (view, mut pump, host) = linux_bridge();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = log.clone();
            view.receive("navigate", move |payload| {
                log.lock().push(format!("{}:{}", tag, payload.unwrap()));
            });
        }
        host.inbound().emit(InboundChannel::Navigate, Some(json!("code")));
        host.inbound().emit(InboundChannel::Navigate, Some(json!("speech")));
        pump.drain();
        assert_eq!(
            *log.lock(),
            [
                "first:\"code\"",
                "second:\"code\"",
                "first:\"speech\"",
                "second:\"speech\"",
            ]
        );
    }

    #[test]
    fn panicking_handler_does_not_stop_delivery() {
        let (view, mut pump, host) = linux_bridge();
        let hits = Arc::new(Mutex::new(0));
        view.receive("find", |_| panic!("boom"));
        {
            let hits = hits.clone();
            view.receive("find", move |_| *hits.lock() += 1);
        }
        host.inbound().emit(InboundChannel::Find, None);
        pump.drain();
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn handler_may_register_handlers() {
        let (view, mut pump, host) = linux_bridge();
        let hits = Arc::new(Mutex::new(0));
        {
            let view2 = view.clone();
            let hits = hits.clone();
            view.receive("new-project", move |_| {
                let hits = hits.clone();
                view2.receive("new-project", move |_| *hits.lock() += 1);
            });
        }
        host.inbound().emit(InboundChannel::NewProject, None);
        pump.drain();
        assert_eq!(*hits.lock(), 0);
        host.inbound().emit(InboundChannel::NewProject, None);
        pump.drain();
        assert_eq!(*hits.lock(), 1);
    }

    #[tokio::test]
    async fn invoke_round_trips_through_host() {
        let (view, _pump, mut host) = linux_bridge();
        let server = tokio::spawn(async move {
            while let Some(input) = host.next().await {
                if let HostInput::Request(req) = input {
                    assert_eq!(req.operation, Operation::GetSystemTheme);
                    req.respond(Ok(Some(json!("dark"))));
                }
            }
        });
        let theme = view.invoke("get-system-theme", None).await;
        assert_eq!(theme, Ok(Some(json!("dark"))));
        drop(view);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unknown_operation_resolves_empty_without_host() {
        let (view, _pump, mut host) = linux_bridge();
        assert_eq!(view.invoke("run-shell", Some(json!("rm"))).await, Ok(None));
        assert!(host.try_next().is_none());
    }

    #[tokio::test]
    async fn invoke_after_host_shutdown_is_unavailable() {
        let (view, _pump, host) = linux_bridge();
        drop(host);
        assert_eq!(
            view.invoke("open-file", None).await,
            Err(HostError::Unavailable)
        );
    }

    #[tokio::test]
    async fn dropped_request_is_unavailable() {
        let (view, _pump, mut host) = linux_bridge();
        let server = tokio::spawn(async move {
            if let Some(HostInput::Request(req)) = host.next().await {
                drop(req);
            }
        });
        assert_eq!(
            view.invoke("open-file", None).await,
            Err(HostError::Unavailable)
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn message_backlog_does_not_starve_requests() {
        let (view, _pump, mut host) = linux_bridge();
        for _ in 0..500 {
            view.send("toggle-sidebar", None);
        }
        let pending = {
            let view = view.clone();
            tokio::spawn(async move { view.invoke("get-system-theme", None).await })
        };
        while host.requests.is_empty() {
            tokio::task::yield_now().await;
        }
        for _ in 0..500 {
            view.send("toggle-sidebar", None);
        }

        let mut messages_first = 0;
        loop {
            match host.next().await {
                Some(HostInput::Message(_)) => messages_first += 1,
                Some(HostInput::Request(req)) => {
                    req.respond(Ok(Some(json!("light"))));
                    break;
                }
                None => panic!("bridge closed"),
            }
        }
        assert!(messages_first < 1000, "request waited behind every message");
        assert_eq!(pending.await.unwrap(), Ok(Some(json!("light"))));
    }

    #[tokio::test]
    async fn host_stream_ends_when_view_is_dropped() {
        let (view, _pump, mut host) = linux_bridge();
        view.send("app-ready", None);
        drop(view);
        assert!(matches!(host.next().await, Some(HostInput::Message(_))));
        assert!(host.next().await.is_none());
    }

    #[test]
    fn dark_mode_is_reported_on_mac_only() {
        let (view, _, _) = linux_bridge();
        assert!(!view.is_dark_mode());
        assert_eq!(view.platform(), "linux");

        let (mac, _, _) = bridge(Platform::Macos, Arc::new(FixedTheme(true)));
        assert!(mac.is_mac());
        assert!(mac.is_dark_mode());
    }
}
