use crate::error::TransportError;
use crate::runtime::{Executor, TaskHandle, spawn_task};
use crate::signaling::signaling_output::SignalingOutput;
use crate::signaling::transport::{PubSubTransport, TransportEvent};
use futures::StreamExt;
use futures::channel::mpsc;
use huddle_core::{PeerSignal, SignalingMessage};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal, after [`SignalingChannel::disconnect`].
    Closed,
}

type MessageHandler = Rc<dyn Fn(&str)>;

struct Subscription {
    destination: String,
    handler: MessageHandler,
}

struct ChannelInner {
    state: ChannelState,
    /// Bumped on every successful handshake; stale pumps compare against it.
    generation: u64,
    subscriptions: Vec<Subscription>,
    on_connected: Option<Rc<dyn Fn()>>,
    on_state_change: Option<Rc<dyn Fn(ChannelState)>>,
    pump: Option<TaskHandle>,
    reconnect: Option<TaskHandle>,
    liveness: Option<TaskHandle>,
}

struct ChannelShared {
    transport: Rc<dyn PubSubTransport>,
    executor: Rc<dyn Executor>,
    reconnect_interval: Duration,
    liveness_interval: Duration,
    inner: RefCell<ChannelInner>,
}

/// Typed publish/subscribe channel to the signaling relay with automatic
/// reconnection.
#[derive(Clone)]
pub struct SignalingChannel {
    shared: Rc<ChannelShared>,
}

impl SignalingChannel {
    pub fn new(
        transport: Rc<dyn PubSubTransport>,
        executor: Rc<dyn Executor>,
        reconnect_interval: Duration,
        liveness_interval: Duration,
    ) -> Self {
        Self {
            shared: Rc::new(ChannelShared {
                transport,
                executor,
                reconnect_interval,
                liveness_interval,
                inner: RefCell::new(ChannelInner {
                    state: ChannelState::Disconnected,
                    generation: 0,
                    subscriptions: Vec::new(),
                    on_connected: None,
                    on_state_change: None,
                    pump: None,
                    reconnect: None,
                    liveness: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.shared.inner.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    /// Runs after every successful handshake, including reconnects.
    pub fn set_on_connected(&self, hook: impl Fn() + 'static) {
        self.shared.inner.borrow_mut().on_connected = Some(Rc::new(hook));
    }

    pub fn set_on_state_change(&self, hook: impl Fn(ChannelState) + 'static) {
        self.shared.inner.borrow_mut().on_state_change = Some(Rc::new(hook));
    }

    /// Registers a handler for a destination. Subscriptions survive
    /// reconnects; handlers run in arrival order on the event loop.
    pub fn subscribe(&self, destination: impl Into<String>, handler: impl Fn(&str) + 'static) {
        let destination = destination.into();
        let connected = {
            let mut inner = self.shared.inner.borrow_mut();
            let known = inner
                .subscriptions
                .iter()
                .any(|s| s.destination == destination);
            inner.subscriptions.push(Subscription {
                destination: destination.clone(),
                handler: Rc::new(handler),
            });
            inner.state == ChannelState::Connected && !known
        };
        if connected {
            if let Err(e) = self.shared.transport.subscribe(&destination) {
                warn!("Failed to subscribe to {}: {}", destination, e);
            }
        }
    }

    /// Attempts the handshake once. On failure, background retries with a
    /// fixed backoff continue until [`SignalingChannel::disconnect`].
    pub async fn connect(&self) -> Result<(), TransportError> {
        let result = self.shared.attempt().await;
        if !matches!(result, Err(TransportError::Closed)) {
            self.shared.start_liveness();
        }
        if let Err(e) = &result {
            if *e != TransportError::Closed {
                warn!(
                    "Signaling connect failed: {}. Retrying in {:?}",
                    e, self.shared.reconnect_interval
                );
                self.shared.schedule_reconnect();
            }
        }
        result
    }

    /// Fire-and-forget. Returns `false` when the message was dropped.
    pub fn send(&self, message: &SignalingMessage) -> bool {
        let destination = message.destination();
        if !self.is_connected() {
            warn!("Signaling channel not connected, dropping message to {}", destination);
            return false;
        }
        let body = match message.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize message to {}: {}", destination, e);
                return false;
            }
        };
        match self.shared.transport.send(destination, &body) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send to {}: {}", destination, e);
                false
            }
        }
    }

    /// Closes the channel for good and cancels every background task.
    /// Safe to call more than once.
    pub fn disconnect(&self) {
        let tasks = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.state == ChannelState::Closed {
                return;
            }
            inner.state = ChannelState::Closed;
            [
                inner.pump.take(),
                inner.reconnect.take(),
                inner.liveness.take(),
            ]
        };
        for task in tasks.into_iter().flatten() {
            task.cancel();
        }
        self.shared.transport.disconnect();
        self.shared.notify_state(ChannelState::Closed);
        info!("Signaling channel closed");
    }
}

impl SignalingOutput for SignalingChannel {
    fn send_signal(&self, signal: PeerSignal) {
        self.send(&SignalingMessage::Peer(signal));
    }
}

impl ChannelShared {
    fn state(&self) -> ChannelState {
        self.inner.borrow().state
    }

    fn set_state(&self, state: ChannelState) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == state {
                return;
            }
            inner.state = state;
        }
        self.notify_state(state);
    }

    fn notify_state(&self, state: ChannelState) {
        let hook = self.inner.borrow().on_state_change.clone();
        if let Some(hook) = hook {
            hook(state);
        }
    }

    async fn attempt(self: &Rc<Self>) -> Result<(), TransportError> {
        match self.state() {
            ChannelState::Closed => return Err(TransportError::Closed),
            ChannelState::Connected => return Ok(()),
            ChannelState::Connecting => {
                return Err(TransportError::Protocol(
                    "connection attempt already in progress".into(),
                ));
            }
            ChannelState::Disconnected => {}
        }

        self.set_state(ChannelState::Connecting);
        let (tx, rx) = mpsc::unbounded();
        let result = self.transport.connect(tx).await;

        if self.state() == ChannelState::Closed {
            if result.is_ok() {
                self.transport.disconnect();
            }
            return Err(TransportError::Closed);
        }
        if let Err(e) = result {
            self.set_state(ChannelState::Disconnected);
            return Err(e);
        }

        let mut destinations: Vec<String> = Vec::new();
        for subscription in self.inner.borrow().subscriptions.iter() {
            if !destinations.contains(&subscription.destination) {
                destinations.push(subscription.destination.clone());
            }
        }
        for destination in &destinations {
            if let Err(e) = self.transport.subscribe(destination) {
                warn!("Failed to subscribe to {}: {}", destination, e);
            }
        }

        let generation = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.generation
        };
        self.spawn_pump(generation, rx);
        self.set_state(ChannelState::Connected);
        info!(
            "Signaling channel connected with {} subscriptions",
            destinations.len()
        );

        let hook = self.inner.borrow().on_connected.clone();
        if let Some(hook) = hook {
            hook();
        }
        Ok(())
    }

    fn spawn_pump(
        self: &Rc<Self>,
        generation: u64,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        let weak = Rc::downgrade(self);
        let handle = spawn_task(&*self.executor, async move {
            while let Some(event) = events.next().await {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                match event {
                    TransportEvent::Message { destination, body } => {
                        shared.dispatch(&destination, &body);
                    }
                    TransportEvent::Closed { reason } => {
                        warn!("Signaling transport closed: {}", reason);
                        shared.connection_lost(generation);
                        return;
                    }
                }
            }
            if let Some(shared) = weak.upgrade() {
                shared.connection_lost(generation);
            }
        });
        if let Some(old) = self.inner.borrow_mut().pump.replace(handle) {
            old.cancel();
        }
    }

    fn dispatch(&self, destination: &str, body: &str) {
        let handlers: Vec<MessageHandler> = self
            .inner
            .borrow()
            .subscriptions
            .iter()
            .filter(|s| s.destination == destination)
            .map(|s| s.handler.clone())
            .collect();
        if handlers.is_empty() {
            debug!("No handler for message on {}", destination);
            return;
        }
        for handler in handlers {
            handler(body);
        }
    }

    fn connection_lost(self: &Rc<Self>, generation: u64) {
        {
            let inner = self.inner.borrow();
            if inner.state != ChannelState::Connected || inner.generation != generation {
                return;
            }
        }
        self.set_state(ChannelState::Disconnected);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(self: &Rc<Self>) {
        {
            let inner = self.inner.borrow();
            if inner.state == ChannelState::Closed || inner.reconnect.is_some() {
                return;
            }
        }

        let weak = Rc::downgrade(self);
        let executor = self.executor.clone();
        let interval = self.reconnect_interval;
        let handle = spawn_task(&*self.executor, async move {
            loop {
                executor.sleep(interval).await;
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                match shared.attempt().await {
                    Ok(()) | Err(TransportError::Closed) => break,
                    Err(e) => warn!("Signaling reconnect failed: {}. Retrying in {:?}", e, interval),
                }
            }
            if let Some(shared) = weak.upgrade() {
                shared.inner.borrow_mut().reconnect = None;
            }
        });
        self.inner.borrow_mut().reconnect = Some(handle);
    }

    fn start_liveness(self: &Rc<Self>) {
        if self.inner.borrow().liveness.is_some() {
            return;
        }

        let weak = Rc::downgrade(self);
        let executor = self.executor.clone();
        let interval = self.liveness_interval;
        let handle = spawn_task(&*self.executor, async move {
            loop {
                executor.sleep(interval).await;
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let (state, generation) = {
                    let inner = shared.inner.borrow();
                    (inner.state, inner.generation)
                };
                if state == ChannelState::Connected && !shared.transport.is_connected() {
                    warn!("Signaling transport reported disconnected, forcing reconnect");
                    shared.connection_lost(generation);
                }
            }
        });
        self.inner.borrow_mut().liveness = Some(handle);
    }
}
