use async_trait::async_trait;
use huddle_client::TransportError;
use huddle_client::signaling::{PubSubTransport, TransportEvent, TransportEventSender};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct TransportState {
    connected: bool,
    /// Upcoming connect attempts that fail.
    failures_left: usize,
    connect_attempts: usize,
    disconnects: usize,
    subscriptions: Vec<String>,
    sent: Vec<(String, String)>,
    events: Option<TransportEventSender>,
}

/// In-memory relay connection. Records subscriptions and published
/// frames; the test injects inbound frames with [`FakeTransport::deliver`].
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Rc<RefCell<TransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A relay that refuses the next `failures` connect attempts.
    pub fn failing(failures: usize) -> Self {
        let transport = Self::default();
        transport.state.borrow_mut().failures_left = failures;
        transport
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.borrow().connect_attempts
    }

    pub fn disconnects(&self) -> usize {
        self.state.borrow().disconnects
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state.borrow().subscriptions.clone()
    }

    pub fn subscription_count(&self, destination: &str) -> usize {
        self.state
            .borrow()
            .subscriptions
            .iter()
            .filter(|d| *d == destination)
            .count()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.borrow().sent.clone()
    }

    /// Parsed bodies published to `destination`, oldest first.
    pub fn sent_to(&self, destination: &str) -> Vec<Value> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter(|(d, _)| d == destination)
            .map(|(_, body)| serde_json::from_str(body).expect("published body is JSON"))
            .collect()
    }

    pub fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }

    pub fn deliver(&self, destination: &str, body: &str) {
        let events = self.state.borrow().events.clone();
        let events = events.expect("transport is not connected");
        events
            .unbounded_send(TransportEvent::Message {
                destination: destination.to_string(),
                body: body.to_string(),
            })
            .expect("channel pump is gone");
    }

    pub fn deliver_json(&self, destination: &str, body: &Value) {
        self.deliver(destination, &body.to_string());
    }

    /// The socket dies without telling anyone; only the liveness check
    /// notices. The event stream stays open.
    pub fn drop_silently(&self) {
        self.state.borrow_mut().connected = false;
    }

    /// The relay closes the connection with a close frame.
    pub fn close_remote(&self, reason: &str) {
        let events = {
            let mut state = self.state.borrow_mut();
            state.connected = false;
            state.events.take()
        };
        if let Some(events) = events {
            let _ = events.unbounded_send(TransportEvent::Closed {
                reason: reason.to_string(),
            });
        }
    }
}

#[async_trait(?Send)]
impl PubSubTransport for FakeTransport {
    async fn connect(&self, events: TransportEventSender) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.connect_attempts += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(TransportError::Unreachable("relay refused connection".into()));
        }
        state.connected = true;
        state.events = Some(events);
        Ok(())
    }

    fn subscribe(&self, destination: &str) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.subscriptions.push(destination.to_string());
        Ok(())
    }

    fn send(&self, destination: &str, body: &str) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.sent.push((destination.to_string(), body.to_string()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn disconnect(&self) {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.events = None;
        state.disconnects += 1;
    }
}
