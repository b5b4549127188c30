use async_trait::async_trait;
use futures::channel::oneshot;
use huddle_client::TransportError;
use huddle_client::signaling::{PubSubTransport, TransportEvent, TransportEventSender};
use huddle_core::stomp::{Command, Frame, decode_frames};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use crate::engine::js_error;
use crate::logger::Logger;

type Handshake = Rc<RefCell<Option<oneshot::Sender<Result<(), TransportError>>>>>;

struct SocketCallbacks {
    _onopen: Closure<dyn FnMut(JsValue)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
    _onerror: Closure<dyn FnMut(JsValue)>,
}

struct Socket {
    ws: WebSocket,
    _callbacks: SocketCallbacks,
}

#[derive(Default)]
struct StompState {
    socket: Option<Socket>,
    connected: bool,
    next_subscription: u32,
}

impl StompState {
    fn send_frame(&self, frame: &Frame) -> Result<(), TransportError> {
        let socket = match &self.socket {
            Some(socket) if self.connected => socket,
            _ => return Err(TransportError::NotConnected),
        };
        socket
            .ws
            .send_with_str(&frame.encode())
            .map_err(|e| TransportError::Protocol(js_error(&e)))
    }
}

/// STOMP 1.2 over a browser WebSocket.
pub struct StompTransport {
    url: String,
    state: Rc<RefCell<StompState>>,
}

impl StompTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Rc::new(RefCell::new(StompState::default())),
        }
    }

    fn close_socket(&self) {
        let socket = {
            let mut state = self.state.borrow_mut();
            state.connected = false;
            state.socket.take()
        };
        if let Some(socket) = socket {
            socket.ws.set_onopen(None);
            socket.ws.set_onmessage(None);
            socket.ws.set_onclose(None);
            socket.ws.set_onerror(None);
            let _ = socket.ws.close();
        }
    }
}

#[async_trait(?Send)]
impl PubSubTransport for StompTransport {
    async fn connect(&self, events: TransportEventSender) -> Result<(), TransportError> {
        self.close_socket();

        let ws = WebSocket::new(&self.url).map_err(|e| TransportError::Unreachable(js_error(&e)))?;
        let (tx, rx) = oneshot::channel();
        let handshake: Handshake = Rc::new(RefCell::new(Some(tx)));

        let onopen = {
            let ws = ws.clone();
            let host = stomp_host(&self.url);
            Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
                debug!("WebSocket open, sending STOMP CONNECT");
                // Liveness is checked on the socket state; no STOMP heart-beats.
                let frame = Frame::connect(&host, (0, 0));
                if let Err(e) = ws.send_with_str(&frame.encode()) {
                    Logger::error(&e);
                }
            }))
        };

        let onmessage = {
            let state = self.state.clone();
            let handshake = handshake.clone();
            let events = events.clone();
            Closure::<dyn FnMut(MessageEvent)>::wrap(Box::new(move |e: MessageEvent| {
                let Some(text) = e.data().as_string() else {
                    return;
                };
                match decode_frames(&text) {
                    Ok(frames) => {
                        for frame in frames {
                            on_frame(&state, &handshake, &events, frame);
                        }
                    }
                    Err(e) => warn!("Dropping malformed STOMP payload: {}", e),
                }
            }))
        };

        let onclose = {
            let state = self.state.clone();
            let handshake = handshake.clone();
            Closure::<dyn FnMut(CloseEvent)>::wrap(Box::new(move |e: CloseEvent| {
                let reason = if e.reason().is_empty() {
                    format!("close code {}", e.code())
                } else {
                    e.reason()
                };
                state.borrow_mut().connected = false;
                if let Some(tx) = handshake.borrow_mut().take() {
                    let _ = tx.send(Err(TransportError::Unreachable(reason)));
                    return;
                }
                let _ = events.unbounded_send(TransportEvent::Closed { reason });
            }))
        };

        let onerror = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |e: JsValue| {
            Logger::error(&e);
        }));

        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        self.state.borrow_mut().socket = Some(Socket {
            ws,
            _callbacks: SocketCallbacks {
                _onopen: onopen,
                _onmessage: onmessage,
                _onclose: onclose,
                _onerror: onerror,
            },
        });

        // A dropped sender means the socket was replaced or torn down.
        rx.await.unwrap_or(Err(TransportError::Closed))
    }

    fn subscribe(&self, destination: &str) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.next_subscription += 1;
        let id = format!("sub-{}", state.next_subscription);
        state.send_frame(&Frame::subscribe(&id, destination))
    }

    fn send(&self, destination: &str, body: &str) -> Result<(), TransportError> {
        self.state
            .borrow()
            .send_frame(&Frame::send(destination, body))
    }

    fn is_connected(&self) -> bool {
        let state = self.state.borrow();
        state.connected
            && state
                .socket
                .as_ref()
                .is_some_and(|s| s.ws.ready_state() == WebSocket::OPEN)
    }

    fn disconnect(&self) {
        let _ = self.state.borrow().send_frame(&Frame::disconnect());
        self.close_socket();
        info!("STOMP transport disconnected");
    }
}

fn on_frame(
    state: &Rc<RefCell<StompState>>,
    handshake: &Handshake,
    events: &TransportEventSender,
    frame: Frame,
) {
    match frame.command {
        Command::Connected => {
            state.borrow_mut().connected = true;
            info!(
                "STOMP session established (version {})",
                frame.get("version").unwrap_or("?")
            );
            if let Some(tx) = handshake.borrow_mut().take() {
                let _ = tx.send(Ok(()));
            }
        }
        Command::Message => {
            let Some(destination) = frame.get("destination").map(str::to_string) else {
                warn!("MESSAGE frame without destination");
                return;
            };
            let _ = events.unbounded_send(TransportEvent::Message {
                destination,
                body: frame.body,
            });
        }
        Command::Error => {
            let message = frame.get("message").unwrap_or("unknown error").to_string();
            error!("Relay sent ERROR frame: {}", message);
            if let Some(tx) = handshake.borrow_mut().take() {
                let _ = tx.send(Err(TransportError::Protocol(message)));
            }
        }
        Command::Receipt => {}
        other => debug!("Ignoring {:?} frame", other),
    }
}

/// Turns a page-relative endpoint such as `/ws` into an absolute WebSocket
/// URL for the current page.
pub fn resolve_ws_url(url: &str, page_protocol: &str, page_host: &str) -> String {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        return url.to_string();
    }
    let scheme = if page_protocol == "https:" { "wss" } else { "ws" };
    let path = if url.is_empty() { "/ws" } else { url };
    if path.starts_with('/') {
        format!("{}://{}{}", scheme, page_host, path)
    } else {
        format!("{}://{}/{}", scheme, page_host, path)
    }
}

fn stomp_host(url: &str) -> String {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = rest.split(['/', '?']).next().unwrap_or_default();
    host.split(':').next().unwrap_or_default().to_string()
}
