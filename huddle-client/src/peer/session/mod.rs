use crate::media::{LocalTrack, TrackKind};
use crate::peer::connection::{
    PeerConnection, PeerConnectionEvent, PeerConnectionFactory, RtcConfig, SenderId,
};
use crate::room::RoomEvents;
use crate::runtime::{Executor, TaskHandle, spawn_task};
use crate::signaling::SignalingOutput;
use futures::StreamExt;
use futures::channel::mpsc;
use huddle_core::{IceCandidate, PeerId, SessionDescription};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, info};

mod create_pc_impl;
mod handle_remote_offer_impl;
mod handle_signal_impl;
mod init_connection_impl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    New,
    Offering,
    Answering,
    Connected,
    Closed,
}

/// Everything a session needs from its surroundings. Shared by all sessions
/// of a registry.
pub(crate) struct SessionContext {
    pub local_id: PeerId,
    pub rtc: RtcConfig,
    pub factory: Rc<dyn PeerConnectionFactory>,
    pub signaling: Rc<dyn SignalingOutput>,
    pub executor: Rc<dyn Executor>,
    pub events: Rc<dyn RoomEvents>,
    /// Tracks every new connection starts with.
    pub local_tracks: RefCell<Vec<LocalTrack>>,
}

pub(crate) enum SessionCommand {
    Initiate,
    RemoteOffer(SessionDescription),
    RemoteAnswer(SessionDescription),
    RemoteCandidate(IceCandidate),
    SyncLocalTracks,
    /// Repeats the outstanding offer, if any.
    ResendOffer,
    Connection {
        generation: u64,
        event: PeerConnectionEvent,
    },
}

struct AttachedTrack {
    sender: SenderId,
    /// `None` once the sender was emptied.
    track_id: Option<String>,
}

struct SessionInner {
    state: SessionState,
    pc: Option<Rc<dyn PeerConnection>>,
    /// Bumped whenever the connection is replaced or the session closes.
    generation: u64,
    local_description_set: bool,
    remote_description_set: bool,
    pending_candidates: VecDeque<IceCandidate>,
    /// Offer still waiting for its answer.
    local_offer: Option<SessionDescription>,
    /// Last remote offer answered on the current connection, with the answer.
    answered_offer: Option<(String, SessionDescription)>,
    attached: HashMap<TrackKind, AttachedTrack>,
    remote_stream: Option<String>,
    renegotiate: bool,
    pump: Option<TaskHandle>,
    actor: Option<TaskHandle>,
}

/// Negotiation state for one remote participant.
///
/// Commands are processed one at a time by the session's own task, so
/// signals from the same peer are handled in arrival order.
#[derive(Clone)]
pub struct PeerSession {
    peer_id: PeerId,
    inner: Rc<RefCell<SessionInner>>,
    ctx: Rc<SessionContext>,
    inbox: mpsc::UnboundedSender<SessionCommand>,
}

impl PeerSession {
    pub(crate) fn spawn(
        peer_id: PeerId,
        ctx: Rc<SessionContext>,
        buffered: Vec<IceCandidate>,
    ) -> Self {
        let (inbox, commands) = mpsc::unbounded();
        let session = Self {
            peer_id,
            inner: Rc::new(RefCell::new(SessionInner {
                state: SessionState::New,
                pc: None,
                generation: 0,
                local_description_set: false,
                remote_description_set: false,
                pending_candidates: buffered.into(),
                local_offer: None,
                answered_offer: None,
                attached: HashMap::new(),
                remote_stream: None,
                renegotiate: false,
                pump: None,
                actor: None,
            })),
            ctx,
            inbox,
        };

        let actor = spawn_task(&*session.ctx.executor, session.clone().run(commands));
        session.inner.borrow_mut().actor = Some(actor);
        session
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn state(&self) -> SessionState {
        self.inner.borrow().state
    }

    pub fn local_description_set(&self) -> bool {
        self.inner.borrow().local_description_set
    }

    pub fn remote_description_set(&self) -> bool {
        self.inner.borrow().remote_description_set
    }

    /// Remote candidates waiting for the remote description.
    pub fn pending_candidate_count(&self) -> usize {
        self.inner.borrow().pending_candidates.len()
    }

    /// Moves a fresh session into `offering`; the offer itself is produced
    /// asynchronously.
    pub(crate) fn initiate(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state != SessionState::New {
                debug!(
                    "Not initiating towards {} in state {:?}",
                    self.peer_id, inner.state
                );
                return;
            }
            inner.state = SessionState::Offering;
        }
        self.push(SessionCommand::Initiate);
    }

    pub(crate) fn push(&self, command: SessionCommand) {
        if self.inbox.unbounded_send(command).is_err() {
            debug!("Session with {} no longer accepts commands", self.peer_id);
        }
    }

    /// Releases the connection and drops buffered candidates. In-flight
    /// negotiation steps are abandoned.
    pub fn close(&self) {
        let (pc, tasks) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == SessionState::Closed {
                return;
            }
            inner.state = SessionState::Closed;
            inner.generation += 1;
            inner.pending_candidates.clear();
            inner.attached.clear();
            (inner.pc.take(), [inner.pump.take(), inner.actor.take()])
        };
        if let Some(pc) = pc {
            pc.close();
        }
        for task in tasks.into_iter().flatten() {
            task.cancel();
        }
        info!("Closed session with {}", self.peer_id);
    }

    async fn run(self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        while let Some(command) = commands.next().await {
            if self.state() == SessionState::Closed {
                break;
            }
            match command {
                SessionCommand::Initiate => self.start_offer().await,
                SessionCommand::RemoteOffer(offer) => self.handle_remote_offer(offer).await,
                SessionCommand::RemoteAnswer(answer) => self.handle_remote_answer(answer).await,
                SessionCommand::RemoteCandidate(candidate) => {
                    self.handle_remote_candidate(candidate).await
                }
                SessionCommand::SyncLocalTracks => self.sync_local_tracks().await,
                SessionCommand::ResendOffer => {
                    self.resend_offer();
                }
                SessionCommand::Connection { generation, event } => {
                    self.handle_connection_event(generation, event)
                }
            }
        }
    }

    /// `false` once the session closed or its connection was replaced.
    fn is_current(&self, generation: u64) -> bool {
        let inner = self.inner.borrow();
        inner.state != SessionState::Closed && inner.generation == generation
    }

    fn current_connection(&self) -> Option<(u64, Rc<dyn PeerConnection>)> {
        let inner = self.inner.borrow();
        if inner.state == SessionState::Closed {
            return None;
        }
        inner.pc.clone().map(|pc| (inner.generation, pc))
    }

    /// The side with the lower id answers when both sides offer at once.
    fn yields_to_remote(&self) -> bool {
        self.ctx.local_id < self.peer_id
    }
}
