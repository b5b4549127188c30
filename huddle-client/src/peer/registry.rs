use crate::media::LocalTrack;
use crate::peer::connection::{PeerConnectionFactory, RtcConfig};
use crate::peer::session::{PeerSession, SessionCommand, SessionContext, SessionState};
use crate::room::RoomEvents;
use crate::runtime::{Executor, TaskHandle, spawn_task};
use crate::signaling::SignalingOutput;
use huddle_core::{IceCandidate, Participant, ParticipantInfo, PeerId, PeerSignal};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryInner {
    participants: BTreeMap<PeerId, Participant>,
    sessions: HashMap<PeerId, PeerSession>,
    /// Candidates from peers that have no session yet.
    orphan_candidates: HashMap<PeerId, Vec<IceCandidate>>,
    pending_joins: HashMap<PeerId, TaskHandle>,
    closed: bool,
}

struct RegistryShared {
    ctx: Rc<SessionContext>,
    join_delay: Duration,
    inner: RefCell<RegistryInner>,
}

/// Participant id to [`PeerSession`] map. Keeps exactly one session per
/// remote participant.
#[derive(Clone)]
pub struct PeerSessionRegistry {
    shared: Rc<RegistryShared>,
}

impl PeerSessionRegistry {
    pub fn new(
        local_id: PeerId,
        rtc: RtcConfig,
        factory: Rc<dyn PeerConnectionFactory>,
        signaling: Rc<dyn SignalingOutput>,
        executor: Rc<dyn Executor>,
        events: Rc<dyn RoomEvents>,
        join_delay: Duration,
    ) -> Self {
        Self {
            shared: Rc::new(RegistryShared {
                ctx: Rc::new(SessionContext {
                    local_id,
                    rtc,
                    factory,
                    signaling,
                    executor,
                    events,
                    local_tracks: RefCell::new(Vec::new()),
                }),
                join_delay,
                inner: RefCell::new(RegistryInner::default()),
            }),
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.shared.ctx.local_id
    }

    /// Records the participant and, after the join delay, offers to it.
    /// Repeated notifications for the same id are no-ops.
    pub fn on_participant_joined(&self, id: PeerId, display_name: Option<String>) {
        if id == *self.local_id() || self.is_closed() {
            return;
        }
        self.register_participant(id.clone(), display_name);

        let schedule = {
            let inner = self.shared.inner.borrow();
            !inner.sessions.contains_key(&id) && !inner.pending_joins.contains_key(&id)
        };
        if !schedule {
            debug!("Session with {} already exists or is scheduled", id);
            return;
        }

        let weak = Rc::downgrade(&self.shared);
        let delay = self.shared.ctx.executor.sleep(self.shared.join_delay);
        let peer = id.clone();
        let task = spawn_task(&*self.shared.ctx.executor, async move {
            delay.await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let registry = PeerSessionRegistry { shared };
            let present = {
                let mut inner = registry.shared.inner.borrow_mut();
                inner.pending_joins.remove(&peer);
                inner.participants.contains_key(&peer)
            };
            if present {
                registry.initiate(peer);
            }
        });
        self.shared.inner.borrow_mut().pending_joins.insert(id, task);
    }

    /// Closes and forgets everything belonging to the participant.
    pub fn on_participant_left(&self, id: &PeerId) {
        if *id == *self.local_id() {
            return;
        }
        let (participant, session, pending) = {
            let mut inner = self.shared.inner.borrow_mut();
            inner.orphan_candidates.remove(id);
            (
                inner.participants.remove(id),
                inner.sessions.remove(id),
                inner.pending_joins.remove(id),
            )
        };
        if let Some(pending) = pending {
            pending.cancel();
        }
        let had_session = session.is_some();
        if let Some(session) = session {
            session.close();
        }
        if participant.is_some() || had_session {
            info!("Participant {} left", id);
            self.shared.ctx.events.on_participant_left(id);
        }
    }

    /// Offers to every listed participant that has no session yet. Sessions
    /// still waiting for an answer repeat their offer.
    pub fn on_room_status_received(&self, participants: &[ParticipantInfo]) {
        for info in participants {
            let id = info.id();
            if *id == *self.local_id() {
                continue;
            }
            self.register_participant(id.clone(), info.username().map(str::to_string));
            if self.initiate(id.clone()) {
                continue;
            }
            if let Some(session) = self.session(id) {
                session.push(SessionCommand::ResendOffer);
            }
        }
    }

    /// Explicit request to connect to a participant.
    pub fn connect_to(&self, id: PeerId) -> bool {
        if id == *self.local_id() || self.is_closed() {
            return false;
        }
        self.register_participant(id.clone(), None);
        self.initiate(id)
    }

    /// Replaces the outward track set and fans it out to every session.
    pub fn on_local_track_changed(&self, tracks: Vec<LocalTrack>) {
        *self.shared.ctx.local_tracks.borrow_mut() = tracks;
        let sessions: Vec<PeerSession> =
            self.shared.inner.borrow().sessions.values().cloned().collect();
        for session in sessions {
            session.push(SessionCommand::SyncLocalTracks);
        }
    }

    /// Routes an offer, answer or candidate to the sender's session.
    pub fn handle_signal(&self, signal: PeerSignal) {
        if self.is_closed() {
            return;
        }
        if signal.target() != self.local_id() {
            debug!("Ignoring signal addressed to {}", signal.target());
            return;
        }
        let sender = signal.sender().clone();
        if sender == *self.local_id() {
            return;
        }

        match signal {
            PeerSignal::Offer { offer, .. } => {
                self.register_participant(sender.clone(), None);
                let session = self.session_or_spawn(&sender);
                session.push(SessionCommand::RemoteOffer(offer));
            }
            PeerSignal::Answer { answer, .. } => match self.session(&sender) {
                Some(session) => session.push(SessionCommand::RemoteAnswer(answer)),
                None => debug!("Dropping answer from {} without a session", sender),
            },
            PeerSignal::IceCandidate { candidate, .. } => match self.session(&sender) {
                Some(session) => session.push(SessionCommand::RemoteCandidate(candidate)),
                None => {
                    debug!("Holding ICE candidate from {} until its session exists", sender);
                    self.shared
                        .inner
                        .borrow_mut()
                        .orphan_candidates
                        .entry(sender)
                        .or_default()
                        .push(candidate);
                }
            },
        }
    }

    /// Closes every session and cancels pending joins. The registry accepts
    /// nothing afterwards.
    pub fn close_all(&self) {
        let (sessions, pending) = {
            let mut inner = self.shared.inner.borrow_mut();
            inner.closed = true;
            inner.orphan_candidates.clear();
            inner.participants.clear();
            let sessions: Vec<PeerSession> = inner.sessions.drain().map(|(_, s)| s).collect();
            let pending: Vec<TaskHandle> = inner.pending_joins.drain().map(|(_, t)| t).collect();
            (sessions, pending)
        };
        for task in pending {
            task.cancel();
        }
        let count = sessions.len();
        for session in sessions {
            session.close();
        }
        info!("Closed {} peer sessions", count);
    }

    pub fn session(&self, id: &PeerId) -> Option<PeerSession> {
        self.shared.inner.borrow().sessions.get(id).cloned()
    }

    pub fn session_state(&self, id: &PeerId) -> Option<SessionState> {
        self.session(id).map(|s| s.state())
    }

    /// Sorted ids of live sessions.
    pub fn session_ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.shared.inner.borrow().sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Sorted ids of known remote participants.
    pub fn participant_ids(&self) -> Vec<PeerId> {
        self.shared.inner.borrow().participants.keys().cloned().collect()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.shared
            .inner
            .borrow()
            .participants
            .values()
            .cloned()
            .collect()
    }

    fn is_closed(&self) -> bool {
        self.shared.inner.borrow().closed
    }

    /// Adds the participant or fills in a display name that was unknown.
    fn register_participant(&self, id: PeerId, display_name: Option<String>) {
        let display_name = display_name.filter(|n| !n.trim().is_empty());
        let added = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.closed {
                return;
            }
            match inner.participants.get_mut(&id) {
                Some(existing) => {
                    if let Some(name) = display_name {
                        if existing.display_name == existing.id.as_str() {
                            existing.display_name = name;
                        }
                    }
                    None
                }
                None => {
                    let participant = Participant::new(id.clone(), display_name);
                    inner.participants.insert(id, participant.clone());
                    Some(participant)
                }
            }
        };
        if let Some(participant) = added {
            info!(
                "Participant {} ({}) joined",
                participant.id, participant.display_name
            );
            self.shared.ctx.events.on_participant_joined(&participant);
        }
    }

    /// Creates an offering session unless one exists.
    fn initiate(&self, id: PeerId) -> bool {
        let session = {
            let mut inner = self.shared.inner.borrow_mut();
            if inner.closed || inner.sessions.contains_key(&id) {
                return false;
            }
            let buffered = inner.orphan_candidates.remove(&id).unwrap_or_default();
            let session = PeerSession::spawn(id.clone(), self.shared.ctx.clone(), buffered);
            inner.sessions.insert(id.clone(), session.clone());
            session
        };
        info!("Initiating session with {}", id);
        session.initiate();
        true
    }

    fn session_or_spawn(&self, id: &PeerId) -> PeerSession {
        let mut inner = self.shared.inner.borrow_mut();
        if let Some(session) = inner.sessions.get(id) {
            return session.clone();
        }
        let buffered = inner.orphan_candidates.remove(id).unwrap_or_default();
        let session = PeerSession::spawn(id.clone(), self.shared.ctx.clone(), buffered);
        inner.sessions.insert(id.clone(), session.clone());
        info!("Created answering session for {}", id);
        session
    }
}
