use super::{AttachedTrack, PeerSession, SessionCommand, SessionState};
use crate::peer::connection::{PeerConnection, PeerConnectionEvent, RemoteStream};
use crate::runtime::spawn_task;
use futures::StreamExt;
use futures::channel::mpsc;
use huddle_core::PeerSignal;
use std::rc::Rc;
use tracing::{error, info, warn};

impl PeerSession {
    /// Replaces any existing connection with a fresh one in `role` and
    /// attaches the current local tracks. Returns `None` if the session was
    /// closed or superseded meanwhile, or the connection could not be built.
    pub(super) async fn open_connection(
        &self,
        role: SessionState,
    ) -> Option<(u64, Rc<dyn PeerConnection>)> {
        let (generation, old_pc, old_pump) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == SessionState::Closed {
                return None;
            }
            inner.generation += 1;
            inner.state = role;
            inner.local_description_set = false;
            inner.remote_description_set = false;
            inner.local_offer = None;
            inner.answered_offer = None;
            inner.attached.clear();
            inner.remote_stream = None;
            inner.renegotiate = false;
            (inner.generation, inner.pc.take(), inner.pump.take())
        };
        if let Some(pump) = old_pump {
            pump.cancel();
        }
        if let Some(pc) = old_pc {
            pc.close();
        }

        let (events_tx, events_rx) = mpsc::unbounded();
        let pc = match self.ctx.factory.create(&self.ctx.rtc, events_tx).await {
            Ok(pc) => pc,
            Err(e) => {
                error!("Failed to create peer connection for {}: {}", self.peer_id, e);
                return None;
            }
        };
        if !self.is_current(generation) {
            pc.close();
            return None;
        }
        self.inner.borrow_mut().pc = Some(pc.clone());
        self.spawn_event_pump(generation, events_rx);

        let tracks = self.ctx.local_tracks.borrow().clone();
        for track in tracks {
            let kind = track.kind();
            if self.inner.borrow().attached.contains_key(&kind) {
                continue;
            }
            match pc.add_track(&track).await {
                Ok(sender) => {
                    if !self.is_current(generation) {
                        return None;
                    }
                    self.inner.borrow_mut().attached.insert(
                        kind,
                        AttachedTrack {
                            sender,
                            track_id: Some(track.id()),
                        },
                    );
                }
                Err(e) => warn!("Failed to attach {:?} track for {}: {}", kind, self.peer_id, e),
            }
        }

        info!("Peer connection for {} created as {:?}", self.peer_id, role);
        self.is_current(generation).then_some((generation, pc))
    }

    /// Forwards connection events into the session inbox, tagged with the
    /// connection generation they belong to.
    fn spawn_event_pump(
        &self,
        generation: u64,
        mut events: mpsc::UnboundedReceiver<PeerConnectionEvent>,
    ) {
        let inbox = self.inbox.clone();
        let pump = spawn_task(&*self.ctx.executor, async move {
            while let Some(event) = events.next().await {
                if inbox
                    .unbounded_send(SessionCommand::Connection { generation, event })
                    .is_err()
                {
                    break;
                }
            }
        });
        if let Some(old) = self.inner.borrow_mut().pump.replace(pump) {
            old.cancel();
        }
    }

    pub(super) fn handle_connection_event(&self, generation: u64, event: PeerConnectionEvent) {
        if !self.is_current(generation) {
            return;
        }
        match event {
            PeerConnectionEvent::IceCandidate(candidate) => {
                self.ctx.signaling.send_signal(PeerSignal::IceCandidate {
                    user_id: self.ctx.local_id.clone(),
                    target_user_id: self.peer_id.clone(),
                    candidate,
                });
            }
            PeerConnectionEvent::RemoteTrack(track) => {
                let first = {
                    let mut inner = self.inner.borrow_mut();
                    if inner.remote_stream.is_some() {
                        false
                    } else {
                        inner.remote_stream = Some(track.stream_id.clone());
                        true
                    }
                };
                if first {
                    info!("Remote stream {} from {}", track.stream_id, self.peer_id);
                    self.ctx.events.on_remote_stream(
                        &self.peer_id,
                        &RemoteStream {
                            id: track.stream_id,
                        },
                    );
                }
            }
            PeerConnectionEvent::StateChanged(state) => {
                info!("Peer connection state for {}: {:?}", self.peer_id, state);
                self.ctx.events.on_peer_connection_state(&self.peer_id, state);
            }
        }
    }
}
