use super::{AttachedTrack, PeerSession, SessionState};
use crate::media::TrackKind;
use crate::peer::connection::{PeerConnection, SenderId};
use huddle_core::{IceCandidate, SessionDescription};
use std::rc::Rc;
use tracing::{debug, error, info, warn};

impl PeerSession {
    pub(super) async fn handle_remote_answer(&self, answer: SessionDescription) {
        let target = {
            let inner = self.inner.borrow();
            if inner.state == SessionState::Offering && inner.local_description_set {
                inner.pc.clone().map(|pc| (inner.generation, pc))
            } else {
                None
            }
        };
        let Some((generation, pc)) = target else {
            debug!(
                "Ignoring answer from {} in state {:?}",
                self.peer_id,
                self.state()
            );
            return;
        };

        if let Err(e) = pc.set_remote_description(&answer).await {
            error!("Failed to apply answer from {}: {}", self.peer_id, e);
            return;
        }
        if !self.is_current(generation) {
            return;
        }
        {
            let mut inner = self.inner.borrow_mut();
            inner.remote_description_set = true;
            inner.local_offer = None;
            inner.state = SessionState::Connected;
        }
        info!("Negotiation with {} complete", self.peer_id);

        self.drain_candidates(generation, &pc).await;
        self.after_negotiation(generation).await;
    }

    /// Applies a remote candidate, or buffers it until the remote
    /// description is in place.
    pub(super) async fn handle_remote_candidate(&self, candidate: IceCandidate) {
        let target = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == SessionState::Closed {
                return;
            }
            let ready = inner.remote_description_set && inner.pc.is_some();
            if ready {
                inner.pc.clone()
            } else {
                inner.pending_candidates.push_back(candidate.clone());
                None
            }
        };
        let Some(pc) = target else {
            debug!("Buffered ICE candidate from {}", self.peer_id);
            return;
        };
        self.apply_candidate(&pc, &candidate).await;
    }

    /// Applies buffered candidates in arrival order, each exactly once.
    pub(super) async fn drain_candidates(&self, generation: u64, pc: &Rc<dyn PeerConnection>) {
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                if inner.state == SessionState::Closed || inner.generation != generation {
                    return;
                }
                inner.pending_candidates.pop_front()
            };
            let Some(candidate) = next else {
                return;
            };
            self.apply_candidate(pc, &candidate).await;
        }
    }

    async fn apply_candidate(&self, pc: &Rc<dyn PeerConnection>, candidate: &IceCandidate) {
        if let Err(e) = pc.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {}: {}", self.peer_id, e);
        }
    }

    /// Brings attached senders in line with the current local tracks,
    /// replacing in place where a sender of the same kind exists.
    pub(super) async fn sync_local_tracks(&self) {
        let Some((generation, pc)) = self.current_connection() else {
            return;
        };
        let tracks = self.ctx.local_tracks.borrow().clone();
        let mut added = false;

        for kind in [TrackKind::Audio, TrackKind::Video] {
            let track = tracks.iter().find(|t| t.kind() == kind).cloned();
            let attached = self
                .inner
                .borrow()
                .attached
                .get(&kind)
                .map(|a| (a.sender, a.track_id.clone()));

            match (attached, track) {
                (Some((sender, current)), Some(track)) => {
                    let id = track.id();
                    if current.as_deref() == Some(id.as_str()) {
                        continue;
                    }
                    if let Err(e) = pc.replace_track(sender, Some(&track)).await {
                        warn!(
                            "Failed to replace {:?} track for {}: {}",
                            kind, self.peer_id, e
                        );
                        continue;
                    }
                    if !self.is_current(generation) {
                        return;
                    }
                    self.set_attached(kind, sender, Some(id));
                }
                (Some((sender, Some(_))), None) => {
                    if let Err(e) = pc.replace_track(sender, None).await {
                        warn!(
                            "Failed to detach {:?} track for {}: {}",
                            kind, self.peer_id, e
                        );
                        continue;
                    }
                    if !self.is_current(generation) {
                        return;
                    }
                    self.set_attached(kind, sender, None);
                }
                (None, Some(track)) => match pc.add_track(&track).await {
                    Ok(sender) => {
                        if !self.is_current(generation) {
                            return;
                        }
                        self.set_attached(kind, sender, Some(track.id()));
                        added = true;
                    }
                    Err(e) => warn!(
                        "Failed to attach {:?} track for {}: {}",
                        kind, self.peer_id, e
                    ),
                },
                (Some((_, None)), None) | (None, None) => {}
            }
        }

        if added {
            self.renegotiate().await;
        }
    }

    fn set_attached(&self, kind: TrackKind, sender: SenderId, track_id: Option<String>) {
        self.inner
            .borrow_mut()
            .attached
            .insert(kind, AttachedTrack { sender, track_id });
    }
}
