use super::{PeerSession, SessionState};
use crate::peer::connection::PeerConnection;
use huddle_core::{PeerSignal, SessionDescription};
use std::rc::Rc;
use tracing::{debug, error, info};

impl PeerSession {
    pub(super) async fn start_offer(&self) {
        {
            let inner = self.inner.borrow();
            if inner.state != SessionState::Offering || inner.pc.is_some() {
                debug!(
                    "Skipping offer to {} in state {:?}",
                    self.peer_id, inner.state
                );
                return;
            }
        }
        let Some((generation, pc)) = self.open_connection(SessionState::Offering).await else {
            return;
        };
        self.send_offer(generation, &pc).await;
    }

    pub(super) async fn send_offer(&self, generation: u64, pc: &Rc<dyn PeerConnection>) {
        let sdp = match pc.create_offer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                error!("Failed to create offer for {}: {}", self.peer_id, e);
                return;
            }
        };
        if !self.is_current(generation) {
            return;
        }

        let offer = SessionDescription::offer(sdp);
        if let Err(e) = pc.set_local_description(&offer).await {
            error!("Failed to set local offer for {}: {}", self.peer_id, e);
            return;
        }
        if !self.is_current(generation) {
            return;
        }
        {
            let mut inner = self.inner.borrow_mut();
            inner.state = SessionState::Offering;
            inner.local_description_set = true;
            inner.local_offer = Some(offer.clone());
        }

        info!("Sending offer to {}", self.peer_id);
        self.ctx.signaling.send_signal(PeerSignal::Offer {
            user_id: self.ctx.local_id.clone(),
            target_user_id: self.peer_id.clone(),
            offer,
        });
    }

    /// Sends the outstanding offer again. The relay does not guarantee
    /// delivery, so an offer that never got an answer may have been lost.
    /// Returns `false` when there is no offer waiting for an answer.
    pub(super) fn resend_offer(&self) -> bool {
        let offer = {
            let inner = self.inner.borrow();
            if inner.state != SessionState::Offering || !inner.local_description_set {
                return false;
            }
            inner.local_offer.clone()
        };
        let Some(offer) = offer else {
            return false;
        };
        info!("Re-sending offer to {}", self.peer_id);
        self.ctx.signaling.send_signal(PeerSignal::Offer {
            user_id: self.ctx.local_id.clone(),
            target_user_id: self.peer_id.clone(),
            offer,
        });
        true
    }

    /// Fresh offer on the existing connection. Deferred until the current
    /// round completes when the session is mid-negotiation.
    pub(super) async fn renegotiate(&self) {
        let target = {
            let mut inner = self.inner.borrow_mut();
            match inner.state {
                SessionState::Closed => None,
                SessionState::Connected if inner.pc.is_some() => {
                    inner.renegotiate = false;
                    let generation = inner.generation;
                    inner.pc.clone().map(|pc| (generation, pc))
                }
                _ => {
                    inner.renegotiate = true;
                    None
                }
            }
        };
        let Some((generation, pc)) = target else {
            return;
        };
        info!("Renegotiating with {}", self.peer_id);
        self.send_offer(generation, &pc).await;
    }

    /// Runs a renegotiation that was deferred while the session was busy.
    pub(super) async fn after_negotiation(&self, generation: u64) {
        let pending = {
            let inner = self.inner.borrow();
            inner.renegotiate && inner.generation == generation
        };
        if pending {
            self.renegotiate().await;
        }
    }
}
