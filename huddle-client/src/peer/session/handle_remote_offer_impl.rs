use super::{PeerSession, SessionState};
use crate::peer::connection::PeerConnection;
use huddle_core::{PeerSignal, SessionDescription};
use std::rc::Rc;
use tracing::{error, info, warn};

impl PeerSession {
    pub(super) async fn handle_remote_offer(&self, offer: SessionDescription) {
        if self.answer_repeated_offer(&offer) {
            return;
        }
        let Some((generation, pc)) = self.prepare_answering().await else {
            return;
        };

        if let Err(e) = pc.set_remote_description(&offer).await {
            error!("Failed to apply offer from {}: {}", self.peer_id, e);
            return;
        }
        if !self.is_current(generation) {
            return;
        }
        self.inner.borrow_mut().remote_description_set = true;
        self.drain_candidates(generation, &pc).await;
        if !self.is_current(generation) {
            return;
        }

        let sdp = match pc.create_answer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                error!("Failed to create answer for {}: {}", self.peer_id, e);
                return;
            }
        };
        if !self.is_current(generation) {
            return;
        }

        let answer = SessionDescription::answer(sdp);
        if let Err(e) = pc.set_local_description(&answer).await {
            error!("Failed to set local answer for {}: {}", self.peer_id, e);
            return;
        }
        if !self.is_current(generation) {
            return;
        }
        {
            let mut inner = self.inner.borrow_mut();
            inner.local_description_set = true;
            inner.state = SessionState::Connected;
            inner.answered_offer = Some((offer.sdp.clone(), answer.clone()));
        }

        info!("Sending answer to {}", self.peer_id);
        self.send_answer(answer);
        self.after_negotiation(generation).await;
    }

    /// An offer that was already answered on this connection gets the same
    /// answer again; the peer re-sends offers whose answer it never saw.
    fn answer_repeated_offer(&self, offer: &SessionDescription) -> bool {
        let answer = {
            let inner = self.inner.borrow();
            match &inner.answered_offer {
                Some((sdp, answer)) if *sdp == offer.sdp => answer.clone(),
                _ => return false,
            }
        };
        info!("Repeated offer from {}, re-sending answer", self.peer_id);
        self.send_answer(answer);
        true
    }

    fn send_answer(&self, answer: SessionDescription) {
        self.ctx.signaling.send_signal(PeerSignal::Answer {
            user_id: self.ctx.local_id.clone(),
            target_user_id: self.peer_id.clone(),
            answer,
        });
    }

    /// Picks the connection an incoming offer is applied to, resolving offer
    /// collisions. `None` means the offer is dropped.
    async fn prepare_answering(&self) -> Option<(u64, Rc<dyn PeerConnection>)> {
        let (state, established) = {
            let inner = self.inner.borrow();
            (
                inner.state,
                inner.pc.is_some() && inner.remote_description_set,
            )
        };
        // The offer this side keeps may be the one that got lost, so it
        // goes out again.
        if state == SessionState::Offering && !self.yields_to_remote() && self.resend_offer() {
            warn!(
                "Offer collision with {}: keeping local offer, waiting for answer",
                self.peer_id
            );
            return None;
        }
        match state {
            SessionState::Closed => None,
            SessionState::Offering if established => {
                // Applying the remote offer rolls the local one back; the
                // local change is offered again once this round completes.
                warn!(
                    "Offer collision with {} during renegotiation: answering on the live connection",
                    self.peer_id
                );
                self.reuse_connection(true)
            }
            SessionState::Offering => {
                warn!(
                    "Offer collision with {}: dropping local offer and answering",
                    self.peer_id
                );
                self.open_connection(SessionState::Answering).await
            }
            SessionState::New => self.open_connection(SessionState::Answering).await,
            SessionState::Answering | SessionState::Connected => match self.reuse_connection(false) {
                Some(existing) => {
                    info!("Renegotiation offer from {}", self.peer_id);
                    Some(existing)
                }
                None => self.open_connection(SessionState::Answering).await,
            },
        }
    }

    /// Answers on the current connection. The remote description stays in
    /// place, so candidates keep applying directly.
    fn reuse_connection(&self, roll_back_offer: bool) -> Option<(u64, Rc<dyn PeerConnection>)> {
        let mut inner = self.inner.borrow_mut();
        let pc = inner.pc.clone()?;
        inner.state = SessionState::Answering;
        inner.local_description_set = false;
        if roll_back_offer {
            inner.local_offer = None;
            inner.renegotiate = true;
        }
        Some((inner.generation, pc))
    }
}
