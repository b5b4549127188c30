use async_trait::async_trait;
use huddle_client::NegotiationError;
use huddle_client::media::LocalTrack;
use huddle_client::peer::{
    PeerConnection, PeerConnectionEvent, PeerConnectionFactory, PeerEventSender, RtcConfig,
    SenderId,
};
use huddle_core::{IceCandidate, SdpKind, SessionDescription};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum PcOp {
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpKind),
    SetRemote(SdpKind, String),
    AddCandidate(String),
    AddTrack(String),
    ReplaceTrack(SenderId, Option<String>),
    Close,
}

/// Scripted peer connection. Behaves like a browser in the ways the engine
/// depends on: candidates are rejected before a remote description exists.
pub struct FakePeerConnection {
    pub index: usize,
    ops: RefCell<Vec<PcOp>>,
    events: PeerEventSender,
    descriptions: Cell<usize>,
    remote_set: Cell<bool>,
    senders: Cell<usize>,
}

impl FakePeerConnection {
    pub fn ops(&self) -> Vec<PcOp> {
        self.ops.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.ops.borrow().contains(&PcOp::Close)
    }

    pub fn applied_candidates(&self) -> Vec<String> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                PcOp::AddCandidate(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&PcOp) -> bool) -> usize {
        self.ops.borrow().iter().filter(|op| matches(op)).count()
    }

    /// Fires a connection event as the platform would.
    pub fn emit(&self, event: PeerConnectionEvent) {
        let _ = self.events.unbounded_send(event);
    }

    fn record(&self, op: PcOp) {
        self.ops.borrow_mut().push(op);
    }

    fn next_sdp(&self, kind: &str) -> String {
        let n = self.descriptions.get() + 1;
        self.descriptions.set(n);
        format!("{}-{}-{}", kind, self.index, n)
    }
}

#[async_trait(?Send)]
impl PeerConnection for FakePeerConnection {
    async fn create_offer(&self) -> Result<String, NegotiationError> {
        self.record(PcOp::CreateOffer);
        Ok(self.next_sdp("offer"))
    }

    async fn create_answer(&self) -> Result<String, NegotiationError> {
        if !self.remote_set.get() {
            return Err(NegotiationError::CreateDescription("no remote offer".into()));
        }
        self.record(PcOp::CreateAnswer);
        Ok(self.next_sdp("answer"))
    }

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.record(PcOp::SetLocal(description.kind));
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.record(PcOp::SetRemote(description.kind, description.sdp.clone()));
        self.remote_set.set(true);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), NegotiationError> {
        if !self.remote_set.get() {
            return Err(NegotiationError::AddCandidate(
                "remote description not set".into(),
            ));
        }
        self.record(PcOp::AddCandidate(candidate.candidate.clone()));
        Ok(())
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<SenderId, NegotiationError> {
        self.record(PcOp::AddTrack(track.id()));
        let id = self.senders.get();
        self.senders.set(id + 1);
        Ok(SenderId(id))
    }

    async fn replace_track(
        &self,
        sender: SenderId,
        track: Option<&LocalTrack>,
    ) -> Result<(), NegotiationError> {
        self.record(PcOp::ReplaceTrack(sender, track.map(|t| t.id())));
        Ok(())
    }

    fn close(&self) {
        self.record(PcOp::Close);
    }
}

#[derive(Default)]
pub struct FakePeerFactory {
    created: RefCell<Vec<Rc<FakePeerConnection>>>,
}

impl FakePeerFactory {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn created(&self) -> Vec<Rc<FakePeerConnection>> {
        self.created.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.created.borrow().len()
    }

    pub fn last(&self) -> Rc<FakePeerConnection> {
        self.created
            .borrow()
            .last()
            .cloned()
            .expect("no peer connection created")
    }
}

#[async_trait(?Send)]
impl PeerConnectionFactory for FakePeerFactory {
    async fn create(
        &self,
        _config: &RtcConfig,
        events: PeerEventSender,
    ) -> Result<Rc<dyn PeerConnection>, NegotiationError> {
        let pc = Rc::new(FakePeerConnection {
            index: self.count(),
            ops: RefCell::new(Vec::new()),
            events,
            descriptions: Cell::new(0),
            remote_set: Cell::new(false),
            senders: Cell::new(0),
        });
        self.created.borrow_mut().push(pc.clone());
        Ok(pc)
    }
}

pub fn candidate(name: &str) -> IceCandidate {
    IceCandidate {
        candidate: name.to_string(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    }
}
