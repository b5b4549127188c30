use huddle_core::PeerSignal;

/// Sink through which a peer session emits offers, answers and ICE
/// candidates to its remote peer.
pub trait SignalingOutput {
    fn send_signal(&self, signal: PeerSignal);
}
