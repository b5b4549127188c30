use huddle_client::SessionState;
use huddle_client::media::{LocalTrack, TrackKind};

use super::ice_from;
use crate::utils::{
    FakeTrack, PcOp, TestPeer, create_test_peer, exchange_signals, init_tracing, run_local,
    settle,
};

fn track(id: &str, kind: TrackKind) -> LocalTrack {
    FakeTrack::new(id, kind)
}

async fn connected_pair() -> (TestPeer, TestPeer) {
    let alice = create_test_peer("alice");
    let bob = create_test_peer("bob");
    alice
        .registry
        .on_local_track_changed(vec![track("alice-audio", TrackKind::Audio)]);
    bob.registry
        .on_local_track_changed(vec![track("bob-audio", TrackKind::Audio)]);
    alice.registry.connect_to(bob.id.clone());
    exchange_signals(&alice, &bob).await;
    assert_eq!(
        bob.registry.session_state(&alice.id),
        Some(SessionState::Connected)
    );
    (alice, bob)
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_simultaneous_renegotiation_keeps_connections() {
    init_tracing();
    run_local(async {
        let (alice, bob) = connected_pair().await;

        alice.registry.on_local_track_changed(vec![
            track("alice-audio", TrackKind::Audio),
            track("alice-video", TrackKind::Video),
        ]);
        bob.registry.on_local_track_changed(vec![
            track("bob-audio", TrackKind::Audio),
            track("bob-video", TrackKind::Video),
        ]);
        settle().await;
        assert_eq!(alice.signaling.offers_to(&bob.id), 1);
        assert_eq!(bob.signaling.offers_to(&alice.id), 1);

        exchange_signals(&alice, &bob).await;

        assert_eq!(
            alice.registry.session_state(&bob.id),
            Some(SessionState::Connected)
        );
        assert_eq!(
            bob.registry.session_state(&alice.id),
            Some(SessionState::Connected)
        );

        // Both sides stay on their first connection.
        assert_eq!(alice.peers.count(), 1);
        assert_eq!(bob.peers.count(), 1);
        let alice_pc = alice.peers.last();
        let bob_pc = bob.peers.last();
        assert!(!alice_pc.is_closed());
        assert!(!bob_pc.is_closed());

        // Alice answered Bob's offer, then offered her own change again.
        assert_eq!(alice_pc.count(|op| *op == PcOp::CreateOffer), 3);
        assert_eq!(alice_pc.count(|op| *op == PcOp::CreateAnswer), 1);
        assert_eq!(bob_pc.count(|op| *op == PcOp::CreateOffer), 1);
        assert_eq!(bob_pc.count(|op| *op == PcOp::CreateAnswer), 2);
        assert_eq!(
            alice_pc.count(|op| *op == PcOp::AddTrack("alice-video".into())),
            1
        );
        assert_eq!(
            bob_pc.count(|op| *op == PcOp::AddTrack("bob-video".into())),
            1
        );
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_candidates_apply_directly_during_renegotiation() {
    init_tracing();
    run_local(async {
        let (alice, bob) = connected_pair().await;

        bob.registry.on_local_track_changed(vec![
            track("bob-audio", TrackKind::Audio),
            track("bob-video", TrackKind::Video),
        ]);
        settle().await;
        assert_eq!(
            bob.registry.session_state(&alice.id),
            Some(SessionState::Offering)
        );

        bob.registry
            .handle_signal(ice_from("alice", "bob", "during-renegotiation"));
        settle().await;

        let session = bob.registry.session(&alice.id).expect("session");
        assert!(session.remote_description_set());
        assert_eq!(session.pending_candidate_count(), 0);
        assert_eq!(
            bob.peers.last().applied_candidates(),
            vec!["during-renegotiation".to_string()]
        );

        exchange_signals(&alice, &bob).await;
        assert_eq!(
            bob.registry.session_state(&alice.id),
            Some(SessionState::Connected)
        );
    })
    .await;
}
