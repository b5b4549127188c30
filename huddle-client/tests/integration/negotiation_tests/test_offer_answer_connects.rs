use huddle_client::SessionState;
use huddle_client::media::TrackKind;
use huddle_client::peer::{PeerConnectionEvent, PeerConnectionState, RemoteTrack};
use huddle_core::{ParticipantInfo, SdpKind};

use crate::utils::{
    PcOp, UiEvent, advance, candidate, create_test_peer, exchange_signals, init_tracing,
    run_local, settle,
};

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_offer_answer_reaches_connected_on_both_sides() {
    init_tracing();
    run_local(async {
        let alice = create_test_peer("alice");
        let bob = create_test_peer("bob");

        // Alice is in the room when Bob joins; Bob learns about Alice from
        // the room status and offers right away.
        alice
            .registry
            .on_participant_joined(bob.id.clone(), Some("Bob".into()));
        bob.registry
            .on_room_status_received(&[ParticipantInfo::from("alice")]);

        let relayed = exchange_signals(&alice, &bob).await;
        assert_eq!(relayed, 2);

        assert_eq!(
            alice.registry.session_state(&bob.id),
            Some(SessionState::Connected)
        );
        assert_eq!(
            bob.registry.session_state(&alice.id),
            Some(SessionState::Connected)
        );
        let session = alice.registry.session(&bob.id).expect("session");
        assert!(session.local_description_set());
        assert!(session.remote_description_set());

        assert_eq!(
            alice.peers.last().ops(),
            vec![
                PcOp::SetRemote(SdpKind::Offer, "offer-0-1".into()),
                PcOp::CreateAnswer,
                PcOp::SetLocal(SdpKind::Answer),
            ]
        );
        assert_eq!(
            bob.peers.last().ops(),
            vec![
                PcOp::CreateOffer,
                PcOp::SetLocal(SdpKind::Offer),
                PcOp::SetRemote(SdpKind::Answer, "answer-0-1".into()),
            ]
        );

        // Alice's own delayed offer finds the session already there.
        advance(2_000).await;
        assert_eq!(exchange_signals(&alice, &bob).await, 0);
        assert_eq!(alice.peers.count(), 1);
        assert_eq!(bob.peers.count(), 1);
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_connection_events_reach_peer_and_ui() {
    init_tracing();
    run_local(async {
        let alice = create_test_peer("alice");
        let bob = create_test_peer("bob");
        bob.registry.connect_to(alice.id.clone());
        exchange_signals(&alice, &bob).await;

        let pc = alice.peers.last();
        pc.emit(PeerConnectionEvent::IceCandidate(candidate("alice-host")));
        exchange_signals(&alice, &bob).await;
        assert_eq!(bob.peers.last().applied_candidates(), vec!["alice-host"]);

        for (track_id, kind) in [("v", TrackKind::Video), ("a", TrackKind::Audio)] {
            pc.emit(PeerConnectionEvent::RemoteTrack(RemoteTrack {
                stream_id: "bob-stream".into(),
                track_id: track_id.into(),
                kind,
            }));
        }
        pc.emit(PeerConnectionEvent::StateChanged(PeerConnectionState::Connected));
        settle().await;

        assert_eq!(
            alice
                .events
                .count(|e| matches!(e, UiEvent::RemoteStream(..))),
            1
        );
        assert!(alice.events.events().contains(&UiEvent::RemoteStream(
            bob.id.clone(),
            "bob-stream".into()
        )));
        assert!(alice.events.events().contains(&UiEvent::PeerState(
            bob.id.clone(),
            PeerConnectionState::Connected
        )));
    })
    .await;
}
