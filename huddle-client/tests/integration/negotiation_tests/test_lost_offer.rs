use huddle_client::SessionState;
use huddle_core::{ParticipantInfo, SdpKind};

use crate::utils::{PcOp, create_test_peer, exchange_signals, init_tracing, run_local, settle};

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_collision_with_lost_offer_still_connects() {
    init_tracing();
    run_local(async {
        let alice = create_test_peer("alice");
        let bob = create_test_peer("bob");

        bob.registry.connect_to(alice.id.clone());
        settle().await;
        // The relay loses Bob's offer.
        assert_eq!(bob.signaling.take().len(), 1);

        // Alice offers on her own. Bob keeps his offer and repeats it, so
        // Alice can answer it.
        alice.registry.connect_to(bob.id.clone());
        exchange_signals(&alice, &bob).await;

        assert_eq!(
            alice.registry.session_state(&bob.id),
            Some(SessionState::Connected)
        );
        assert_eq!(
            bob.registry.session_state(&alice.id),
            Some(SessionState::Connected)
        );
        assert_eq!(bob.peers.count(), 1);
        assert!(!bob.peers.last().is_closed());
        assert_eq!(
            bob.peers
                .last()
                .count(|op| matches!(op, PcOp::SetRemote(SdpKind::Answer, _))),
            1
        );
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_room_status_repeats_unanswered_offer() {
    init_tracing();
    run_local(async {
        let alice = create_test_peer("alice");
        let bob = create_test_peer("bob");

        bob.registry.connect_to(alice.id.clone());
        settle().await;
        bob.signaling.take();

        bob.registry.on_room_status_received(&[
            ParticipantInfo::from("alice"),
            ParticipantInfo::from("bob"),
        ]);
        settle().await;
        assert_eq!(bob.signaling.offers_to(&alice.id), 1);
        assert_eq!(bob.peers.count(), 1);

        exchange_signals(&alice, &bob).await;
        assert_eq!(
            alice.registry.session_state(&bob.id),
            Some(SessionState::Connected)
        );
        assert_eq!(
            bob.registry.session_state(&alice.id),
            Some(SessionState::Connected)
        );

        // Nothing left to repeat once answered.
        bob.registry
            .on_room_status_received(&[ParticipantInfo::from("alice")]);
        settle().await;
        assert!(bob.signaling.signals().is_empty());
    })
    .await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_repeated_offer_gets_the_same_answer() {
    init_tracing();
    run_local(async {
        let alice = create_test_peer("alice");
        let bob = create_test_peer("bob");

        bob.registry.connect_to(alice.id.clone());
        settle().await;
        for signal in bob.signaling.take() {
            alice.registry.handle_signal(signal);
        }
        settle().await;
        // Alice answered, but the relay loses the answer.
        let lost = alice.signaling.take();
        assert_eq!(lost.len(), 1);

        bob.registry
            .on_room_status_received(&[ParticipantInfo::from("alice")]);
        exchange_signals(&alice, &bob).await;

        assert_eq!(
            bob.registry.session_state(&alice.id),
            Some(SessionState::Connected)
        );
        let alice_pc = alice.peers.last();
        assert_eq!(alice.peers.count(), 1);
        assert_eq!(
            alice_pc.count(|op| matches!(op, PcOp::SetRemote(SdpKind::Offer, _))),
            1
        );
        assert_eq!(alice_pc.count(|op| *op == PcOp::CreateAnswer), 1);
        assert_eq!(
            bob.peers.last().ops().last(),
            Some(&PcOp::SetRemote(SdpKind::Answer, "answer-0-1".into()))
        );
    })
    .await;
}
