use kswap::{LocalNetwork, MergeKind, MessageTag, Phase, SwapConfig, SwapError, SwapReduce, SwapTransport};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_silent_partner_times_out() {
    let cfg = SwapConfig::new(2, 2).with_recv_timeout(Duration::from_millis(50));
    let reduce = SwapReduce::<f32>::new(cfg).unwrap();
    let net: Arc<dyn SwapTransport> = Arc::new(LocalNetwork::new(2));

    // Block 1 never runs.
    let block = reduce.block(0, vec![1.0; 8]).unwrap();
    let err = reduce.spawn(block, net).wait().await.unwrap_err();
    match err {
        SwapError::RoundFailed {
            phase,
            round,
            gid,
            peer,
            reason,
        } => {
            assert_eq!((phase, round, gid, peer), (Phase::Swap, 0, 0, 1));
            assert!(reason.contains("timed out"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnected_partner_fails_round() {
    let reduce = SwapReduce::<u32>::new(SwapConfig::new(4, 2)).unwrap();
    let net = LocalNetwork::new(4);
    net.disconnect(1).unwrap();

    let mut block = reduce.block(0, vec![1; 8]).unwrap();
    let err = reduce.run(&mut block, &net).await.unwrap_err();
    assert!(matches!(err, SwapError::PeerDisconnected { gid: 1 }));
}

#[tokio::test]
async fn test_message_from_outside_partner_set_aborts() {
    let cfg = SwapConfig::new(4, 2).with_recv_timeout(Duration::from_millis(500));
    let reduce = SwapReduce::<f64>::new(cfg).unwrap();
    let net: Arc<dyn SwapTransport> = Arc::new(LocalNetwork::new(4));

    // In round 0 block 0 only exchanges with block 1.
    net.send(MessageTag::swap(0), 3, 0, vec![0; 16]).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|gid| {
            let block = reduce.block(gid, vec![1.0; 8]).unwrap();
            reduce.spawn(block, Arc::clone(&net))
        })
        .collect();
    let mut results = Vec::new();
    for h in handles {
        results.push(h.wait().await);
    }

    match &results[0] {
        Err(SwapError::UnexpectedPartner {
            phase,
            round,
            gid,
            sender,
            expected,
        }) => {
            assert_eq!((*phase, *round, *gid, *sender), (Phase::Swap, 0, 0, 3));
            assert_eq!(expected, &vec![1]);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(results[0].as_ref().unwrap_err().is_protocol_violation());
}

#[test]
fn test_alpha_items_must_hold_whole_pixels() {
    let cfg = SwapConfig::new(4, 2)
        .with_merge(MergeKind::AlphaOver)
        .with_item_size(6);
    assert!(matches!(
        SwapReduce::<f32>::new(cfg),
        Err(SwapError::InvalidConfig(_))
    ));
}
