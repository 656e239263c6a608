use kswap::{
    Block, FinalRedistributor, LocalNetwork, RoundSchedule, Sum, SwapConfig, SwapRoundExecutor,
    SwapTransport,
};
use std::sync::Arc;

use super::helpers::{assert_partition, run_blocks};

fn assert_ascending<T: kswap::Element>(blocks: &[Block<T>], len: usize) {
    let mut cursor = 0;
    for b in blocks {
        assert_eq!(b.owned_range().start, cursor, "gid {} out of order", b.gid());
        cursor = b.owned_range().end();
    }
    assert_eq!(cursor, len);
}

#[tokio::test]
async fn test_contiguous_layout_orders_ranges_by_gid() {
    for (blocks, k) in [(8u32, 2u32), (16, 4), (16, 2), (12, 4), (27, 3), (6, 4)] {
        let len = 100;
        let buffers: Vec<Vec<u64>> = (0..blocks)
            .map(|i| (0..len as u64).map(|j| j * 100 + u64::from(i)).collect())
            .collect();
        let cfg = SwapConfig::new(blocks, k).with_contiguous_final_layout(true);
        let out = run_blocks(cfg, buffers).await;
        assert_ascending(&out, len);
        let offset: u64 = (0..u64::from(blocks)).sum();
        for b in &out {
            for (j, v) in b.owned_range().as_range().zip(b.owned()) {
                assert_eq!(*v, j as u64 * 100 * u64::from(blocks) + offset);
            }
        }
    }
}

#[tokio::test]
async fn test_without_final_phase_ranges_are_digit_reversed() {
    let out = run_blocks(SwapConfig::new(8, 2), vec![vec![1i32; 16]; 8]).await;
    assert_partition(&out, 16);
    // Block 1 (binary 001) ends up with slice 4 (binary 100).
    assert_eq!(out[1].owned_range().start, 8);
    assert_eq!(out[4].owned_range().start, 2);
}

#[tokio::test]
async fn test_bit_reversal_exchange_after_rounds() {
    let blocks = 8u32;
    let len = 24;
    let schedule = Arc::new(RoundSchedule::new(blocks, 2).unwrap());
    let final_phase = Arc::new(FinalRedistributor::bit_reversal(blocks).unwrap());
    let net: Arc<dyn SwapTransport> = Arc::new(LocalNetwork::new(blocks));

    let mut handles = Vec::new();
    for gid in 0..blocks {
        let schedule = Arc::clone(&schedule);
        let final_phase = Arc::clone(&final_phase);
        let net = Arc::clone(&net);
        handles.push(tokio::spawn(async move {
            let mut block = Block::new(gid, vec![gid as f32; len]);
            let mut exec = SwapRoundExecutor::<f32>::new(&schedule, &Sum, &*net);
            exec.run_all(&mut block).await.unwrap();
            final_phase.run(&mut block, &*net, None).await.unwrap();
            block
        }));
    }
    let mut out = Vec::new();
    for h in handles {
        out.push(h.await.unwrap());
    }
    assert_ascending(&out, len);
    for b in &out {
        assert!(b.owned().iter().all(|&v| v == 28.0));
    }
}
