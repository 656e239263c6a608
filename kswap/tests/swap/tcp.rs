use kswap::{
    Block, ContiguousPlacement, PlacementOracle, RoundRobinPlacement, SwapConfig, SwapReduce,
    SwapTransport, TcpNetwork,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::helpers::assert_partition;

/// Bind one listener per worker, then join every worker into the mesh.
async fn mesh(placement: Arc<dyn PlacementOracle>) -> Vec<Arc<TcpNetwork>> {
    let workers = placement.workers();
    let mut listeners = Vec::new();
    let mut addrs = HashMap::new();
    for w in 0..workers {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        addrs.insert(w, l.local_addr().unwrap());
        listeners.push(l);
    }
    let mut nets = Vec::new();
    for (w, l) in (0..workers).zip(listeners) {
        let peers: HashMap<_, _> = addrs
            .iter()
            .filter(|(p, _)| **p != w)
            .map(|(p, a)| (*p, *a))
            .collect();
        let net = TcpNetwork::establish(w, l, &peers, Arc::clone(&placement))
            .await
            .unwrap();
        nets.push(Arc::new(net));
    }
    nets
}

/// Run every block on the worker hosting it and collect them by gid.
async fn run_mesh(
    reduce: SwapReduce<f64>,
    nets: &[Arc<TcpNetwork>],
    buffer: impl Fn(u32) -> Vec<f64>,
) -> Vec<Block<f64>> {
    let mut handles = Vec::new();
    for net in nets {
        for gid in net.local_blocks() {
            let block = reduce.block(gid, buffer(gid)).unwrap();
            let transport: Arc<dyn SwapTransport> = net.clone();
            handles.push(reduce.spawn(block, transport));
        }
    }
    let mut blocks = Vec::new();
    for h in handles {
        blocks.push(h.wait().await.unwrap());
    }
    blocks.sort_by_key(Block::gid);
    blocks
}

#[tokio::test]
async fn test_sum_across_two_workers() {
    let blocks = 8u32;
    let len = 48;
    let placement: Arc<dyn PlacementOracle> = Arc::new(ContiguousPlacement::new(blocks, 2));
    let nets = mesh(placement).await;
    assert_eq!(nets[0].local_blocks(), vec![0, 1, 2, 3]);

    let cfg = SwapConfig::new(blocks, 2).with_recv_timeout(Duration::from_secs(10));
    let reduce = SwapReduce::new(cfg).unwrap();
    let out = run_mesh(reduce, &nets, |gid| {
        (0..len).map(|j| f64::from(gid) + j as f64).collect()
    })
    .await;

    assert_eq!(out.len(), blocks as usize);
    assert_partition(&out, len);
    for b in &out {
        for (j, v) in b.owned_range().as_range().zip(b.owned()) {
            assert_eq!(*v, 28.0 + 8.0 * j as f64, "gid {} j {j}", b.gid());
        }
    }
}

#[tokio::test]
async fn test_round_robin_placement_with_contiguous_layout() {
    let blocks = 6u32;
    let len = 30;
    let placement: Arc<dyn PlacementOracle> = Arc::new(RoundRobinPlacement::new(blocks, 3));
    let nets = mesh(placement).await;
    assert_eq!(nets[1].local_blocks(), vec![1, 4]);

    let cfg = SwapConfig::new(blocks, 3)
        .with_contiguous_final_layout(true)
        .with_recv_timeout(Duration::from_secs(10));
    let reduce = SwapReduce::new(cfg).unwrap();
    let out = run_mesh(reduce, &nets, |_| vec![0.5; len]).await;

    let mut cursor = 0;
    for b in &out {
        assert_eq!(b.owned_range().start, cursor, "gid {}", b.gid());
        cursor = b.owned_range().end();
        assert!(b.owned().iter().all(|&v| v == 3.0));
    }
    assert_eq!(cursor, len);
}
