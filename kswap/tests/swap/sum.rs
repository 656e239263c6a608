use kswap::{FactorPolicy, SwapConfig};

use super::helpers::{assert_partition, run_blocks};

/// Block `i` holds `(i + 1) * 1000 + j` at position `j`.
fn ramp(blocks: u32, len: usize) -> Vec<Vec<f64>> {
    (0..blocks)
        .map(|i| (0..len).map(|j| f64::from(i + 1) * 1000.0 + j as f64).collect())
        .collect()
}

fn ramp_sum(blocks: u32, j: usize) -> f64 {
    let b = f64::from(blocks);
    1000.0 * b * (b + 1.0) / 2.0 + b * j as f64
}

#[tokio::test]
async fn test_sum_equals_reduce_scatter() {
    for blocks in [2u32, 4, 8, 16] {
        for k in [2u32, 4] {
            let len = 64;
            let out = run_blocks(SwapConfig::new(blocks, k), ramp(blocks, len)).await;
            assert_partition(&out, len);
            for b in &out {
                let r = b.owned_range();
                for (j, v) in r.as_range().zip(b.owned()) {
                    assert_eq!(*v, ramp_sum(blocks, j), "B={blocks} k={k} gid={} j={j}", b.gid());
                }
            }
        }
    }
}

#[tokio::test]
async fn test_sum_constant_values() {
    // Every position ends up as the sum of the per-block values.
    let blocks = 8u32;
    let buffers: Vec<Vec<f32>> = (0..blocks).map(|i| vec![i as f32 + 0.5; 40]).collect();
    let out = run_blocks(SwapConfig::new(blocks, 2), buffers).await;
    let expected: f32 = (0..blocks).map(|i| i as f32 + 0.5).sum();
    for b in &out {
        assert!(b.owned().iter().all(|&v| v == expected), "gid {}", b.gid());
    }
}

#[tokio::test]
async fn test_sum_mixed_radix_uneven_lengths() {
    for (blocks, k) in [(12u32, 4u32), (24, 4), (6, 4), (14, 2), (9, 3)] {
        for len in [1usize, 7, 50, 101] {
            let out = run_blocks(SwapConfig::new(blocks, k), ramp(blocks, len)).await;
            assert_partition(&out, len);
            for b in &out {
                for (j, v) in b.owned_range().as_range().zip(b.owned()) {
                    assert_eq!(*v, ramp_sum(blocks, j), "B={blocks} k={k} len={len}");
                }
            }
        }
    }
}

#[tokio::test]
async fn test_sum_integers_wrap() {
    let buffers = vec![vec![u32::MAX; 6], vec![2u32; 6]];
    let out = run_blocks(SwapConfig::new(2, 2), buffers).await;
    for b in &out {
        assert!(b.owned().iter().all(|&v| v == 1));
    }

    let buffers: Vec<Vec<i64>> = (0..4).map(|i| vec![-i; 9]).collect();
    let out = run_blocks(SwapConfig::new(4, 4), buffers).await;
    assert_partition(&out, 9);
    for b in &out {
        assert!(b.owned().iter().all(|&v| v == -6));
    }
}

#[tokio::test]
async fn test_sum_item_granularity() {
    // Items of 3 elements are never split across blocks.
    let blocks = 4u32;
    let buffers: Vec<Vec<i32>> = (0..blocks).map(|i| vec![i as i32; 30]).collect();
    let out = run_blocks(SwapConfig::new(blocks, 2).with_item_size(3), buffers).await;
    assert_partition(&out, 30);
    for b in &out {
        assert_eq!(b.owned_range().start % 3, 0);
        assert_eq!(b.owned_range().len % 3, 0);
        assert!(b.owned().iter().all(|&v| v == 6));
    }
}

#[tokio::test]
async fn test_single_block_keeps_range() {
    let out = run_blocks(SwapConfig::new(1, 2), vec![vec![4.0f32; 5]]).await;
    assert_eq!(out[0].owned_range().start, 0);
    assert_eq!(out[0].owned_range().len, 5);
    assert_eq!(out[0].owned(), &[4.0; 5]);
}

#[tokio::test]
async fn test_legacy_policy_when_consistent() {
    // 16 blocks with target 4 never hit the fallback, so the historical
    // factorization is usable.
    let cfg = SwapConfig::new(16, 4).with_factor_policy(FactorPolicy::Legacy);
    let out = run_blocks(cfg, ramp(16, 32)).await;
    assert_partition(&out, 32);
    for b in &out {
        for (j, v) in b.owned_range().as_range().zip(b.owned()) {
            assert_eq!(*v, ramp_sum(16, j));
        }
    }
}
