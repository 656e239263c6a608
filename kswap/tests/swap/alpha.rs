use kswap::{MergeKind, SwapConfig};

use super::helpers::{assert_partition, run_blocks};

const PIXELS: usize = 10;

/// Premultiplied RGBA layer for block `gid`, varying per pixel.
fn layer(gid: u32, alpha: f64) -> Vec<f64> {
    (0..PIXELS)
        .flat_map(|p| {
            let shade = (p as f64 + 1.0) / PIXELS as f64;
            let r = alpha * shade;
            let g = alpha * (1.0 - shade);
            let b = alpha * f64::from(gid % 3) / 2.0;
            [r, g, b, alpha]
        })
        .collect()
}

/// Front-to-back "over" of `layers` in order.
fn composite(layers: &[Vec<f64>]) -> Vec<f64> {
    let mut acc = layers[0].clone();
    for back in &layers[1..] {
        for (a, b) in acc.chunks_exact_mut(4).zip(back.chunks_exact(4)) {
            let alpha = a[3];
            for c in 0..4 {
                a[c] += b[c] * (1.0 - alpha);
            }
        }
    }
    acc
}

async fn check_against_sequential(alphas: &[f64], k: u32) {
    let blocks = alphas.len() as u32;
    let layers: Vec<Vec<f64>> = alphas
        .iter()
        .enumerate()
        .map(|(i, &a)| layer(i as u32, a))
        .collect();
    let expected = composite(&layers);

    let cfg = SwapConfig::new(blocks, k).with_merge(MergeKind::AlphaOver);
    let out = run_blocks(cfg, layers).await;
    assert_partition(&out, PIXELS * 4);
    for b in &out {
        let r = b.owned_range();
        assert_eq!(r.start % 4, 0, "range {r} splits a pixel");
        for (j, v) in r.as_range().zip(b.owned()) {
            assert!(
                (v - expected[j]).abs() < 1e-12,
                "B={blocks} k={k} gid={} j={j}: {v} != {}",
                b.gid(),
                expected[j]
            );
        }
    }
}

#[tokio::test]
async fn test_alpha_over_two_rounds_matches_sequential() {
    check_against_sequential(&[0.5, 0.5, 1.0, 0.75], 2).await;
}

#[tokio::test]
async fn test_alpha_over_one_round_matches_sequential() {
    check_against_sequential(&[0.5, 0.5, 1.0, 0.75], 4).await;
}

#[tokio::test]
async fn test_alpha_over_round_count_does_not_matter() {
    // Same closed form whether 4 blocks run as 2x2 or 1x4.
    let alphas = [0.5, 0.5, 1.0, 0.25];
    let layers: Vec<Vec<f64>> = alphas
        .iter()
        .enumerate()
        .map(|(i, &a)| layer(i as u32, a))
        .collect();
    let cfg = |k| {
        SwapConfig::new(4, k)
            .with_merge(MergeKind::AlphaOver)
            .with_contiguous_final_layout(true)
    };
    let two_rounds = run_blocks(cfg(2), layers.clone()).await;
    let one_round = run_blocks(cfg(4), layers).await;
    // The schedules split the image differently; compare the stitched results.
    let stitch = |blocks: &[kswap::Block<f64>]| {
        assert_partition(blocks, PIXELS * 4);
        let mut image = vec![f64::NAN; PIXELS * 4];
        for b in blocks {
            image[b.owned_range().as_range()].copy_from_slice(b.owned());
        }
        image
    };
    let (a, b) = (stitch(&two_rounds), stitch(&one_round));
    for (j, (x, y)) in a.iter().zip(&b).enumerate() {
        assert!((x - y).abs() < 1e-12, "j={j}: {x} != {y}");
    }
    // The third layer is opaque: every composite pixel is opaque.
    for b in &one_round {
        for px in b.owned().chunks_exact(4) {
            assert!((px[3] - 1.0).abs() < 1e-12);
        }
    }
}

#[tokio::test]
async fn test_alpha_over_mixed_radix() {
    let alphas: Vec<f64> = (0..12).map(|i| 0.1 + 0.05 * f64::from(i)).collect();
    check_against_sequential(&alphas, 4).await;
    check_against_sequential(&alphas[..6], 3).await;
    check_against_sequential(&alphas[..8], 2).await;
}

#[tokio::test]
async fn test_alpha_over_f32() {
    let layers: Vec<Vec<f32>> = [0.5f32, 0.5, 1.0, 0.5]
        .iter()
        .map(|&a| vec![a * 0.5, 0.0, a * 0.25, a].repeat(6))
        .collect();
    let cfg = SwapConfig::new(4, 2).with_merge(MergeKind::AlphaOver);
    let out = run_blocks(cfg, layers).await;
    assert_partition(&out, 24);
    // alpha: 0.5 + 0.5 * (0.5 + 0.5 * 1.0) = 1.0; red: 0.25 + 0.5 * (0.25 + 0.5 * 0.5) = 0.5.
    for b in &out {
        for px in b.owned().chunks_exact(4) {
            assert!((px[0] - 0.5).abs() < 1e-6);
            assert!((px[3] - 1.0).abs() < 1e-6);
        }
    }
}
