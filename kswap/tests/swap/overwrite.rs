use kswap::{
    MergeContext, MergeKind, MergeOperator, Overwrite, Result, SubRange, SwapConfig, SwapReduce,
    merge_order,
};
use std::sync::{Arc, Mutex};

use super::helpers::{assert_partition, run_blocks, run_blocks_with};

/// Block `i` holds unique values `i * len + j`.
fn tagged(blocks: u32, len: usize) -> Vec<Vec<u32>> {
    (0..blocks)
        .map(|i| (0..len).map(|j| i * len as u32 + j as u32).collect())
        .collect()
}

/// Records every incoming sub-range, then overwrites like `Overwrite`.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(u32, u32, Vec<u32>)>>,
}

impl MergeOperator<u32> for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn merge(&self, ctx: &MergeContext, owned: &mut [u32], incoming: &[u32]) -> Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push((ctx.gid, ctx.partner, incoming.to_vec()));
        MergeOperator::<u32>::merge(&Overwrite, ctx, owned, incoming)
    }

    fn is_commutative(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn test_two_blocks_swap_halves() {
    let len = 6;
    let cfg = SwapConfig::new(2, 2).with_merge(MergeKind::Overwrite);
    let out = run_blocks(cfg, tagged(2, len)).await;
    assert_eq!(out[0].owned_range(), SubRange::new(0, 3));
    assert_eq!(out[0].owned(), &[6, 7, 8]);
    assert_eq!(out[1].owned_range(), SubRange::new(3, 3));
    assert_eq!(out[1].owned(), &[3, 4, 5]);
}

#[tokio::test]
async fn test_single_round_is_a_transpose() {
    for blocks in [3u32, 4, 5] {
        let per_block = 4usize;
        let len = blocks as usize * per_block;
        let recorder = Arc::new(Recorder::default());
        let reduce = SwapReduce::with_operator(
            SwapConfig::new(blocks, blocks),
            Arc::clone(&recorder) as Arc<dyn MergeOperator<u32>>,
        )
        .unwrap();
        assert_eq!(reduce.schedule().rounds(), 1);
        let inputs = tagged(blocks, len);
        let out = run_blocks_with(reduce, inputs.clone()).await;
        assert_partition(&out, len);

        // Block p received slice p of every other block: an all-to-all.
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), (blocks * (blocks - 1)) as usize);
        for (gid, sender, data) in seen.iter() {
            let p = *gid as usize;
            let slice = &inputs[*sender as usize][p * per_block..(p + 1) * per_block];
            assert_eq!(data.as_slice(), slice, "block {gid} from {sender}");
        }

        // Overwrite leaves the last partner in merge order.
        for b in &out {
            let last = merge_order(b.gid(), blocks).last().unwrap();
            let p = b.gid() as usize;
            assert_eq!(
                b.owned(),
                &inputs[last as usize][p * per_block..(p + 1) * per_block]
            );
        }
    }
}

#[tokio::test]
async fn test_overwrite_keeps_ranges_consistent() {
    let blocks = 8u32;
    let len = 40;
    let cfg = SwapConfig::new(blocks, 2).with_merge(MergeKind::Overwrite);
    let out = run_blocks(cfg, tagged(blocks, len)).await;
    assert_partition(&out, len);
    // Every value still carries its own position.
    for b in &out {
        for (j, v) in b.owned_range().as_range().zip(b.owned()) {
            assert_eq!(*v as usize % len, j);
        }
    }
}
