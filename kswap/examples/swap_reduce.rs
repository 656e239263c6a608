//! Radix-k swap reduction across 8 in-process blocks.
//!
//! Each block starts with a full buffer filled with its own gid. After the
//! reduction every block owns a distinct slice of the summed dataset, and
//! with the contiguous layout the slices ascend with the gid.
//!
//! ```bash
//! cargo run --example swap_reduce
//! ```

use kswap::{MergeKind, RoundSchedule, SwapConfig, swap_reduce_local};

#[tokio::main]
async fn main() -> kswap::Result<()> {
    let blocks = 8u32;
    let count = 16usize;

    let buffers: Vec<Vec<f32>> = (0..blocks).map(|gid| vec![gid as f32; count]).collect();
    let config = SwapConfig::new(blocks, 4)
        .with_merge(MergeKind::Sum)
        .with_contiguous_final_layout(true);
    println!("k-values: {:?}", RoundSchedule::from_config(&config)?.k_values());

    for block in swap_reduce_local(config, buffers).await? {
        println!(
            "block {}: {} {:?}",
            block.gid(),
            block.owned_range(),
            block.owned()
        );
    }
    // Every owned element = 0 + 1 + ... + 7 = 28.0
    // block 0: [0, 2) [28.0, 28.0]
    // block 1: [2, 4) [28.0, 28.0]
    // ...

    Ok(())
}
