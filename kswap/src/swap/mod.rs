//! The swap reduction proper: per-round execution, the closing
//! redistribution and the driver tying them to a transport.

mod executor;
mod final_swap;
mod handle;
pub(crate) mod helpers;
mod reduce;

pub use executor::{RoundPhase, SwapRoundExecutor};
pub use final_swap::{FinalRedistributor, reverse_bits};
pub use handle::{SwapGroup, SwapHandle};
pub use reduce::{SwapReduce, run_local, swap_reduce_local};
