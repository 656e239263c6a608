pub mod block;
pub mod config;
pub mod element;
pub mod error;
pub mod merge;
pub mod partners;
pub mod protocol;
pub mod range;
pub mod schedule;
pub mod swap;
pub mod transport;
pub mod types;

pub use block::Block;
pub use config::SwapConfig;
pub use element::Element;
pub use error::{Result, SwapError};
pub use merge::{AlphaOver, MergeContext, MergeOperator, Overwrite, Side, Sum, merge_order};
pub use partners::{GroupPosition, Partner, PartnerLocator};
pub use range::{RangeTracker, SubRange};
pub use schedule::RoundSchedule;
pub use swap::{
    FinalRedistributor, RoundPhase, SwapGroup, SwapHandle, SwapReduce, SwapRoundExecutor,
    run_local, swap_reduce_local,
};
pub use transport::{
    ContiguousPlacement, LocalNetwork, Mailbox, PlacementOracle, RoundRobinPlacement,
    SwapTransport, TcpNetwork,
};
pub use types::{BlockId, FactorPolicy, MergeKind, MessageTag, Phase, WorkerId};
