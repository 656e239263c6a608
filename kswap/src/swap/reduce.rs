use crate::block::Block;
use crate::config::SwapConfig;
use crate::element::Element;
use crate::error::{Result, SwapError};
use crate::merge::MergeOperator;
use crate::schedule::RoundSchedule;
use crate::swap::executor::SwapRoundExecutor;
use crate::swap::final_swap::FinalRedistributor;
use crate::swap::handle::{SwapGroup, SwapHandle};
use crate::transport::{LocalNetwork, SwapTransport};
use crate::types::BlockId;
use std::sync::Arc;

/// A configured swap reduction, shared by every block of one run.
///
/// Cheap to clone. Each block calls [`run`](Self::run) (or
/// [`spawn`](Self::spawn)) with its own [`Block`] and a transport reaching
/// all other blocks.
pub struct SwapReduce<T: Element> {
    config: SwapConfig,
    schedule: Arc<RoundSchedule>,
    operator: Arc<dyn MergeOperator<T>>,
    final_phase: Option<Arc<FinalRedistributor>>,
}

impl<T: Element> Clone for SwapReduce<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            schedule: Arc::clone(&self.schedule),
            operator: Arc::clone(&self.operator),
            final_phase: self.final_phase.clone(),
        }
    }
}

impl<T: Element> SwapReduce<T> {
    /// Validate `config`, derive the schedule and pick the built-in operator.
    pub fn new(config: SwapConfig) -> Result<Self> {
        let operator = config.merge.operator::<T>();
        Self::with_operator(config, operator)
    }

    /// Like [`new`](Self::new) but merging with a caller-provided operator.
    pub fn with_operator(config: SwapConfig, operator: Arc<dyn MergeOperator<T>>) -> Result<Self> {
        let schedule = RoundSchedule::from_config(&config)?;
        operator.validate(config.item_size)?;
        let final_phase = config
            .contiguous_final_layout
            .then(|| Arc::new(FinalRedistributor::for_schedule(&schedule)));
        tracing::debug!(
            schedule = %schedule,
            radix_two = schedule.is_radix_two(),
            target_k = config.target_k,
            merge = operator.name(),
            policy = %config.factor_policy,
            contiguous = config.contiguous_final_layout,
            "swap reduction configured"
        );
        Ok(Self {
            config,
            schedule: Arc::new(schedule),
            operator,
            final_phase,
        })
    }

    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    pub fn schedule(&self) -> &RoundSchedule {
        &self.schedule
    }

    pub fn final_redistributor(&self) -> Option<&FinalRedistributor> {
        self.final_phase.as_deref()
    }

    /// Wrap `buffer` as block `gid`, splitting on this run's item size.
    pub fn block(&self, gid: BlockId, buffer: Vec<T>) -> Result<Block<T>> {
        if gid >= self.config.total_blocks {
            return Err(SwapError::UnknownBlock { gid });
        }
        Block::with_item_size(gid, buffer, self.config.item_size)
    }

    /// Run every swap round for `block`, then the closing redistribution if
    /// configured. On return the block's owned range holds its share of the
    /// merged dataset.
    pub async fn run(&self, block: &mut Block<T>, transport: &dyn SwapTransport) -> Result<()> {
        let gid = block.gid();
        if gid >= self.config.total_blocks {
            return Err(SwapError::UnknownBlock { gid });
        }
        if block.tracker().granularity() != self.config.item_size {
            return Err(SwapError::InvalidConfig(format!(
                "block {gid} splits on {} elements but the run uses item_size {}",
                block.tracker().granularity(),
                self.config.item_size
            )));
        }

        let mut executor =
            SwapRoundExecutor::new(&self.schedule, &*self.operator, transport)
                .with_timeout(self.config.recv_timeout);
        executor.run_all(block).await?;

        if let Some(final_phase) = &self.final_phase {
            final_phase
                .run(block, transport, self.config.recv_timeout)
                .await?;
        }
        tracing::debug!(gid, range = %block.owned_range(), "swap reduction complete");
        Ok(())
    }

    /// Run [`run`](Self::run) in a background task.
    pub fn spawn(&self, mut block: Block<T>, transport: Arc<dyn SwapTransport>) -> SwapHandle<T> {
        let this = self.clone();
        SwapHandle::spawn(block.gid(), async move {
            this.run(&mut block, &*transport).await?;
            Ok(block)
        })
    }
}

/// Reduce `buffers` (buffer `i` belongs to block `i`) in-process, one task
/// per block over a [`LocalNetwork`]. Returns the blocks ordered by gid.
pub async fn swap_reduce_local<T: Element>(
    config: SwapConfig,
    buffers: Vec<Vec<T>>,
) -> Result<Vec<Block<T>>> {
    let reduce = SwapReduce::<T>::new(config)?;
    run_local(&reduce, buffers).await
}

/// [`swap_reduce_local`] with an already configured reduction.
pub async fn run_local<T: Element>(
    reduce: &SwapReduce<T>,
    buffers: Vec<Vec<T>>,
) -> Result<Vec<Block<T>>> {
    let total = reduce.config().total_blocks;
    if buffers.len() != total as usize {
        return Err(SwapError::InvalidConfig(format!(
            "{} buffers for {total} blocks",
            buffers.len()
        )));
    }
    let network: Arc<dyn SwapTransport> = Arc::new(LocalNetwork::new(total));
    let mut group = SwapGroup::new();
    for (gid, buffer) in (0..total).zip(buffers) {
        let block = reduce.block(gid, buffer)?;
        group.push(reduce.spawn(block, Arc::clone(&network)));
    }
    group.wait_all().await
}
