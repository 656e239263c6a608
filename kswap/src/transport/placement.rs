use crate::types::{BlockId, WorkerId};

/// Maps block gids to the worker hosting them.
///
/// Only transports consult placement; the swap logic itself addresses
/// blocks by gid alone.
pub trait PlacementOracle: Send + Sync {
    fn total_blocks(&self) -> u32;

    fn workers(&self) -> u32;

    /// Worker hosting `gid`. Gids past `total_blocks` still map to some
    /// worker in `0..workers()`; callers reject them before routing.
    fn owner_worker(&self, gid: BlockId) -> WorkerId;

    /// Gids hosted by `worker`, ascending.
    fn local_blocks(&self, worker: WorkerId) -> Vec<BlockId> {
        (0..self.total_blocks())
            .filter(|&gid| self.owner_worker(gid) == worker)
            .collect()
    }
}

/// Consecutive gid ranges per worker. The first `total % workers` workers
/// host one block more than the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContiguousPlacement {
    total_blocks: u32,
    workers: u32,
}

impl ContiguousPlacement {
    pub fn new(total_blocks: u32, workers: u32) -> Self {
        Self {
            total_blocks,
            workers: workers.max(1),
        }
    }
}

impl PlacementOracle for ContiguousPlacement {
    fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    fn workers(&self) -> u32 {
        self.workers
    }

    fn owner_worker(&self, gid: BlockId) -> WorkerId {
        let div = self.total_blocks / self.workers;
        let rem = self.total_blocks % self.workers;
        let big = div + 1;
        let worker = if gid < rem * big {
            gid / big
        } else if div == 0 {
            rem
        } else {
            rem + (gid - rem * big) / div
        };
        worker.min(self.workers - 1)
    }

    fn local_blocks(&self, worker: WorkerId) -> Vec<BlockId> {
        let div = self.total_blocks / self.workers;
        let rem = self.total_blocks % self.workers;
        if worker >= self.workers {
            return Vec::new();
        }
        let start = worker * div + worker.min(rem);
        let count = div + u32::from(worker < rem);
        (start..start + count).collect()
    }
}

/// Gid `g` lives on worker `g % workers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobinPlacement {
    total_blocks: u32,
    workers: u32,
}

impl RoundRobinPlacement {
    pub fn new(total_blocks: u32, workers: u32) -> Self {
        Self {
            total_blocks,
            workers: workers.max(1),
        }
    }
}

impl PlacementOracle for RoundRobinPlacement {
    fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    fn workers(&self) -> u32 {
        self.workers
    }

    fn owner_worker(&self, gid: BlockId) -> WorkerId {
        gid % self.workers
    }
}
