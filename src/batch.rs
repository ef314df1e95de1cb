use std::num::NonZeroUsize;

use crate::normalize::WireRecord;

pub const DEFAULT_ROLLUP_NUM: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

/// Records handed to the dispatcher as one ingest request.
pub type Batch = Vec<WireRecord>;

/// Splits a record stream into batches of at most `rollup_num` records.
#[derive(Debug, Clone)]
pub struct BatchAccumulator {
    batch: Batch,
    rollup_num: NonZeroUsize,
}
impl BatchAccumulator {
    pub fn new(rollup_num: NonZeroUsize) -> Self {
        Self {
            batch: Batch::with_capacity(rollup_num.get()),
            rollup_num,
        }
    }

    /// Returns the full batch once `record` completes it.
    pub fn push(&mut self, record: WireRecord) -> Option<Batch> {
        self.batch.push(record);
        if self.batch.len() < self.rollup_num.get() {
            return None;
        }
        let next = Batch::with_capacity(self.rollup_num.get());
        Some(std::mem::replace(&mut self.batch, next))
    }

    /// Returns the partial batch left over, if any.
    pub fn finish(self) -> Option<Batch> {
        if self.batch.is_empty() {
            return None;
        }
        Some(self.batch)
    }
}
