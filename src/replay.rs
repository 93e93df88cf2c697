use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::ReplayError;
use crate::hub::GestureEvent;

/// Bounded ring of the most recently sequenced events, used to backfill
/// sessions that ask for replay. Entries are contiguous in sequence number;
/// eviction is strictly FIFO.
pub struct ReplayBuffer {
    events: VecDeque<Arc<GestureEvent>>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Append a newly sequenced event, evicting the oldest entry when full.
    pub fn append(&mut self, event: Arc<GestureEvent>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Sequence number of the newest retained event.
    pub fn head(&self) -> Option<u64> {
        self.events.back().map(|e| e.sequence)
    }

    /// Sequence number of the oldest retained event.
    pub fn oldest(&self) -> Option<u64> {
        self.events.front().map(|e| e.sequence)
    }

    /// Events from `from` through the current head, in sequence order.
    ///
    /// A start below the oldest retained entry has been evicted and fails
    /// with `RangeExpired`; a start beyond the head yields nothing.
    pub fn range(&self, from: u64) -> Result<Vec<Arc<GestureEvent>>, ReplayError> {
        let (oldest, head) = match (self.oldest(), self.head()) {
            (Some(o), Some(h)) => (o, h),
            // Nothing sequenced yet, so nothing was missed.
            _ => return Ok(Vec::new()),
        };
        if from > head {
            return Ok(Vec::new());
        }
        if from < oldest {
            return Err(ReplayError::RangeExpired {
                oldest_retained: oldest,
            });
        }
        let start = (from - oldest) as usize;
        Ok(self.events.iter().skip(start).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
