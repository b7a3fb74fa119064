//! Monotonic 64-bit identifier source.
//!
//! Identifiers are `millis << 12 | sequence`: roughly time ordered, positive
//! for the next few centuries and strictly increasing within a process even
//! when the wall clock steps backwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use mockable::Clock;

use crate::domain::ports::IdGenerator;

const SEQUENCE_BITS: u32 = 12;

/// Clock-seeded identifier generator.
pub struct TimestampIdGenerator {
    clock: Arc<dyn Clock>,
    last: AtomicI64,
}

impl TimestampIdGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: AtomicI64::new(0),
        }
    }

    fn floor(&self) -> i64 {
        self.clock.utc().timestamp_millis().max(0) << SEQUENCE_BITS
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> i64 {
        let floor = self.floor();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(floor.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        floor.max(previous + 1)
    }
}
