//! Ordered journal of registry state transitions

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use nfid_types::{Address, Nfid};

/// What changed in a single transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEventKind {
    Minted {
        address: Address,
        nfid: Nfid,
    },
    Replaced {
        address: Address,
        previous: Nfid,
        nfid: Nfid,
    },
    Burned {
        address: Address,
        nfid: Nfid,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEvent {
    /// Strictly increasing, starting at 1.
    pub seq: u64,
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub kind: RegistryEventKind,
}

/// Bounded in-memory event log. Oldest entries are dropped first.
#[derive(Debug)]
pub(crate) struct EventJournal {
    events: VecDeque<RegistryEvent>,
    capacity: usize,
    last_seq: u64,
}

impl EventJournal {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            last_seq: 0,
        }
    }

    pub(crate) fn record(&mut self, kind: RegistryEventKind) -> u64 {
        self.last_seq += 1;
        if self.capacity == 0 {
            return self.last_seq;
        }

        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(RegistryEvent {
            seq: self.last_seq,
            timestamp_ms: now_ms(),
            kind,
        });
        self.last_seq
    }

    pub(crate) fn since(&self, seq: u64) -> Vec<RegistryEvent> {
        // Sequence numbers are contiguous, so the retained window can be indexed.
        let first = match self.events.front() {
            Some(event) => event.seq,
            None => return Vec::new(),
        };
        let skip = seq.saturating_sub(first - 1) as usize;
        self.events.iter().skip(skip).cloned().collect()
    }

    pub(crate) fn last_seq(&self) -> u64 {
        self.last_seq
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
