use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Volume;

/// Direction of a storage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Buy gas and put it into storage.
    Injection,
    /// Take gas out of storage and sell it.
    Withdrawal,
}

/// A caller-supplied injection or withdrawal: date and volume only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledVolume {
    pub date: NaiveDate,
    pub volume: Volume,
}

/// A scheduled volume tagged with its direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub date: NaiveDate,
    pub volume: Volume,
    pub kind: EventKind,
}

impl StorageEvent {
    pub fn injection(date: NaiveDate, volume: Volume) -> Self {
        Self {
            date,
            volume,
            kind: EventKind::Injection,
        }
    }

    pub fn withdrawal(date: NaiveDate, volume: Volume) -> Self {
        Self {
            date,
            volume,
            kind: EventKind::Withdrawal,
        }
    }
}

/// Merge injections and withdrawals into one chronological sequence.
///
/// Each list is stable-sorted by date, injections are appended before
/// withdrawals, and the result is stable-sorted by date again. On a shared
/// date every injection therefore precedes every withdrawal, and each side
/// keeps its original relative order.
pub fn merge_events(injections: &[ScheduledVolume], withdrawals: &[ScheduledVolume]) -> Vec<StorageEvent> {
    let mut sorted_injections = injections.to_vec();
    sorted_injections.sort_by_key(|e| e.date);
    let mut sorted_withdrawals = withdrawals.to_vec();
    sorted_withdrawals.sort_by_key(|e| e.date);

    let mut events: Vec<StorageEvent> = sorted_injections
        .into_iter()
        .map(|e| StorageEvent::injection(e.date, e.volume))
        .chain(
            sorted_withdrawals
                .into_iter()
                .map(|e| StorageEvent::withdrawal(e.date, e.volume)),
        )
        .collect();
    events.sort_by_key(|e| e.date);
    events
}
