use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::ports::interactions::TargetTransaction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Likes,
    Comments,
}

impl CounterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CounterKind::Likes => "like_count",
            CounterKind::Comments => "comment_count",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterDelta {
    Increment,
    Decrement,
}

impl CounterDelta {
    /// Decrement is floored at zero.
    pub fn apply(self, current: u64) -> u64 {
        match self {
            CounterDelta::Increment => current.saturating_add(1),
            CounterDelta::Decrement => current.saturating_sub(1),
        }
    }
}

/// Denormalized per-wish counters.
///
/// Adjustments only happen through an open [`TargetTransaction`], whose
/// holder already owns the wish lock; no locking is done here.
pub struct AggregateCounter;

impl AggregateCounter {
    pub async fn adjust(
        tx: &mut dyn TargetTransaction,
        kind: CounterKind,
        delta: CounterDelta,
    ) -> DomainResult<u64> {
        let current = tx.wish().counter(kind);
        let next = delta.apply(current);
        if delta == CounterDelta::Decrement && current == 0 {
            tracing::warn!(
                wish_id = %tx.wish().wish_id,
                counter = kind.as_str(),
                "decrement on zero counter clamped"
            );
        }
        tx.write_counter(kind, next).await?;
        Ok(next)
    }
}
