// Global ceiling on deep topic fetches
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Shared countdown for deep topic fetches across one aggregation run.
///
/// Created once per run and threaded by handle into every caller that might
/// issue deep fetches (each org card and the grid), so the ceiling is global
/// rather than per-caller. A unit is taken per attempted fetch, success or
/// failure - the point is pacing outbound requests, not fairness, so a
/// failed attempt still counts. Callers may race between reading the
/// remainder and taking units; `try_take` never lets the counter go below
/// zero, so the worst case is slight under-fetching.
pub struct TopicBudget {
    remaining: AtomicU32,
}

impl TopicBudget {
    pub fn new(ceiling: u32) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicU32::new(ceiling),
        })
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Claim one deep fetch. Returns false once the budget is exhausted.
    pub fn try_take(&self) -> bool {
        let taken = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !taken {
            debug!("topic budget exhausted, skipping deep fetch");
        }
        taken
    }

    /// How many deep fetches a caller with `candidates` repos missing topics
    /// and a per-card cap of `card_cap` should attempt right now.
    pub fn plan(&self, card_cap: usize, candidates: usize) -> usize {
        candidates.min(card_cap).min(self.remaining() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_down_and_stops_at_zero() {
        let budget = TopicBudget::new(3);
        assert!(budget.try_take());
        assert!(budget.try_take());
        assert!(budget.try_take());
        assert!(!budget.try_take());
        assert!(!budget.try_take());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_plan_is_min_of_cap_candidates_and_budget() {
        let budget = TopicBudget::new(10);
        assert_eq!(budget.plan(5, 3), 3);
        assert_eq!(budget.plan(2, 8), 2);
        assert_eq!(budget.plan(20, 20), 10);

        for _ in 0..9 {
            budget.try_take();
        }
        assert_eq!(budget.plan(5, 5), 1);
    }

    #[tokio::test]
    async fn test_concurrent_takers_never_exceed_ceiling() {
        let budget = TopicBudget::new(8);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let budget = Arc::clone(&budget);
            handles.push(tokio::spawn(async move {
                let mut got = 0u32;
                for _ in 0..5 {
                    if budget.try_take() {
                        got += 1;
                    }
                }
                got
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 8);
        assert_eq!(budget.remaining(), 0);
    }
}
