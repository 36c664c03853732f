//! Work distribution across workers
//!
//! Faculties are handed out through a shared cursor: each worker claims the
//! next unclaimed index until the list is exhausted. Every index is claimed
//! exactly once no matter how many workers race for it, and an idle worker
//! never waits on a busy one.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared claim cursor over `len` work items
#[derive(Debug)]
pub struct WorkCursor {
    next: AtomicUsize,
    len: usize,
}

impl WorkCursor {
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    /// Claims the next item index, or None once everything has been handed out
    pub fn claim(&self) -> Option<usize> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        (index < self.len).then_some(index)
    }

    /// Number of items not yet claimed
    pub fn remaining(&self) -> usize {
        self.len.saturating_sub(self.next.load(Ordering::Relaxed))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Number of workers worth starting for `items` with at most `configured` workers
pub fn effective_workers(configured: usize, items: usize) -> usize {
    configured.min(items).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_claims_each_index_once() {
        let cursor = WorkCursor::new(3);
        assert_eq!(cursor.claim(), Some(0));
        assert_eq!(cursor.claim(), Some(1));
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.claim(), Some(2));
        assert_eq!(cursor.claim(), None);
        assert_eq!(cursor.claim(), None);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_empty_cursor() {
        let cursor = WorkCursor::new(0);
        assert!(cursor.is_empty());
        assert_eq!(cursor.claim(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_partition_the_work() {
        let cursor = Arc::new(WorkCursor::new(200));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cursor = cursor.clone();
            handles.push(tokio::spawn(async move {
                let mut mine = Vec::new();
                while let Some(index) = cursor.claim() {
                    mine.push(index);
                    tokio::task::yield_now().await;
                }
                mine
            }));
        }

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            let claimed = handle.await.unwrap();
            total += claimed.len();
            seen.extend(claimed);
        }
        assert_eq!(total, 200);
        assert_eq!(seen.len(), 200);
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(effective_workers(4, 10), 4);
        assert_eq!(effective_workers(4, 2), 2);
        assert_eq!(effective_workers(4, 0), 1);
    }
}
