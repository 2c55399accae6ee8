//! In-memory pending queue keyed by (user, event).

use std::collections::BTreeMap;

use crate::core::model::{PendingDelivery, PendingKey, UserId};
use crate::core::{NotifyError, PendingQueue};

/// In-memory queue storing pending deliveries in key order.
/// Entries of one user are contiguous, so lookups are a range scan.
pub struct InMemoryPendingQueue {
    max_depth: usize,
    entries: BTreeMap<PendingKey, PendingDelivery>,
}

impl InMemoryPendingQueue {
    /// Create a new in-memory queue with a maximum depth.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            entries: BTreeMap::new(),
        }
    }
}

pub(crate) fn user_range(user_id: UserId) -> std::ops::RangeInclusive<PendingKey> {
    PendingKey {
        user_id,
        event_id: i64::MIN,
    }..=PendingKey {
        user_id,
        event_id: i64::MAX,
    }
}

pub(crate) fn check_insert(
    entries: &BTreeMap<PendingKey, PendingDelivery>,
    max_depth: usize,
    entry: &PendingDelivery,
) -> Result<(), NotifyError> {
    if entries.contains_key(&entry.key) {
        return Err(NotifyError::DuplicatePending {
            user_id: entry.key.user_id,
            event_id: entry.key.event_id,
        });
    }
    if entries.len() >= max_depth {
        return Err(NotifyError::QueueFull("max queue depth reached".into()));
    }
    Ok(())
}

impl PendingQueue for InMemoryPendingQueue {
    fn insert(&mut self, entry: PendingDelivery) -> Result<(), NotifyError> {
        check_insert(&self.entries, self.max_depth, &entry)?;
        self.entries.insert(entry.key, entry);
        Ok(())
    }

    fn find_by_user(&self, user_id: UserId) -> Result<Vec<PendingDelivery>, NotifyError> {
        Ok(self
            .entries
            .range(user_range(user_id))
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn delete(&mut self, key: &PendingKey) -> Result<bool, NotifyError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry(user_id: UserId, event_id: i64) -> PendingDelivery {
        let at = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        PendingDelivery::new(user_id, event_id, at)
    }

    #[test]
    fn test_find_by_user_is_grouped() {
        let mut q = InMemoryPendingQueue::new(100);
        q.insert(entry(2, 10)).unwrap();
        q.insert(entry(1, 11)).unwrap();
        q.insert(entry(2, 12)).unwrap();
        q.insert(entry(3, 10)).unwrap();

        let events: Vec<_> = q
            .find_by_user(2)
            .unwrap()
            .into_iter()
            .map(|e| e.key.event_id)
            .collect();
        assert_eq!(events, vec![10, 12]);
        assert!(q.find_by_user(9).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut q = InMemoryPendingQueue::new(100);
        q.insert(entry(1, 1)).unwrap();
        let err = q.insert(entry(1, 1)).unwrap_err();
        assert!(matches!(
            err,
            NotifyError::DuplicatePending {
                user_id: 1,
                event_id: 1
            }
        ));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_queue_full() {
        let mut q = InMemoryPendingQueue::new(2);
        q.insert(entry(1, 1)).unwrap();
        q.insert(entry(1, 2)).unwrap();
        assert!(matches!(q.insert(entry(1, 3)), Err(NotifyError::QueueFull(_))));
    }

    #[test]
    fn test_delete() {
        let mut q = InMemoryPendingQueue::new(10);
        q.insert(entry(1, 1)).unwrap();
        let key = PendingKey {
            user_id: 1,
            event_id: 1,
        };
        assert!(q.delete(&key).unwrap());
        assert!(!q.delete(&key).unwrap());
        assert!(q.is_empty());
    }
}
