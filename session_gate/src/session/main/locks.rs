use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed table of per-subject async locks
///
/// Entries exist only while someone holds or waits for the lock.
#[derive(Debug, Default)]
pub(crate) struct SubjectLocks {
    table: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl SubjectLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `subject_id`
    pub(crate) async fn lock(&self, subject_id: &str) -> SubjectGuard {
        let entry = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table
                .entry(subject_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = entry.lock_owned().await;

        SubjectGuard {
            subject_id: subject_id.to_string(),
            table: Arc::clone(&self.table),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one subject, released on drop
#[derive(Debug)]
pub(crate) struct SubjectGuard {
    subject_id: String,
    table: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SubjectGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let mutex = Arc::clone(OwnedMutexGuard::mutex(&guard));
        drop(guard);

        // Two references left: the table entry and `mutex`, so nobody else waits
        if let Some(entry) = table.get(&self.subject_id) {
            if Arc::ptr_eq(entry, &mutex) && Arc::strong_count(&mutex) == 2 {
                table.remove(&self.subject_id);
            }
        }
    }
}
