use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::BorrowerId;

/// one mutex per borrower; different borrowers never contend
#[derive(Debug, Default)]
pub struct BorrowerLocks {
    slots: Mutex<HashMap<BorrowerId, Arc<Mutex<()>>>>,
}

impl BorrowerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// run `f` while holding the lock for `borrower_id`
    pub fn with_lock<T>(&self, borrower_id: BorrowerId, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(borrower_id).or_default())
        };
        let _guard = slot.lock();
        f()
    }

    /// drop the slot of a deleted borrower unless someone is queued on it
    pub fn forget(&self, borrower_id: BorrowerId) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(&borrower_id) {
            if Arc::strong_count(slot) == 1 {
                slots.remove(&borrower_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
