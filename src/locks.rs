use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::errors::Result;
use crate::types::LoanId;

/// per-loan mutual exclusion.
///
/// Each loan id maps to its own mutex, so work on one loan is serialized while
/// different loans never wait on each other. An entry lives only while some caller
/// holds or waits on it.
#[derive(Debug, Default)]
pub struct LoanLocks {
    locks: Mutex<HashMap<LoanId, Arc<Mutex<()>>>>,
}

impl LoanLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, loan_id: LoanId) -> Arc<Mutex<()>> {
        // the registry only holds unit mutexes, a poisoned guard has no state to corrupt
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(loan_id).or_default().clone()
    }

    fn release(&self, loan_id: LoanId, handle: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // the registry and this caller hold the last two references
        if Arc::strong_count(&handle) == 2 {
            locks.remove(&loan_id);
        }
    }

    /// run `op` while holding the loan's lock
    pub fn with_lock<T>(&self, loan_id: LoanId, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let handle = self.handle(loan_id);
        let result = {
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            op()
        };
        self.release(loan_id, handle);
        result
    }

    /// run `op` under the loan's lock, re-running it after a lost-update conflict.
    ///
    /// `op` must reload the loan on every call. Conflicts are retried at most
    /// `max_retries` times, every other error is returned as is.
    pub fn run_exclusive<T>(
        &self,
        loan_id: LoanId,
        max_retries: u32,
        mut op: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            match self.with_lock(loan_id, &mut op) {
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    warn!(%loan_id, attempt, error = %err, "retrying after concurrent update");
                }
                result => return result,
            }
        }
    }

    /// number of loans currently locked or waited on
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.len())
            .unwrap_or_default()
    }
}
