//! Per-user daily quota enforcement
//!
//! Each user has one quota row `(last_updated, name_count)` that resets to
//! zero on the first request of a new calendar day; there is no background
//! sweep. The guard splits checking from committing: the check runs before
//! inference and mutates nothing except the day rollover, the commit runs only
//! after inference succeeded, so a failed classification never consumes quota.

use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;

/// One user's quota row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserQuota {
    pub last_updated: NaiveDate,
    pub name_count: u64,
}

/// Persistence boundary for quota rows
pub trait QuotaStore: Send + Sync {
    fn get_quota(&self, user_id: &str) -> Result<Option<UserQuota>>;
    fn upsert_quota(&self, user_id: &str, quota: UserQuota) -> Result<()>;
}

/// Enforces the per-request cap and the rolling daily quota.
///
/// Pure function over an injected store handle; no module-level state.
pub struct QuotaGuard {
    max_names_per_request: usize,
    daily_quota: u64,
}

impl QuotaGuard {
    pub fn new(max_names_per_request: usize, daily_quota: u64) -> Self {
        Self {
            max_names_per_request,
            daily_quota,
        }
    }

    /// Current usage for the day, applying and persisting the day rollover.
    ///
    /// A stored date strictly before `today` resets the count to zero and
    /// advances the row; this is the sole reset trigger.
    fn usage_today(&self, store: &dyn QuotaStore, user_id: &str, today: NaiveDate) -> Result<u64> {
        match store.get_quota(user_id)? {
            Some(quota) if quota.last_updated < today => {
                let reset = UserQuota {
                    last_updated: today,
                    name_count: 0,
                };
                store.upsert_quota(user_id, reset)?;
                Ok(0)
            }
            Some(quota) => Ok(quota.name_count),
            None => Ok(0),
        }
    }

    /// Check a request of `name_count` names against both caps.
    ///
    /// Fails with `TOO_MANY_NAMES` or `QUOTA_EXCEEDED` (reporting the
    /// overage); no usage is recorded here.
    pub fn check(
        &self,
        store: &dyn QuotaStore,
        user_id: &str,
        name_count: usize,
        today: NaiveDate,
    ) -> Result<()> {
        if name_count > self.max_names_per_request {
            return Err(EngineError::TooManyNames {
                max: self.max_names_per_request,
            });
        }

        let used = self.usage_today(store, user_id, today)?;
        let requested = name_count as u64;
        if used + requested > self.daily_quota {
            return Err(EngineError::QuotaExceeded {
                overage: used + requested - self.daily_quota,
            });
        }

        Ok(())
    }

    /// Record `name_count` names against today's usage.
    ///
    /// Called only after a successful classification; charging is
    /// at-most-once per request.
    pub fn commit(
        &self,
        store: &dyn QuotaStore,
        user_id: &str,
        name_count: usize,
        today: NaiveDate,
    ) -> Result<()> {
        let used = self.usage_today(store, user_id, today)?;
        store.upsert_quota(
            user_id,
            UserQuota {
                last_updated: today,
                name_count: used + name_count as u64,
            },
        )
    }
}

/// In-memory quota store for tests and single-node deployments
#[derive(Default)]
pub struct InMemoryQuotaStore {
    rows: Mutex<HashMap<String, UserQuota>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuotaStore for InMemoryQuotaStore {
    fn get_quota(&self, user_id: &str) -> Result<Option<UserQuota>> {
        Ok(self.rows.lock().get(user_id).copied())
    }

    fn upsert_quota(&self, user_id: &str, quota: UserQuota) -> Result<()> {
        self.rows.lock().insert(user_id.to_string(), quota);
        Ok(())
    }
}
