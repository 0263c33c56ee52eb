/*!
 * Statistics Module
 *
 * Derived dashboard counts. The directory is the source of truth; these
 * numbers are recomputed from it with one full scan and cached until the
 * next `recompute`.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::directory::{Account, AccountDirectory};
use crate::ids::AccountId;

/// Directory-wide counts
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryStatistics {
    pub total_accounts: usize,
    pub active_accounts: usize,
    pub inactive_accounts: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub ongoing_tasks: usize,
}

impl DirectoryStatistics {
    pub fn collect(directory: &AccountDirectory) -> Self {
        let mut stats = DirectoryStatistics {
            total_accounts: directory.len(),
            ..Default::default()
        };
        for account in directory.list_all() {
            if account.is_active() {
                stats.active_accounts += 1;
            }
            stats.total_tasks += account.tasks().len();
            stats.completed_tasks += account.tasks().completed_count();
        }
        stats.inactive_accounts = stats.total_accounts - stats.active_accounts;
        stats.ongoing_tasks = stats.total_tasks - stats.completed_tasks;
        stats
    }
}

/// Per-account task breakdown, as shown in the all-accounts task report
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AccountTaskSummary {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub ongoing_tasks: usize,
}

impl AccountTaskSummary {
    pub fn for_account(account: &Account) -> Self {
        let total = account.tasks().len();
        let completed = account.tasks().completed_count();
        Self {
            account_id: account.id(),
            username: account.username().to_string(),
            email: account.email().to_string(),
            is_active: account.is_active(),
            total_tasks: total,
            completed_tasks: completed,
            ongoing_tasks: total - completed,
        }
    }

    pub fn for_directory(directory: &AccountDirectory) -> Vec<Self> {
        directory.list_all().into_iter().map(Self::for_account).collect()
    }
}

/// Read-side cache of `DirectoryStatistics`
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    current: DirectoryStatistics,
    recomputed_at: Option<DateTime<Utc>>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recompute(&mut self, directory: &AccountDirectory) -> &DirectoryStatistics {
        self.current = DirectoryStatistics::collect(directory);
        self.recomputed_at = Some(Utc::now());
        debug!(
            accounts = self.current.total_accounts,
            tasks = self.current.total_tasks,
            "Recomputed statistics"
        );
        &self.current
    }

    /// Counts as of the last `recompute`.
    pub fn current(&self) -> &DirectoryStatistics {
        &self.current
    }

    pub fn recomputed_at(&self) -> Option<DateTime<Utc>> {
        self.recomputed_at
    }

    pub fn total_accounts(&self) -> usize {
        self.current.total_accounts
    }

    pub fn active_accounts(&self) -> usize {
        self.current.active_accounts
    }

    pub fn total_tasks(&self) -> usize {
        self.current.total_tasks
    }

    pub fn completed_tasks(&self) -> usize {
        self.current.completed_tasks
    }
}
