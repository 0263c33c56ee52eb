/*!
 * TaskDesk Handler Module
 *
 * The boundary that front ends call into. It validates input before it
 * reaches the directory, tracks failed logins for the lockout rule, keeps
 * the statistics cache fresh and drives persistence.
 */

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::directory::{Account, AccountDirectory};
use crate::error::{Result, StoreError};
use crate::ids::{AccountId, TaskId};
use crate::search_engine::{AccountFilter, SearchResult};
use crate::statistics::{AccountTaskSummary, DirectoryStatistics, StatisticsAggregator};
use crate::storage::{LoadReport, StorageManager};
use crate::task_manager::{Task, TaskEdit};
use crate::validation::{ValidationConfig, ValidationEngine};

#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub data_file: PathBuf,
    /// Consecutive wrong passwords before the account is deactivated.
    pub max_login_attempts: u32,
    pub backup_on_save: bool,
    pub backups_to_keep: usize,
    pub validation: ValidationConfig,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data.txt"),
            max_login_attempts: 3,
            backup_on_save: false,
            backups_to_keep: 5,
            validation: ValidationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    Success { account_id: AccountId },
    UnknownUser,
    Inactive,
    WrongPassword { attempts_left: u32 },
    /// This attempt used up the allowance and the account was deactivated.
    LockedOut,
}

pub struct TaskDeskHandler {
    directory: AccountDirectory,
    statistics: StatisticsAggregator,
    validation: ValidationEngine,
    storage: StorageManager,
    failed_logins: HashMap<AccountId, u32>,
    config: HandlerConfig,
}

impl TaskDeskHandler {
    /// Starts with an empty directory; call `load` to read the data file.
    pub fn new(config: HandlerConfig) -> anyhow::Result<Self> {
        let validation = ValidationEngine::new(Some(config.validation.clone()))?;
        let storage = StorageManager::new(config.data_file.clone());
        Ok(Self {
            directory: AccountDirectory::new(),
            statistics: StatisticsAggregator::new(),
            validation,
            storage,
            failed_logins: HashMap::new(),
            config,
        })
    }

    pub fn open(config: HandlerConfig) -> anyhow::Result<Self> {
        let mut handler = Self::new(config)?;
        handler.load()?;
        Ok(handler)
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Replaces the in-memory directory with the file contents. On error the
    /// current directory is left as it was.
    pub fn load(&mut self) -> Result<LoadReport> {
        let (directory, report) = self.storage.load_with_report()?;
        self.directory = directory;
        self.failed_logins.clear();
        self.statistics.recompute(&self.directory);
        Ok(report)
    }

    pub fn save(&self) -> Result<()> {
        if self.config.backup_on_save && self.storage.data_file().exists() {
            self.storage.create_backup()?;
            self.storage.cleanup_old_backups(self.config.backups_to_keep)?;
        }
        self.storage.save(&self.directory)
    }

    /// Replaces the directory with the three demo accounts.
    pub fn seed_sample_accounts(&mut self) -> Result<()> {
        self.directory = AccountDirectory::with_sample_accounts()?;
        self.failed_logins.clear();
        self.statistics.recompute(&self.directory);
        Ok(())
    }

    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<AccountId> {
        self.validation.validate_username(username)?;
        self.validation.validate_email(email)?;
        self.validation.validate_password(password)?;
        self.directory.create(username, email, password)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginOutcome> {
        let Some(account) = self.directory.find_by_username(username) else {
            return Ok(LoginOutcome::UnknownUser);
        };
        let account_id = account.id();
        if !account.is_active() {
            return Ok(LoginOutcome::Inactive);
        }
        if self.directory.authenticate(username, password) {
            self.failed_logins.remove(&account_id);
            info!(account_id, "Login succeeded");
            return Ok(LoginOutcome::Success { account_id });
        }

        let failures = self.failed_logins.entry(account_id).or_insert(0);
        *failures += 1;
        if *failures < self.config.max_login_attempts {
            return Ok(LoginOutcome::WrongPassword {
                attempts_left: self.config.max_login_attempts - *failures,
            });
        }
        self.failed_logins.remove(&account_id);
        self.directory.toggle_activation(account_id)?;
        warn!(account_id, "Account deactivated after repeated failed logins");
        Ok(LoginOutcome::LockedOut)
    }

    pub fn failed_login_count(&self, account_id: AccountId) -> u32 {
        self.failed_logins.get(&account_id).copied().unwrap_or(0)
    }

    pub fn change_username(&mut self, account_id: AccountId, new_username: &str) -> Result<()> {
        self.validation.validate_username(new_username)?;
        self.directory.rename(account_id, new_username)
    }

    pub fn change_email(&mut self, account_id: AccountId, new_email: &str) -> Result<()> {
        self.validation.validate_email(new_email)?;
        self.directory.change_email(account_id, new_email)
    }

    pub fn change_password(&mut self, account_id: AccountId, new_password: &str) -> Result<()> {
        self.validation.validate_password(new_password)?;
        self.directory.change_password(account_id, new_password)
    }

    pub fn toggle_activation(&mut self, account_id: AccountId) -> Result<bool> {
        let active = self.directory.toggle_activation(account_id)?;
        if active {
            self.failed_logins.remove(&account_id);
        }
        Ok(active)
    }

    pub fn delete_account(&mut self, account_id: AccountId) -> Result<Account> {
        let account = self.directory.delete(account_id)?;
        self.failed_logins.remove(&account_id);
        Ok(account)
    }

    pub fn add_task(&mut self, account_id: AccountId, title: &str, due_date: &str) -> Result<TaskId> {
        self.validation.validate_title(title)?;
        self.validation.validate_due_date(due_date)?;
        self.directory.add_task(account_id, title, due_date)
    }

    pub fn edit_task(&mut self, account_id: AccountId, task_id: TaskId, edit: TaskEdit) -> Result<()> {
        match &edit {
            TaskEdit::Title(title) => self.validation.validate_title(title)?,
            TaskEdit::DueDate(due_date) => self.validation.validate_due_date(due_date)?,
            TaskEdit::Status(_) => {}
        }
        self.directory.edit_task(account_id, task_id, edit)
    }

    pub fn mark_task_completed(&mut self, account_id: AccountId, task_id: TaskId) -> Result<()> {
        self.directory.mark_task_completed(account_id, task_id)
    }

    pub fn delete_task(&mut self, account_id: AccountId, task_id: TaskId) -> Result<Task> {
        self.directory.delete_task(account_id, task_id)
    }

    pub fn tasks(&self, account_id: AccountId) -> Result<Vec<&Task>> {
        Ok(self.directory.tasks(account_id)?.all().collect())
    }

    pub fn search(&self, keyword: &str) -> SearchResult<'_> {
        self.directory.search_detailed(keyword)
    }

    pub fn filter(&self, filter: AccountFilter) -> Vec<&Account> {
        self.directory.filter(filter)
    }

    /// Fresh counts; recomputed on every call.
    pub fn dashboard(&mut self) -> DirectoryStatistics {
        *self.statistics.recompute(&self.directory)
    }

    pub fn task_report(&self) -> Vec<AccountTaskSummary> {
        AccountTaskSummary::for_directory(&self.directory)
    }

    pub fn require_account(&self, account_id: AccountId) -> Result<&Account> {
        self.directory
            .find_by_id(account_id)
            .ok_or(StoreError::AccountNotFound(account_id))
    }
}
