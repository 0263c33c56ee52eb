/*!
 * Text persistence for the account directory.
 *
 * Layout:
 *
 * ```text
 * ========== USER DATA ==========
 * ID Username Email Password Status
 * USER: 101 tanvir tanvir@gmail.com 1234 Active
 *   TASK: 1001 Buy_milk 05/06/2025 Ongoing
 * ========== Total Users: 1 ==========
 * ```
 *
 * Fields are separated by runs of spaces. Spaces inside task titles are
 * written as underscores and read back as spaces, so a literal underscore
 * in a title comes back as a space.
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::directory::{Account, AccountDirectory};
use crate::error::Result;
use crate::ids::{AccountId, MAX_ID, TaskId};
use crate::task_manager::{Task, TaskStatus};

pub const HEADER_MARKER: &str = "USER DATA";
pub const HEADER_LINE: &str = "========== USER DATA ==========";
pub const COLUMN_HEADER_LINE: &str = "ID Username Email Password Status";
pub const ACCOUNT_MARKER: &str = "USER:";
pub const TASK_MARKER: &str = "TASK:";
pub const SUMMARY_MARKER: &str = "Total Users:";

const ACTIVE: &str = "Active";
const INACTIVE: &str = "Inactive";

/// What a load kept and what it threw away
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub accounts_loaded: usize,
    pub tasks_loaded: usize,
    pub accounts_discarded: usize,
    pub tasks_discarded: usize,
    /// Count written on the summary line, if one was reached.
    pub declared_total: Option<usize>,
}

pub fn escape_title(title: &str) -> String {
    title.replace(' ', "_")
}

pub fn unescape_title(token: &str) -> String {
    token.replace('_', " ")
}

pub fn serialize(directory: &AccountDirectory) -> String {
    let mut out = String::new();
    out.push_str(HEADER_LINE);
    out.push('\n');
    out.push_str(COLUMN_HEADER_LINE);
    out.push('\n');

    let mut written = 0usize;
    for account in directory.list_all() {
        if account.id() == 0 || account.username().is_empty() || account.email().is_empty() {
            warn!(account_id = account.id(), "Skipping malformed account while saving");
            continue;
        }
        out.push_str(&format!(
            "{} {} {} {} {} {}\n",
            ACCOUNT_MARKER,
            account.id(),
            account.username(),
            account.email(),
            account.password(),
            if account.is_active() { ACTIVE } else { INACTIVE },
        ));
        for task in account.tasks().all() {
            out.push_str(&format!(
                "  {} {} {} {} {}\n",
                TASK_MARKER,
                task.task_id,
                escape_title(&task.title),
                task.due_date,
                task.status.as_str(),
            ));
        }
        written += 1;
    }

    out.push_str(&format!("========== {} {} ==========\n", SUMMARY_MARKER, written));
    out
}

fn parse_account(tokens: &[&str]) -> Option<Account> {
    let [_, id, username, email, password, status, ..] = tokens else {
        return None;
    };
    let id: AccountId = id.parse().ok()?;
    if id == 0 || id > MAX_ID || username.is_empty() || email.is_empty() {
        return None;
    }
    Some(Account::new(
        id,
        username.to_string(),
        email.to_string(),
        password.to_string(),
        *status == ACTIVE,
    ))
}

fn parse_task(tokens: &[&str]) -> Option<Task> {
    let [_, task_id, title, due_date, status, ..] = tokens else {
        return None;
    };
    let task_id: TaskId = task_id.parse().ok()?;
    if task_id == 0 || task_id > MAX_ID {
        return None;
    }
    Some(Task {
        task_id,
        title: unescape_title(title),
        due_date: due_date.to_string(),
        status: TaskStatus::parse(status)?,
    })
}

/// Parses a data file into a fresh directory with resynchronised counters.
/// Malformed records are dropped; a dropped account takes its task lines with it.
pub fn deserialize(input: &str) -> (AccountDirectory, LoadReport) {
    let mut directory = AccountDirectory::new();
    let mut report = LoadReport::default();
    let mut lines = input.lines();

    if lines.by_ref().any(|line| line.contains(HEADER_MARKER)) {
        lines.next();
    }

    // Account currently collecting task lines. `None` after a rejected
    // account line, so its tasks are dropped instead of landing elsewhere.
    let mut current: Option<Account> = None;

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first().copied() {
            Some(ACCOUNT_MARKER) => {
                flush(&mut directory, &mut report, current.take());
                current = parse_account(&tokens);
                if current.is_none() {
                    warn!(line = %line, "Discarding malformed account record");
                    report.accounts_discarded += 1;
                }
            }
            Some(TASK_MARKER) => {
                let Some(account) = current.as_mut() else {
                    debug!(line = %line, "Discarding task without an owning account");
                    report.tasks_discarded += 1;
                    continue;
                };
                let inserted = match parse_task(&tokens) {
                    Some(task) => account.tasks_mut().insert(task),
                    None => false,
                };
                if !inserted {
                    warn!(account_id = account.id(), line = %line, "Discarding malformed task record");
                    report.tasks_discarded += 1;
                }
            }
            _ if line.contains(SUMMARY_MARKER) => {
                report.declared_total = line
                    .split(SUMMARY_MARKER)
                    .nth(1)
                    .and_then(|rest| rest.split_whitespace().next())
                    .and_then(|n| n.parse().ok());
                break;
            }
            _ => {}
        }
    }
    flush(&mut directory, &mut report, current);
    directory.resync_counters();

    if let Some(declared) = report.declared_total {
        if declared != report.accounts_loaded {
            warn!(declared, loaded = report.accounts_loaded, "Account count differs from summary line");
        }
    }
    (directory, report)
}

fn flush(directory: &mut AccountDirectory, report: &mut LoadReport, account: Option<Account>) {
    let Some(account) = account else {
        return;
    };
    let id = account.id();
    let tasks = account.tasks().len();
    match directory.restore(account) {
        Ok(()) => {
            report.accounts_loaded += 1;
            report.tasks_loaded += tasks;
        }
        Err(e) => {
            warn!(account_id = id, error = %e, "Discarding conflicting account record");
            report.accounts_discarded += 1;
            report.tasks_discarded += tasks;
        }
    }
}

/// Reads and writes the directory at one path, with timestamped backups beside it.
pub struct StorageManager {
    data_file: PathBuf,
}

impl StorageManager {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    fn data_dir(&self) -> PathBuf {
        match self.data_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn backup_prefix(&self) -> String {
        let stem = self
            .data_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("data");
        format!("{}_backup_", stem)
    }

    pub fn save(&self, directory: &AccountDirectory) -> Result<()> {
        let dir = self.data_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        fs::write(&self.data_file, serialize(directory))?;
        info!(path = ?self.data_file, accounts = directory.len(), "Saved data file");
        Ok(())
    }

    /// A missing file yields an empty directory.
    pub fn load(&self) -> Result<AccountDirectory> {
        self.load_with_report().map(|(directory, _)| directory)
    }

    pub fn load_with_report(&self) -> Result<(AccountDirectory, LoadReport)> {
        let content = match fs::read_to_string(&self.data_file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = ?self.data_file, "No data file yet, starting empty");
                return Ok((AccountDirectory::new(), LoadReport::default()));
            }
            Err(e) => return Err(e.into()),
        };
        let (directory, report) = deserialize(&content);
        info!(
            path = ?self.data_file,
            accounts = report.accounts_loaded,
            tasks = report.tasks_loaded,
            discarded = report.accounts_discarded + report.tasks_discarded,
            "Loaded data file"
        );
        Ok((directory, report))
    }

    pub fn create_backup(&self) -> Result<PathBuf> {
        if !self.data_file.exists() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "data file does not exist").into());
        }
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let backup_path = self
            .data_dir()
            .join(format!("{}{}.txt", self.backup_prefix(), timestamp));
        fs::copy(&self.data_file, &backup_path)?;
        info!(path = ?backup_path, "Created backup");
        Ok(backup_path)
    }

    /// Backups of this data file, oldest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let mut backups = Vec::new();
        let dir = self.data_dir();
        if !dir.exists() {
            return Ok(backups);
        }
        let prefix = self.backup_prefix();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with(&prefix) && name.ends_with(".txt") {
                    backups.push(path);
                }
            }
        }
        backups.sort();
        Ok(backups)
    }

    pub fn cleanup_old_backups(&self, keep_count: usize) -> Result<usize> {
        let backups = self.list_backups()?;
        if backups.len() <= keep_count {
            return Ok(0);
        }
        let to_remove = backups.len() - keep_count;
        for backup in backups.iter().take(to_remove) {
            fs::remove_file(backup)?;
            debug!(path = ?backup, "Removed old backup");
        }
        Ok(to_remove)
    }

    /// Replaces the data file with a backup, backing up the current file first.
    pub fn restore_from_backup(&self, backup_path: &Path) -> Result<()> {
        if !backup_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("backup file does not exist: {:?}", backup_path),
            )
            .into());
        }
        if self.data_file.exists() {
            self.create_backup()?;
        }
        fs::copy(backup_path, &self.data_file)?;
        info!(path = ?backup_path, "Restored from backup");
        Ok(())
    }
}
