/*!
 * Account directory: the primary table of accounts plus the username and
 * email indices and their uniqueness sets.
 *
 * Entities live only in `accounts`; every other structure stores keys. All
 * checks that can fail run before the first structure is mutated, so an
 * error never leaves the indices half-updated.
 */

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::ids::{AccountId, IdAllocator, MAX_ID, TaskId};
use crate::search_engine::{self, AccountFilter, SearchResult};
use crate::task_manager::{Task, TaskCollection, TaskEdit};
use crate::validation::require_token;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    username: String,
    email: String,
    #[serde(skip_serializing)]
    password: String,
    is_active: bool,
    tasks: TaskCollection,
}

impl Account {
    /// Builds a detached account, e.g. from a parsed record. It only becomes
    /// visible once handed to `AccountDirectory::restore`.
    pub fn new(id: AccountId, username: String, email: String, password: String, is_active: bool) -> Self {
        Self {
            id,
            username,
            email,
            password,
            is_active,
            tasks: TaskCollection::new(id),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Stored verbatim; there is no hashing.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    /// Task collection of a detached account. Accounts inside a directory
    /// are reached through `AccountDirectory::tasks_mut` instead.
    pub fn tasks_mut(&mut self) -> &mut TaskCollection {
        &mut self.tasks
    }
}

#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: HashMap<AccountId, Account>,
    by_username: HashMap<String, AccountId>,
    by_email: HashMap<String, AccountId>,
    used_usernames: HashSet<String>,
    used_emails: HashSet<String>,
    account_ids: IdAllocator,
    task_ids: IdAllocator,
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            by_username: HashMap::new(),
            by_email: HashMap::new(),
            used_usernames: HashSet::new(),
            used_emails: HashSet::new(),
            account_ids: IdAllocator::accounts(),
            task_ids: IdAllocator::tasks(),
        }
    }

    /// Three demo accounts, IDs 101 to 103.
    pub fn with_sample_accounts() -> Result<Self> {
        let mut directory = Self::new();
        directory.create("tanvir", "tanvir@gmail.com", "1234")?;
        directory.create("sadik", "sadik@gmail.com", "abcd")?;
        directory.create("Himel", "Himel@gmail.com", "abcd")?;
        Ok(directory)
    }

    fn check_unique(&self, username: &str, email: &str) -> Result<()> {
        if !self.is_username_unique(username) {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }
        if !self.is_email_unique(email) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }
        Ok(())
    }

    fn index(&mut self, account: Account) {
        self.by_username.insert(account.username.clone(), account.id);
        self.used_usernames.insert(account.username.clone());
        self.by_email.insert(account.email.clone(), account.id);
        self.used_emails.insert(account.email.clone());
        self.accounts.insert(account.id, account);
    }

    fn check_storable(username: &str, email: &str, password: &str) -> Result<()> {
        require_token("username", username)?;
        require_token("email", email)?;
        require_token("password", password)
    }

    /// Registers a new active account with an empty task list. Each field
    /// must be a single non-empty token so the record survives a save.
    pub fn create(&mut self, username: &str, email: &str, password: &str) -> Result<AccountId> {
        Self::check_storable(username, email, password)?;
        self.check_unique(username, email)?;
        let id = loop {
            let id = self
                .account_ids
                .allocate()
                .ok_or(StoreError::IdsExhausted("account"))?;
            if !self.accounts.contains_key(&id) {
                break id;
            }
        };
        let account = Account::new(id, username.to_string(), email.to_string(), password.to_string(), true);
        self.index(account);
        info!(account_id = id, username = %username, "Created account");
        Ok(id)
    }

    /// Inserts a pre-numbered account together with its tasks. Used by the
    /// loader; counters are only advanced, never rewound.
    pub fn restore(&mut self, account: Account) -> Result<()> {
        if account.id == 0 || account.id > MAX_ID {
            return Err(StoreError::validation("id", format!("account id must be between 1 and {}", MAX_ID)));
        }
        Self::check_storable(&account.username, &account.email, &account.password)?;
        if self.accounts.contains_key(&account.id) {
            return Err(StoreError::validation(
                "id",
                format!("account id {} is already present", account.id),
            ));
        }
        self.check_unique(&account.username, &account.email)?;
        self.account_ids.observe(account.id);
        if let Some(max) = account.tasks.max_task_id() {
            self.task_ids.observe(max);
        }
        self.index(account);
        Ok(())
    }

    pub fn find_by_id(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&Account> {
        self.by_username.get(username).and_then(|id| self.accounts.get(id))
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.by_email.get(email).and_then(|id| self.accounts.get(id))
    }

    pub fn is_username_unique(&self, username: &str) -> bool {
        !self.used_usernames.contains(username)
    }

    pub fn is_email_unique(&self, email: &str) -> bool {
        !self.used_emails.contains(email)
    }

    fn get_mut(&mut self, id: AccountId) -> Result<&mut Account> {
        self.accounts.get_mut(&id).ok_or(StoreError::AccountNotFound(id))
    }

    /// Replaces the username in the record, the index and the set as one step.
    /// Renaming to the current name is a no-op.
    pub fn rename(&mut self, id: AccountId, new_username: &str) -> Result<()> {
        let old = self
            .find_by_id(id)
            .ok_or(StoreError::AccountNotFound(id))?
            .username
            .clone();
        if old == new_username {
            return Ok(());
        }
        require_token("username", new_username)?;
        if !self.is_username_unique(new_username) {
            return Err(StoreError::DuplicateUsername(new_username.to_string()));
        }
        self.by_username.remove(&old);
        self.used_usernames.remove(&old);
        self.by_username.insert(new_username.to_string(), id);
        self.used_usernames.insert(new_username.to_string());
        self.get_mut(id)?.username = new_username.to_string();
        debug!(account_id = id, old = %old, new = new_username, "Renamed account");
        Ok(())
    }

    /// Same contract as `rename`, over the email index.
    pub fn change_email(&mut self, id: AccountId, new_email: &str) -> Result<()> {
        let old = self
            .find_by_id(id)
            .ok_or(StoreError::AccountNotFound(id))?
            .email
            .clone();
        if old == new_email {
            return Ok(());
        }
        require_token("email", new_email)?;
        if !self.is_email_unique(new_email) {
            return Err(StoreError::DuplicateEmail(new_email.to_string()));
        }
        self.by_email.remove(&old);
        self.used_emails.remove(&old);
        self.by_email.insert(new_email.to_string(), id);
        self.used_emails.insert(new_email.to_string());
        self.get_mut(id)?.email = new_email.to_string();
        debug!(account_id = id, old = %old, new = new_email, "Changed account email");
        Ok(())
    }

    pub fn change_password(&mut self, id: AccountId, new_password: &str) -> Result<()> {
        let account = self.get_mut(id)?;
        require_token("password", new_password)?;
        account.password = new_password.to_string();
        Ok(())
    }

    /// Flips the active flag and returns the new state.
    pub fn toggle_activation(&mut self, id: AccountId) -> Result<bool> {
        let account = self.get_mut(id)?;
        account.is_active = !account.is_active;
        info!(account_id = id, active = account.is_active, "Toggled account activation");
        Ok(account.is_active)
    }

    /// Removes the account, its index entries and its whole task collection.
    pub fn delete(&mut self, id: AccountId) -> Result<Account> {
        let account = self.accounts.remove(&id).ok_or(StoreError::AccountNotFound(id))?;
        self.by_username.remove(&account.username);
        self.used_usernames.remove(&account.username);
        self.by_email.remove(&account.email);
        self.used_emails.remove(&account.email);
        info!(
            account_id = id,
            username = %account.username,
            tasks = account.tasks.len(),
            "Deleted account"
        );
        Ok(account)
    }

    /// True iff the account exists, is active and the password matches exactly.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.find_by_username(username)
            .is_some_and(|account| account.is_active && account.password == password)
    }

    pub fn search(&self, keyword: &str) -> Vec<&Account> {
        search_engine::search(self, keyword).accounts
    }

    /// Like `search`, but also reports which stage produced the hits.
    pub fn search_detailed(&self, keyword: &str) -> SearchResult<'_> {
        search_engine::search(self, keyword)
    }

    /// All accounts, ascending by ID.
    pub fn list_all(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    pub fn filter(&self, filter: AccountFilter) -> Vec<&Account> {
        self.filter_by(|account| filter.matches(account))
    }

    pub fn filter_by<P>(&self, predicate: P) -> Vec<&Account>
    where
        P: Fn(&Account) -> bool,
    {
        self.list_all().into_iter().filter(|account| predicate(*account)).collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn tasks(&self, id: AccountId) -> Result<&TaskCollection> {
        self.find_by_id(id)
            .map(|account| &account.tasks)
            .ok_or(StoreError::AccountNotFound(id))
    }

    pub fn tasks_mut(&mut self, id: AccountId) -> Result<&mut TaskCollection> {
        Ok(&mut self.get_mut(id)?.tasks)
    }

    /// Adds a task to the account, drawing its ID from the directory-wide counter.
    pub fn add_task(&mut self, id: AccountId, title: &str, due_date: &str) -> Result<TaskId> {
        let account = self.accounts.get_mut(&id).ok_or(StoreError::AccountNotFound(id))?;
        let task_id = account
            .tasks
            .add(&mut self.task_ids, title.to_string(), due_date.to_string())?;
        debug!(account_id = id, task_id, "Added task");
        Ok(task_id)
    }

    pub fn find_task(&self, id: AccountId, task_id: TaskId) -> Result<&Task> {
        self.tasks(id)?
            .find_by_id(task_id)
            .ok_or(StoreError::TaskNotFound { account_id: id, task_id })
    }

    pub fn edit_task(&mut self, id: AccountId, task_id: TaskId, edit: TaskEdit) -> Result<()> {
        self.tasks_mut(id)?.edit(task_id, edit)
    }

    pub fn mark_task_completed(&mut self, id: AccountId, task_id: TaskId) -> Result<()> {
        self.tasks_mut(id)?.mark_completed(task_id)
    }

    pub fn delete_task(&mut self, id: AccountId, task_id: TaskId) -> Result<Task> {
        self.tasks_mut(id)?.delete(task_id)
    }

    pub fn next_account_id(&self) -> AccountId {
        self.account_ids.peek()
    }

    pub fn next_task_id(&self) -> TaskId {
        self.task_ids.peek()
    }

    /// Re-derives both counters from the records currently held.
    pub fn resync_counters(&mut self) {
        self.account_ids.resync(self.accounts.keys().copied());
        self.task_ids
            .resync(self.accounts.values().filter_map(|a| a.tasks.max_task_id()));
        debug!(
            next_account_id = self.account_ids.peek(),
            next_task_id = self.task_ids.peek(),
            "Resynchronised id counters"
        );
    }

    /// Cross-checks the primary table against both indices and both sets.
    /// Returns a description of the first inconsistency found.
    pub fn verify_indices(&self) -> std::result::Result<(), String> {
        let sizes = [
            self.by_username.len(),
            self.by_email.len(),
            self.used_usernames.len(),
            self.used_emails.len(),
        ];
        if sizes.iter().any(|&n| n != self.accounts.len()) {
            return Err(format!(
                "index sizes {:?} differ from {} accounts",
                sizes,
                self.accounts.len()
            ));
        }
        for (id, account) in &self.accounts {
            if account.id != *id {
                return Err(format!("account keyed {} carries id {}", id, account.id));
            }
            if self.by_username.get(&account.username) != Some(id) {
                return Err(format!("username `{}` not indexed to {}", account.username, id));
            }
            if self.by_email.get(&account.email) != Some(id) {
                return Err(format!("email `{}` not indexed to {}", account.email, id));
            }
            if !self.used_usernames.contains(&account.username) || !self.used_emails.contains(&account.email) {
                return Err(format!("uniqueness sets are missing keys of account {}", id));
            }
            if *id >= self.account_ids.peek() {
                return Err(format!("account counter {} not past id {}", self.account_ids.peek(), id));
            }
            if let Some(max) = account.tasks.max_task_id() {
                if max >= self.task_ids.peek() {
                    return Err(format!("task counter {} not past task {}", self.task_ids.peek(), max));
                }
            }
        }
        Ok(())
    }
}
