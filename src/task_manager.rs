use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::ids::{AccountId, IdAllocator, MAX_ID, TaskId};
use crate::validation::{require_title, require_token};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Ongoing,
    Completed,
}

impl TaskStatus {
    /// The status word used on disk and in listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Ongoing => "Ongoing",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "Ongoing" => Some(TaskStatus::Ongoing),
            "Completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub task_id: TaskId,
    pub title: String,
    pub due_date: String,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(task_id: TaskId, title: String, due_date: String) -> Self {
        Self {
            task_id,
            title,
            due_date,
            status: TaskStatus::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// A single-field change applied by `TaskCollection::edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEdit {
    Title(String),
    DueDate(String),
    Status(TaskStatus),
}

/// Tasks owned by one account, keyed by task ID. Iteration is ascending by ID.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskCollection {
    #[serde(skip)]
    owner: AccountId,
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskCollection {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            tasks: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    fn next_id(&self, ids: &mut IdAllocator) -> Result<TaskId> {
        loop {
            let task_id = ids.allocate().ok_or(StoreError::IdsExhausted("task"))?;
            if !self.tasks.contains_key(&task_id) {
                return Ok(task_id);
            }
        }
    }

    /// Allocates from the shared counter; the new task starts out `Ongoing`.
    /// The title and date must be storable in the data file.
    pub fn add(&mut self, ids: &mut IdAllocator, title: String, due_date: String) -> Result<TaskId> {
        require_title(&title)?;
        require_token("due date", &due_date)?;
        let task_id = self.next_id(ids)?;
        self.tasks.insert(task_id, Task::new(task_id, title, due_date));
        Ok(task_id)
    }

    /// Inserts an already-numbered task. Returns false and leaves the collection
    /// untouched if the ID is taken, out of range, or a field could not be stored.
    pub fn insert(&mut self, task: Task) -> bool {
        if task.task_id == 0 || task.task_id > MAX_ID || self.tasks.contains_key(&task.task_id) {
            return false;
        }
        if require_title(&task.title).is_err() || require_token("due date", &task.due_date).is_err() {
            return false;
        }
        self.tasks.insert(task.task_id, task);
        true
    }

    pub fn find_by_id(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    fn find_mut(&mut self, task_id: TaskId) -> Result<&mut Task> {
        let owner = self.owner;
        self.tasks.get_mut(&task_id).ok_or(StoreError::TaskNotFound {
            account_id: owner,
            task_id,
        })
    }

    pub fn edit(&mut self, task_id: TaskId, edit: TaskEdit) -> Result<()> {
        match &edit {
            TaskEdit::Title(title) => require_title(title)?,
            TaskEdit::DueDate(due_date) => require_token("due date", due_date)?,
            TaskEdit::Status(_) => {}
        }
        let task = self.find_mut(task_id)?;
        match edit {
            TaskEdit::Title(title) => task.title = title,
            TaskEdit::DueDate(due_date) => task.due_date = due_date,
            TaskEdit::Status(status) => task.status = status,
        }
        Ok(())
    }

    pub fn mark_completed(&mut self, task_id: TaskId) -> Result<()> {
        let task = self.find_mut(task_id)?;
        if task.is_completed() {
            return Err(StoreError::AlreadyCompleted(task_id));
        }
        task.status = TaskStatus::Completed;
        Ok(())
    }

    pub fn delete(&mut self, task_id: TaskId) -> Result<Task> {
        let owner = self.owner;
        self.tasks.remove(&task_id).ok_or(StoreError::TaskNotFound {
            account_id: owner,
            task_id,
        })
    }

    pub fn all(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.values().filter(|t| t.is_completed()).count()
    }

    pub fn max_task_id(&self) -> Option<TaskId> {
        self.tasks.keys().next_back().copied()
    }
}
