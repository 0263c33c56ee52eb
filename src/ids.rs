/*!
 * Monotonic ID counters for accounts and tasks.
 */

pub type AccountId = u32;
pub type TaskId = u32;

pub const FIRST_ACCOUNT_ID: AccountId = 101;
pub const FIRST_TASK_ID: TaskId = 1001;
/// Largest ID a record may carry. `u32::MAX` is kept free so the counter can always step past any stored ID.
pub const MAX_ID: u32 = u32::MAX - 1;

/// Hands out strictly increasing IDs. `next` is always greater than anything issued or observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    start: u32,
    next: u32,
}

impl IdAllocator {
    pub fn new(start: u32) -> Self {
        Self { start, next: start }
    }

    pub fn accounts() -> Self {
        Self::new(FIRST_ACCOUNT_ID)
    }

    pub fn tasks() -> Self {
        Self::new(FIRST_TASK_ID)
    }

    /// `None` once the ID space is used up.
    pub fn allocate(&mut self) -> Option<u32> {
        if self.next > MAX_ID {
            return None;
        }
        let id = self.next;
        self.next += 1;
        Some(id)
    }

    /// The value the next `allocate` call returns.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Advance past `id` if it is at or beyond the current position. Never moves backwards.
    /// IDs above `MAX_ID` leave the counter exhausted rather than wrapping.
    pub fn observe(&mut self, id: u32) {
        if id >= self.next {
            self.next = id.saturating_add(1);
        }
    }

    /// Reset to `max(start, max_seen + 1)` after a bulk load.
    pub fn resync<I: IntoIterator<Item = u32>>(&mut self, seen: I) {
        self.next = self.start;
        for id in seen {
            self.observe(id);
        }
    }
}
