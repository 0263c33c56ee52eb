pub mod directory;
pub mod error;
pub mod handler;
pub mod ids;
pub mod search_engine;
pub mod statistics;
pub mod storage;
pub mod task_manager;
pub mod validation;

pub use directory::{Account, AccountDirectory};

pub use error::{Result, StoreError};

pub use ids::{AccountId, IdAllocator, TaskId, FIRST_ACCOUNT_ID, FIRST_TASK_ID};

pub use task_manager::{Task, TaskCollection, TaskEdit, TaskStatus};

pub use search_engine::{AccountFilter, MatchType, SearchResult};

pub use statistics::{AccountTaskSummary, DirectoryStatistics, StatisticsAggregator};

pub use storage::{LoadReport, StorageManager};

pub use validation::{ValidationConfig, ValidationEngine};

pub use handler::{HandlerConfig, LoginOutcome, TaskDeskHandler};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

pub fn version_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
