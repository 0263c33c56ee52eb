use taskdesk::handler::*;
use taskdesk::search_engine::{AccountFilter, MatchType};
use taskdesk::task_manager::{TaskEdit, TaskStatus};
use taskdesk::{DirectoryStatistics, StoreError};
use tempfile::TempDir;

fn config(temp_dir: &TempDir) -> HandlerConfig {
    HandlerConfig {
        data_file: temp_dir.path().join("data.txt"),
        ..Default::default()
    }
}

#[test]
fn test_open_without_data_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::open(config(&temp_dir)).unwrap();
    assert!(handler.directory().is_empty());
    assert_eq!(handler.dashboard(), DirectoryStatistics::default());
}

#[test]
fn test_register_add_tasks_save_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::open(config(&temp_dir)).unwrap();

    let id = handler.register("tanvir", "tanvir@gmail.com", "1234").unwrap();
    let t1 = handler.add_task(id, "Buy milk", "05/06/2025").unwrap();
    handler.add_task(id, "Call home", "06/06/2025").unwrap();
    handler.mark_task_completed(id, t1).unwrap();
    handler.save().unwrap();

    let mut reopened = TaskDeskHandler::open(config(&temp_dir)).unwrap();
    let stats = reopened.dashboard();
    assert_eq!(stats.total_accounts, 1);
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.ongoing_tasks, 1);

    let tasks = reopened.tasks(id).unwrap();
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert!(reopened.directory().next_task_id() > t1 + 1);
}

#[test]
fn test_validation_errors_do_not_touch_state() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::new(config(&temp_dir)).unwrap();
    let id = handler.register("u1", "u1@x.com", "pw1").unwrap();

    assert!(matches!(
        handler.add_task(id, "Title", "31/12/2031"),
        Err(StoreError::Validation { field: "due date", .. })
    ));
    assert!(matches!(
        handler.add_task(id, &"x".repeat(101), "31/12/2030"),
        Err(StoreError::Validation { field: "title", .. })
    ));
    assert!(handler.tasks(id).unwrap().is_empty());

    assert!(handler.change_email(id, "u1@x").is_err());
    assert!(handler.change_username(id, "has space").is_err());
    assert!(handler.change_password(id, "p").is_err());
    let account = handler.require_account(id).unwrap();
    assert_eq!(account.email(), "u1@x.com");
    assert_eq!(account.username(), "u1");
    assert_eq!(account.password(), "pw1");
}

#[test]
fn test_profile_edits() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::new(config(&temp_dir)).unwrap();
    let id = handler.register("u1", "u1@x.com", "pw1").unwrap();
    handler.register("u2", "u2@x.com", "pw2").unwrap();

    assert!(handler.change_username(id, "u2").unwrap_err().is_duplicate_key());
    handler.change_username(id, "renamed").unwrap();
    handler.change_email(id, "renamed@x.com").unwrap();
    handler.change_password(id, "newpass").unwrap();
    assert_eq!(
        handler.login("renamed", "newpass").unwrap(),
        LoginOutcome::Success { account_id: id }
    );
    assert_eq!(handler.login("u1", "pw1").unwrap(), LoginOutcome::UnknownUser);
}

#[test]
fn test_edit_task_validates_per_field() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::new(config(&temp_dir)).unwrap();
    let id = handler.register("u1", "u1@x.com", "pw1").unwrap();
    let task = handler.add_task(id, "Draft", "01/01/2025").unwrap();

    assert!(handler.edit_task(id, task, TaskEdit::DueDate("1/1/2025".to_string())).is_err());
    handler.edit_task(id, task, TaskEdit::Title("Final".to_string())).unwrap();
    handler.edit_task(id, task, TaskEdit::Status(TaskStatus::Completed)).unwrap();
    assert!(matches!(
        handler.mark_task_completed(id, task),
        Err(StoreError::AlreadyCompleted(_))
    ));
    assert_eq!(handler.delete_task(id, task).unwrap().title, "Final");
    assert!(handler.delete_task(id, task).unwrap_err().is_not_found());
}

#[test]
fn test_successful_login_resets_failures() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::new(config(&temp_dir)).unwrap();
    let id = handler.register("u1", "u1@x.com", "secret").unwrap();

    handler.login("u1", "bad").unwrap();
    handler.login("u1", "bad").unwrap();
    assert_eq!(handler.failed_login_count(id), 2);
    assert_eq!(
        handler.login("u1", "secret").unwrap(),
        LoginOutcome::Success { account_id: id }
    );
    assert_eq!(handler.failed_login_count(id), 0);
    assert_eq!(
        handler.login("u1", "bad").unwrap(),
        LoginOutcome::WrongPassword { attempts_left: 2 }
    );
}

#[test]
fn test_lockout_and_admin_reactivation() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::new(config(&temp_dir)).unwrap();
    let id = handler.register("u1", "u1@x.com", "secret").unwrap();

    for _ in 0..2 {
        handler.login("u1", "bad").unwrap();
    }
    assert_eq!(handler.login("u1", "bad").unwrap(), LoginOutcome::LockedOut);
    assert_eq!(handler.filter(AccountFilter::Inactive).len(), 1);
    assert_eq!(handler.dashboard().inactive_accounts, 1);

    assert!(handler.toggle_activation(id).unwrap());
    assert_eq!(
        handler.login("u1", "secret").unwrap(),
        LoginOutcome::Success { account_id: id }
    );
}

#[test]
fn test_delete_account_discards_tasks() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::new(config(&temp_dir)).unwrap();
    handler.seed_sample_accounts().unwrap();
    handler.add_task(101, "Task", "01/01/2025").unwrap();

    let removed = handler.delete_account(101).unwrap();
    assert_eq!(removed.tasks().len(), 1);
    let stats = handler.dashboard();
    assert_eq!(stats.total_accounts, 2);
    assert_eq!(stats.total_tasks, 0);
    assert_eq!(handler.search("tanvir").match_type, MatchType::None);
    assert!(handler.tasks(101).is_err());
}

#[test]
fn test_task_report_and_search() {
    let temp_dir = TempDir::new().unwrap();
    let mut handler = TaskDeskHandler::new(config(&temp_dir)).unwrap();
    handler.seed_sample_accounts().unwrap();
    handler.add_task(103, "One", "01/01/2025").unwrap();

    let report = handler.task_report();
    assert_eq!(report.len(), 3);
    assert_eq!(report[2].username, "Himel");
    assert_eq!(report[2].total_tasks, 1);

    let result = handler.search("sad");
    assert_eq!(result.match_type, MatchType::Partial);
    assert_eq!(result.accounts[0].id(), 102);
}

#[test]
fn test_failed_load_keeps_directory() {
    let temp_dir = TempDir::new().unwrap();
    let config = HandlerConfig {
        data_file: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let mut handler = TaskDeskHandler::new(config).unwrap();
    handler.seed_sample_accounts().unwrap();
    assert!(handler.load().is_err());
    assert_eq!(handler.directory().len(), 3);
}

#[test]
fn test_backup_on_save() {
    let temp_dir = TempDir::new().unwrap();
    let config = HandlerConfig {
        backup_on_save: true,
        backups_to_keep: 1,
        ..config(&temp_dir)
    };
    let mut handler = TaskDeskHandler::new(config).unwrap();
    handler.seed_sample_accounts().unwrap();
    handler.save().unwrap();
    assert!(handler.storage().list_backups().unwrap().is_empty());

    handler.save().unwrap();
    assert_eq!(handler.storage().list_backups().unwrap().len(), 1);
    handler.save().unwrap();
    assert_eq!(handler.storage().list_backups().unwrap().len(), 1);
}
