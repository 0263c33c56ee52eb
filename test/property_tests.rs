use proptest::prelude::*;
use taskdesk::directory::AccountDirectory;
use taskdesk::statistics::DirectoryStatistics;
use taskdesk::storage::{deserialize, serialize};

#[derive(Clone, Debug)]
enum Op {
    Create(u8, u8),
    Rename(u8, u8),
    ChangeEmail(u8, u8),
    Delete(u8),
    Toggle(u8),
    AddTask(u8),
    Complete(u8, u8),
    DeleteTask(u8, u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6, 0u8..6).prop_map(|(u, e)| Op::Create(u, e)),
        (0u8..8, 0u8..6).prop_map(|(a, u)| Op::Rename(a, u)),
        (0u8..8, 0u8..6).prop_map(|(a, e)| Op::ChangeEmail(a, e)),
        (0u8..8).prop_map(Op::Delete),
        (0u8..8).prop_map(Op::Toggle),
        (0u8..8).prop_map(Op::AddTask),
        (0u8..8, 0u8..4).prop_map(|(a, t)| Op::Complete(a, t)),
        (0u8..8, 0u8..4).prop_map(|(a, t)| Op::DeleteTask(a, t)),
    ]
}

// Picks an existing account by position, or a missing id when the slot is empty.
fn pick(directory: &AccountDirectory, slot: u8) -> u32 {
    directory
        .list_all()
        .get(slot as usize)
        .map(|a| a.id())
        .unwrap_or(9_000 + slot as u32)
}

fn pick_task(directory: &AccountDirectory, account: u32, slot: u8) -> u32 {
    directory
        .tasks(account)
        .ok()
        .and_then(|tasks| tasks.all().nth(slot as usize).map(|t| t.task_id))
        .unwrap_or(90_000)
}

fn apply(directory: &mut AccountDirectory, op: &Op) {
    // Errors are expected for collisions and misses; only the invariants matter.
    let _ = match *op {
        Op::Create(u, e) => directory
            .create(&format!("user{u}"), &format!("user{e}@x.com"), "pw1")
            .map(|_| ()),
        Op::Rename(a, u) => {
            let id = pick(directory, a);
            directory.rename(id, &format!("user{u}"))
        }
        Op::ChangeEmail(a, e) => {
            let id = pick(directory, a);
            directory.change_email(id, &format!("user{e}@x.com"))
        }
        Op::Delete(a) => {
            let id = pick(directory, a);
            directory.delete(id).map(|_| ())
        }
        Op::Toggle(a) => {
            let id = pick(directory, a);
            directory.toggle_activation(id).map(|_| ())
        }
        Op::AddTask(a) => {
            let id = pick(directory, a);
            directory.add_task(id, "Some task", "01/01/2025").map(|_| ())
        }
        Op::Complete(a, t) => {
            let id = pick(directory, a);
            let task = pick_task(directory, id, t);
            directory.mark_task_completed(id, task)
        }
        Op::DeleteTask(a, t) => {
            let id = pick(directory, a);
            let task = pick_task(directory, id, t);
            directory.delete_task(id, task).map(|_| ())
        }
    };
}

fn naive_statistics(directory: &AccountDirectory) -> (usize, usize, usize) {
    let accounts = directory.list_all();
    let active = accounts.iter().filter(|a| a.is_active()).count();
    let tasks: Vec<_> = accounts.iter().flat_map(|a| a.tasks().all()).collect();
    let completed = tasks.iter().filter(|t| t.is_completed()).count();
    (active, tasks.len(), completed)
}

proptest! {
    #[test]
    fn indices_stay_consistent(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut directory = AccountDirectory::new();
        for op in &ops {
            apply(&mut directory, op);
            prop_assert!(directory.verify_indices().is_ok(), "{:?} after {:?}", directory.verify_indices(), op);

            for account in directory.list_all() {
                prop_assert_eq!(directory.find_by_username(account.username()).map(|a| a.id()), Some(account.id()));
                prop_assert_eq!(directory.find_by_email(account.email()).map(|a| a.id()), Some(account.id()));
                prop_assert!(!directory.is_username_unique(account.username()));
                prop_assert!(!directory.is_email_unique(account.email()));
            }
        }
    }

    #[test]
    fn statistics_match_naive_recount(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut directory = AccountDirectory::new();
        for op in &ops {
            apply(&mut directory, op);
        }
        let stats = DirectoryStatistics::collect(&directory);
        let (active, tasks, completed) = naive_statistics(&directory);
        prop_assert_eq!(stats.total_accounts, directory.len());
        prop_assert_eq!(stats.active_accounts, active);
        prop_assert_eq!(stats.total_tasks, tasks);
        prop_assert_eq!(stats.completed_tasks, completed);
        prop_assert_eq!(stats.inactive_accounts + stats.active_accounts, stats.total_accounts);
    }

    #[test]
    fn serialized_directories_reload_identically(ops in prop::collection::vec(op_strategy(), 1..48)) {
        let mut directory = AccountDirectory::new();
        for op in &ops {
            apply(&mut directory, op);
        }
        let (loaded, report) = deserialize(&serialize(&directory));
        prop_assert_eq!(report.accounts_discarded + report.tasks_discarded, 0);
        prop_assert_eq!(loaded.list_all(), directory.list_all());
        prop_assert!(loaded.verify_indices().is_ok());
        prop_assert!(loaded.next_account_id() <= directory.next_account_id());
        prop_assert!(loaded.next_task_id() <= directory.next_task_id());
    }
}
