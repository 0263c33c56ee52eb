use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use serde::Serialize;
use taskdesk::{AccountFilter, AccountId, HandlerConfig, TaskDeskHandler, TaskEdit, TaskId, TaskStatus};
use tracing_subscriber::EnvFilter;

fn account_arg() -> Arg {
    Arg::new("account")
        .value_name("ACCOUNT_ID")
        .help("Account ID")
        .required(true)
        .value_parser(clap::value_parser!(AccountId))
}

fn task_arg() -> Arg {
    Arg::new("task")
        .value_name("TASK_ID")
        .help("Task ID")
        .required(true)
        .value_parser(clap::value_parser!(TaskId))
}

fn text_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).help(help).required(true)
}

fn cli() -> Command {
    Command::new("taskdesk")
        .version(taskdesk::VERSION)
        .about("Account and task store backed by a plain text data file")
        .subcommand_required(true)
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .value_name("PATH")
                .help("Data file path")
                .default_value("data.txt"),
        )
        .arg(
            Arg::new("backup")
                .long("backup")
                .help("Back up the data file before overwriting it")
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("stats").about("Show dashboard counts"))
        .subcommand(Command::new("list").about("List all accounts"))
        .subcommand(Command::new("report").about("Per-account task totals"))
        .subcommand(Command::new("seed").about("Replace the data with the sample accounts"))
        .subcommand(Command::new("backups").about("List backups of the data file"))
        .subcommand(
            Command::new("search")
                .about("Search accounts by id, username or email")
                .arg(text_arg("keyword", "Search keyword")),
        )
        .subcommand(
            Command::new("filter")
                .about("Filter accounts: active, inactive, with-tasks, without-tasks")
                .arg(text_arg("kind", "Filter kind")),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account")
                .arg(text_arg("username", "Username"))
                .arg(text_arg("email", "Email address"))
                .arg(text_arg("password", "Password")),
        )
        .subcommand(
            Command::new("login")
                .about("Check credentials")
                .long_about(
                    "Check credentials. Failed attempts are only counted within one run, \
                     so a single invocation never locks an account; front ends that keep \
                     a handler open get the lockout after repeated failures.",
                )
                .arg(text_arg("username", "Username"))
                .arg(text_arg("password", "Password")),
        )
        .subcommand(
            Command::new("rename")
                .about("Change an account's username")
                .arg(account_arg())
                .arg(text_arg("username", "New username")),
        )
        .subcommand(
            Command::new("change-email")
                .about("Change an account's email address")
                .arg(account_arg())
                .arg(text_arg("email", "New email address")),
        )
        .subcommand(
            Command::new("change-password")
                .about("Change an account's password")
                .arg(account_arg())
                .arg(text_arg("password", "New password")),
        )
        .subcommand(
            Command::new("edit-task")
                .about("Edit a task's title, due date or status")
                .arg(account_arg())
                .arg(task_arg())
                .arg(Arg::new("title").long("title").help("New title"))
                .arg(Arg::new("due").long("due").help("New due date, DD/MM/YYYY"))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .help("New status")
                        .value_parser(["Ongoing", "Completed"]),
                )
                .group(
                    ArgGroup::new("changes")
                        .args(["title", "due", "status"])
                        .multiple(true)
                        .required(true),
                ),
        )
        .subcommand(Command::new("toggle").about("Activate or deactivate an account").arg(account_arg()))
        .subcommand(Command::new("delete").about("Delete an account and its tasks").arg(account_arg()))
        .subcommand(Command::new("tasks").about("List an account's tasks").arg(account_arg()))
        .subcommand(
            Command::new("add-task")
                .about("Add a task to an account")
                .arg(account_arg())
                .arg(text_arg("title", "Task title"))
                .arg(text_arg("due", "Due date, DD/MM/YYYY")),
        )
        .subcommand(
            Command::new("complete")
                .about("Mark a task completed")
                .arg(account_arg())
                .arg(task_arg()),
        )
        .subcommand(
            Command::new("remove-task")
                .about("Delete a task")
                .arg(account_arg())
                .arg(task_arg()),
        )
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn text<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing argument `{}`", name))
}

fn id<T: Copy + Send + Sync + 'static>(matches: &ArgMatches, name: &str) -> anyhow::Result<T> {
    matches
        .get_one::<T>(name)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("missing argument `{}`", name))
}

fn task_edits(args: &ArgMatches) -> anyhow::Result<Vec<TaskEdit>> {
    let mut edits = Vec::new();
    if let Some(title) = args.get_one::<String>("title") {
        edits.push(TaskEdit::Title(title.clone()));
    }
    if let Some(due) = args.get_one::<String>("due") {
        edits.push(TaskEdit::DueDate(due.clone()));
    }
    if let Some(status) = args.get_one::<String>("status") {
        let status = TaskStatus::parse(status)
            .ok_or_else(|| anyhow::anyhow!("unknown status `{}`", status))?;
        edits.push(TaskEdit::Status(status));
    }
    Ok(edits)
}

fn run(handler: &mut TaskDeskHandler, command: &str, args: &ArgMatches) -> anyhow::Result<bool> {
    match command {
        "stats" => print_json(&handler.dashboard())?,
        "list" => print_json(&handler.directory().list_all())?,
        "report" => print_json(&handler.task_report())?,
        "backups" => {
            let backups: Vec<PathBuf> = handler.storage().list_backups()?;
            print_json(&backups)?;
        }
        "search" => print_json(&handler.search(text(args, "keyword")?))?,
        "filter" => {
            let filter: AccountFilter = text(args, "kind")?
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            print_json(&handler.filter(filter))?;
        }
        "tasks" => print_json(&handler.tasks(id(args, "account")?)?)?,
        "seed" => {
            handler.seed_sample_accounts()?;
            return Ok(true);
        }
        "register" => {
            let account_id = handler.register(
                text(args, "username")?,
                text(args, "email")?,
                text(args, "password")?,
            )?;
            println!("{}", account_id);
            return Ok(true);
        }
        "login" => {
            let outcome = handler.login(text(args, "username")?, text(args, "password")?)?;
            print_json(&outcome)?;
            return Ok(true);
        }
        "rename" => {
            handler.change_username(id(args, "account")?, text(args, "username")?)?;
            return Ok(true);
        }
        "change-email" => {
            handler.change_email(id(args, "account")?, text(args, "email")?)?;
            return Ok(true);
        }
        "change-password" => {
            handler.change_password(id(args, "account")?, text(args, "password")?)?;
            return Ok(true);
        }
        "edit-task" => {
            let (account_id, task_id) = (id(args, "account")?, id(args, "task")?);
            for edit in task_edits(args)? {
                handler.edit_task(account_id, task_id, edit)?;
            }
            return Ok(true);
        }
        "toggle" => {
            let active = handler.toggle_activation(id(args, "account")?)?;
            println!("{}", if active { "Active" } else { "Inactive" });
            return Ok(true);
        }
        "delete" => {
            let account = handler.delete_account(id(args, "account")?)?;
            println!("Deleted {} ({} tasks)", account.username(), account.tasks().len());
            return Ok(true);
        }
        "add-task" => {
            let task_id = handler.add_task(id(args, "account")?, text(args, "title")?, text(args, "due")?)?;
            println!("{}", task_id);
            return Ok(true);
        }
        "complete" => {
            handler.mark_task_completed(id(args, "account")?, id(args, "task")?)?;
            return Ok(true);
        }
        "remove-task" => {
            let task = handler.delete_task(id(args, "account")?, id(args, "task")?)?;
            println!("Deleted task {}", task.task_id);
            return Ok(true);
        }
        other => anyhow::bail!("unknown command `{}`", other),
    }
    Ok(false)
}

fn main() -> anyhow::Result<()> {
    install_tracing();
    let matches = cli().get_matches();
    let config = HandlerConfig {
        data_file: PathBuf::from(text(&matches, "data")?),
        backup_on_save: matches.get_flag("backup"),
        ..Default::default()
    };
    let mut handler = TaskDeskHandler::open(config)?;
    let Some((command, args)) = matches.subcommand() else {
        anyhow::bail!("no command given");
    };
    if run(&mut handler, command, args)? {
        handler.save()?;
    }
    Ok(())
}
