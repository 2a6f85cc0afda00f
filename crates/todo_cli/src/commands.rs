//! Subcommand dispatch over one `TodoStore`.
//!
//! # Responsibility
//! - Translate CLI input into store operations.
//! - Ask for confirmation before delete unless `--yes` is given.
//!
//! # Invariants
//! - Task references resolve against the current filtered view, matching `list`.
//! - Output only goes to the provided writer, so commands are testable.

use clap::Subcommand;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};
use todo_core::db::DbError;
use todo_core::{
    DeleteConfirmation, LoggingError, RepoError, StateStorage, TaskEditor, TaskFilter, TaskId,
    TodoStore, MAX_TASKS,
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a task (words are joined with single spaces).
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Toggle completion of a task.
    Toggle {
        /// 1-based position in `list` output, or task id.
        task: String,
    },
    /// Replace task text; blank text deletes the task.
    Edit { task: String, text: String },
    /// Delete a task after confirmation.
    Delete {
        task: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Set the view filter (all, active, completed).
    Filter { filter: TaskFilter },
    /// Remove all completed tasks.
    ClearCompleted,
    /// Show tasks in the current view.
    List,
    /// Show counts and limit state.
    Status,
    /// Print core health-check and version.
    Ping,
}

/// CLI failure.
#[derive(Debug)]
pub enum CliError {
    Db(DbError),
    Repo(RepoError),
    Logging(LoggingError),
    UnknownTask(String),
    Io(io::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Repo(err) => write!(f, "storage error: {err}"),
            Self::Logging(err) => write!(f, "logging error: {err}"),
            Self::UnknownTask(reference) => {
                write!(f, "no task `{reference}` in the current view")
            }
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnknownTask(_) => None,
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Runs one subcommand against `store`.
pub fn run<S: StateStorage>(
    command: Command,
    store: &mut TodoStore<S>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::Add { text } => {
            if store.is_at_limit() {
                writeln!(out, "Limit of {MAX_TASKS} tasks reached; nothing added.")?;
            }
            let before = store.total_count();
            store.add(&text.join(" "));
            if store.total_count() > before {
                writeln!(out, "Added. {} of {MAX_TASKS} slots used.", store.total_count())?;
            } else if !store.is_at_limit() {
                writeln!(out, "Nothing to add.")?;
            }
        }
        Command::Toggle { task } => {
            let id = resolve_task_ref(store, &task)?;
            store.toggle(&id);
            writeln!(out, "Toggled.")?;
        }
        Command::Edit { task, text } => {
            let id = resolve_task_ref(store, &task)?;
            let Some(current) = store.state().task(&id).cloned() else {
                return Err(CliError::UnknownTask(task));
            };
            let mut editor = TaskEditor::new();
            editor.begin(&current);
            editor.set_buffer(text);
            editor.submit(store);
            if store.state().task(&id).is_some() {
                writeln!(out, "Updated.")?;
            } else {
                writeln!(out, "Deleted (empty text).")?;
            }
        }
        Command::Delete { task, yes } => {
            let id = resolve_task_ref(store, &task)?;
            let mut confirmation = DeleteConfirmation::new();
            if !confirmation.request(store, &id) {
                return Err(CliError::UnknownTask(task));
            }
            if !yes && !ask(&confirmation, input, out)? {
                confirmation.cancel();
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            confirmation.confirm(store);
            writeln!(out, "Deleted.")?;
        }
        Command::Filter { filter } => {
            store.set_filter(filter);
            writeln!(out, "Filter: {filter}")?;
        }
        Command::ClearCompleted => {
            let before = store.total_count();
            store.clear_completed();
            writeln!(out, "Cleared {}.", before - store.total_count())?;
        }
        Command::List => render_list(store, out)?,
        Command::Status => {
            writeln!(
                out,
                "active={} total={} limit={MAX_TASKS} at_limit={} has_completed={} filter={}",
                store.active_count(),
                store.total_count(),
                store.is_at_limit(),
                store.has_completed(),
                store.filter()
            )?;
        }
        Command::Ping => {
            writeln!(out, "todo_core ping={}", todo_core::ping())?;
            writeln!(out, "todo_core version={}", todo_core::core_version())?;
        }
    }

    info!("event=cli_command module=cli status=ok tasks={}", store.total_count());
    Ok(())
}

/// Resolves a 1-based position or a task id against the filtered view.
fn resolve_task_ref<S: StateStorage>(
    store: &TodoStore<S>,
    reference: &str,
) -> Result<TaskId, CliError> {
    let visible = store.filtered_tasks();
    let trimmed = reference.trim();

    let by_position = trimmed
        .parse::<usize>()
        .ok()
        .and_then(|position| position.checked_sub(1))
        .and_then(|index| visible.get(index));
    let found = by_position.or_else(|| visible.iter().find(|task| task.id.as_str() == trimmed));

    found
        .map(|task| task.id.clone())
        .ok_or_else(|| CliError::UnknownTask(trimmed.to_string()))
}

fn ask(
    confirmation: &DeleteConfirmation,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    let prompt = confirmation.prompt().unwrap_or_default();
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn render_list<S: StateStorage>(
    store: &TodoStore<S>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let visible = store.filtered_tasks();
    if visible.is_empty() {
        writeln!(out, "No tasks ({}).", store.filter())?;
        return Ok(());
    }

    for (index, task) in visible.iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        writeln!(out, "{:>2}. [{mark}] {}  ({})", index + 1, task.text, task.id)?;
    }
    let noun = if store.active_count() == 1 { "item" } else { "items" };
    writeln!(
        out,
        "{} {noun} left · filter: {}{}",
        store.active_count(),
        store.filter(),
        if store.has_completed() {
            " · clear-completed available"
        } else {
            ""
        }
    )?;
    Ok(())
}
