//! Kairu - Main Entry Point
//!
//! Parses the command line, sets up logging, loads the data file and
//! dispatches to the handlers in the `kairu` library.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use kairu::formatting::GroupBy;
use kairu::handlers::ViewOptions;
use kairu::todo::{SortKey, TaskId};
use kairu::validation::{AddTaskInput, EditTaskInput};
use kairu::{Config, KairuApp, KairuError, Storage};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Kairu - a to-do manager with goals, groups, streaks and points
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the data file
    #[arg(long, global = true, env = "KAIRU_FILE")]
    file: Option<PathBuf>,

    /// Path to a scoring/catalog config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Commit the data file after each change and push on exit
    #[arg(long, global = true)]
    sync_git: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(long, global = true)]
    verbose: bool,

    /// Print without theme colours
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Priority,
    #[value(alias = "due_date")]
    Due,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Priority => SortKey::Priority,
            SortArg::Due => SortKey::Due,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum GroupByArg {
    #[default]
    Group,
    Goal,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Group => GroupBy::Group,
            GroupByArg::Goal => GroupBy::Goal,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a new task group
    GroupAdd { name: String },
    /// List all task groups
    GroupList,
    /// Add a new long-term goal
    GoalAdd {
        name: String,
        description: Option<String>,
    },
    /// List all goals
    GoalList,
    /// Add a new task
    Add {
        name: String,
        /// The group to add the task to
        #[arg(short, long)]
        group: String,
        #[arg(long)]
        details: Option<String>,
        /// low, medium or high (default medium)
        #[arg(short, long)]
        priority: Option<String>,
        /// 'YYYY-MM-DD HH:MM' or 'YYYY-MM-DD' (end of day)
        #[arg(short, long)]
        due: Option<String>,
        /// daily, weekly or monthly
        #[arg(short, long)]
        recurring: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Link the task to a goal
        #[arg(long)]
        goal: Option<String>,
    },
    /// Edit an existing task ('none' clears details, due, goal, recurring)
    Edit {
        id: TaskId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        recurring: Option<String>,
    },
    /// Mark a task as done
    Done { id: TaskId },
    /// Delete a task and its sub-tasks
    Delete { id: TaskId },
    /// Star an important task
    Star { id: TaskId },
    /// Unstar a task
    Unstar { id: TaskId },
    /// Add a sub-task to a task
    SubAdd { parent_id: TaskId, description: String },
    /// Mark a sub-task as done (e.g. `sub-done 3 1` for 3.1)
    SubDone { parent_id: TaskId, sub_task_id: u32 },
    /// Log progress on a task
    Log {
        id: TaskId,
        #[arg(short, long)]
        message: String,
    },
    /// View active tasks, or one task by id
    View {
        id: Option<TaskId>,
        /// Show the progress log of the task
        #[arg(long)]
        show_log: bool,
        #[arg(long, value_enum, default_value_t = GroupByArg::Group)]
        group_by: GroupByArg,
        /// Only show one group
        #[arg(short, long)]
        group: Option<String>,
        #[arg(short, long, value_enum)]
        sort: Option<SortArg>,
        #[arg(long)]
        filter_priority: Option<String>,
        /// Only show starred tasks
        #[arg(long)]
        starred: bool,
        #[arg(long)]
        filter_tag: Option<String>,
    },
    /// View completed tasks of a group
    ViewCompleted {
        #[arg(short, long)]
        group: String,
    },
    /// Search active and completed tasks
    Search { keyword: String },
    /// Show what matters now
    Focus {
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Show points, level, streak and achievements
    Stats,
    /// List themes
    Themes,
    /// Buy a streak freeze
    BuyFreeze,
    /// Unlock a theme with points
    UnlockTheme { name: String },
    /// Set the active theme
    SetTheme { name: String },
    /// Guided daily planning
    PlanDay,
    /// Guided end-of-day review
    Shutdown,
    /// Deal with a stale task
    Unstuck,
    /// Check today's schedule for burnout risk
    HealthCheck,
    /// Start a pomodoro timer
    Pomodoro {
        /// Work minutes
        #[arg(short, long, default_value_t = 25)]
        work: u64,
        /// Break minutes
        #[arg(short, long, default_value_t = 5)]
        breaks: u64,
    },
}

fn init_logging(args: &Args) {
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kairu={}", log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Colour only on a terminal, unless disabled by flag or `NO_COLOR`
fn resolve_color(args: &Args) -> bool {
    if args.no_color || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path.or_else(Config::default_path) {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

async fn run(app: &mut KairuApp, command: Command) -> Result<Option<String>> {
    let output = match command {
        Command::GroupAdd { name } => app.handle_group_add(name)?,
        Command::GroupList => app.handle_group_list()?,
        Command::GoalAdd { name, description } => app.handle_goal_add(name, description)?,
        Command::GoalList => app.handle_goal_list()?,
        Command::Add {
            name,
            group,
            details,
            priority,
            due,
            recurring,
            tags,
            goal,
        } => app.handle_add(AddTaskInput {
            name,
            group,
            details,
            priority,
            due,
            recurrence: recurring,
            tags,
            goal,
        })?,
        Command::Edit {
            id,
            name,
            details,
            priority,
            due,
            tags,
            goal,
            group,
            recurring,
        } => app.handle_edit(
            id,
            EditTaskInput {
                name,
                details,
                priority,
                due,
                tags,
                goal,
                group,
                recurrence: recurring,
            },
        )?,
        Command::Done { id } => app.handle_done(id)?,
        Command::Delete { id } => app.handle_delete(id)?,
        Command::Star { id } => app.handle_star(id, true)?,
        Command::Unstar { id } => app.handle_star(id, false)?,
        Command::SubAdd {
            parent_id,
            description,
        } => app.handle_sub_add(parent_id, description)?,
        Command::SubDone {
            parent_id,
            sub_task_id,
        } => app.handle_sub_done(parent_id, sub_task_id)?,
        Command::Log { id, message } => app.handle_log(id, message)?,
        Command::View {
            id: Some(id),
            show_log,
            ..
        } => app.handle_view_task(id, show_log)?,
        Command::View {
            id: None,
            show_log,
            group_by,
            group,
            sort,
            filter_priority,
            starred,
            filter_tag,
        } => {
            if show_log {
                return Err(KairuError::validation("--show-log needs a task id").into());
            }
            app.handle_view(ViewOptions {
                group,
                priority: filter_priority,
                tag: filter_tag,
                starred,
                sort: sort.map(SortKey::from),
                group_by: group_by.into(),
            })?
        }
        Command::ViewCompleted { group } => app.handle_view_completed(group)?,
        Command::Search { keyword } => app.handle_search(keyword)?,
        Command::Focus { group } => app.handle_focus(group)?,
        Command::Stats => app.handle_stats()?,
        Command::Themes => app.handle_themes()?,
        Command::BuyFreeze => app.handle_buy_freeze()?,
        Command::UnlockTheme { name } => app.handle_unlock_theme(name)?,
        Command::SetTheme { name } => app.handle_set_theme(name)?,
        Command::HealthCheck => app.handle_health_check()?,
        Command::PlanDay => {
            app.handle_plan_day(&mut std::io::stdin().lock(), &mut std::io::stdout())?;
            return Ok(None);
        }
        Command::Shutdown => {
            app.handle_shutdown(&mut std::io::stdin().lock(), &mut std::io::stdout())?;
            return Ok(None);
        }
        Command::Unstuck => {
            app.handle_unstuck(&mut std::io::stdin().lock(), &mut std::io::stdout())?;
            return Ok(None);
        }
        Command::Pomodoro { work, breaks } => app.handle_pomodoro(work, breaks).await?,
    };
    Ok(Some(output))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Check if no arguments were provided (except the program name)
    if std::env::args().len() == 1 {
        let mut cmd = Args::command();
        cmd.print_help().ok();
        println!();
        std::process::exit(2);
    }

    let args = Args::parse();
    init_logging(&args);

    let config = load_config(args.config.clone())?;
    let file = args.file.clone().unwrap_or_else(Storage::default_path);
    info!("Using data file {}", file.display());

    let mut app = KairuApp::new(&file, args.sync_git, config)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    app.set_color(resolve_color(&args));
    if let Some(output) = run(&mut app, args.command).await? {
        println!("{}", output);
    }
    Ok(())
}
