use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use timer_cli::cli::{Cli, Command, format_duration, parse_task_id};
use timer_core::config::{self, Config, ConfigOverrides, Palette};
use timer_core::notify::{Notifier, NoopNotifier, notification_body, notifier_from_env};
use timer_core::storage::json_store;
use timer_core::{
    AppError, JsonFileRepository, Snapshot, Subscription, Task, TaskStore, ToggleEvent, ToggleKind,
    Toggled,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKTIMER_LOG";

struct App {
    store: TaskStore<JsonFileRepository>,
    palette: Palette,
    notifier: Box<dyn Notifier>,
}

impl App {
    fn open(overrides: &[String]) -> Result<Self, AppError> {
        let loaded = config::load_config_with_fallback();
        if let Some(err) = loaded.error {
            tracing::warn!(error = %err, "using default configuration");
        }

        let mut parsed = ConfigOverrides::default();
        for raw in overrides {
            parsed.apply(raw)?;
        }
        let config = config::merge_overrides(&loaded.config, &parsed);
        Self::with_config(&config)
    }

    fn with_config(config: &Config) -> Result<Self, AppError> {
        let path = json_store::store_path(config.store_path.as_deref())?;
        tracing::debug!(path = %path.display(), "opening task store");
        let store = TaskStore::open(JsonFileRepository::new(path))?;
        let notifier: Box<dyn Notifier> = if config.notifications_enabled() {
            notifier_from_env()
        } else {
            Box::new(NoopNotifier)
        };

        Ok(Self {
            store,
            palette: config.palette(),
            notifier,
        })
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: &'static str,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn state_label(task: &Task) -> &'static str {
    if task.is_running() { "running" } else { "stopped" }
}

fn format_instant(instant: OffsetDateTime) -> Result<String, AppError> {
    instant
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn task_json(task: &Task, now: OffsetDateTime) -> Result<serde_json::Value, AppError> {
    let running_since = task.running_since.map(format_instant).transpose()?;
    Ok(serde_json::json!({
        "id": task.id,
        "name": task.name,
        "notes": task.notes,
        "running": task.is_running(),
        "running_since": running_since,
        "accumulated_seconds": task.accumulated_seconds,
        "total_seconds": task.total_seconds_at(now),
    }))
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    println!("{}", task_json(task, OffsetDateTime::now_utc())?);
    Ok(())
}

fn print_tasks_json(tasks: &[Task]) -> Result<(), AppError> {
    let now = OffsetDateTime::now_utc();
    let payload = tasks
        .iter()
        .map(|task| task_json(task, now))
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", serde_json::Value::Array(payload));
    Ok(())
}

fn print_tasks_plain(tasks: &[Task], palette: &Palette) {
    if tasks.is_empty() {
        println!("{}", palette.muted("No tasks"));
        return;
    }

    let now = OffsetDateTime::now_utc();
    let rows = tasks.iter().map(|task| TaskRow {
        id: task.id,
        name: task.name.clone(),
        state: state_label(task),
        total: format_duration(task.total_seconds_at(now)),
        notes: task.notes.clone(),
    });
    println!("{}", Table::new(rows).with(Style::sharp()));

    let running = tasks.iter().filter(|task| task.is_running()).count();
    if running > 0 {
        println!(
            "{}",
            palette.running(&format!("{running} of {} running", tasks.len()))
        );
    }
}

fn print_task_plain(task: &Task, palette: &Palette) -> Result<(), AppError> {
    let now = OffsetDateTime::now_utc();
    println!(
        "{} ({})",
        palette.timer_state(task.is_running(), &task.name),
        task.id
    );
    println!(
        "  state:   {}",
        palette.timer_state(task.is_running(), state_label(task))
    );
    if let Some(since) = task.running_since {
        println!("  since:   {}", format_instant(since)?);
    }
    println!("  total:   {}", format_duration(task.total_seconds_at(now)));
    if !task.notes.is_empty() {
        println!("  notes:   {}", palette.muted(&task.notes));
    }
    Ok(())
}

fn print_toggle_json(task: &Task, event: &ToggleEvent) -> Result<(), AppError> {
    let json = serde_json::json!({
        "id": task.id,
        "name": task.name,
        "kind": event.kind,
        "at": format_instant(event.at)?,
        "total_seconds": event.total_seconds,
    });
    println!("{}", json);
    Ok(())
}

fn print_snapshot_summary(snapshot: &Snapshot, palette: &Palette) {
    let running = snapshot.iter().filter(|task| task.is_running()).count();
    println!(
        "{}",
        palette.muted(&format!(
            "[tasks] {} total, {} running",
            snapshot.len(),
            running
        ))
    );
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn task_id(raw: &str) -> Result<u64, AppError> {
    parse_task_id(raw).map_err(AppError::invalid_input)
}

fn required_name(raw: &str) -> Result<&str, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }
    Ok(trimmed)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(app: &App, command: Command, json: bool) -> Result<(), AppError> {
    let store = &app.store;
    let palette = &app.palette;

    match command {
        Command::Add { name, notes } => {
            let name = required_name(name.as_deref().unwrap_or(""))?;
            let id = store.create(name, notes.trim())?;
            let task = store.get(id)?;
            if json {
                print_task_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.name, task.id);
            }
        }
        Command::Edit { id, name, notes } => {
            let id = task_id(&id)?;
            if name.is_none() && notes.is_none() {
                return Err(AppError::invalid_input("nothing to change"));
            }
            let current = store.get(id)?;
            let name = match name.as_deref() {
                Some(value) => required_name(value)?.to_string(),
                None => current.name,
            };
            let notes = notes.map_or(current.notes, |value| value.trim().to_string());
            let task = store.edit(id, &name, &notes)?;
            if json {
                print_task_json(&task)?;
            } else {
                println!("Updated task: {} ({})", task.name, task.id);
            }
        }
        Command::Delete { id } => {
            let id = task_id(&id)?;
            let existing = store.snapshot()?.get(id).cloned();
            store.remove(id)?;
            match (existing, json) {
                (Some(task), true) => print_task_json(&task)?,
                (Some(task), false) => println!("Deleted task: {} ({})", task.name, task.id),
                (None, true) => println!("{}", serde_json::json!({ "id": id, "deleted": false })),
                (None, false) => println!("Task {id} was already deleted"),
            }
        }
        Command::Clear => {
            let count = store.snapshot()?.len();
            store.remove_all()?;
            if json {
                println!("{}", serde_json::json!({ "deleted": count }));
            } else {
                println!("Deleted {count} tasks");
            }
        }
        Command::Toggle { id } => {
            let id = task_id(&id)?;
            let Toggled { task, event } = store.toggle(id)?;
            if let Err(err) = app.notifier.notify(&task.name, &event) {
                tracing::warn!(error = %err, "notification failed");
            }
            if json {
                print_toggle_json(&task, &event)?;
            } else {
                let verb = match event.kind {
                    ToggleKind::Start => "Started",
                    ToggleKind::Stop => "Stopped",
                };
                println!(
                    "{} task: {} ({}), total {}. {}",
                    palette.timer_state(task.is_running(), verb),
                    task.name,
                    task.id,
                    format_duration(event.total_seconds),
                    notification_body(&event)
                );
            }
        }
        Command::Show { id } => {
            let task = store.get(task_id(&id)?)?;
            if json {
                print_task_json(&task)?;
            } else {
                print_task_plain(&task, palette)?;
            }
        }
        Command::List => {
            let snapshot = store.snapshot()?;
            if json {
                print_tasks_json(&snapshot)?;
            } else {
                print_tasks_plain(&snapshot, palette);
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let app = App::open(&[])?;
    let mut watch: Option<Subscription> = None;
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        if line.eq_ignore_ascii_case("watch") {
            if watch.take().is_some() {
                println!("Stopped watching");
            } else {
                let subscription = app.store.subscribe()?;
                // The first snapshot is the current list, which the user already asked for.
                subscription.drain();
                watch = Some(subscription);
                println!("Watching task list");
            }
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasktimer".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if !err.use_stderr() => {
                let _ = err.print();
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides are only accepted on the command line")
            );
            continue;
        }

        if let Err(err) = run_command(&app, cli.command, cli.json) {
            eprintln!("ERROR: {}", err);
        }

        if let Some(subscription) = watch.as_ref() {
            for snapshot in subscription.drain() {
                print_snapshot_summary(&snapshot, &app.palette);
            }
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let result = App::open(&cli.config_override)
        .and_then(|app| run_command(&app, cli.command, cli.json));
    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
