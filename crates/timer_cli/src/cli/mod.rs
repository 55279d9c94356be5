use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasktimer add "Write report" --notes "Q3 numbers"
    Add {
        name: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Edit a task's name or notes
    ///
    /// Example: tasktimer edit 1 --name "Write final report"
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: tasktimer delete 1
    Delete {
        id: String,
    },
    /// Delete every task
    ///
    /// Example: tasktimer clear
    Clear,
    /// Start a stopped task or stop a running one
    ///
    /// Example: tasktimer toggle 1
    Toggle {
        id: String,
    },
    /// Show details of a task
    ///
    /// Example: tasktimer show 1
    Show {
        id: String,
    },
    /// List all tasks
    ///
    /// Example: tasktimer list
    List,
}

/// Parses a task id argument.
pub fn parse_task_id(raw: &str) -> Result<u64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("id is required".to_string());
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| format!("invalid task id '{trimmed}'"))
}

/// Formats a number of seconds as `HH:MM:SS`; hours are not capped at 24.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
