//! CLI commands for the emoji picker.
//!
//! Thin wrapper over [`EmojiPicker`]: every command builds a picker from the
//! configuration, runs once and flushes usage changes before returning.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::core::EmojiPicker;

#[derive(Parser)]
#[command(name = "emoji-picker")]
#[command(about = "Search emojis by keyword, most used first", long_about = None)]
pub struct Cli {
    /// Configuration file (default: <config dir>/emoji-picker/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print emojis matching a filter, separated by spaces
    Search {
        /// Filter text; fewer than two characters lists every emoji
        #[arg(default_value = "")]
        filter: String,
    },

    /// Print the keywords of an emoji, separated by semicolons
    Keywords {
        emoji: String,
    },

    /// Record that an emoji was used
    Use {
        emoji: String,

        /// Number of uses to record
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Print the most used emojis
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Forget the usage count of an emoji
    Forget {
        emoji: String,
    },

    /// Forget all usage counts
    Reset,

    /// Print usage statistics
    Stats,
}

/// Parse arguments and run the requested command.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let picker = EmojiPicker::new(&config);

    let mut out = io::stdout().lock();
    execute(&picker, cli.command, &mut out)?;

    picker.flush()?;
    Ok(())
}

/// Run one command against `picker`, writing its output to `out`.
pub fn execute(picker: &EmojiPicker, command: Commands, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::Search { filter } => {
            writeln!(out, "{}", picker.search_line(&filter)?)?;
        }
        Commands::Keywords { emoji } => {
            writeln!(out, "{}", picker.keywords_line(&emoji)?)?;
        }
        Commands::Use { emoji, times } => {
            picker.record_usage_by(&emoji, times);
            writeln!(out, "{} used {} times", emoji, picker.usage_count(&emoji))?;
        }
        Commands::Top { limit } => {
            for emoji in picker.top_emojis(limit) {
                writeln!(out, "{} {}", emoji, picker.usage_count(&emoji))?;
            }
        }
        Commands::Forget { emoji } => match picker.remove_rank(&emoji) {
            Some(count) => writeln!(out, "Forgot {} ({} uses)", emoji, count)?,
            None => writeln!(out, "{} has no recorded uses", emoji)?,
        },
        Commands::Reset => {
            picker.reset_ranks()?;
            writeln!(out, "All usage counts cleared")?;
        }
        Commands::Stats => {
            let stats = picker.stats();
            writeln!(out, "Tracked emojis: {}", stats.tracked_emojis)?;
            writeln!(out, "Total uses:     {}", stats.total_uses)?;
            writeln!(out, "Most uses:      {}", stats.max_uses)?;
        }
    }
    Ok(())
}
