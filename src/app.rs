//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A terminal microphone recorder widget with a host dashboard bridge
#[derive(Parser)]
#[command(name = "ovr")]
#[command(version)]
#[command(about = "\n\n ┏┓┓┏┏┓\n ┗┛┗┛┛ ")]
#[command(long_about = "\n\n ┏┓┓┏┏┓\n ┗┛┗┛┛ \n\nA terminal microphone recorder widget. Records audio, shows elapsed time,\nwrites the finished recording's URL to a host-readable state file and can\nsignal completion to the hosting environment.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Open the recorder widget\n    $ ovr\n\n    # Open it with a task-specific title\n    $ ovr --title \"Chimney Repair C457897\"\n\n    # Toggle recording from outside the widget\n    $ pkill -USR1 ovr\n\n    # List capture devices to configure in ovr.toml\n    $ ovr list-devices\n\n    # Edit configuration file\n    $ ovr config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/ovr/ovr.toml\n    Logs:               ~/.local/state/ovr/ovr.log.*\n\nFor more information, visit: https://github.com/ovr-tools/ovr"
)]
struct Cli {
    /// Title shown above the recorder (record default command)
    #[arg(short, long, global = true)]
    title: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the recorder widget (default)
    ///
    /// Press Space or Enter to start/stop recording, 'd' to signal Done,
    /// Escape/q to quit. The finished recording's URL is written to the
    /// configured host state file.
    #[command(visible_alias = "r")]
    Record {
        /// Title shown above the recorder
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit the widget title, audio device, host state file and other
    /// configuration. Uses $EDITOR environment variable or falls back to
    /// nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in ovr.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   ovr completions bash > ovr.bash
    ///   ovr completions zsh > _ovr
    ///   ovr completions fish > ovr.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails (e.g., recording, config editing)
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "ovr", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Record { .. }) => {
            // Default command is record
            // If both are specified, the explicit record command option takes precedence
            let title = match cli.command {
                Some(Commands::Record { title }) => title,
                None => cli.title,
                _ => unreachable!(),
            };
            commands::handle_record(title).await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
