//! CLI command definitions for the `chatd` binary.
//!
//! Uses clap derive macros for argument parsing. Each subcommand maps to one
//! handler operation (e.g., `chatd create --users 7 9`, `chatd send 1 --from 7 --text hi`).

pub mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use chatserver_types::chat::{ChatId, UserId};

/// Manage chats, their members, and their messages.
#[derive(Parser)]
#[command(name = "chatd", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to load instead of `{data_dir}/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database URL (overrides the config file).
    #[arg(long, env = "CHATD_DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a chat with the given members.
    Create {
        /// Member user IDs.
        #[arg(long, num_args = 1..)]
        users: Vec<UserId>,
    },

    /// Delete a chat together with its members and messages.
    #[command(alias = "rm")]
    Delete {
        /// Chat to delete.
        chat_id: ChatId,
    },

    /// Send a message to a chat.
    Send {
        /// Target chat.
        chat_id: ChatId,

        /// Sending user; must be a member of the chat.
        #[arg(long)]
        from: UserId,

        /// Message text.
        #[arg(long)]
        text: String,
    },

    /// Check that the database is reachable.
    Check,
}

/// How command results are rendered.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            quiet: cli.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_create_with_users() {
        let cli = Cli::try_parse_from(["chatd", "create", "--users", "7", "9"]).unwrap();
        match cli.command {
            Commands::Create { users } => assert_eq!(users, vec![UserId(7), UserId(9)]),
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_parse_create_without_users_yields_empty_list() {
        let cli = Cli::try_parse_from(["chatd", "create"]).unwrap();
        match cli.command {
            Commands::Create { users } => assert!(users.is_empty()),
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_parse_send_with_global_flags() {
        let cli = Cli::try_parse_from([
            "chatd", "send", "5", "--from", "7", "--text", "hi", "--json", "-vv",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Send { chat_id, from, text } => {
                assert_eq!(chat_id, ChatId(5));
                assert_eq!(from, UserId(7));
                assert_eq!(text, "hi");
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric_chat_id() {
        assert!(Cli::try_parse_from(["chatd", "delete", "abc"]).is_err());
    }
}
