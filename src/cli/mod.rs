//! CLI module for VidQuery.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// VidQuery - ask questions about YouTube videos
///
/// Answers are grounded in the video's transcript and returned as bullet points.
#[derive(Parser, Debug)]
#[command(name = "vidquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDQUERY_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long, env = "VIDQUERY_PORT")]
        port: Option<u16>,
    },

    /// Ask a question about a video
    Ask {
        /// YouTube URL or video ID
        video: String,

        /// The question to ask
        question: String,

        /// Print the transcript chunks the answer was grounded on
        #[arg(short, long)]
        sources: bool,
    },

    /// Print the transcript of a video
    Transcript {
        /// YouTube URL or video ID
        video: String,

        /// Write the transcript to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["vidquery", "-vv", "ask", "abc123", "What is it about?", "--sources"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { video, question, sources } => {
                assert_eq!(video, "abc123");
                assert_eq!(question, "What is it about?");
                assert!(sources);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["vidquery", "serve", "--host", "0.0.0.0", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["vidquery", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
