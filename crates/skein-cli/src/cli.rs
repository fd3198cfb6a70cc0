//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "skein", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "SKEIN_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Embed a JSON file of document chunks.
    Embed {
        /// Input file: a JSON array of chunks.
        #[arg(short, long)]
        input: String,

        /// Where to write embedded chunks (defaults to the input file).
        #[arg(short, long)]
        output: Option<String>,

        /// Re-embed chunks that already carry vectors.
        #[arg(short, long)]
        force: bool,

        /// Embedding model (defaults to the configured model).
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search an embedded chunk file.
    Search {
        /// Query text.
        query: String,

        /// Embedded chunk file to search.
        #[arg(short, long)]
        store: String,

        /// Strategy: dense, sparse or hybrid.
        #[arg(long)]
        strategy: Option<String>,

        /// Maximum number of results.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity (0.0 to 1.0).
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Print the raw result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,

    /// Show the resolved config file path.
    Path,

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_default() {
        let args = CliArgs::parse_from(["skein"]);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_cli_args_verbose_quiet() {
        let args = CliArgs::parse_from(["skein", "-v"]);
        assert!(args.verbose);

        let args = CliArgs::parse_from(["skein", "--quiet"]);
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_args_config_flag() {
        let args = CliArgs::parse_from(["skein", "--config", "/tmp/skein.toml"]);
        assert_eq!(args.config.as_deref(), Some("/tmp/skein.toml"));
    }

    #[test]
    fn test_embed_command() {
        let args = CliArgs::parse_from([
            "skein", "embed", "--input", "chunks.json", "-o", "out.json", "--force",
        ]);
        match args.command {
            Some(Command::Embed {
                input,
                output,
                force,
                model,
            }) => {
                assert_eq!(input, "chunks.json");
                assert_eq!(output.as_deref(), Some("out.json"));
                assert!(force);
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_command() {
        let args = CliArgs::parse_from([
            "skein",
            "search",
            "purring cats",
            "--store",
            "chunks.json",
            "--strategy",
            "sparse",
            "-k",
            "5",
            "--threshold",
            "0.25",
        ]);
        match args.command {
            Some(Command::Search {
                query,
                store,
                strategy,
                top_k,
                threshold,
                json,
            }) => {
                assert_eq!(query, "purring cats");
                assert_eq!(store, "chunks.json");
                assert_eq!(strategy.as_deref(), Some("sparse"));
                assert_eq!(top_k, Some(5));
                assert_eq!(threshold, Some(0.25));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_requires_store() {
        assert!(CliArgs::try_parse_from(["skein", "search", "cats"]).is_err());
    }

    #[test]
    fn test_config_show() {
        let args = CliArgs::parse_from(["skein", "config", "show"]);
        assert!(matches!(
            args.command,
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Show
            }))
        ));
    }

    #[test]
    fn test_config_init_flags() {
        let args = CliArgs::parse_from(["skein", "config", "init", "-f", "/tmp/c.toml", "--force"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Init { file, force },
            })) => {
                assert_eq!(file.as_deref(), Some("/tmp/c.toml"));
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_version_command() {
        let args = CliArgs::parse_from(["skein", "version"]);
        assert!(matches!(args.command, Some(Command::Version)));
    }
}
