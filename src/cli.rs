use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "docent",
    version,
    about = "Ask questions about your own documents"
)]
pub(crate) struct Cli {
    /// Path to the TOML config file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "DOCENT_CONFIG",
        default_value = "config/default.toml"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run the HTTP gateway
    Serve,

    /// Index a text or markdown file
    Add {
        /// Document name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        file: PathBuf,
    },

    /// Answer a question from the indexed documents
    Ask { question: String },

    /// Semantic search over indexed passages
    Search {
        query: String,

        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_name() {
        let cli = Cli::try_parse_from(["docent", "add", "--name", "Notes", "notes.md"]).unwrap();
        match cli.command {
            Command::Add { name, file } => {
                assert_eq!(name.as_deref(), Some("Notes"));
                assert_eq!(file, PathBuf::from("notes.md"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_search_limit_and_global_config() {
        let cli =
            Cli::try_parse_from(["docent", "search", "paris", "--limit", "2", "-c", "x.toml"])
                .unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(
            cli.command,
            Command::Search { ref query, limit: Some(2) } if query == "paris"
        ));
    }

    #[test]
    fn ask_requires_question() {
        assert!(Cli::try_parse_from(["docent", "ask"]).is_err());
    }
}
