use clap::{Parser, Subcommand};

mod commands;
mod errors;
mod handlers;
mod render;
mod validation;

pub use handlers::dispatch;

#[derive(Parser, Debug)]
#[command(version, about = "Search memes from the terminal", long_about = None)]
pub struct Args {
    /// Log debug output to stderr (MEMEFIND_LOG takes precedence)
    #[clap(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Streaming search with live progress. Ctrl-C cancels.
    Search {
        #[clap(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Number of results, defaults to `top_k` from the config
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Print stage changes as lines instead of a progress bar
        #[clap(long, default_value = "false")]
        plain: bool,

        /// Print results as json
        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// One-shot search without progress
    Quick {
        #[clap(required = true, num_args = 1..)]
        query: Vec<String>,

        #[clap(short = 'n', long)]
        limit: Option<usize>,

        #[clap(short, long)]
        category: Option<String>,

        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// List memes page by page
    List {
        /// Page size, defaults to `page_size` from the config
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        #[clap(short, long, default_value = "0")]
        offset: usize,

        #[clap(short, long)]
        category: Option<String>,

        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// List categories
    Categories {
        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Show a single meme
    Show {
        id: String,

        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Print the bundled memes used when the server is unreachable
    Curated {
        query: Option<String>,

        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Print the effective configuration
    Config {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let args = Args::try_parse_from(["memefind", "search", "可爱", "猫", "-n", "5", "--plain"]).unwrap();
        match args.command {
            Command::Search { query, limit, plain, json } => {
                assert_eq!(query, vec!["可爱".to_string(), "猫".to_string()]);
                assert_eq!(limit, Some(5));
                assert!(plain);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Args::try_parse_from(["memefind", "search"]).is_err());
    }

    #[test]
    fn test_verbose_is_global() {
        let args = Args::try_parse_from(["memefind", "categories", "--verbose"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn test_parse_list_defaults() {
        let args = Args::try_parse_from(["memefind", "list", "-c", "猫咪"]).unwrap();
        match args.command {
            Command::List { limit, offset, category, json } => {
                assert_eq!(limit, None);
                assert_eq!(offset, 0);
                assert_eq!(category.as_deref(), Some("猫咪"));
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
