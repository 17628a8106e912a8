use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "shapediff",
    about = "Structural diffs of JSON documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two JSON documents
    Diff(DiffArgs),
    /// Parse a field tag and show its directives
    Tag(TagArgs),
    /// Show the effective engine configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Document to compare from
    pub from: PathBuf,
    /// Document to compare to
    pub to: PathBuf,
    /// Directives for the root value, e.g. "indexBy=."
    #[arg(long)]
    pub tag: Option<String>,
    /// TOML file with engine configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Source name attached to exported records
    #[arg(long, default_value = "")]
    pub source: String,
    /// Source id attached to exported records
    #[arg(long, default_value = "")]
    pub id: String,
    /// Reject comparisons between unrelated scalar kinds
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct TagArgs {
    pub tag: String,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// TOML file to load; defaults are shown without one
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["shapediff", "diff", "a.json", "b.json"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.from, PathBuf::from("a.json"));
            assert_eq!(args.to, PathBuf::from("b.json"));
            assert!(args.tag.is_none());
            assert!(!args.strict);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_options() {
        let cli = Cli::try_parse_from([
            "shapediff", "diff", "a.json", "b.json",
            "--tag", "indexBy=id", "--source", "orders", "--id", "42", "--strict",
        ]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.tag.as_deref(), Some("indexBy=id"));
            assert_eq!(args.source, "orders");
            assert_eq!(args.id, "42");
            assert!(args.strict);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_requires_both_files() {
        assert!(Cli::try_parse_from(["shapediff", "diff", "a.json"]).is_err());
    }

    #[test]
    fn parse_tag() {
        let cli = Cli::try_parse_from(["shapediff", "tag", "sort=true"]).unwrap();
        if let Command::Tag(args) = cli.command {
            assert_eq!(args.tag, "sort=true");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_config() {
        let cli = Cli::try_parse_from(["shapediff", "config"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigArgs { path: None })));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["shapediff", "--verbose", "config"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["shapediff", "--format", "json", "tag", "-"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
