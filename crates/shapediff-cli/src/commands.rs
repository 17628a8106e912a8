use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use shapediff_engine::{DiffConfig, Differ, Tag};
use shapediff_types::{Change, ChangeLog, Shape, Value};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &cli.format),
        Command::Tag(args) => cmd_tag(args, &cli.format),
        Command::Config(args) => cmd_config(args),
    }
}

fn cmd_diff(args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let log = diff_files(&args)?;
    match format {
        OutputFormat::Json => {
            let records = log.to_change_records(&args.source, &args.id);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        OutputFormat::Text => print!("{}", render_text(&log)),
    }
    Ok(())
}

fn cmd_tag(args: TagArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let tag = Tag::parse(&args.tag)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tag)?),
        OutputFormat::Text => print!("{}", render_tag(&tag)),
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = match &args.path {
        Some(path) => load_config(path)?,
        None => DiffConfig::default(),
    };
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Compare the two documents named by `args`.
pub(crate) fn diff_files(args: &DiffArgs) -> anyhow::Result<ChangeLog> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DiffConfig::default(),
    };
    config.strict_mode |= args.strict;

    let mut builder = Differ::builder().config(config);
    if let Some(tag) = &args.tag {
        builder = builder.tag(Tag::parse(tag)?);
    }
    let differ = builder.build(Some(&Shape::Dynamic), None)?;

    let from = read_document(&args.from)?;
    let to = read_document(&args.to)?;
    let log = differ.diff_values(&from, &to);
    debug!(
        from = %args.from.display(),
        to = %args.to.display(),
        changes = log.len(),
        "compared documents"
    );
    Ok(log)
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(Value::from(json))
}

fn load_config(path: &Path) -> anyhow::Result<DiffConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid configuration in {}", path.display()))
}

pub(crate) fn render_text(log: &ChangeLog) -> String {
    if log.is_empty() {
        return "No changes.\n".to_string();
    }
    let mut out = String::new();
    for change in log {
        let line = match change {
            Change::Create { path, to } => format!("{} {}: {}", "+".green().bold(), path, to.to_string().green()),
            Change::Delete { path, from } => format!("{} {}: {}", "-".red().bold(), path, from.to_string().red()),
            Change::Update { path, from, to } => format!(
                "{} {}: {} → {}",
                "~".yellow().bold(),
                path,
                from.to_string().red(),
                to.to_string().green()
            ),
            Change::Error { path, message } => format!("{} {}: {}", "!".red().bold(), path, message.red()),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!(
        "\n{} changes: {} created, {} updated, {} deleted, {} errors\n",
        log.len().to_string().bold(),
        log.creates(),
        log.updates(),
        log.deletes(),
        log.errors()
    ));
    out
}

fn render_tag(tag: &Tag) -> String {
    let mut out = String::new();
    let mut line = |key: &str, value: String| {
        out.push_str(&format!("  {:<14} {}\n", key.cyan(), value));
    };
    line("name", tag.name.clone().unwrap_or_else(|| "-".into()));
    line("ignore", tag.ignore.to_string());
    line("presence", tag.presence.to_string());
    line("sort", tag.sort.to_string());
    line("indexBy", tag.index_by.clone().unwrap_or_else(|| "-".into()));
    line("precision", tag.precision.map_or_else(|| "-".into(), |p| p.to_string()));
    line("timeLayout", tag.time_layout.clone().unwrap_or_else(|| "-".into()));
    line("itemSeparator", tag.item_separator.clone().unwrap_or_else(|| "-".into()));
    line("pairDelimiter", tag.pair_delimiter.clone().unwrap_or_else(|| "-".into()));
    line("pairSeparator", tag.pair_separator.clone().unwrap_or_else(|| "-".into()));
    line("whitespace", tag.whitespace.clone().unwrap_or_else(|| "-".into()));
    line(
        "nullifyEmpty",
        tag.nullify_empty.map_or_else(|| "-".into(), |n| n.to_string()),
    );
    out
}
