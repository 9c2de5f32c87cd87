#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the green area dashboard pipeline.
//!
//! Loads the source files once, builds a [`Report`] and prints the answer
//! to one query as pretty JSON. `shell` keeps the report in memory and
//! answers one query per stdin line; `reload` rebuilds it from disk and
//! swaps it in atomically.

mod query;

use std::io::BufRead as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use radiografia_analytics::Report;
use radiografia_dataset::{Dataset, DatasetConfig, SnapshotHandle};

use crate::query::Query;

#[derive(Parser)]
#[command(name = "radiografia", about = "Green area accessibility queries")]
struct Cli {
    /// Directory holding the source files
    #[arg(long, default_value = "src_files", global = true)]
    data_dir: PathBuf,

    /// TOML file overriding file names, columns, placeholders or weights
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Query(Query),
    /// Answer one query per stdin line (`reload` rereads the files)
    Shell,
}

/// A single shell line.
#[derive(Parser)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    query: Query,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DatasetConfig::from_file(path)?,
        None => DatasetConfig::default(),
    };
    let report = load_report(&config, &cli.data_dir)?;

    match cli.command {
        Commands::Query(query) => print_json(&query::run(&query, &report)?)?,
        Commands::Shell => shell(&config, &cli.data_dir, report)?,
    }

    Ok(())
}

fn load_report(config: &DatasetConfig, data_dir: &Path) -> Result<Report, Box<dyn std::error::Error>> {
    let dataset = Dataset::load(config, data_dir)?;
    Ok(Report::build(Arc::new(dataset))?)
}

fn print_json(value: &serde_json::Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn shell(
    config: &DatasetConfig,
    data_dir: &Path,
    report: Report,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = SnapshotHandle::new(report);

    for line in std::io::stdin().lock().lines() {
        let args = split_args(&line?);
        match args.first().map(String::as_str) {
            None => {}
            Some("exit" | "quit") => break,
            Some("reload") => match load_report(config, data_dir) {
                Ok(next) => {
                    handle.replace(next);
                    log::info!("Reloaded dataset from {}", data_dir.display());
                }
                Err(e) => log::error!("Reload failed, keeping the current dataset: {e}"),
            },
            Some(_) => match ShellLine::try_parse_from(&args) {
                Ok(line) => match query::run(&line.query, &handle.current()) {
                    Ok(value) => print_json(&value)?,
                    Err(e) => eprintln!("error: {e}"),
                },
                Err(e) => eprintln!("{e}"),
            },
        }
    }

    Ok(())
}

/// Splits a shell line on whitespace, keeping double-quoted runs together.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        args.push(current);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_keeps_quotes() {
        assert_eq!(
            split_args(r#"center --name "Parque Clouthier""#),
            vec!["center", "--name", "Parque Clouthier"]
        );
        assert_eq!(split_args("  top  --metric ranking_score "), vec!["top", "--metric", "ranking_score"]);
        assert!(split_args("   ").is_empty());
        assert_eq!(split_args(r#"center --name """#), vec!["center", "--name", ""]);
    }

    #[test]
    fn shell_lines_parse_as_queries() {
        let line = ShellLine::try_parse_from(split_args("top --metric population_total --n 3 --ascending")).unwrap();
        assert_eq!(
            line.query,
            Query::Top {
                metric: "population_total".to_string(),
                n: 3,
                ascending: true,
            }
        );
        let line = ShellLine::try_parse_from(split_args("age-sex")).unwrap();
        assert_eq!(line.query, Query::AgeSex { park: None });
    }

    #[test]
    fn cli_accepts_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["radiografia", "services", "--park", "5", "--data-dir", "data"]).unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("data"));
        assert!(matches!(cli.command, Commands::Query(Query::Services { park: 5 })));
    }
}
