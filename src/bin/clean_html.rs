//! Offline run of the cleaning pipeline on a saved HTML page.
//!
//! Usage: clean_html <page.html> [--selector <css>] [--column-map <file.yaml>]
//! Prints the cleaned rows as JSON on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use rankscrape::{export, extract, process::NameMap};
use std::{fs, path::PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "clean_html")]
struct Cli {
    /// Saved HTML document
    page: PathBuf,

    /// CSS selector of the table element
    #[arg(long, default_value = extract::DEFAULT_TABLE_SELECTOR)]
    selector: String,

    /// Extra header variants (YAML)
    #[arg(long)]
    column_map: Option<PathBuf>,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let html = fs::read_to_string(&cli.page)
        .with_context(|| format!("reading {}", cli.page.display()))?;

    let names = match &cli.column_map {
        Some(path) => NameMap::builtin().merged_with(&NameMap::from_yaml_file(path)?),
        None => NameMap::builtin().clone(),
    };

    let raw = extract::parse_table(&html, &cli.selector)?;
    let table = rankscrape::clean_table(raw, &names);
    let records = export::to_json_records(&table)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
