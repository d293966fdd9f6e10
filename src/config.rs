// src/config.rs

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::extract::DEFAULT_TABLE_SELECTOR;
use crate::fetch::DEFAULT_SOURCE_URL;
use crate::process::NameMap;

pub static DEFAULT_OUTPUT: &str = "outputs/largest_companies_by_revenue.xlsx";

/// Command line for the `rankscrape` binary.
#[derive(Debug, Default, Parser)]
#[command(name = "rankscrape")]
#[command(about = "Scrape a company ranking table, clean it and save it as a report")]
pub struct Args {
    /// YAML config file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Page holding the table
    #[arg(long)]
    pub url: Option<String>,

    /// CSS selector of the table element (first match is used)
    #[arg(long)]
    pub selector: Option<String>,

    /// Report path; extension picks the format (.xlsx, .parquet, .csv, .json)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Extra header variants (YAML), layered over the built-in column map
    #[arg(long)]
    pub column_map: Option<PathBuf>,

    /// Recipient of the report e-mail (defaults to the SMTP user)
    #[arg(long)]
    pub email_to: Option<String>,

    /// Do not e-mail the report
    #[arg(long)]
    pub no_email: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailSettings {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub to: Option<String>,
    pub subject: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            to: None,
            subject: "Your scraped data file".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub url: String,
    pub table_selector: String,
    pub output: PathBuf,
    pub column_map: Option<PathBuf>,
    pub mail: MailSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            table_selector: DEFAULT_TABLE_SELECTOR.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            column_map: None,
            mail: MailSettings::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Defaults, then the `--config` file, then individual flags.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };

        if let Some(url) = &args.url {
            cfg.url = url.clone();
        }
        if let Some(selector) = &args.selector {
            cfg.table_selector = selector.clone();
        }
        if let Some(out) = &args.out {
            cfg.output = out.clone();
        }
        if let Some(map) = &args.column_map {
            cfg.column_map = Some(map.clone());
        }
        if let Some(to) = &args.email_to {
            cfg.mail.to = Some(to.clone());
        }
        if args.no_email {
            cfg.mail.enabled = false;
        }
        Ok(cfg)
    }

    /// Built-in column map, extended by the configured file if any.
    pub fn name_map(&self) -> Result<NameMap> {
        match &self.column_map {
            Some(path) => {
                let extra = NameMap::from_yaml_file(path)?;
                Ok(NameMap::builtin().merged_with(&extra))
            }
            None => Ok(NameMap::builtin().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::BusinessColumn;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_without_flags() -> Result<()> {
        let cfg = Config::resolve(&Args::parse_from(["rankscrape"]))?;
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.table_selector, "table");
        assert!(cfg.mail.enabled);
        Ok(())
    }

    #[test]
    fn flags_override_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "url: https://example.com/list\noutput: out/file.csv\nmail:\n  smtp_port: 2525\n  to: team@example.com"
        )?;

        let args = Args::parse_from([
            "rankscrape",
            "--config",
            file.path().to_str().unwrap(),
            "--out",
            "elsewhere.json",
            "--no-email",
        ]);
        let cfg = Config::resolve(&args)?;

        assert_eq!(cfg.url, "https://example.com/list");
        assert_eq!(cfg.output, PathBuf::from("elsewhere.json"));
        assert_eq!(cfg.mail.smtp_port, 2525);
        assert_eq!(cfg.mail.smtp_host, "smtp.gmail.com");
        assert_eq!(cfg.mail.to.as_deref(), Some("team@example.com"));
        assert!(!cfg.mail.enabled);
        Ok(())
    }

    #[test]
    fn unknown_keys_rejected() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "urll: typo")?;
        assert!(Config::from_yaml_file(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn column_map_file_extends_builtin() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "company:\n  - Firm name")?;

        let cfg = Config {
            column_map: Some(file.path().to_path_buf()),
            ..Config::default()
        };
        let names = cfg.name_map()?;
        assert_eq!(names.resolve("firm_name"), BusinessColumn::Company);
        assert_eq!(names.resolve("ranks"), BusinessColumn::Rank);
        Ok(())
    }
}
