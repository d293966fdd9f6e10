use anyhow::Result;
use clap::Parser;
use rankscrape::{
    config::{Args, Config},
    export, extract, fetch,
    notify::{self, Delivery, SmtpCredentials},
    process,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rankscrape=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    if dotenv::dotenv().is_err() {
        info!("no .env file; using process environment");
    }
    let cfg = Config::resolve(&Args::parse())?;
    let names = cfg.name_map()?;
    info!(url = %cfg.url, output = %cfg.output.display(), variants = names.len(), "startup");

    // ─── 3) fetch + extract ──────────────────────────────────────────
    let client = fetch::build_client()?;
    let html = fetch::fetch_html(&client, &cfg.url).await?;
    let raw = extract::parse_table(&html, &cfg.table_selector)?;
    info!(
        columns = raw.num_columns(),
        rows = raw.num_rows(),
        "extracted table"
    );

    // ─── 4) clean ────────────────────────────────────────────────────
    let table = process::clean_table(raw, &names);
    if table.num_rows() == 0 {
        warn!("cleaned table has no rows");
    }

    // ─── 5) save ─────────────────────────────────────────────────────
    let path = export::save_table(&table, &cfg.output)?;
    info!(path = %path.display(), "report saved");

    // ─── 6) e-mail ───────────────────────────────────────────────────
    match notify::send_report(&cfg.mail, SmtpCredentials::from_env(), &path).await? {
        Delivery::Sent { to } => info!(to = %to, "report sent"),
        Delivery::Skipped { reason } => info!(reason = %reason, "report not sent"),
    }

    info!("all done");
    Ok(())
}
