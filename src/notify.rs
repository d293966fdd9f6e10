// src/notify.rs

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::config::MailSettings;

pub static SMTP_USER_VAR: &str = "SCRAPER_SMTP_USER";
pub static SMTP_PASSWORD_VAR: &str = "SCRAPER_SMTP_PASSWORD";

#[derive(Clone)]
pub struct SmtpCredentials {
    pub user: String,
    password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl SmtpCredentials {
    /// Both values must be present and non-empty.
    pub fn from_values(user: Option<String>, password: Option<String>) -> Option<Self> {
        let user = user.filter(|u| !u.trim().is_empty())?;
        let password = password.filter(|p| !p.is_empty())?;
        Some(Self { user, password })
    }

    /// Read `SCRAPER_SMTP_USER` / `SCRAPER_SMTP_PASSWORD`.
    pub fn from_env() -> Option<Self> {
        Self::from_values(
            std::env::var(SMTP_USER_VAR).ok(),
            std::env::var(SMTP_PASSWORD_VAR).ok(),
        )
    }
}

/// Outcome of a delivery attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { to: String },
    Skipped { reason: String },
}

#[cfg(feature = "email")]
mod smtp {
    use anyhow::{anyhow, Context, Result};
    use lettre::{
        message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
        transport::smtp::authentication::Credentials,
        Message, SmtpTransport, Transport,
    };
    use std::{fs, path::Path};

    use super::SmtpCredentials;
    use crate::config::MailSettings;

    /// Recipient: configured address, else the sender.
    pub fn recipient<'a>(settings: &'a MailSettings, sender: &'a str) -> &'a str {
        settings.to.as_deref().unwrap_or(sender)
    }

    /// Plain-text note with the report attached as `application/octet-stream`.
    pub fn build_message(settings: &MailSettings, sender: &str, path: &Path) -> Result<Message> {
        let from: Mailbox = sender
            .parse()
            .with_context(|| format!("invalid sender address {:?}", sender))?;
        let to_addr = recipient(settings, sender);
        let to: Mailbox = to_addr
            .parse()
            .with_context(|| format!("invalid recipient address {:?}", to_addr))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("report")
            .to_string();
        let bytes =
            fs::read(path).with_context(|| format!("reading attachment {}", path.display()))?;
        let content_type = ContentType::parse("application/octet-stream")
            .map_err(|e| anyhow!("attachment content type: {:?}", e))?;

        let body = format!(
            "Hi! Your automated data scraping task has completed.\n{} is attached.\n",
            file_name
        );

        Message::builder()
            .from(from)
            .to(to)
            .subject(settings.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(Attachment::new(file_name).body(bytes, content_type)),
            )
            .context("building report e-mail")
    }

    /// STARTTLS submission; blocks until the server answers.
    pub fn send_blocking(
        settings: &MailSettings,
        creds: &SmtpCredentials,
        message: &Message,
    ) -> Result<()> {
        let mailer = SmtpTransport::starttls_relay(&settings.smtp_host)
            .with_context(|| format!("configuring SMTP relay {}", settings.smtp_host))?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                creds.user.clone(),
                creds.password.clone(),
            ))
            .build();
        mailer.send(message).context("sending report e-mail")?;
        Ok(())
    }
}

#[cfg(feature = "email")]
pub use smtp::{build_message, recipient};

/// E-mail `path` as an attachment. Missing credentials or a disabled mailer
/// skip delivery with a warning rather than failing the run.
#[cfg(feature = "email")]
#[tracing::instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn send_report(
    settings: &MailSettings,
    creds: Option<SmtpCredentials>,
    path: &Path,
) -> Result<Delivery> {
    use anyhow::Context;

    if !settings.enabled {
        return Ok(skipped("e-mail disabled"));
    }
    let Some(creds) = creds else {
        return Ok(skipped("SMTP credentials not found in environment"));
    };

    let message = smtp::build_message(settings, &creds.user, path)?;
    let to = smtp::recipient(settings, &creds.user).to_string();

    let settings = settings.clone();
    tokio::task::spawn_blocking(move || smtp::send_blocking(&settings, &creds, &message))
        .await
        .context("mail task failed")??;

    info!(to = %to, "report e-mailed");
    Ok(Delivery::Sent { to })
}

#[cfg(not(feature = "email"))]
pub async fn send_report(
    _settings: &MailSettings,
    _creds: Option<SmtpCredentials>,
    _path: &Path,
) -> Result<Delivery> {
    Ok(skipped("built without the `email` feature"))
}

fn skipped(reason: &str) -> Delivery {
    warn!("{}; skipping e-mail", reason);
    Delivery::Skipped {
        reason: reason.to_string(),
    }
}
