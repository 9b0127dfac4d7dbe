// src/notify/email.rs
//! SMTP delivery of the rendered digest. Credentials come from the
//! environment; a missing configuration is reported as `Ok(None)` so runs
//! without mail set up still print the report.

use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::report::Report;

pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
pub const ENV_SMTP_USER: &str = "SMTP_USER";
pub const ENV_SMTP_PASS: &str = "SMTP_PASS";
pub const ENV_FROM: &str = "NOTIFY_EMAIL_FROM";
pub const ENV_TO: &str = "NOTIFY_EMAIL_TO";

#[derive(Debug)]
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// Build a sender from `SMTP_HOST`/`SMTP_USER`/`SMTP_PASS` and
    /// `NOTIFY_EMAIL_FROM`/`NOTIFY_EMAIL_TO`. Returns `Ok(None)` when none of
    /// them are set; errors when the configuration is partial or malformed.
    pub fn from_env() -> Result<Option<Self>> {
        let vars = [ENV_SMTP_HOST, ENV_SMTP_USER, ENV_SMTP_PASS, ENV_FROM, ENV_TO];
        let set: Vec<&str> = vars
            .iter()
            .copied()
            .filter(|v| std::env::var(v).is_ok_and(|s| !s.trim().is_empty()))
            .collect();
        if set.is_empty() {
            return Ok(None);
        }
        if set.len() < vars.len() {
            let missing: Vec<&str> = vars.iter().copied().filter(|v| !set.contains(v)).collect();
            anyhow::bail!("incomplete SMTP configuration, missing {}", missing.join(", "));
        }

        let host = std::env::var(ENV_SMTP_HOST)?;
        let user = std::env::var(ENV_SMTP_USER)?;
        let pass = std::env::var(ENV_SMTP_PASS)?;
        let from: Mailbox = std::env::var(ENV_FROM)?
            .parse()
            .context("parsing NOTIFY_EMAIL_FROM")?;
        let to: Mailbox = std::env::var(ENV_TO)?
            .parse()
            .context("parsing NOTIFY_EMAIL_TO")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .with_context(|| format!("building SMTP relay for {host}"))?
            .credentials(Credentials::new(user, pass))
            .build();

        Ok(Some(Self {
            transport,
            from,
            to,
        }))
    }

    /// Send the report as a multipart plain-text + HTML message.
    pub async fn send(&self, report: &Report) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(report.subject())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(report.render_text()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(report.render_html()),
                    ),
            )
            .context("building report email")?;

        self.transport
            .send(message)
            .await
            .context("sending report email")?;
        tracing::info!(to = %self.to, "report email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        for v in [ENV_SMTP_HOST, ENV_SMTP_USER, ENV_SMTP_PASS, ENV_FROM, ENV_TO] {
            std::env::remove_var(v);
        }
    }

    #[serial_test::serial]
    #[test]
    fn unset_env_means_no_sender() {
        clear_env();
        assert!(EmailSender::from_env().unwrap().is_none());
    }

    #[serial_test::serial]
    #[test]
    fn partial_env_is_an_error() {
        clear_env();
        std::env::set_var(ENV_SMTP_HOST, "smtp.gmail.com");
        std::env::set_var(ENV_SMTP_USER, "bot@example.no");
        let err = EmailSender::from_env().unwrap_err();
        assert!(err.to_string().contains("SMTP_PASS"));
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn full_env_builds_a_sender() {
        clear_env();
        std::env::set_var(ENV_SMTP_HOST, "smtp.gmail.com");
        std::env::set_var(ENV_SMTP_USER, "bot@example.no");
        std::env::set_var(ENV_SMTP_PASS, "app-password");
        std::env::set_var(ENV_FROM, "LovSonar <bot@example.no>");
        std::env::set_var(ENV_TO, "compliance@example.no");
        assert!(EmailSender::from_env().unwrap().is_some());
        clear_env();
    }
}
