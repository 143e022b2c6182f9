use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use tracing::{info, warn};

use crate::config::MailConfig;

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let builder = if config.ssl_tls {
            SmtpTransport::relay(&config.server).context("create SMTP transport")?
        } else if config.starttls {
            SmtpTransport::starttls_relay(&config.server).context("create SMTP transport")?
        } else {
            SmtpTransport::builder_dangerous(&config.server)
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();
        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("parse MAIL_FROM {:?}", config.from))?;

        info!(
            server = %config.server,
            port = config.port,
            starttls = config.starttls,
            ssl_tls = config.ssl_tls,
            "SMTP mailer initialized"
        );
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("parse recipient {:?}", mail.to))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .context("build email message")?;

        // lettre's SMTP transport is blocking
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("join SMTP send task")?
            .context("SMTP send")?;
        Ok(())
    }
}

pub fn password_reset_mail(to: &str, frontend_url: &str, token: &str, ttl_minutes: i64) -> OutgoingMail {
    let reset_url = format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    );
    OutgoingMail {
        to: to.to_string(),
        subject: "Password reset - Migraine Diary".into(),
        body: format!(
            "Hello,\n\nTo reset your password, open the link below:\n{reset_url}\n\n\
             This link expires in {ttl_minutes} minutes.\n\n\
             If you did not request this change, ignore this email."
        ),
    }
}

/// Sends on a background task. The caller's response never waits on, or fails with, the send.
pub fn dispatch(mailer: Arc<dyn Mailer>, mail: OutgoingMail) {
    tokio::spawn(async move {
        let to = mail.to.clone();
        match mailer.send(mail).await {
            Ok(()) => info!(to = %to, "email sent"),
            Err(e) => warn!(error = ?e, to = %to, "failed to send email"),
        }
    });
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use tokio::sync::mpsc;

    /// Mailer that forwards every message to a channel instead of an SMTP server.
    pub struct RecordingMailer {
        tx: mpsc::UnboundedSender<OutgoingMail>,
    }

    impl RecordingMailer {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<OutgoingMail>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { tx }, rx)
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
            self.tx.send(mail).context("recording channel closed")?;
            Ok(())
        }
    }

    pub struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _mail: OutgoingMail) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;
    use std::time::Duration;

    #[test]
    fn reset_mail_links_to_frontend() {
        let mail = password_reset_mail("ana@x.com", "http://localhost:3000/", "abc.def.ghi", 15);
        assert_eq!(mail.to, "ana@x.com");
        assert!(mail
            .body
            .contains("http://localhost:3000/reset-password?token=abc.def.ghi"));
        assert!(mail.body.contains("15 minutes"));
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let (mailer, mut rx) = RecordingMailer::new();
        dispatch(Arc::new(mailer), password_reset_mail("a@b.co", "http://f", "t", 15));
        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("mail dispatched")
            .expect("channel open");
        assert_eq!(got.to, "a@b.co");
    }
}
