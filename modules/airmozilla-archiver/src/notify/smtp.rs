use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::backend::NotifyBackend;
use super::email::AdminEmail;

/// SMTP notification backend.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Authenticated relays are reached over STARTTLS; without credentials the
    /// host is treated as a trusted local relay.
    pub fn new(
        host: &str,
        port: Option<u16>,
        credentials: Option<(String, String)>,
        from_address: &str,
    ) -> anyhow::Result<Self> {
        let mut builder = match credentials {
            Some((username, password)) => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .with_context(|| format!("Invalid SMTP relay: {host}"))?
                .credentials(Credentials::new(username, password)),
            None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };
        if let Some(port) = port {
            builder = builder.port(port);
        }

        let from = from_address
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid from address: {from_address}"))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn message(&self, email: &AdminEmail) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for address in &email.to {
            let mailbox = address
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid administrator address: {address}"))?;
            builder = builder.to(mailbox);
        }
        Ok(builder.body(email.body.clone())?)
    }
}

#[async_trait]
impl NotifyBackend for SmtpMailer {
    async fn send(&self, email: &AdminEmail) -> anyhow::Result<()> {
        if email.to.is_empty() {
            anyhow::bail!("No administrators to notify: {}", email.subject);
        }

        let message = self.message(email)?;
        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;

        info!(subject = %email.subject, recipients = email.to.len(), "Sent administrator email");
        Ok(())
    }
}
