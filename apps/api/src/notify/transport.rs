use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

/// STARTTLS SMTP relay.
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .with_context(|| format!("invalid SMTP relay '{}'", settings.host))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();
        let from = Mailbox::new(
            Some(settings.from_name.clone()),
            settings
                .from_email
                .parse()
                .with_context(|| format!("invalid sender address '{}'", settings.from_email))?,
        );
        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let to: Mailbox = email
            .to
            .parse()
            .with_context(|| format!("invalid recipient '{}'", email.to))?;
        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject);

        let html = SinglePart::html(email.html_body);
        let message = if email.attachments.is_empty() {
            builder.singlepart(html)?
        } else {
            let mut parts = MultiPart::mixed().singlepart(html);
            for attachment in email.attachments {
                let content_type = ContentType::parse(&attachment.content_type)
                    .with_context(|| format!("invalid content type '{}'", attachment.content_type))?;
                parts = parts.singlepart(
                    Attachment::new(attachment.file_name).body(attachment.bytes.to_vec(), content_type),
                );
            }
            builder.multipart(parts)?
        };

        self.mailer.send(message).await?;
        debug!(to = %email.to, "email sent");
        Ok(())
    }
}
