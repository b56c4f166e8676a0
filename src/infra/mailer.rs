use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MessageBuilder, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::AppConfig;

/// A file sent alongside the HTML body.
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        subject: &str,
        html: &str,
        to: &[String],
        cc: &[String],
        bcc: &[String],
        attachments: &[EmailAttachment],
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let address: Address = config
            .email_sender_address
            .parse()
            .map_err(|err| anyhow!("invalid EMAIL_SENDER_ADDRESS: {}", err))?;
        let from = Mailbox::new(Some(config.email_sender_name.clone()), address);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.email_sender_address.clone(),
                config.email_sender_password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(
        &self,
        subject: &str,
        html: &str,
        to: &[String],
        cc: &[String],
        bcc: &[String],
        attachments: &[EmailAttachment],
    ) -> Result<Message> {
        build_message(self.from.clone(), subject, html, to, cc, bcc, attachments)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(
        &self,
        subject: &str,
        html: &str,
        to: &[String],
        cc: &[String],
        bcc: &[String],
        attachments: &[EmailAttachment],
    ) -> Result<()> {
        let message = self.build_message(subject, html, to, cc, bcc, attachments)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn build_message(
    from: Mailbox,
    subject: &str,
    html: &str,
    to: &[String],
    cc: &[String],
    bcc: &[String],
    attachments: &[EmailAttachment],
) -> Result<Message> {
    if to.is_empty() {
        return Err(anyhow!("email has no recipients"));
    }

    let mut builder: MessageBuilder = Message::builder().from(from).subject(subject);
    for recipient in to {
        builder = builder.to(parse_mailbox(recipient)?);
    }
    for recipient in cc {
        builder = builder.cc(parse_mailbox(recipient)?);
    }
    for recipient in bcc {
        builder = builder.bcc(parse_mailbox(recipient)?);
    }

    if attachments.is_empty() {
        return Ok(builder.header(ContentType::TEXT_HTML).body(html.to_string())?);
    }

    let mut parts = MultiPart::mixed().singlepart(SinglePart::html(html.to_string()));
    for attachment in attachments {
        let content_type = ContentType::parse(&attachment.content_type).map_err(|err| {
            anyhow!("invalid content type for {}: {}", attachment.file_name, err)
        })?;
        parts = parts.singlepart(
            Attachment::new(attachment.file_name.clone()).body(attachment.data.clone(), content_type),
        );
    }
    Ok(builder.multipart(parts)?)
}

fn parse_mailbox(value: &str) -> Result<Mailbox> {
    value
        .parse::<Mailbox>()
        .map_err(|err| anyhow!("invalid recipient {}: {}", value, err))
}
