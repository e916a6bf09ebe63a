//! The lettre-backed SMTP mail transport

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use vigil_core::{MailError, MailTransport, OutgoingMail};

/// Sends notification mails through an SMTP relay over TLS.
///
/// Credentials travel with each mail, so one transport serves actions that
/// authenticate as different accounts.
pub struct SmtpMailTransport {
    relay: String,
}

impl SmtpMailTransport {
    /// A transport for the given relay host.
    pub fn new(relay: impl Into<String>) -> Self {
        Self {
            relay: relay.into(),
        }
    }

    /// The default transport, relaying through Gmail.
    pub fn gmail() -> Self {
        Self::new("smtp.gmail.com")
    }
}

fn mailbox(field: &str, addr: &str) -> Result<Mailbox, MailError> {
    addr.parse()
        .map_err(|err| MailError::Address(format!("{field} '{addr}': {err}")))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<String, MailError> {
        let from = mail
            .from
            .as_deref()
            .ok_or_else(|| MailError::Build("a sender is required".to_string()))?;
        let to = mail
            .to
            .as_deref()
            .ok_or_else(|| MailError::Build("a recipient is required".to_string()))?;

        let mut message = Message::builder()
            .from(mailbox("from", from)?)
            .to(mailbox("to", to)?);
        if let Some(cc) = &mail.cc {
            message = message.cc(mailbox("cc", cc)?);
        }
        if let Some(bcc) = &mail.bcc {
            message = message.bcc(mailbox("bcc", bcc)?);
        }
        if let Some(reply_to) = &mail.reply_to {
            message = message.reply_to(mailbox("replyTo", reply_to)?);
        }
        if let Some(subject) = &mail.subject {
            message = message.subject(subject.clone());
        }
        let content_type = if mail.html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };
        let message = message
            .header(content_type)
            .body(mail.body.clone().unwrap_or_default())
            .map_err(|err| MailError::Build(err.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.relay)
            .map_err(|err| MailError::Transport(err.to_string()))?;
        if let (Some(user), Some(pass)) = (&mail.username, &mail.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        let response = builder
            .build()
            .send(message)
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;
        debug!(relay = %self.relay, "mail relayed");
        Ok(format!(
            "{} {}",
            response.code(),
            response.first_line().unwrap_or_default()
        ))
    }
}
