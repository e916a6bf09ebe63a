//! The `notification` action kind: send a mail about a transition

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use vigil_core::{ActionDoc, MailTransport, OutgoingMail};

use crate::error::ActionResult;
use crate::props::ActionProps;
use crate::registry::{ActionContext, ActionKind};

/// Sends a mail built from the action's fields.
///
/// The auth user doubles as the default sender, recipient and reply-to, so a
/// minimal action needs nothing but `username`/`password`. A `bodyType` of
/// `"html"` switches the body from plain text.
pub struct NotificationKind {
    transport: Arc<dyn MailTransport>,
}

impl NotificationKind {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ActionKind for NotificationKind {
    async fn execute(
        &self,
        action: &mut ActionDoc,
        ctx: &ActionContext<'_>,
    ) -> ActionResult<Option<String>> {
        let html = action.field("bodyType").and_then(Value::as_str) == Some("html");
        let mail = {
            let props = ActionProps::new(&action.fields, ctx);
            let username = props.text("username")?;
            let from = props.text("from")?;
            OutgoingMail {
                username: username.clone().or_else(|| from.clone()),
                password: props.text("password")?,
                from: from.or_else(|| username.clone()),
                to: props.text("to")?.or_else(|| username.clone()),
                cc: props.text("cc")?,
                bcc: props.text("bcc")?,
                reply_to: props.text("replyTo")?.or(username),
                subject: props.text("subject")?,
                body: props.text("body")?,
                html,
            }
        };

        let receipt = self.transport.send(&mail).await?;
        debug!(kind = "notification", receipt = %receipt, "mail accepted");
        Ok(Some(format!("Email sent: {receipt}")))
    }
}
