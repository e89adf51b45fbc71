use tracing::info;

use crate::mailer::{Email, MailError, Mailer};

/// Development fallback used when no `SMTP_URL` is configured: echoes
/// the message to the log instead of sending it. The body carries the
/// one-time code or magic link, which is exactly what a developer
/// running locally needs to see.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    async fn send(&self, mail: &Email) -> Result<(), MailError> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.text.as_deref().unwrap_or(""),
            "dev email (not sent)"
        );
        Ok(())
    }
}
