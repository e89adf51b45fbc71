//! Outbound email delivery.
//!
//! The auth flow calls the mailer at most once per start() invocation
//! and treats any failure as observable; a failed send rolls the
//! pending credential back.

use std::sync::{Arc, Mutex};

mod console;
mod smtp;

pub use console::ConsoleMailer;
pub use smtp::SmtpMailer;

/// An outbound message. `text` and `html` are alternative bodies.
#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("message build failed: {0}")]
    Message(String),
    #[error("delivery failed: {0}")]
    Transport(String),
}

#[allow(async_fn_in_trait)]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &Email) -> Result<(), MailError>;
}

/// Captures messages instead of delivering them. Lets tests read the
/// code or link a flow produced.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<Email>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().expect("memory mailer mutex poisoned").clone()
    }
}

impl Mailer for MemoryMailer {
    async fn send(&self, mail: &Email) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("memory mailer mutex poisoned")
            .push(mail.clone());
        Ok(())
    }
}

/// Runtime-selected delivery backend. Async-fn-in-trait mailers are
/// not object safe, so dispatch is an enum rather than `dyn Mailer`.
#[derive(Clone)]
pub enum AnyMailer {
    Smtp(SmtpMailer),
    Console(ConsoleMailer),
    Memory(MemoryMailer),
}

impl Mailer for AnyMailer {
    async fn send(&self, mail: &Email) -> Result<(), MailError> {
        match self {
            Self::Smtp(m) => m.send(mail).await,
            Self::Console(m) => m.send(mail).await,
            Self::Memory(m) => m.send(mail).await,
        }
    }
}
