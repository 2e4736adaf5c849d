use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use super::{MailChannel, Mailer, OutboundEmail};
use crate::error::{Error, Result};

const PREVIEW_BASE_URL: &str = "https://mail.sandbox.geek.news/message";

/// Simulated mail relay. Each channel gets a throwaway account and keeps
/// delivered messages in memory; nothing ever leaves the process.
pub struct SandboxMailer;

impl SandboxMailer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for SandboxMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for SandboxMailer {
    async fn open_channel(&self) -> Result<Arc<dyn MailChannel>> {
        Ok(Arc::new(SandboxChannel {
            account: format!("sandbox-{}", Uuid::new_v4()),
            outbox: Mutex::new(Vec::new()),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct DeliveredMail {
    pub message_id: String,
    pub to: String,
    pub subject: String,
}

pub struct SandboxChannel {
    /// Throwaway account name, a stand-in for a real transport credential.
    account: String,
    outbox: Mutex<Vec<DeliveredMail>>,
}

impl SandboxChannel {
    pub fn delivered(&self) -> Vec<DeliveredMail> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// The sandbox accepts anything that looks like `local@domain.tld`; other
/// addresses fail the individual send, mirroring a relay rejecting a
/// malformed recipient.
fn is_deliverable(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !address.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[async_trait]
impl MailChannel for SandboxChannel {
    async fn send(&self, mail: &OutboundEmail) -> Result<Option<String>> {
        if !is_deliverable(&mail.to) {
            return Err(Error::Mail(format!(
                "recipient rejected by {}: {}",
                self.account, mail.to
            )));
        }

        let message_id = Uuid::new_v4().to_string();
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(DeliveredMail {
                message_id: message_id.clone(),
                to: mail.to.clone(),
                subject: mail.subject.clone(),
            });

        Ok(Some(format!("{PREVIEW_BASE_URL}/{message_id}")))
    }
}
