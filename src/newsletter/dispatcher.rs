use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::DispatchConfig;
use crate::error::{Error, Result};
use crate::mail::{FROM_ADDRESS, Mailer, OutboundEmail, render_campaign_html};
use crate::store::Store;
use crate::types::NewCampaignLog;

/// Aggregate outcome of one campaign send.
#[derive(Debug)]
pub struct DispatchReport {
    pub sent_to: usize,
    pub success_count: usize,
    pub preview_links: Vec<String>,
    pub log_id: i64,
}

/// Sends a campaign to every current subscriber and appends one log row.
///
/// One send task per recipient runs on a `JoinSet`, gated by a semaphore of
/// `config.max_in_flight` permits and bounded by `config.send_timeout`.
/// Individual failures (rejected recipient, timeout, panic) are folded into
/// the aggregate count; the batch never fails fast. Only a missing campaign,
/// an empty subscriber list, or failure to open the outbound channel abort
/// the whole call.
pub async fn send_campaign(
    store: &dyn Store,
    mailer: &dyn Mailer,
    config: &DispatchConfig,
    campaign_id: i64,
) -> Result<DispatchReport> {
    let campaign = store.get_campaign(campaign_id)?.ok_or(Error::NotFound)?;

    // Read fresh at send time: late subscribers are included, removed ones
    // are not.
    let recipients = store.list_subscriber_emails()?;
    let sent_to = recipients.len();
    if sent_to == 0 {
        return Err(Error::NothingToSend);
    }

    let channel = mailer.open_channel().await?;
    let html = render_campaign_html(&campaign.subject, &campaign.body);

    let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let mut tasks: JoinSet<Option<Option<String>>> = JoinSet::new();

    for to in recipients {
        let channel = Arc::clone(&channel);
        let semaphore = Arc::clone(&semaphore);
        let send_timeout = config.send_timeout;
        let mail = OutboundEmail {
            from: FROM_ADDRESS.to_string(),
            to,
            subject: campaign.subject.clone(),
            text: campaign.body.clone(),
            html: html.clone(),
        };

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return None;
            };

            match tokio::time::timeout(send_timeout, channel.send(&mail)).await {
                Ok(Ok(preview)) => Some(preview),
                Ok(Err(e)) => {
                    tracing::warn!("send to {} failed: {e}", mail.to);
                    None
                }
                Err(_) => {
                    tracing::warn!("send to {} timed out", mail.to);
                    None
                }
            }
        });
    }

    let mut success_count = 0;
    // Preview links accumulate in completion order; sends are unordered.
    let mut preview_links = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(preview)) => {
                success_count += 1;
                if let Some(url) = preview {
                    preview_links.push(url);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("send task aborted: {e}"),
        }
    }

    let log_id = store.append_campaign_log(&NewCampaignLog {
        campaign_id: campaign.id,
        sent_to: sent_to as i64,
        success_count: success_count as i64,
        preview_links: preview_links.clone(),
    })?;

    Ok(DispatchReport {
        sent_to,
        success_count,
        preview_links,
        log_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::mail::MailChannel;
    use crate::store::SqliteStore;

    /// Transport stub: fails for any recipient whose address contains
    /// "bounce", succeeds with a preview link otherwise.
    struct StubMailer {
        with_previews: bool,
    }

    struct StubChannel {
        with_previews: bool,
    }

    #[async_trait]
    impl Mailer for StubMailer {
        async fn open_channel(&self) -> Result<Arc<dyn MailChannel>> {
            Ok(Arc::new(StubChannel {
                with_previews: self.with_previews,
            }))
        }
    }

    #[async_trait]
    impl MailChannel for StubChannel {
        async fn send(&self, mail: &OutboundEmail) -> Result<Option<String>> {
            if mail.to.contains("bounce") {
                return Err(Error::Mail(format!("rejected: {}", mail.to)));
            }
            Ok(self
                .with_previews
                .then(|| format!("https://preview/{}", mail.to)))
        }
    }

    fn open_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    #[tokio::test]
    async fn test_all_sends_succeed() {
        let (_temp, store) = open_store();
        let campaign_id = store.create_campaign("Subject", "Body").unwrap();
        for i in 0..5 {
            store.add_subscriber(&format!("user{i}@x.com")).unwrap();
        }

        let mailer = StubMailer {
            with_previews: true,
        };
        let report = send_campaign(&store, &mailer, &DispatchConfig::default(), campaign_id)
            .await
            .unwrap();

        assert_eq!(report.sent_to, 5);
        assert_eq!(report.success_count, 5);
        assert_eq!(report.preview_links.len(), 5);

        let logs = store.list_campaign_logs(campaign_id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].sent_to, 5);
        assert_eq!(logs[0].success_count, 5);
    }

    #[tokio::test]
    async fn test_partial_failure_is_aggregated() {
        let (_temp, store) = open_store();
        let campaign_id = store.create_campaign("Subject", "Body").unwrap();
        store.add_subscriber("good1@x.com").unwrap();
        store.add_subscriber("bounce@x.com").unwrap();
        store.add_subscriber("good2@x.com").unwrap();

        let mailer = StubMailer {
            with_previews: true,
        };
        let report = send_campaign(&store, &mailer, &DispatchConfig::default(), campaign_id)
            .await
            .unwrap();

        assert_eq!(report.sent_to, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.preview_links.len(), 2);

        // Exactly one log row despite the failures
        let logs = store.list_campaign_logs(campaign_id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].success_count, 2);
    }

    #[tokio::test]
    async fn test_no_subscribers_fails_without_log() {
        let (_temp, store) = open_store();
        let campaign_id = store.create_campaign("Subject", "Body").unwrap();

        let mailer = StubMailer {
            with_previews: true,
        };
        let result = send_campaign(&store, &mailer, &DispatchConfig::default(), campaign_id).await;

        assert!(matches!(result, Err(Error::NothingToSend)));
        assert!(store.list_campaign_logs(campaign_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_campaign() {
        let (_temp, store) = open_store();
        store.add_subscriber("a@x.com").unwrap();

        let mailer = StubMailer {
            with_previews: true,
        };
        let result = send_campaign(&store, &mailer, &DispatchConfig::default(), 999).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_success_without_preview_counts() {
        let (_temp, store) = open_store();
        let campaign_id = store.create_campaign("Subject", "Body").unwrap();
        store.add_subscriber("a@x.com").unwrap();

        let mailer = StubMailer {
            with_previews: false,
        };
        let report = send_campaign(&store, &mailer, &DispatchConfig::default(), campaign_id)
            .await
            .unwrap();

        assert_eq!(report.success_count, 1);
        assert!(report.preview_links.is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_respects_tiny_semaphore() {
        let (_temp, store) = open_store();
        let campaign_id = store.create_campaign("Subject", "Body").unwrap();
        for i in 0..20 {
            store.add_subscriber(&format!("user{i}@x.com")).unwrap();
        }

        let config = DispatchConfig {
            max_in_flight: 1,
            ..DispatchConfig::default()
        };
        let mailer = StubMailer {
            with_previews: true,
        };
        let report = send_campaign(&store, &mailer, &config, campaign_id)
            .await
            .unwrap();

        assert_eq!(report.success_count, 20);
    }
}
