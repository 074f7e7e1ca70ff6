use std::path::PathBuf;

use async_trait::async_trait;
use deck_core::{Notifier, NotifyError};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;
use tracing::info;

/// Drops each notification as a plain-text message file into a directory
/// picked up by a mail relay
pub struct OutboxNotifier {
    dir: PathBuf,
    sender: String,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>, sender: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            sender: sender.into(),
        }
    }

    fn render_message(&self, recipients: &[String], subject: &str, body: &str) -> String {
        let date = OffsetDateTime::now_utc()
            .format(&Rfc2822)
            .unwrap_or_default();

        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
            self.sender,
            recipients.join(", "),
            subject.replace(['\r', '\n'], " "),
            date,
            body
        )
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let delivery = |e: std::io::Error| NotifyError::Delivery(format!("{}: {}", self.dir.display(), e));

        tokio::fs::create_dir_all(&self.dir).await.map_err(delivery)?;

        let id = uuid::Uuid::new_v4();
        let tmp = self.dir.join(format!(".{}.tmp", id));
        let path = self.dir.join(format!("{}.eml", id));

        tokio::fs::write(&tmp, self.render_message(recipients, subject, body))
            .await
            .map_err(delivery)?;
        tokio::fs::rename(&tmp, &path).await.map_err(delivery)?;

        info!("Queued notification for {} recipients at {}", recipients.len(), path.display());
        Ok(())
    }
}
