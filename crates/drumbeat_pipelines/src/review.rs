//! Review-queue operations: approve, reject, bulk approve, rollback.
//!
//! Approval of a content action publishes to the account's CMS; rollback
//! unpublishes via the provider post id captured at deployment time.

use chrono::Utc;
use drumbeat_core::{ContentStatus, QueueStatus, ReviewQueueItem};
use drumbeat_error::{DrumbeatResult, PipelineError, PipelineErrorKind};
use drumbeat_interface::{AccountStore, ContentPublisher, ContentStore, ReviewQueueStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Aggregate result of a bulk approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkApproveReport {
    /// Items approved (and, for content actions, deployed)
    pub approved: usize,
    /// Items that raised
    pub failed: usize,
    /// One entry per failed item: "id: message"
    pub errors: Vec<String>,
}

/// Human-review decision surface over the queue.
pub struct ReviewOps {
    queue: Arc<dyn ReviewQueueStore>,
    content: Arc<dyn ContentStore>,
    accounts: Arc<dyn AccountStore>,
    publisher: Arc<dyn ContentPublisher>,
}

impl ReviewOps {
    /// Wire the operations from their collaborators.
    pub fn new(
        queue: Arc<dyn ReviewQueueStore>,
        content: Arc<dyn ContentStore>,
        accounts: Arc<dyn AccountStore>,
        publisher: Arc<dyn ContentPublisher>,
    ) -> Self {
        Self {
            queue,
            content,
            accounts,
            publisher,
        }
    }

    /// Approve a pending item.
    ///
    /// Content actions publish to the CMS: on success the item becomes
    /// `Deployed` with the provider post id stored as rollback data and the
    /// piece becomes `Published`. A publish failure leaves the item
    /// `Approved` and surfaces the error so the deployment can be retried.
    #[instrument(skip(self))]
    pub async fn approve(&self, item_id: Uuid, approver: &str) -> DrumbeatResult<ReviewQueueItem> {
        let mut item = self.queue.get(item_id).await?;
        require_status(&item, QueueStatus::Pending, "approve")?;

        item.status = QueueStatus::Approved;
        item.approver = Some(approver.to_string());
        item.decided_at = Some(Utc::now());
        self.queue.update(item.clone()).await?;

        if !item.action.is_content_action() {
            return Ok(item);
        }
        let content_id = item.content_id.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::InvalidTransition {
                id: item_id.to_string(),
                message: "content action has no content piece".to_string(),
            })
        })?;

        let mut piece = self.content.get(content_id).await?;
        let account = self.accounts.get(item.account_id).await?;
        let post = self.publisher.publish(&account, &piece).await?;

        piece.status = ContentStatus::Published;
        piece.published_url = Some(post.url.clone());
        piece.published_at = Some(Utc::now());
        piece.provider_post_id = Some(post.post_id);
        self.content.update(piece).await?;

        item.status = QueueStatus::Deployed;
        item.deployed_at = Some(Utc::now());
        item.rollback = Some(json!({ "wordpress_post_id": post.post_id }));
        self.queue.update(item.clone()).await?;

        info!(post_id = post.post_id, "Content deployed");
        Ok(item)
    }

    /// Reject a pending item; a linked content piece is rejected with it.
    #[instrument(skip(self))]
    pub async fn reject(&self, item_id: Uuid, approver: &str) -> DrumbeatResult<ReviewQueueItem> {
        let mut item = self.queue.get(item_id).await?;
        require_status(&item, QueueStatus::Pending, "reject")?;

        item.status = QueueStatus::Rejected;
        item.approver = Some(approver.to_string());
        item.decided_at = Some(Utc::now());
        self.queue.update(item.clone()).await?;

        if let Some(content_id) = item.content_id.filter(|_| item.action.is_content_action()) {
            let mut piece = self.content.get(content_id).await?;
            piece.status = ContentStatus::Rejected;
            self.content.update(piece).await?;
        }
        Ok(item)
    }

    /// Approve a batch sequentially; a failing item never aborts the rest.
    #[instrument(skip(self, item_ids), fields(count = item_ids.len()))]
    pub async fn bulk_approve(
        &self,
        item_ids: &[Uuid],
        approver: &str,
    ) -> DrumbeatResult<BulkApproveReport> {
        let mut approved = 0;
        let mut errors = Vec::new();

        for &item_id in item_ids {
            match self.approve(item_id, approver).await {
                Ok(_) => approved += 1,
                Err(e) => {
                    warn!(%item_id, error = %e, "Bulk approve item failed, continuing");
                    errors.push(format!("{item_id}: {e}"));
                }
            }
        }

        Ok(BulkApproveReport {
            approved,
            failed: errors.len(),
            errors,
        })
    }

    /// Revert a deployed content action.
    ///
    /// Unpublishes via the stored provider post id, returns the piece to
    /// `Approved` with its publication fields cleared, and marks the item
    /// `RolledBack`.
    #[instrument(skip(self))]
    pub async fn rollback(&self, item_id: Uuid) -> DrumbeatResult<ReviewQueueItem> {
        let mut item = self.queue.get(item_id).await?;
        require_status(&item, QueueStatus::Deployed, "rollback")?;
        if !item.action.is_content_action() {
            return Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                id: item_id.to_string(),
                message: "only content actions can be rolled back".to_string(),
            })
            .into());
        }

        let post_id = item
            .rollback
            .as_ref()
            .and_then(|data| data.get("wordpress_post_id"))
            .and_then(|v| v.as_u64())
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::InvalidTransition {
                    id: item_id.to_string(),
                    message: "no provider post id in rollback data".to_string(),
                })
            })?;

        let account = self.accounts.get(item.account_id).await?;
        self.publisher.unpublish(&account, post_id).await?;

        if let Some(content_id) = item.content_id {
            let mut piece = self.content.get(content_id).await?;
            piece.status = ContentStatus::Approved;
            piece.published_url = None;
            piece.published_at = None;
            piece.provider_post_id = None;
            self.content.update(piece).await?;
        }

        item.status = QueueStatus::RolledBack;
        self.queue.update(item.clone()).await?;
        info!(post_id, "Deployment rolled back");
        Ok(item)
    }
}

fn require_status(
    item: &ReviewQueueItem,
    required: QueueStatus,
    operation: &str,
) -> DrumbeatResult<()> {
    if item.status == required {
        Ok(())
    } else {
        Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
            id: item.id.to_string(),
            message: format!(
                "cannot {operation} an item in status {} (requires {})",
                item.status, required
            ),
        })
        .into())
    }
}
