//! Fire-and-forget email notifications.
//!
//! Events are pushed onto a bounded queue drained by detached worker tasks. A
//! request that publishes an event never waits for it, and delivery failures are
//! logged and dropped: every event is attempted at most once.

use std::sync::Arc;

use anyhow::Context;
use common::NotificationConfig;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::providers::email::Mailer;
use crate::providers::identity::IdentityProvider;
use crate::store::DataStore;

/// A lifecycle event worth telling someone about. Owns all of its data so it can
/// outlive the request that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationEvent {
    Direct {
        recipients: Vec<String>,
        subject: String,
        body: String,
    },
    /// A new asset was uploaded to a group; tell the group owner.
    AssetCreated {
        asset_title: String,
        group_id: Uuid,
        uploader_id: String,
        uploader_name: String,
    },
    /// An asset was finalized by a reviewer; tell the asset owner.
    AssetReviewed {
        asset_title: String,
        owner_id: String,
        reviewer_name: String,
    },
}

/// Collaborators the workers need to resolve and deliver an event.
#[derive(Clone)]
pub struct NotificationDeps {
    pub store: Arc<dyn DataStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn Mailer>,
}

/// Handle for publishing notification events.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<NotificationEvent>,
}

impl NotificationDispatcher {
    /// Start the worker pool. Workers exit once every dispatcher handle is dropped
    /// and the queue is drained.
    pub fn start(config: &NotificationConfig, deps: NotificationDeps) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..config.workers.max(1) {
            let rx = Arc::clone(&rx);
            let deps = deps.clone();
            tokio::spawn(async move {
                run_worker(worker_id, rx, deps).await;
            });
        }

        info!(
            queue_capacity = config.queue_capacity,
            workers = config.workers,
            "Started notification dispatcher"
        );
        Self { tx }
    }

    /// Enqueue an event without waiting. Returns `false` if it was dropped.
    pub fn publish(&self, event: NotificationEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "Notification queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(?event, "Notification dispatcher stopped, dropping event");
                false
            }
        }
    }

    /// Send `body` to `recipients`.
    pub fn notify(&self, recipients: Vec<String>, subject: &str, body: &str) -> bool {
        self.publish(NotificationEvent::Direct {
            recipients,
            subject: subject.to_string(),
            body: body.to_string(),
        })
    }
}

async fn run_worker(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<NotificationEvent>>>,
    deps: NotificationDeps,
) {
    loop {
        let event = { rx.lock().await.recv().await };
        let Some(event) = event else {
            debug!(worker_id, "Notification queue closed, worker exiting");
            return;
        };

        if let Err(e) = deliver(&deps, event).await {
            error!(worker_id, error = %format!("{e:#}"), "Notification delivery failed");
        }
    }
}

async fn deliver(deps: &NotificationDeps, event: NotificationEvent) -> anyhow::Result<()> {
    match event {
        NotificationEvent::Direct {
            recipients,
            subject,
            body,
        } => {
            deps.mailer.send(&recipients, &subject, &body).await?;
        }
        NotificationEvent::AssetCreated {
            asset_title,
            group_id,
            uploader_id,
            uploader_name,
        } => {
            let group = deps
                .store
                .get_group(group_id)
                .await
                .context("fetching group")?;
            if group.owner_id == uploader_id {
                debug!(%group_id, "Uploader owns the group, skipping notification");
                return Ok(());
            }
            let Some(email) = resolve_email(deps, &group.owner_id).await? else {
                return Ok(());
            };
            let body = format!(
                "User {uploader_name} uploaded a new video '{asset_title}' to group '{}'.",
                group.name
            );
            deps.mailer
                .send(&[email], "New Asset Uploaded", &body)
                .await?;
        }
        NotificationEvent::AssetReviewed {
            asset_title,
            owner_id,
            reviewer_name,
        } => {
            let Some(email) = resolve_email(deps, &owner_id).await? else {
                return Ok(());
            };
            let body = format!("{reviewer_name} has finished reviewing your video '{asset_title}'.");
            deps.mailer
                .send(&[email], "Your video has been reviewed", &body)
                .await?;
        }
    }
    Ok(())
}

async fn resolve_email(deps: &NotificationDeps, user_id: &str) -> anyhow::Result<Option<String>> {
    let contact = deps
        .identity
        .get_user_contact_info(user_id)
        .await
        .with_context(|| format!("fetching contact info for {user_id}"))?;
    if contact.email.is_empty() {
        warn!(user_id, "User has no email address, skipping notification");
        return Ok(None);
    }
    Ok(Some(contact.email))
}
