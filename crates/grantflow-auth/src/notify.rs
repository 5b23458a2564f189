//! Fire-and-forget notifications about token events.
//!
//! Events go through a bounded queue drained by a background task, so a slow
//! or failing [`NotificationSender`] never blocks or fails a grant. When the
//! queue is full the event is dropped and logged.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::NotificationConfig;
use crate::types::GrantType;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Queue closed")]
    QueueClosed,
}

/// Token events published by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    TokenIssued {
        jti: String,
        client_id: String,
        subject: String,
        grant_type: GrantType,
    },
    TokenRevoked {
        jti: String,
        client_id: String,
        subject: String,
    },
}

impl NotificationEvent {
    #[must_use]
    pub fn jti(&self) -> &str {
        match self {
            Self::TokenIssued { jti, .. } | Self::TokenRevoked { jti, .. } => jti,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenIssued { .. } => "token_issued",
            Self::TokenRevoked { .. } => "token_revoked",
        }
    }
}

/// Delivers events to the outside world (mail, webhooks, audit log...).
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError>;
}

/// Sender that only writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSender;

#[async_trait]
impl NotificationSender for LoggingSender {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        info!(event = event.kind(), jti = %event.jti(), "Token event");
        Ok(())
    }
}

/// Handle for enqueueing events. Cheap to clone.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<NotificationEvent>,
}

impl NotificationDispatcher {
    /// Starts the background worker and returns the enqueue handle.
    ///
    /// The worker exits once every handle is dropped. Must be called inside a
    /// tokio runtime.
    pub fn spawn(
        sender: Arc<dyn NotificationSender>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<NotificationEvent>(capacity.max(1));

        let worker = tokio::spawn(async move {
            debug!("Notification worker started");
            while let Some(event) = rx.recv().await {
                if let Err(e) = sender.send(&event).await {
                    warn!(error = %e, event = event.kind(), jti = %event.jti(), "Notification failed");
                }
            }
            debug!("Notification worker stopped");
        });

        (Self { tx }, worker)
    }

    /// Builds a dispatcher from configuration, or `None` when disabled.
    pub fn from_config(
        config: &NotificationConfig,
        sender: Arc<dyn NotificationSender>,
    ) -> Option<(Self, JoinHandle<()>)> {
        config
            .enabled
            .then(|| Self::spawn(sender, config.queue_capacity))
    }

    /// Enqueues `event` without waiting. Never fails the caller.
    pub fn notify(&self, event: NotificationEvent) {
        if let Err(e) = self.try_notify(event) {
            warn!(error = %e, "Dropping notification");
        }
    }

    /// Enqueues `event`, reporting why it could not be queued.
    ///
    /// # Errors
    ///
    /// `SendFailed` when the queue is full, `QueueClosed` when the worker has
    /// stopped.
    pub fn try_notify(&self, event: NotificationEvent) -> Result<(), NotificationError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(ev) => {
                NotificationError::SendFailed(format!("queue full, {} dropped", ev.kind()))
            }
            mpsc::error::TrySendError::Closed(_) => NotificationError::QueueClosed,
        })
    }
}
