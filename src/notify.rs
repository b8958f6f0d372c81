use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::{NotSet, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::OrmConn;
use crate::entity::notifications::ActiveModel as NotificationActive;
use crate::models::NotificationChannel;

#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub user_id: Uuid,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
}

/// Fire-and-forget notification dispatch. `notify` enqueues and returns;
/// a background task persists the message. Dispatch failures are logged
/// and never reach the calling workflow.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<NotificationMessage>,
}

impl Notifier {
    /// Spawn the dispatcher task and hand back its sending half.
    pub fn spawn(orm: OrmConn) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotificationMessage>();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(err) = persist(&orm, &msg).await {
                    tracing::warn!(
                        error = %err,
                        user_id = %msg.user_id,
                        channel = msg.channel.as_str(),
                        "notification dispatch failed"
                    );
                } else {
                    tracing::debug!(
                        user_id = %msg.user_id,
                        channel = msg.channel.as_str(),
                        "notification dispatched"
                    );
                }
            }
        });
        Self { tx }
    }

    pub fn notify(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
        title: impl Into<String>,
        body: impl Into<String>,
    ) {
        let msg = NotificationMessage {
            user_id,
            channel,
            title: title.into(),
            body: body.into(),
        };
        if self.tx.send(msg).is_err() {
            tracing::warn!("notification channel closed, dropping message");
        }
    }
}

async fn persist(orm: &OrmConn, msg: &NotificationMessage) -> Result<(), sea_orm::DbErr> {
    NotificationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(msg.user_id),
        channel: Set(msg.channel.as_str().to_string()),
        title: Set(msg.title.clone()),
        body: Set(msg.body.clone()),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;
    Ok(())
}
