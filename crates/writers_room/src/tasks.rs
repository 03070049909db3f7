//! Per-session flow tasks.

use crate::ChannelId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Table of running session flows, keyed by session channel.
///
/// A flow removes itself when it finishes; [`cancel`](Self::cancel) aborts it
/// wherever it is suspended, including the post-finalization cleanup wait.
#[derive(Debug, Clone, Default)]
pub struct SessionTasks {
    tasks: Arc<RwLock<HashMap<ChannelId, JoinHandle<()>>>>,
}

impl SessionTasks {
    /// Create an empty task table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the flow driving a session.
    ///
    /// Any flow already registered for the channel is aborted first.
    #[instrument(skip(self, flow))]
    pub async fn spawn<F>(&self, channel: ChannelId, flow: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Held across spawn so the flow cannot deregister before it is registered.
        let mut tasks = self.tasks.write().await;
        let table = self.clone();
        let handle = tokio::spawn(async move {
            flow.await;
            table.tasks.write().await.remove(&channel);
            debug!(%channel, "Session flow finished");
        });

        if let Some(old_handle) = tasks.insert(channel, handle) {
            debug!("Aborting previous session flow");
            old_handle.abort();
        }
        info!("Session flow spawned");
    }

    /// Abort a session's flow. Returns whether one was running.
    #[instrument(skip(self))]
    pub async fn cancel(&self, channel: ChannelId) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.remove(&channel) {
            Some(handle) => {
                handle.abort();
                info!("Session flow cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether a flow is registered for the channel.
    pub async fn is_running(&self, channel: ChannelId) -> bool {
        self.tasks.read().await.contains_key(&channel)
    }

    /// Whether no flow is registered.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn finished_flows_deregister() {
        let tasks = SessionTasks::new();
        tasks.spawn(ChannelId::new(1), async {}).await;
        for _ in 0..10 {
            if tasks.is_empty().await {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!tasks.is_running(ChannelId::new(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_aborts_a_suspended_flow() {
        let tasks = SessionTasks::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tasks
            .spawn(ChannelId::new(1), async move {
                tokio::time::sleep(Duration::from_secs(43200)).await;
                let _ = tx.send(());
            })
            .await;

        assert!(tasks.cancel(ChannelId::new(1)).await);
        assert!(!tasks.cancel(ChannelId::new(1)).await);
        assert!(rx.await.is_err());
    }
}
