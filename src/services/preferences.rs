use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use crate::{db::AccountStore, error::AppResult, models::EnrichedItem};

/// Results whose providers count towards preferences
const PROVIDER_RESULTS: usize = 8;
/// Providers counted per result
const PROVIDERS_PER_RESULT: usize = 3;

/// Counter increments derived from one recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceUpdate {
    pub account_id: Uuid,
    pub genre: Option<String>,
    pub language: Option<String>,
    /// Distinct provider names, each counted once
    pub providers: Vec<String>,
}

impl PreferenceUpdate {
    /// Collects the distinct providers among the first three of each of the first
    /// eight results
    pub fn from_results(
        account_id: Uuid,
        genre: Option<&str>,
        language: Option<&str>,
        results: &[EnrichedItem],
    ) -> Self {
        let mut providers: Vec<String> = Vec::new();
        for item in results.iter().take(PROVIDER_RESULTS) {
            for provider in item.providers.iter().take(PROVIDERS_PER_RESULT) {
                if !provider.is_empty() && !providers.contains(provider) {
                    providers.push(provider.clone());
                }
            }
        }

        Self {
            account_id,
            genre: genre.map(str::to_string),
            language: language.map(str::to_string),
            providers,
        }
    }

    fn is_empty(&self) -> bool {
        self.genre.is_none() && self.language.is_none() && self.providers.is_empty()
    }
}

/// Loads the account, adds the increments and saves it back.
///
/// Read-modify-write without locking; concurrent updates for one account may
/// lose increments. A missing account is skipped.
pub async fn bump_preferences(
    accounts: &dyn AccountStore,
    update: &PreferenceUpdate,
) -> AppResult<()> {
    let Some(account) = accounts.find_by_id(update.account_id).await? else {
        tracing::debug!(account_id = %update.account_id, "Preference update for unknown account");
        return Ok(());
    };

    let mut preferences = account.preferences;
    if let Some(genre) = &update.genre {
        preferences.record_genre(genre);
    }
    if let Some(language) = &update.language {
        preferences.record_language(language);
    }
    for provider in &update.providers {
        preferences.record_provider(provider);
    }

    accounts
        .save_preferences(update.account_id, &preferences)
        .await
}

/// Queues preference updates for a background writer so request handlers never
/// wait on them
#[derive(Clone)]
pub struct PreferenceWriter {
    update_tx: mpsc::UnboundedSender<PreferenceUpdate>,
}

/// Handle for stopping the preference writer
pub struct PreferenceWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PreferenceWriterHandle {
    /// Signals the writer, lets it apply everything already queued, and waits for it
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Preference writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Preference writer task failed");
        }
    }
}

impl PreferenceWriter {
    /// Spawns the writer task
    pub fn spawn(accounts: Arc<dyn AccountStore>) -> (Self, PreferenceWriterHandle) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            Self::writer_task(accounts, update_rx, shutdown_rx).await;
        });

        (
            Self { update_tx },
            PreferenceWriterHandle { shutdown_tx, task },
        )
    }

    /// Queues an update. Never blocks; a closed writer drops the update with a log line.
    pub fn enqueue(&self, update: PreferenceUpdate) {
        if update.is_empty() {
            return;
        }
        if let Err(e) = self.update_tx.send(update) {
            tracing::error!(error = %e, "Failed to queue preference update");
        }
    }

    async fn writer_task(
        accounts: Arc<dyn AccountStore>,
        mut update_rx: mpsc::UnboundedReceiver<PreferenceUpdate>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Preference writer task started");

        loop {
            tokio::select! {
                received = update_rx.recv() => {
                    match received {
                        Some(update) => Self::apply(accounts.as_ref(), &update).await,
                        None => break,
                    }
                }
                // a dropped handle closes this channel; only an explicit signal stops the writer
                Some(()) = shutdown_rx.recv() => {
                    let mut flushed = 0usize;
                    while let Ok(update) = update_rx.try_recv() {
                        Self::apply(accounts.as_ref(), &update).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed = flushed, "Preference writer flushed pending updates");
                    break;
                }
            }
        }

        tracing::info!("Preference writer task stopped");
    }

    async fn apply(accounts: &dyn AccountStore, update: &PreferenceUpdate) {
        if let Err(e) = bump_preferences(accounts, update).await {
            tracing::warn!(
                account_id = %update.account_id,
                error = %e,
                "Could not update user preferences"
            );
        }
    }
}
