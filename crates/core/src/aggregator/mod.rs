//! Multi-provider torrent aggregation.
//!
//! An [`Aggregator`] is configured with a search target and a provider
//! selection, then `run` fetches from every pending provider concurrently and
//! merges the results in configuration order. A failing provider never
//! discards another provider's results: failures are returned alongside the
//! merged record.
//!
//! Merged results are stored per target ID for the life of the aggregator.
//! Re-running an ID replaces the results of the existing record in place, so
//! holders of an earlier `Arc<AggregationRecord>` observe the update.

mod types;

pub use types::*;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{Config, JackettConfig, YtsConfig};
use crate::provider::{
    JackettProvider, ProviderResult, TorrentProvider, YtsProvider, JACKETT_PROVIDER_NAME,
    YTS_PROVIDER_NAME,
};

/// Providers and target waiting for the next `run`.
#[derive(Default)]
struct PendingRun {
    target: Option<SearchTarget>,
    providers: Vec<Box<dyn TorrentProvider>>,
}

/// Aggregates torrent results across providers.
pub struct Aggregator {
    yts: YtsConfig,
    jackett: JackettConfig,
    pending: Mutex<PendingRun>,
    records: RwLock<HashMap<String, Arc<AggregationRecord>>>,
}

impl Aggregator {
    /// Create an aggregator building providers from the given settings.
    pub fn new(yts: YtsConfig, jackett: JackettConfig) -> Self {
        Self {
            yts,
            jackett,
            pending: Mutex::new(PendingRun::default()),
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.yts.clone(), config.jackett.clone())
    }

    /// Set the target and build the providers for the next run.
    ///
    /// Replaces anything configured earlier. When meta-search is requested
    /// without an API key, no meta-search provider is added and
    /// `MissingCredentials` is returned; the curated index is still
    /// configured if it was requested. A target without an IMDb ID gets no
    /// curated index provider and `ProviderSetup` is returned.
    pub async fn configure(
        &self,
        target: SearchTarget,
        selection: &ProviderSelection,
    ) -> Result<(), AggregatorError> {
        let mut providers: Vec<Box<dyn TorrentProvider>> = Vec::new();
        let mut outcome = Ok(());

        if selection.curated_index {
            match target.imdb_id.as_deref() {
                Some(imdb_id) => match YtsProvider::new(self.yts.clone(), imdb_id) {
                    Ok(provider) => providers.push(Box::new(provider)),
                    Err(e) => {
                        outcome = Err(AggregatorError::ProviderSetup {
                            provider: YTS_PROVIDER_NAME.to_string(),
                            message: e.to_string(),
                        })
                    }
                },
                None => {
                    warn!(id = %target.id, "No IMDb ID, skipping curated index");
                    outcome = Err(AggregatorError::ProviderSetup {
                        provider: YTS_PROVIDER_NAME.to_string(),
                        message: format!("no IMDb ID known for {:?}", target.title),
                    });
                }
            }
        }

        if selection.meta_search {
            let api_key = selection
                .meta_search_api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty());

            match api_key {
                Some(api_key) => {
                    let mut config = self.jackett.clone();
                    if let Some(host) = selection
                        .meta_search_host
                        .as_deref()
                        .filter(|host| !host.trim().is_empty())
                    {
                        config.url = host.trim().to_string();
                    }
                    match JackettProvider::new(config, api_key, &target.id, &target.title) {
                        Ok(provider) => providers.push(Box::new(provider)),
                        Err(e) => {
                            outcome = Err(AggregatorError::ProviderSetup {
                                provider: JACKETT_PROVIDER_NAME.to_string(),
                                message: e.to_string(),
                            })
                        }
                    }
                }
                None => {
                    warn!(id = %target.id, "Meta-search requested without an API key");
                    outcome = Err(AggregatorError::MissingCredentials(
                        "Jackett requires an API key (set [jackett] api_key)".to_string(),
                    ));
                }
            }
        }

        debug!(
            id = %target.id,
            title = %target.title,
            providers = providers.len(),
            "Aggregator configured"
        );

        let mut pending = self.pending.lock().await;
        pending.target = Some(target);
        pending.providers = providers;
        outcome
    }

    /// Add a provider to the pending run.
    ///
    /// Providers run in the order they were added, after those built by
    /// `configure`.
    pub async fn add_provider(&self, provider: Box<dyn TorrentProvider>) {
        self.pending.lock().await.providers.push(provider);
    }

    /// Names of the providers pending for the next run.
    pub async fn pending_providers(&self) -> Vec<String> {
        self.pending
            .lock()
            .await
            .providers
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Fetch from every pending provider and store the merged results.
    ///
    /// The pending providers are consumed; `configure` must be called again
    /// before the next run. A run with no providers stores an empty record.
    pub async fn run(&self) -> Result<RunOutcome, AggregatorError> {
        let PendingRun { target, providers } = std::mem::take(&mut *self.pending.lock().await);
        let target = target.ok_or(AggregatorError::NoTarget)?;

        info!(id = %target.id, providers = providers.len(), "Running aggregation");

        let fetches = providers.iter().map(|provider| async move {
            let result = provider.fetch().await;
            (provider.name().to_string(), result)
        });
        let fetched = futures::future::join_all(fetches).await;

        let mut results: Vec<ProviderResult> = Vec::new();
        let mut errors = Vec::new();
        for (provider, outcome) in fetched {
            match outcome {
                Ok(mut found) => {
                    debug!(provider = %provider, results = found.len(), "Provider succeeded");
                    results.append(&mut found);
                }
                Err(e) => {
                    warn!(provider = %provider, error = %e, "Provider failed");
                    errors.push(ProviderFailure {
                        provider,
                        message: e.to_string(),
                    });
                }
            }
        }

        let record = self.store(&target.id, results).await;

        info!(
            id = %target.id,
            results = record.len().await,
            failures = errors.len(),
            "Aggregation complete"
        );

        Ok(RunOutcome { record, errors })
    }

    async fn store(&self, id: &str, results: Vec<ProviderResult>) -> Arc<AggregationRecord> {
        let mut records = self.records.write().await;
        match records.get(id) {
            Some(record) => {
                record.replace_results(results).await;
                Arc::clone(record)
            }
            None => {
                let record = Arc::new(AggregationRecord::new(id, results));
                records.insert(id.to_string(), Arc::clone(&record));
                record
            }
        }
    }

    /// Stored record for `id`, if it has been run.
    pub async fn lookup(&self, id: &str) -> Option<Arc<AggregationRecord>> {
        self.records.read().await.get(id).cloned()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop every stored record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
        debug!("Aggregator store cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> Aggregator {
        Aggregator::from_config(&Config::default())
    }

    #[tokio::test]
    async fn test_run_without_configure_fails() {
        let err = aggregator().run().await.unwrap_err();
        assert!(matches!(err, AggregatorError::NoTarget));
    }

    #[tokio::test]
    async fn test_configure_curated_only() {
        let aggregator = aggregator();
        aggregator
            .configure(
                SearchTarget::new("tt0083658", "Blade Runner"),
                &ProviderSelection::curated_only(),
            )
            .await
            .unwrap();
        assert_eq!(aggregator.pending_providers().await, vec!["YTS"]);
    }

    #[tokio::test]
    async fn test_configure_meta_search_without_key() {
        let aggregator = aggregator();
        let selection = ProviderSelection {
            curated_index: true,
            meta_search: true,
            meta_search_api_key: None,
            meta_search_host: None,
        };
        let err = aggregator
            .configure(SearchTarget::new("tt1", "x"), &selection)
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::MissingCredentials(_)));
        assert!(!err.to_string().is_empty());
        assert_eq!(aggregator.pending_providers().await, vec!["YTS"]);
    }

    #[tokio::test]
    async fn test_configure_without_imdb_id_skips_curated_index() {
        let aggregator = aggregator();
        let err = aggregator
            .configure(
                SearchTarget::new("78", "Blade Runner"),
                &ProviderSelection::curated_only(),
            )
            .await
            .unwrap_err();

        match err {
            AggregatorError::ProviderSetup { provider, .. } => assert_eq!(provider, "YTS"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(aggregator.pending_providers().await.is_empty());
    }

    #[tokio::test]
    async fn test_configure_blank_key_is_missing() {
        let aggregator = aggregator();
        let selection = ProviderSelection {
            curated_index: false,
            meta_search: true,
            meta_search_api_key: Some("  ".to_string()),
            meta_search_host: Some("http://jackett:9117".to_string()),
        };
        assert!(aggregator
            .configure(SearchTarget::new("tt1", "x"), &selection)
            .await
            .is_err());
        assert!(aggregator.pending_providers().await.is_empty());
    }

    #[tokio::test]
    async fn test_configure_both_providers_in_order() {
        let aggregator = aggregator();
        let selection = ProviderSelection {
            curated_index: true,
            meta_search: true,
            meta_search_api_key: Some("key".to_string()),
            meta_search_host: None,
        };
        aggregator
            .configure(SearchTarget::new("tt1", "x"), &selection)
            .await
            .unwrap();
        assert_eq!(aggregator.pending_providers().await, vec!["YTS", "Jackett"]);
    }

    #[tokio::test]
    async fn test_empty_run_is_legal() {
        let aggregator = aggregator();
        aggregator
            .configure(SearchTarget::new("tt1", "x"), &ProviderSelection::default())
            .await
            .unwrap();

        let outcome = aggregator.run().await.unwrap();
        assert!(outcome.errors.is_empty());
        assert!(outcome.record.is_empty().await);
        assert_eq!(outcome.record.id(), "tt1");
        assert!(aggregator.lookup("tt1").await.is_some());
    }

    #[tokio::test]
    async fn test_lookup_unknown() {
        assert!(aggregator().lookup("nope").await.is_none());
    }
}
