pub mod aggregator;
pub mod config;
pub mod downloader;
pub mod metadata;
pub mod provider;
pub mod release;
pub mod testing;

pub use aggregator::{
    AggregationRecord, Aggregator, AggregatorError, ProviderFailure, ProviderSelection,
    RunOutcome, SearchTarget,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use downloader::{AddedTorrent, DownloaderError, TorrentDaemon, TransmissionClient};
pub use metadata::{
    MediaKind, MetadataError, MetadataLookup, TitleDetails, TitleId, TitleSummary, TmdbClient,
};
pub use provider::{
    JackettProvider, ProviderError, ProviderResult, ReleaseType, TorrentProvider, YtsProvider,
};
