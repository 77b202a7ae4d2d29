use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Catalog CSV (identifier and name columns)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Precomputed similarity table CSV
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// Detail page URL; `{id}` is replaced with the item identifier
    #[serde(default = "default_detail_url_template")]
    pub detail_url_template: String,

    /// Per-request timeout for metadata fetches; unset means no timeout
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,

    /// Fan out the metadata fetches of one recommendation concurrently
    #[serde(default = "default_concurrent_fetches")]
    pub concurrent_fetches: bool,

    /// Number of similar titles drawn when the request doesn't say
    #[serde(default = "default_sample_size")]
    pub default_sample_size: usize,

    /// Redis connection URL; enables the metadata cache when set
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Metadata cache TTL in seconds
    #[serde(default = "default_metadata_cache_ttl")]
    pub metadata_cache_ttl: u64,

    /// Abort startup when similarity rows reference identifiers missing from the catalog
    #[serde(default)]
    pub strict_data: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "data/anime_list.csv".to_string()
}

fn default_similarity_path() -> String {
    "models/weights.csv".to_string()
}

fn default_detail_url_template() -> String {
    "https://myanimelist.net/anime/{id}".to_string()
}

fn default_concurrent_fetches() -> bool {
    true
}

fn default_sample_size() -> usize {
    5
}

fn default_metadata_cache_ttl() -> u64 {
    86400
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
