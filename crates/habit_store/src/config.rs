use habit_core::Collections;

/// Connection settings for the record-store REST API.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL, e.g. `https://my.living-apps.de/rest`
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    pub collections: Collections,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: habit_core::reference::REFERENCE_BASE.to_string(),
            api_key: None,
            timeout_secs: 30,
            collections: Collections::default(),
        }
    }
}

impl StoreConfig {
    pub(crate) fn records_url(&self, collection: &str) -> String {
        format!(
            "{}/apps/{}/records",
            self.base_url.trim_end_matches('/'),
            collection
        )
    }

    pub(crate) fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.records_url(collection), id)
    }
}
