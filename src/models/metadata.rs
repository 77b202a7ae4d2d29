use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display metadata scraped from a title's detail page
///
/// Built fresh on every fetch. A page without an image or a trailer yields
/// `None` for that field; that is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub detail_url: String,
    pub synopsis: String,
    pub image_url: Option<String>,
    pub trailer_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}
