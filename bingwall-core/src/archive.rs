use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const BING_BASE: &str = "https://www.bing.com";

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const METADATA_TIMEOUT: Duration = Duration::from_secs(15);

/// One day's image record from the HPImageArchive endpoint.
///
/// Only its derived artifacts (file and filename) persist; the descriptor
/// itself is discarded after the download.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageDescriptor {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub urlbase: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub startdate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveResponse {
    pub images: Vec<ImageDescriptor>,
}

/// Fetch the descriptor for `market` at day offset `idx` (0 = today).
pub fn fetch_descriptor(market: &str, idx: usize) -> Result<ImageDescriptor> {
    let url = format!(
        "{}/HPImageArchive.aspx?format=js&idx={}&n=1&mkt={}",
        BING_BASE,
        idx,
        urlencoding::encode(market)
    );
    let unavailable = |reason: String| Error::MetadataUnavailable {
        market: market.to_string(),
        idx,
        reason,
    };

    let response = attohttpc::get(&url)
        .header("User-Agent", USER_AGENT)
        .timeout(METADATA_TIMEOUT)
        .send()
        .map_err(|e| unavailable(e.to_string()))?;
    if !response.is_success() {
        return Err(unavailable(format!("status {}", response.status())));
    }
    let text = response.text().map_err(|e| unavailable(e.to_string()))?;
    let parsed: ArchiveResponse =
        serde_json::from_str(&text).map_err(|e| unavailable(e.to_string()))?;

    debug!(market, idx, "fetched image metadata");
    parsed
        .images
        .into_iter()
        .next()
        .ok_or_else(|| unavailable("empty images array".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_archive_response() {
        let body = r#"{"images":[{"startdate":"20250117","url":"/th?id=OHR.Test_EN-US123_1920x1080.jpg","urlbase":"/th?id=OHR.Test_EN-US123","title":"Test Image","copyright":"Somewhere (© Someone)"}]}"#;
        let parsed: ArchiveResponse = serde_json::from_str(body).unwrap();
        let descriptor = &parsed.images[0];
        assert_eq!(descriptor.startdate.as_deref(), Some("20250117"));
        assert_eq!(descriptor.urlbase.as_deref(), Some("/th?id=OHR.Test_EN-US123"));
        assert_eq!(descriptor.title.as_deref(), Some("Test Image"));
    }

    #[test]
    fn tolerates_missing_fields() {
        let parsed: ArchiveResponse = serde_json::from_str(r#"{"images":[{}]}"#).unwrap();
        assert!(parsed.images[0].url.is_none());
        assert!(parsed.images[0].urlbase.is_none());
    }

    #[test]
    fn empty_images_array_decodes() {
        let parsed: ArchiveResponse = serde_json::from_str(r#"{"images":[]}"#).unwrap();
        assert!(parsed.images.is_empty());
    }
}
