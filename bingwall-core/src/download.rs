use std::time::Duration;

use tracing::{debug, warn};

use crate::archive::USER_AGENT;
use crate::error::{Error, Result};

/// Payload floor distinguishing a real photo from a placeholder image.
const MIN_IMAGE_BYTES: usize = 10 * 1024;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// A downloaded image, alive only between retrieval and the file write.
#[derive(Debug)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Try candidates strictly in list order, returning the first acceptable
/// response. Trying the next URL is the whole retry strategy; a rejected
/// candidate is never re-attempted.
pub fn download_first(urls: &[String]) -> Result<Download> {
    for url in urls {
        match fetch_image(url) {
            Ok(download) => {
                debug!(url = %url, size = download.bytes.len(), "downloaded image");
                return Ok(download);
            }
            Err(reason) => warn!(url = %url, reason = %reason, "candidate rejected"),
        }
    }
    Err(Error::DownloadExhausted {
        attempts: urls.len(),
    })
}

fn fetch_image(url: &str) -> std::result::Result<Download, String> {
    let response = attohttpc::get(url)
        .header("User-Agent", USER_AGENT)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .map_err(|e| e.to_string())?;
    if !response.is_success() {
        return Err(format!("status {}", response.status()));
    }
    let content_type = response
        .headers()
        .get(attohttpc::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let bytes = response.bytes().map_err(|e| e.to_string())?;
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(format!("response too small ({} bytes)", bytes.len()));
    }
    Ok(Download {
        bytes,
        content_type,
    })
}
