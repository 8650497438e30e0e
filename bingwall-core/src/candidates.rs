use std::collections::HashSet;

use crate::archive::{ImageDescriptor, BING_BASE};

/// Extensions tried for every resolution tag, in fixed preference order.
const EXTENSIONS: [&str; 3] = [".jpg", ".png", ".webp"];

/// Build the ordered list of download URLs for one descriptor.
///
/// The service's own pre-resolved `url` goes first, then one URL per
/// requested resolution (outer) and extension (inner) from `urlbase`.
/// Duplicates keep their first position. A descriptor without either
/// fragment yields an empty list, which callers treat as "no image
/// available" rather than an error.
pub fn build_candidate_urls(descriptor: &ImageDescriptor, resolutions: &[String]) -> Vec<String> {
    let mut urls = Vec::new();

    if let Some(url) = descriptor.url.as_deref().filter(|u| !u.is_empty()) {
        urls.push(resolve(url));
    }
    if let Some(urlbase) = descriptor.urlbase.as_deref().filter(|u| !u.is_empty()) {
        let base = resolve(urlbase);
        for resolution in resolutions {
            for ext in EXTENSIONS {
                urls.push(format!("{}_{}{}", base, resolution, ext));
            }
        }
    }

    let mut seen = HashSet::new();
    urls.retain(|u| seen.insert(u.clone()));
    urls
}

fn resolve(fragment: &str) -> String {
    if fragment.starts_with("http") {
        fragment.to_string()
    } else {
        format!("{}{}", BING_BASE, fragment)
    }
}
