use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::archive::ImageDescriptor;

/// Characters never allowed in a derived filename.
const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_STEM_CHARS: usize = 140;

/// How the descriptive part of the filename is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMode {
    /// Short identifier from the OHR fragment of `urlbase`.
    #[default]
    Slug,
    /// The image title verbatim, slug as fallback.
    Title,
}

impl std::str::FromStr for NameMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "slug" => Ok(NameMode::Slug),
            "title" => Ok(NameMode::Title),
            other => Err(format!(
                "unknown name mode '{}', expected slug or title",
                other
            )),
        }
    }
}

impl std::fmt::Display for NameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NameMode::Slug => "slug",
            NameMode::Title => "title",
        })
    }
}

/// Derive the deterministic, filesystem-safe filename for a descriptor.
///
/// Identical descriptor + content type + mode always yields the identical
/// filename; the skip conflict policy depends on this.
pub fn build_filename(
    descriptor: &ImageDescriptor,
    content_type: Option<&str>,
    mode: NameMode,
) -> String {
    let date = date_component(descriptor);
    let descriptive = match mode {
        NameMode::Title => descriptor
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| extract_slug(descriptor)),
        NameMode::Slug => extract_slug(descriptor),
    };

    let mut stem = sanitize(&format!("{}_{}", date, descriptive));
    if stem.chars().count() > MAX_STEM_CHARS {
        stem = stem.chars().take(MAX_STEM_CHARS).collect();
        stem = stem.trim_end_matches('_').to_string();
    }
    format!("{}{}", stem, extension_for(content_type))
}

/// Replace filesystem-hostile characters and trim surrounding whitespace.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Stable identifier from the descriptor's `urlbase` fragment.
///
/// Everything after the `OHR.` marker when present, otherwise the last path
/// segment; truncated at the first `_`. Truncation can collide across images
/// sharing a prefix; the derivation stays deterministic regardless.
pub fn extract_slug(descriptor: &ImageDescriptor) -> String {
    let urlbase = descriptor.urlbase.as_deref().unwrap_or("");
    let tail = match urlbase.split_once("OHR.") {
        Some((_, rest)) => rest,
        None => urlbase.rsplit('/').next().unwrap_or(""),
    };
    let slug = tail.split('_').next().unwrap_or("");
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

/// Date component `YYYY-MM-DD` from the descriptor's `startdate`.
pub fn date_component(descriptor: &ImageDescriptor) -> String {
    let raw = descriptor.startdate.as_deref().unwrap_or("");
    match NaiveDate::parse_from_str(raw, "%Y%m%d") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) if !raw.is_empty() => raw.to_string(),
        Err(_) => Utc::now().format("%Y-%m-%d").to_string(),
    }
}

/// File extension for a declared content type, `.jpg` when in doubt.
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let ct = match content_type {
        Some(ct) => ct.to_ascii_lowercase(),
        None => return ".jpg",
    };
    if ct.contains("jpeg") || ct.contains("jpg") {
        ".jpg"
    } else if ct.contains("png") {
        ".png"
    } else if ct.contains("webp") {
        ".webp"
    } else if ct.contains("bmp") {
        ".bmp"
    } else {
        ".jpg"
    }
}
