use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the download pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The metadata endpoint yielded nothing usable for a market/offset pair.
    /// Recovered by trying the next market.
    #[error("no image metadata for market {market} at offset {idx}: {reason}")]
    MetadataUnavailable {
        market: String,
        idx: usize,
        reason: String,
    },

    /// Every candidate URL failed transport, status, or the size floor.
    #[error("all {attempts} candidate urls failed")]
    DownloadExhausted { attempts: usize },

    /// The OS call to set the desktop background reported failure.
    #[error("failed to apply wallpaper: {0}")]
    WallpaperApply(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
