pub mod archive;
pub mod candidates;
pub mod conf;
pub mod download;
pub mod error;
pub mod naming;
pub mod run;
pub mod task;
pub mod wallpaper;

pub use archive::{fetch_descriptor, ImageDescriptor, BING_BASE};
pub use candidates::build_candidate_urls;
pub use conf::Settings;
pub use download::{download_first, Download};
pub use error::{Error, Result};
pub use naming::{build_filename, NameMode};
pub use run::{run, ConflictMode, RunConfig, RunSummary};
pub use wallpaper::set_wallpaper;
