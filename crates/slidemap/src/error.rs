use std::path::PathBuf;
use thiserror::Error;

/// Failures inside a viewing session.
///
/// None of these is fatal: they are logged, the failing operation is skipped,
/// and navigation of the slides already loaded keeps working.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to read slide {ordinal} from `{}`", path.display())]
    SlideRead {
        ordinal: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch slide {ordinal} from {url}")]
    SlideFetch {
        ordinal: usize,
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("slide loader task for slide {ordinal} was aborted")]
    LoaderAborted { ordinal: usize },

    #[error("slide index {index} is out of range (0..{total})")]
    OutOfRange { index: usize, total: usize },

    #[error("no map container found on slide {}", .slide.map(|s| (s + 1).to_string()).unwrap_or_else(|| "?".to_string()))]
    MapElementMissing { slide: Option<usize> },

    #[error("geocoding `{name}` failed: {status}")]
    Geocode { name: String, status: String },

    #[error("location `{0}` is not on the pre-defined route")]
    LocationNotPreDefined(String),
}

impl ViewerError {
    /// True for the errors that end the sequential slide load.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::SlideRead { .. } | Self::SlideFetch { .. } | Self::LoaderAborted { .. }
        )
    }
}
