use std::path::PathBuf;

use futures::future::BoxFuture;

use crate::error::ViewerError;

/// Where the slides come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideSource {
    /// A single page with every slide pre-rendered as `<section class="slide">`.
    Page(PathBuf),
    /// A directory holding `slides/slide{i}.html` fragments.
    Directory(PathBuf),
    /// An HTTP(S) base URL serving `slides/slide{i}.html` fragments.
    Remote(String),
}

impl SlideSource {
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            return Self::Remote(arg.trim_end_matches('/').to_string());
        }
        let path = PathBuf::from(arg);
        let is_page = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        if is_page && !path.is_dir() {
            Self::Page(path)
        } else {
            Self::Directory(path)
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Page(path) | Self::Directory(path) => path.display().to_string(),
            Self::Remote(url) => url.clone(),
        }
    }
}

impl std::fmt::Display for SlideSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Relative location of fragment `ordinal` (1-based).
pub fn fragment_path(ordinal: usize) -> String {
    format!("slides/slide{ordinal}.html")
}

/// Fetches slide fragments by 1-based ordinal.
pub trait SlideFetcher: Send + Sync {
    fn fetch(&self, ordinal: usize) -> BoxFuture<'_, Result<String, ViewerError>>;
}

/// Reads fragments from a local directory.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SlideFetcher for DirFetcher {
    fn fetch(&self, ordinal: usize) -> BoxFuture<'_, Result<String, ViewerError>> {
        let path = self.root.join(fragment_path(ordinal));
        Box::pin(async move {
            let read_path = path.clone();
            tokio::task::spawn_blocking(move || std::fs::read_to_string(read_path))
                .await
                .map_err(|_| ViewerError::LoaderAborted { ordinal })?
                .map_err(|source| ViewerError::SlideRead {
                    ordinal,
                    path,
                    source,
                })
        })
    }
}

/// Fetches fragments over HTTP with a plain GET.
pub struct HttpFetcher {
    base: String,
}

impl HttpFetcher {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn url_for(&self, ordinal: usize) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), fragment_path(ordinal))
    }
}

impl SlideFetcher for HttpFetcher {
    fn fetch(&self, ordinal: usize) -> BoxFuture<'_, Result<String, ViewerError>> {
        let url = self.url_for(ordinal);
        Box::pin(async move {
            let request_url = url.clone();
            tokio::task::spawn_blocking(move || -> Result<String, ureq::Error> {
                ureq::get(&request_url).call()?.body_mut().read_to_string()
            })
            .await
            .map_err(|_| ViewerError::LoaderAborted { ordinal })?
            .map_err(|source| ViewerError::SlideFetch {
                ordinal,
                url,
                source: Box::new(source),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_arg() {
        assert_eq!(
            SlideSource::from_arg("https://example.org/deck/"),
            SlideSource::Remote("https://example.org/deck".to_string())
        );
        assert_eq!(
            SlideSource::from_arg("talk/index.html"),
            SlideSource::Page(PathBuf::from("talk/index.html"))
        );
        assert_eq!(
            SlideSource::from_arg("talk"),
            SlideSource::Directory(PathBuf::from("talk"))
        );
    }

    #[test]
    fn test_fragment_urls() {
        assert_eq!(fragment_path(7), "slides/slide7.html");
        let fetcher = HttpFetcher::new("http://localhost:8000/");
        assert_eq!(fetcher.url_for(1), "http://localhost:8000/slides/slide1.html");
    }

    #[tokio::test]
    async fn test_dir_fetcher_reports_missing_fragment() {
        let dir = std::env::temp_dir().join(format!("slidemap-dir-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("slides")).unwrap();
        std::fs::write(dir.join("slides/slide1.html"), "<h1>One</h1>").unwrap();

        let fetcher = DirFetcher::new(&dir);
        assert_eq!(fetcher.fetch(1).await.unwrap(), "<h1>One</h1>");
        let err = fetcher.fetch(2).await.unwrap_err();
        assert!(matches!(err, ViewerError::SlideRead { ordinal: 2, .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
