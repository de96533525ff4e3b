use std::path::Path;

use anyhow::Context;

use super::html;
use super::source::{DirFetcher, HttpFetcher, SlideFetcher, SlideSource};
use crate::error::ViewerError;

/// Default number of fragments in a deck.
pub const DEFAULT_SLIDE_COUNT: usize = 19;

/// What a loader sends to the viewer.
#[derive(Debug)]
pub enum LoadEvent {
    /// Fragment with 1-based `ordinal` arrived; slides arrive in order.
    Slide { ordinal: usize, markup: String },
    /// Loading stopped early; the slides already delivered remain.
    Failed(ViewerError),
    /// No more slides will arrive.
    Finished { loaded: usize },
}

#[derive(Debug)]
pub struct LoadReport {
    pub loaded: usize,
    pub failure: Option<ViewerError>,
}

/// Fetch fragments `1..=count` one after another.
///
/// Fragment `i + 1` is not requested until fragment `i` has arrived, so the
/// sink sees slides in ordinal order. The first failure ends the load.
pub async fn load_sequential<F, S>(fetcher: &F, count: usize, mut sink: S) -> LoadReport
where
    F: SlideFetcher + ?Sized,
    S: FnMut(usize, String),
{
    let mut loaded = 0;
    for ordinal in 1..=count {
        match fetcher.fetch(ordinal).await {
            Ok(markup) => {
                crate::debug!("slides"; "loaded slide {ordinal}/{count}");
                sink(ordinal, markup);
                loaded += 1;
            }
            Err(err) => {
                crate::error!("slides"; "{err}; stopping after {loaded} slide(s)");
                return LoadReport {
                    loaded,
                    failure: Some(err),
                };
            }
        }
    }
    LoadReport {
        loaded,
        failure: None,
    }
}

/// Read every slide of a pre-rendered page at once.
pub fn load_page(path: &Path) -> anyhow::Result<Vec<String>> {
    let page = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let slides = html::split_page(&page);
    if slides.is_empty() {
        anyhow::bail!(
            "No elements with class=\"slide\" found in {}",
            path.display()
        );
    }
    Ok(slides)
}

/// Load `source` on a background thread, sending events as slides arrive.
///
/// `notify` runs after every event so the UI can schedule a repaint.
pub fn spawn(
    source: SlideSource,
    count: usize,
    events: std::sync::mpsc::Sender<LoadEvent>,
    notify: impl Fn() + Send + 'static,
) -> anyhow::Result<std::thread::JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("slide-loader".to_string())
        .spawn(move || {
            run(source, count, &events, &notify);
        })
        .context("Failed to start the slide loader thread")?;
    Ok(handle)
}

fn run(
    source: SlideSource,
    count: usize,
    events: &std::sync::mpsc::Sender<LoadEvent>,
    notify: &(impl Fn() + Send),
) {
    let send = |event: LoadEvent| {
        // The viewer may already be closed; nothing left to notify then.
        if events.send(event).is_ok() {
            notify();
        }
    };

    let fetcher: Box<dyn SlideFetcher> = match source {
        SlideSource::Page(path) => {
            match load_page(&path) {
                Ok(slides) => {
                    let loaded = slides.len();
                    for (i, markup) in slides.into_iter().enumerate() {
                        send(LoadEvent::Slide {
                            ordinal: i + 1,
                            markup,
                        });
                    }
                    send(LoadEvent::Finished { loaded });
                }
                Err(e) => {
                    crate::error!("slides"; "{e:#}");
                    send(LoadEvent::Finished { loaded: 0 });
                }
            }
            return;
        }
        SlideSource::Directory(root) => Box::new(DirFetcher::new(root)),
        SlideSource::Remote(base) => Box::new(HttpFetcher::new(base)),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => {
            crate::error!("slides"; "failed to start loader runtime: {e}");
            send(LoadEvent::Finished { loaded: 0 });
            return;
        }
    };

    let report = runtime.block_on(load_sequential(fetcher.as_ref(), count, |ordinal, markup| {
        send(LoadEvent::Slide { ordinal, markup })
    }));

    if let Some(err) = report.failure {
        send(LoadEvent::Failed(err));
    }
    send(LoadEvent::Finished {
        loaded: report.loaded,
    });
}
