//! Image references in ads and news are either absolute URLs or upload paths
//! relative to the media server. A reference that cannot be resolved, or that
//! was reported as failing to load, renders as a placeholder.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use url::Url;

/// What the slide pane should draw for an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Load from this URL.
    Remote(Url),
    /// Draw the built-in placeholder graphic.
    Placeholder,
}

/// Resolves image references and tracks known-bad URLs.
///
/// Clones share the failure set, so a prober task can report failures that the
/// composer then sees.
#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    base: Option<Url>,
    failed: Arc<Mutex<HashSet<String>>>,
}

impl MediaResolver {
    /// Creates a resolver joining relative references onto `base`.
    pub fn new(base: Option<Url>) -> Self {
        Self { base, failed: Arc::default() }
    }

    /// Resolves a reference. Never fails; bad input yields `Placeholder`.
    pub fn resolve(&self, reference: Option<&str>) -> ImageSource {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return ImageSource::Placeholder;
        };

        let resolved = match Url::parse(reference) {
            Ok(absolute) => Some(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base.as_ref().and_then(|base| base.join(reference).ok())
            }
            Err(e) => {
                log::debug!("Unusable image reference {reference:?}: {e}");
                None
            }
        };

        match resolved {
            Some(url) if !self.has_failed(&url) => ImageSource::Remote(url),
            _ => ImageSource::Placeholder,
        }
    }

    /// Records that `url` could not be loaded.
    pub fn report_failure(&self, url: &Url) {
        let mut failed = self.failed.lock().unwrap_or_else(|e| e.into_inner());
        if failed.insert(url.to_string()) {
            log::warn!("Image failed to load, using placeholder: {url}");
        }
    }

    /// Forgets all recorded failures, e.g. after new content arrives.
    pub fn clear_failures(&self) {
        self.failed.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn has_failed(&self, url: &Url) -> bool {
        self.failed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(url.as_str())
    }
}
