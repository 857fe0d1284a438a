use std::collections::BTreeSet;
use std::sync::Arc;

use lib_kiosk::core::TimerHandle;
use lib_kiosk::ingestors::ContentState;
use lib_kiosk::models::build_slides;
use lib_kiosk::retrieve::ApiClient;
use lib_kiosk::utils::{ImageSource, MediaResolver};
use tokio::sync::watch;
use url::Url;

/// Image URLs referenced by a content snapshot, deduplicated.
pub fn image_urls(content: &ContentState, media: &MediaResolver) -> BTreeSet<Url> {
    build_slides(&content.ads, &content.news)
        .iter()
        .filter_map(|slide| match media.resolve(slide.image_ref()) {
            ImageSource::Remote(url) => Some(url),
            ImageSource::Placeholder => None,
        })
        .collect()
}

/// HEAD-checks the images of every new content revision and reports the ones
/// that fail to the resolver, which then renders them as placeholders.
pub fn spawn_image_probe(
    client: Arc<ApiClient>,
    mut content: watch::Receiver<ContentState>,
    media: MediaResolver,
) -> TimerHandle {
    TimerHandle::spawn("image-probe", move |token| async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                changed = content.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let snapshot = content.borrow_and_update().clone();
            media.clear_failures();
            let urls = image_urls(&snapshot, &media);
            log::debug!("Probing {} images for content revision {}", urls.len(), snapshot.revision);

            for url in urls {
                let ok = tokio::select! {
                    _ = token.cancelled() => return,
                    result = client.head_ok(&url) => match result {
                        Ok(ok) => ok,
                        Err(e) => {
                            log::debug!("Image probe failed for {}: {}", url, e);
                            false
                        }
                    },
                };
                if !ok {
                    media.report_failure(&url);
                }
            }
        }
    })
}
