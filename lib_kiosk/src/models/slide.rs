//! # Slides
//!
//! The rotation shows ads and news through one tagged union. The merged order
//! is fixed: every ad in the order received, then every news item in the order
//! received.

use std::sync::Arc;
use std::time::Duration;

use super::{Ad, NewsItem};

/// Seconds an ad stays on screen when it has no usable duration.
pub const AD_DEFAULT_SECONDS: u64 = 10;
/// Seconds a news item stays on screen when it has no usable duration.
pub const NEWS_DEFAULT_SECONDS: u64 = 12;

/// One unit of rotating content.
#[derive(Debug, Clone, PartialEq)]
pub enum Slide {
    /// An advertisement.
    Ad(Ad),
    /// A government news item.
    News(NewsItem),
}

/// Identity of a slide within one content generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideKey {
    /// Ad by backend id.
    Ad(i64),
    /// News item by backend id.
    News(i64),
}

impl Slide {
    /// Display time in whole seconds, always positive.
    pub fn duration_seconds(&self) -> u64 {
        match self {
            Slide::Ad(ad) => positive_or(ad.duration_seconds, AD_DEFAULT_SECONDS),
            Slide::News(item) => positive_or(item.duration_seconds, NEWS_DEFAULT_SECONDS),
        }
    }

    /// Display time as a `Duration`.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds())
    }

    /// Identity of this slide.
    pub fn key(&self) -> SlideKey {
        match self {
            Slide::Ad(ad) => SlideKey::Ad(ad.id),
            Slide::News(item) => SlideKey::News(item.id),
        }
    }

    /// Image reference as received, if the slide has one.
    pub fn image_ref(&self) -> Option<&str> {
        match self {
            Slide::Ad(ad) => Some(ad.image_url.as_str()),
            Slide::News(item) => item.image_url.as_deref(),
        }
        .filter(|r| !r.trim().is_empty())
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            Slide::Ad(ad) => format!("ad#{} \"{}\"", ad.id, ad.title),
            Slide::News(item) => format!("news#{} \"{}\"", item.id, item.title_el),
        }
    }
}

fn positive_or(value: Option<i64>, fallback: u64) -> u64 {
    match value {
        Some(v) if v > 0 => v as u64,
        _ => fallback,
    }
}

/// Merges ads and news into the rotation order: ads first, then news.
pub fn build_slides(ads: &[Ad], news: &[NewsItem]) -> Arc<[Slide]> {
    ads.iter()
        .cloned()
        .map(Slide::Ad)
        .chain(news.iter().cloned().map(Slide::News))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(id: i64, duration: Option<i64>) -> Ad {
        Ad { id, title: format!("ad {id}"), duration_seconds: duration, ..Default::default() }
    }

    fn news(id: i64, duration: Option<i64>) -> NewsItem {
        NewsItem { id, title_el: format!("news {id}"), duration_seconds: duration, ..Default::default() }
    }

    #[test]
    fn durations_fall_back_per_kind() {
        assert_eq!(Slide::Ad(ad(1, None)).duration_seconds(), 10);
        assert_eq!(Slide::Ad(ad(1, Some(0))).duration_seconds(), 10);
        assert_eq!(Slide::Ad(ad(1, Some(-4))).duration_seconds(), 10);
        assert_eq!(Slide::Ad(ad(1, Some(15))).duration_seconds(), 15);
        assert_eq!(Slide::News(news(1, None)).duration_seconds(), 12);
        assert_eq!(Slide::News(news(1, Some(0))).duration_seconds(), 12);
        assert_eq!(Slide::News(news(1, Some(7))).duration(), Duration::from_secs(7));
    }

    #[test]
    fn huge_durations_do_not_overflow() {
        let slide = Slide::Ad(ad(1, Some(i64::MAX)));
        assert_eq!(slide.duration_seconds(), i64::MAX as u64);
        assert_eq!(slide.duration(), Duration::from_secs(i64::MAX as u64));
    }

    #[test]
    fn ads_come_before_news_in_received_order() {
        let slides = build_slides(&[ad(2, None), ad(1, None)], &[news(9, None), news(3, None)]);
        let keys: Vec<SlideKey> = slides.iter().map(Slide::key).collect();
        assert_eq!(
            keys,
            vec![SlideKey::Ad(2), SlideKey::Ad(1), SlideKey::News(9), SlideKey::News(3)]
        );
    }

    #[test]
    fn blank_image_references_are_absent() {
        let mut item = news(1, None);
        item.image_url = Some(" ".into());
        assert_eq!(Slide::News(item).image_ref(), None);
        assert_eq!(Slide::Ad(ad(1, None)).image_ref(), None);
    }
}
