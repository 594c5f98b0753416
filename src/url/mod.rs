//! URL handling for petrel
//!
//! This module provides URL normalization, crawl classification, and the
//! `Origin` politeness unit.

mod normalize;

pub use normalize::normalize_url;

use std::fmt;
use url::Url;

/// File extensions treated as fetchable images
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Hosts that serve video content petrel never fetches
const VIDEO_HOSTS: &[&str] = &["youtube.com", "vimeo.com", "dailymotion.com"];

/// Host fragments that mark social, advertising, and tracking endpoints
const SKIP_HOSTS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "ads.",
    "analytics.",
    "tracker.",
];

/// How a normalized URL should be treated by the crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlClass {
    /// Candidate HTML page, eligible for fetching and expansion
    Page,
    /// Image reference, fetched into the blob store
    Image,
    /// Video platform URL, never fetched
    Video,
    /// Social / advertising / tracking endpoint, never fetched
    Skip,
}

impl UrlClass {
    /// Returns true if the URL may enter the frontier as a page
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page)
    }

    /// Returns true if the URL is an image reference
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image)
    }
}

/// Classifies a normalized URL
///
/// Checks, in order: image extension on the path (case-insensitive), video
/// platform host, skip-list host fragments. Everything else is a page
/// candidate.
pub fn classify(url: &Url) -> UrlClass {
    let path = url.path().to_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return UrlClass::Image;
    }

    let host = url.host_str().unwrap_or("").to_lowercase();
    if VIDEO_HOSTS.iter().any(|h| host.contains(h)) {
        return UrlClass::Video;
    }

    if SKIP_HOSTS.iter().any(|h| host.contains(h)) {
        return UrlClass::Skip;
    }

    UrlClass::Page
}

/// The politeness unit: one origin gets at most one in-flight fetch
///
/// Two URLs share an origin when their scheme, host, and effective port all
/// match. The port falls back to the scheme default when not explicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Origin {
    /// Extracts the origin of a normalized URL
    pub fn of(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_string(),
            host: url.host_str().unwrap_or("").to_string(),
            port: url.port_or_known_default().unwrap_or(0),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify_page() {
        assert_eq!(classify(&url("https://example.com/article")), UrlClass::Page);
        assert_eq!(classify(&url("https://example.com/")), UrlClass::Page);
    }

    #[test]
    fn test_classify_image_extensions() {
        for ext in ["jpg", "jpeg", "png", "gif", "webp"] {
            let u = url(&format!("https://example.com/pic.{}", ext));
            assert_eq!(classify(&u), UrlClass::Image, "failed for .{}", ext);
        }
    }

    #[test]
    fn test_classify_image_uppercase_extension() {
        assert_eq!(classify(&url("https://example.com/IMG.JPG")), UrlClass::Image);
        assert_eq!(classify(&url("https://example.com/Photo.PnG")), UrlClass::Image);
    }

    #[test]
    fn test_classify_video_hosts() {
        assert_eq!(
            classify(&url("https://www.youtube.com/watch?v=abc")),
            UrlClass::Video
        );
        assert_eq!(classify(&url("https://vimeo.com/12345")), UrlClass::Video);
        assert_eq!(
            classify(&url("https://dailymotion.com/video/x1")),
            UrlClass::Video
        );
    }

    #[test]
    fn test_classify_skip_hosts() {
        assert_eq!(
            classify(&url("https://www.facebook.com/page")),
            UrlClass::Skip
        );
        assert_eq!(classify(&url("https://twitter.com/user")), UrlClass::Skip);
        assert_eq!(
            classify(&url("https://ads.example.com/banner")),
            UrlClass::Skip
        );
        assert_eq!(
            classify(&url("https://analytics.example.com/collect")),
            UrlClass::Skip
        );
        assert_eq!(
            classify(&url("https://tracker.example.com/pixel")),
            UrlClass::Skip
        );
    }

    #[test]
    fn test_image_extension_wins_over_host() {
        // Extension check runs first; an image on a video host is an image.
        assert_eq!(
            classify(&url("https://youtube.com/thumb.jpg")),
            UrlClass::Image
        );
    }

    #[test]
    fn test_query_does_not_make_image() {
        assert_eq!(
            classify(&url("https://example.com/page?file=pic.jpg")),
            UrlClass::Page
        );
    }

    #[test]
    fn test_origin_of() {
        let origin = Origin::of(&url("https://example.com/a/b"));
        assert_eq!(origin.scheme, "https");
        assert_eq!(origin.host, "example.com");
        assert_eq!(origin.port, 443);
    }

    #[test]
    fn test_origin_explicit_port() {
        let origin = Origin::of(&url("http://example.com:8080/"));
        assert_eq!(origin.port, 8080);
    }

    #[test]
    fn test_origin_same_host_different_scheme() {
        let a = Origin::of(&url("http://example.com/"));
        let b = Origin::of(&url("https://example.com/"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_origin_identity_across_paths() {
        let a = Origin::of(&url("https://example.com/a"));
        let b = Origin::of(&url("https://example.com/b?x=1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_origin_display() {
        let origin = Origin::of(&url("https://example.com/"));
        assert_eq!(origin.to_string(), "https://example.com:443");
    }
}
